pub mod calibration;
pub mod line_driver;
pub mod timing;

pub use calibration::{Calibration, CalibrationIndex, PulseTicks, TICK_TABLE};
pub use line_driver::LineOutputs;
pub use timing::{OverflowTimer, Phase, TimingEngine};
