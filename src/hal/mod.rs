pub mod adc;
pub mod exint;
pub mod gpio;
pub mod power;
pub mod timer;
pub mod watchdog;

// Re-export commonly used types
pub use adc::{Adc, AdcPrescaler, TrimPot};
pub use gpio::board::{DriverEnable, StatusLed};
pub use gpio::{Input, Output, Pin};
pub use power::{Power, SleepMode};
pub use timer::{Prescaler, Timer0};
pub use watchdog::{Watchdog, WatchdogTimeout};
