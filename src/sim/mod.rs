//! Hosted, tick-accurate simulation of the device.
//!
//! The same timing engine, calibration and supervisor that run on the
//! ATtiny13A are wired to the models in [`peripherals`]. One [`Simulation::step`]
//! is one timer tick (~106.67 us); falling edges are injected between ticks.

pub mod peripherals;

use ufmt::{uDisplay, uWrite, uwrite, Formatter};

use crate::config::{LED_BIT, PORTB_INITIAL, WDT_TIMEOUT_TICKS};
use crate::drivers::{Calibration, CalibrationIndex, LineOutputs, Phase, PulseTicks, TimingEngine};
use crate::os::Supervisor;

pub use peripherals::{Parked, SimAdc, SimPin, SimTimer, SimTrimPot, SimWatchdog, WatchdogExpiry};

pub type SimEngine = TimingEngine<SimPin, SimPin, SimTimer>;
pub type SimCalibration = Calibration<SimAdc, SimAdc, SimTrimPot>;

/// Output transitions kept by the trace; later ones are dropped.
pub const TRACE_CAPACITY: usize = 256;

#[derive(Clone, Copy, Debug)]
pub struct SimConfig {
    /// Raw 10-bit trimpot reading
    pub trimpot: u16,
    /// Ticks a conversion takes
    pub conversion_ticks: u16,
    /// Ticks per watchdog period
    pub watchdog_ticks: u32,
    /// Conversions never complete
    pub adc_stuck: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            // index 3, same pulse as the power-on default
            trimpot: 3 << 7,
            conversion_ticks: 2,
            watchdog_ticks: WDT_TIMEOUT_TICKS,
            adc_stuck: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    DriverEnable,
    Led,
}

/// A change of one output, `asserted` meaning driver on or LED lit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub tick: u32,
    pub signal: Signal,
    pub asserted: bool,
}

impl uDisplay for Signal {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        match self {
            Signal::DriverEnable => f.write_str("DE "),
            Signal::Led => f.write_str("LED"),
        }
    }
}

impl uDisplay for Transition {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        let level = if self.asserted { "on" } else { "off" };
        uwrite!(f, "{} {} {}", self.tick, self.signal, level)
    }
}

/// Everything a reset puts back to power-on state
struct Device {
    pulse: PulseTicks,
    engine: SimEngine,
    calibration: SimCalibration,
    supervisor: Supervisor<Parked, SimWatchdog>,
}

impl Device {
    fn power_on(config: &SimConfig) -> Self {
        let driver = SimPin::new(false);
        let led = SimPin::new(PORTB_INITIAL & (1 << LED_BIT) != 0);
        let adc = SimAdc::new(config.trimpot, config.conversion_ticks, config.adc_stuck);

        Self {
            pulse: PulseTicks::new(),
            engine: TimingEngine::new(LineOutputs::new(driver, led), SimTimer::new()),
            calibration: Calibration::new(adc, SimTrimPot),
            supervisor: Supervisor::new(Parked, SimWatchdog::new(config.watchdog_ticks)),
        }
    }
}

pub struct Simulation {
    config: SimConfig,
    device: Device,
    now: u32,
    hung: bool,
    resets: u32,
    driver: bool,
    led: bool,
    trace: heapless::Vec<Transition, TRACE_CAPACITY>,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            device: Device::power_on(&config),
            now: 0,
            hung: false,
            resets: 0,
            driver: false,
            led: false,
            trace: heapless::Vec::new(),
        }
    }

    /// Advance one timer tick.
    pub fn step(&mut self) {
        self.now = self.now.wrapping_add(1);

        let device = &mut self.device;
        device.calibration.adc_mut().tick();

        let mut wake = false;
        if device.engine.timer_mut().tick() {
            device.engine.on_timer_overflow();
            wake = true;
        }

        match device.supervisor.watchdog_mut().tick() {
            Some(WatchdogExpiry::Interrupt) => wake = true,
            Some(WatchdogExpiry::Reset) => {
                self.reset();
                return;
            }
            None => {}
        }

        if wake {
            self.wake();
        }
        self.record();
    }

    pub fn run(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Step until the engine is idle again, at most `limit` ticks.
    /// Returns the ticks stepped.
    pub fn run_until_idle(&mut self, limit: u32) -> u32 {
        let mut ticks = 0;
        while self.phase() != Phase::Idle && ticks < limit {
            self.step();
            ticks += 1;
        }
        ticks
    }

    /// A start bit on the TX line, between two ticks.
    pub fn falling_edge(&mut self) {
        let device = &mut self.device;
        device.engine.on_falling_edge(&device.pulse);
        self.wake();
        self.record();
    }

    pub fn set_trimpot(&mut self, sample: u16) {
        self.config.trimpot = sample;
        self.device.calibration.adc_mut().set_sample(sample);
    }

    /// Stop the main loop from running; interrupts still fire.
    pub fn hang(&mut self) {
        log::debug!("main loop hung at tick {}", self.now);
        self.hung = true;
    }

    fn wake(&mut self) {
        if self.hung {
            return;
        }
        let device = &mut self.device;
        device.supervisor.service(&mut device.calibration, &device.pulse);
    }

    fn reset(&mut self) {
        log::debug!("watchdog reset at tick {}", self.now);
        self.device = Device::power_on(&self.config);
        self.hung = false;
        self.resets += 1;
        self.record();
    }

    fn record(&mut self) {
        let driver = self.device.engine.driver_enabled();
        let led = self.device.engine.led_lit();
        if driver != self.driver {
            self.push(Signal::DriverEnable, driver);
            self.driver = driver;
        }
        if led != self.led {
            self.push(Signal::Led, led);
            self.led = led;
        }
    }

    fn push(&mut self, signal: Signal, asserted: bool) {
        let transition = Transition {
            tick: self.now,
            signal,
            asserted,
        };
        if self.trace.push(transition).is_err() {
            log::trace!("trace full, dropping transition at tick {}", self.now);
        }
    }

    pub fn now(&self) -> u32 {
        self.now
    }

    pub fn driver_enabled(&self) -> bool {
        self.device.engine.driver_enabled()
    }

    pub fn led_lit(&self) -> bool {
        self.device.engine.led_lit()
    }

    pub fn phase(&self) -> Phase {
        self.device.engine.phase()
    }

    pub fn pulse_ticks(&self) -> u16 {
        self.device.pulse.ticks()
    }

    pub fn pulse_preload(&self) -> u8 {
        self.device.pulse.preload()
    }

    pub fn calibration_index(&self) -> Option<CalibrationIndex> {
        self.device.calibration.current()
    }

    pub fn timer(&self) -> &SimTimer {
        self.device.engine.timer()
    }

    /// Main-loop wake-ups since the last reset
    pub fn wakes(&self) -> u32 {
        self.device.supervisor.wakes()
    }

    /// Watchdog feeds since the last reset
    pub fn watchdog_feeds(&self) -> u32 {
        self.device.supervisor.watchdog().feeds()
    }

    pub fn resets(&self) -> u32 {
        self.resets
    }

    pub fn trace(&self) -> &[Transition] {
        &self.trace
    }
}
