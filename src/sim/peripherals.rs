//! Tick-level models of the peripherals the firmware touches

use core::convert::Infallible;

use embedded_hal::adc::{Channel, OneShot};
use embedded_hal::digital::v2::{OutputPin, StatefulOutputPin};
use embedded_hal::watchdog::Watchdog;

use crate::config::TRIMPOT_ADC_CHANNEL;
use crate::drivers::OverflowTimer;
use crate::os::Idle;

/// Output latch of one port bit
#[derive(Debug)]
pub struct SimPin {
    high: bool,
}

impl SimPin {
    pub fn new(high: bool) -> Self {
        Self { high }
    }
}

impl OutputPin for SimPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Infallible> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.high = true;
        Ok(())
    }
}

impl StatefulOutputPin for SimPin {
    fn is_set_high(&self) -> Result<bool, Infallible> {
        Ok(self.high)
    }

    fn is_set_low(&self) -> Result<bool, Infallible> {
        Ok(!self.high)
    }
}

/// 8-bit up-counter with overflow flag and interrupt enable.
///
/// The counter never stops, just like Timer/Counter0 once it has a clock.
#[derive(Debug, Default)]
pub struct SimTimer {
    counter: u8,
    overflow_enabled: bool,
    overflow_pending: bool,
    restarts: u32,
}

impl SimTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one prescaled tick. Returns true when the overflow interrupt fires.
    pub fn tick(&mut self) -> bool {
        self.counter = self.counter.wrapping_add(1);
        if self.counter == 0 {
            self.overflow_pending = true;
        }
        if self.overflow_pending && self.overflow_enabled {
            self.overflow_pending = false;
            true
        } else {
            false
        }
    }

    pub fn counter(&self) -> u8 {
        self.counter
    }

    pub fn overflow_enabled(&self) -> bool {
        self.overflow_enabled
    }

    pub fn restarts(&self) -> u32 {
        self.restarts
    }
}

impl OverflowTimer for SimTimer {
    fn restart(&mut self, preload: u8) {
        self.counter = preload;
        self.overflow_pending = false;
        self.overflow_enabled = true;
        self.restarts += 1;
    }

    fn disable_overflow(&mut self) {
        self.overflow_enabled = false;
    }
}

/// Free-running single-channel ADC with a polled completion flag
#[derive(Debug)]
pub struct SimAdc {
    sample: u16,
    conversion_ticks: u16,
    remaining: u16,
    complete: bool,
    stuck: bool,
}

/// Trimpot input of [`SimAdc`]
#[derive(Debug)]
pub struct SimTrimPot;

impl Channel<SimAdc> for SimTrimPot {
    type ID = u8;

    fn channel() -> u8 {
        TRIMPOT_ADC_CHANNEL
    }
}

impl SimAdc {
    /// Starts the first conversion right away, as the firmware does at init.
    pub fn new(sample: u16, conversion_ticks: u16, stuck: bool) -> Self {
        let mut adc = Self {
            sample: sample & 0x3ff,
            conversion_ticks,
            remaining: 0,
            complete: false,
            stuck,
        };
        adc.start();
        adc
    }

    fn start(&mut self) {
        self.remaining = self.conversion_ticks.max(1);
        self.complete = false;
    }

    pub fn tick(&mut self) {
        if self.stuck || self.complete {
            return;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            self.complete = true;
        }
    }

    pub fn sample(&self) -> u16 {
        self.sample
    }

    /// Turn the trimpot. Applies to the next conversion that completes.
    pub fn set_sample(&mut self, sample: u16) {
        self.sample = sample & 0x3ff;
    }
}

impl OneShot<SimAdc, u16, SimTrimPot> for SimAdc {
    type Error = Infallible;

    fn read(&mut self, _pin: &mut SimTrimPot) -> nb::Result<u16, Infallible> {
        if !self.complete {
            return Err(nb::Error::WouldBlock);
        }
        let sample = self.sample;
        self.start();
        Ok(sample)
    }
}

/// What a watchdog timeout did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchdogExpiry {
    Interrupt,
    Reset,
}

/// Watchdog in interrupt-then-reset mode.
///
/// A timeout with the interrupt armed raises the interrupt and disarms it; a
/// timeout while disarmed resets the device. Feeding restarts the period and
/// re-arms the interrupt.
#[derive(Debug)]
pub struct SimWatchdog {
    period: u32,
    elapsed: u32,
    interrupt_armed: bool,
    feeds: u32,
}

impl SimWatchdog {
    pub fn new(period: u32) -> Self {
        Self {
            period: period.max(1),
            elapsed: 0,
            interrupt_armed: true,
            feeds: 0,
        }
    }

    pub fn tick(&mut self) -> Option<WatchdogExpiry> {
        self.elapsed += 1;
        if self.elapsed < self.period {
            return None;
        }
        self.elapsed = 0;
        if self.interrupt_armed {
            self.interrupt_armed = false;
            Some(WatchdogExpiry::Interrupt)
        } else {
            Some(WatchdogExpiry::Reset)
        }
    }

    pub fn feeds(&self) -> u32 {
        self.feeds
    }
}

impl Watchdog for SimWatchdog {
    fn feed(&mut self) {
        self.elapsed = 0;
        self.interrupt_armed = true;
        self.feeds += 1;
    }
}

/// The simulator is the event loop, so the main loop is always already
/// parked in sleep when an interrupt arrives.
#[derive(Debug, Default)]
pub struct Parked;

impl Idle for Parked {
    fn wait_for_interrupt(&mut self) {}
}
