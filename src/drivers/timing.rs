//! Two-phase retriggerable timeout driving the line outputs
//!
//! A falling edge on the TX line puts the engine in [`Phase::ArmedShort`]: the
//! driver and LED are on and the timer is loaded to overflow after the
//! calibrated byte window. The first overflow releases the driver and leaves
//! the counter free-running for one full period with only the LED on. The
//! second overflow turns the LED off and silences the timer.

use embedded_hal::digital::v2::{OutputPin, StatefulOutputPin};

use super::calibration::PulseTicks;
use super::line_driver::LineOutputs;

/// 8-bit overflow timer used as a one-shot countdown.
pub trait OverflowTimer {
    /// Load `preload` into the counter with a freshly reset prescaler,
    /// discard a pending overflow and enable the overflow interrupt.
    fn restart(&mut self, preload: u8);

    /// Disable the overflow interrupt. The counter keeps running.
    fn disable_overflow(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Everything off, overflow interrupt disabled
    Idle,
    /// Driver and LED on, counting down the byte window
    ArmedShort,
    /// Driver off, LED on for one full timer period
    ArmedLong,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    FallingEdge,
    Overflow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Driver and LED on, timer restarted from the pulse preload
    AssertAndArm,
    /// Driver off, timer left running
    ReleaseDriver,
    /// LED off, overflow interrupt disabled
    ReleaseLed,
}

/// The whole state machine.
pub const fn transition(phase: Phase, event: Event) -> (Phase, Action) {
    match (phase, event) {
        (_, Event::FallingEdge) => (Phase::ArmedShort, Action::AssertAndArm),
        (Phase::ArmedShort, Event::Overflow) => (Phase::ArmedLong, Action::ReleaseDriver),
        (Phase::ArmedLong, Event::Overflow) => (Phase::Idle, Action::ReleaseLed),
        // stray overflow, silence the timer again
        (Phase::Idle, Event::Overflow) => (Phase::Idle, Action::ReleaseLed),
    }
}

pub struct TimingEngine<DE, LED, T> {
    outputs: LineOutputs<DE, LED>,
    timer: T,
    phase: Phase,
}

impl<DE, LED, T> TimingEngine<DE, LED, T>
where
    DE: OutputPin,
    LED: OutputPin,
    T: OverflowTimer,
{
    /// Takes over the outputs and drives them to their idle levels.
    pub fn new(mut outputs: LineOutputs<DE, LED>, mut timer: T) -> Self {
        outputs.idle();
        timer.disable_overflow();
        Self {
            outputs,
            timer,
            phase: Phase::Idle,
        }
    }

    /// External interrupt handler body: start of a bit on the TX line.
    #[inline]
    pub fn on_falling_edge(&mut self, pulse: &PulseTicks) {
        self.dispatch(Event::FallingEdge, pulse.preload());
    }

    /// Timer overflow interrupt handler body.
    #[inline]
    pub fn on_timer_overflow(&mut self) {
        self.dispatch(Event::Overflow, 0);
    }

    fn dispatch(&mut self, event: Event, preload: u8) {
        let (next, action) = transition(self.phase, event);
        match action {
            Action::AssertAndArm => {
                self.outputs.assert_all();
                self.timer.restart(preload);
            }
            Action::ReleaseDriver => self.outputs.release_driver(),
            Action::ReleaseLed => {
                self.outputs.release_led();
                self.timer.disable_overflow();
            }
        }
        self.phase = next;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }
}

impl<DE, LED, T> TimingEngine<DE, LED, T>
where
    DE: StatefulOutputPin,
    LED: StatefulOutputPin,
{
    pub fn driver_enabled(&self) -> bool {
        self.outputs.driver_enabled()
    }

    pub fn led_lit(&self) -> bool {
        self.outputs.led_lit()
    }
}
