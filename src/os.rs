//! Power supervisor: idle sleep, watchdog service and calibration polling

use embedded_hal::adc::{Channel, OneShot};
use embedded_hal::watchdog::Watchdog;

use crate::drivers::{Calibration, PulseTicks};

/// Low-power wait that returns on the next interrupt.
pub trait Idle {
    fn wait_for_interrupt(&mut self);
}

/// Owner of the main loop.
///
/// Every wake-up, whatever its source, feeds the watchdog and polls the
/// trimpot. The watchdog interrupt guarantees a wake-up at least once per
/// watchdog period even on a silent bus.
pub struct Supervisor<I, W> {
    idle: I,
    watchdog: W,
    wakes: u32,
}

impl<I: Idle, W: Watchdog> Supervisor<I, W> {
    pub fn new(idle: I, watchdog: W) -> Self {
        Self {
            idle,
            watchdog,
            wakes: 0,
        }
    }

    /// Work done after each wake-up
    pub fn service<A, ADC, PIN>(
        &mut self,
        calibration: &mut Calibration<A, ADC, PIN>,
        pulse: &PulseTicks,
    ) where
        ADC: OneShot<A, u16, PIN>,
        PIN: Channel<A>,
    {
        self.watchdog.feed();
        self.wakes = self.wakes.wrapping_add(1);
        calibration.poll(pulse);
        log::trace!("wake {}, pulse {} ticks", self.wakes, pulse.ticks());
    }

    /// Sleep until an interrupt, then service.
    pub fn run_once<A, ADC, PIN>(
        &mut self,
        calibration: &mut Calibration<A, ADC, PIN>,
        pulse: &PulseTicks,
    ) where
        ADC: OneShot<A, u16, PIN>,
        PIN: Channel<A>,
    {
        self.idle.wait_for_interrupt();
        self.service(calibration, pulse);
    }

    pub fn run<A, ADC, PIN>(
        &mut self,
        calibration: &mut Calibration<A, ADC, PIN>,
        pulse: &PulseTicks,
    ) -> !
    where
        ADC: OneShot<A, u16, PIN>,
        PIN: Channel<A>,
    {
        loop {
            self.run_once(calibration, pulse);
        }
    }

    /// Wake-ups serviced since power-on
    pub fn wakes(&self) -> u32 {
        self.wakes
    }

    pub fn watchdog(&self) -> &W {
        &self.watchdog
    }

    pub fn watchdog_mut(&mut self) -> &mut W {
        &mut self.watchdog
    }
}
