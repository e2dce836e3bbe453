use avr_device::attiny13a::TC0;

use crate::drivers::OverflowTimer;

// TIMSK0 / TIFR0
const TOIE0: u8 = 1 << 1;
const TOV0: u8 = 1 << 1;
// GTCCR
const PSR10: u8 = 1 << 0;

#[derive(Clone, Copy)]
pub enum Prescaler {
    Stop = 0,
    Direct = 1,
    Div8 = 2,
    Div64 = 3,
    Div256 = 4,
    Div1024 = 5,
}

/// Timer/Counter0 in normal mode, used as a one-shot overflow countdown
pub struct Timer0 {
    tc0: TC0,
    prescaler: Prescaler,
}

impl Timer0 {
    /// The counter is left stopped until the first [`OverflowTimer::restart`].
    pub fn new(tc0: TC0, prescaler: Prescaler) -> Self {
        unsafe {
            tc0.timsk0.write(|w| w.bits(0));
            tc0.tccr0a.write(|w| w.bits(0));
            tc0.tccr0b.write(|w| w.bits(Prescaler::Stop as u8));
        }
        Self { tc0, prescaler }
    }
}

impl OverflowTimer for Timer0 {
    #[inline]
    fn restart(&mut self, preload: u8) {
        unsafe {
            self.tc0.tccr0b.write(|w| w.bits(self.prescaler as u8));
            self.tc0.tccr0a.write(|w| w.bits(0));
            self.tc0.gtccr.write(|w| w.bits(PSR10));
            self.tc0.tcnt0.write(|w| w.bits(preload));
            // writing a one clears the flag
            self.tc0.tifr0.write(|w| w.bits(TOV0));
            self.tc0.timsk0.write(|w| w.bits(TOIE0));
        }
    }

    #[inline]
    fn disable_overflow(&mut self) {
        unsafe {
            self.tc0.timsk0.write(|w| w.bits(0));
        }
    }
}
