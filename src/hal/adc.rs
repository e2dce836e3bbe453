use avr_device::attiny13a::ADC;
use core::convert::Infallible;
use embedded_hal::adc::{Channel, OneShot};

use crate::config::{TRIMPOT_ADC_CHANNEL, TRIMPOT_BIT};

// ADCSRA
const ADEN: u8 = 1 << 7;
const ADSC: u8 = 1 << 6;
const ADIF: u8 = 1 << 4;

#[derive(Clone, Copy)]
#[repr(u8)]
pub enum AdcPrescaler {
    Div2 = 1,
    Div4 = 2,
    Div8 = 3,
    Div16 = 4,
    Div32 = 5,
    Div64 = 6,
    Div128 = 7,
}

/// Single-conversion ADC with a polled completion flag.
///
/// The conversion-complete interrupt stays disabled: servicing it would
/// clear ADIF before the main loop gets to look at it.
pub struct Adc {
    adc: ADC,
    prescaler: AdcPrescaler,
}

/// Timing trimpot on PB4 / ADC2
pub struct TrimPot;

impl Channel<Adc> for TrimPot {
    type ID = u8;

    fn channel() -> u8 {
        TRIMPOT_ADC_CHANNEL
    }
}

impl Adc {
    /// Vcc reference, right-adjusted result, first conversion started.
    pub fn new(adc: ADC, prescaler: AdcPrescaler) -> Self {
        unsafe {
            // digital input buffer off on the analog pin
            adc.didr0.write(|w| w.bits(1 << TRIMPOT_BIT));
            adc.admux.write(|w| w.bits(<TrimPot as Channel<Adc>>::channel()));
        }
        let mut adc = Self { adc, prescaler };
        adc.start();
        adc
    }

    #[inline]
    fn start(&mut self) {
        unsafe {
            // the stale ADIF is cleared by writing it as one
            self.adc
                .adcsra
                .write(|w| w.bits(ADEN | ADSC | ADIF | self.prescaler as u8));
        }
    }
}

impl OneShot<Adc, u16, TrimPot> for Adc {
    type Error = Infallible;

    fn read(&mut self, _pin: &mut TrimPot) -> nb::Result<u16, Infallible> {
        if self.adc.adcsra.read().bits() & ADIF == 0 {
            return Err(nb::Error::WouldBlock);
        }
        let sample = self.adc.adc.read().bits();
        self.start();
        Ok(sample)
    }
}
