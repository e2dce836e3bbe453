use avr_device::attiny13a::PORTB;
use core::convert::Infallible;
use core::marker::PhantomData;
use embedded_hal::digital::v2::{OutputPin, StatefulOutputPin};

use crate::config::{PORTB_DIRECTION, PORTB_INITIAL};

pub trait PinMode {}
pub struct Input;
pub struct Output;
impl PinMode for Input {}
impl PinMode for Output {}

/// One bit of port B
#[derive(Debug)]
pub struct Pin<const P: u8, MODE> {
    _mode: PhantomData<MODE>,
}

impl<const P: u8, MODE: PinMode> Pin<P, MODE> {
    const fn new() -> Self {
        Pin { _mode: PhantomData }
    }

    #[inline]
    fn port() -> &'static avr_device::attiny13a::portb::RegisterBlock {
        unsafe { &*PORTB::ptr() }
    }
}

impl<const P: u8> OutputPin for Pin<P, Output> {
    type Error = Infallible;

    #[inline]
    fn set_high(&mut self) -> Result<(), Infallible> {
        Self::port().portb.modify(|r, w| unsafe { w.bits(r.bits() | (1 << P)) });
        Ok(())
    }

    #[inline]
    fn set_low(&mut self) -> Result<(), Infallible> {
        Self::port().portb.modify(|r, w| unsafe { w.bits(r.bits() & !(1 << P)) });
        Ok(())
    }
}

impl<const P: u8> StatefulOutputPin for Pin<P, Output> {
    #[inline]
    fn is_set_high(&self) -> Result<bool, Infallible> {
        Ok(Self::port().portb.read().bits() & (1 << P) != 0)
    }

    #[inline]
    fn is_set_low(&self) -> Result<bool, Infallible> {
        self.is_set_high().map(|high| !high)
    }
}

/// Board wiring
pub mod board {
    use super::*;
    use crate::config::{DRIVER_ENABLE_BIT, LED_BIT, TX_SENSE_BIT};

    /// Transceiver DE, active high
    pub type DriverEnable = Pin<DRIVER_ENABLE_BIT, Output>;
    /// Activity LED, active low
    pub type StatusLed = Pin<LED_BIT, Output>;
    /// UART TX as seen by INT0
    pub type TxSense = Pin<TX_SENSE_BIT, Input>;

    pub struct Pins {
        pub driver_enable: DriverEnable,
        pub led: StatusLed,
        pub tx_sense: TxSense,
    }

    /// Apply the power-on port layout and hand out the used pins.
    ///
    /// Levels are written before directions so the LED never flashes on.
    pub fn configure(portb: PORTB) -> Pins {
        portb.portb.write(|w| unsafe { w.bits(PORTB_INITIAL) });
        portb.ddrb.write(|w| unsafe { w.bits(PORTB_DIRECTION) });
        Pins {
            driver_enable: Pin::new(),
            led: Pin::new(),
            tx_sense: Pin::new(),
        }
    }
}
