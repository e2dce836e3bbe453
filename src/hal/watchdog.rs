use avr_device::attiny13a::WDT;
use embedded_hal::watchdog::{Watchdog as Feed, WatchdogEnable};

// WDTCR
const WDTIF: u8 = 1 << 7;
const WDTIE: u8 = 1 << 6;
const WDCE: u8 = 1 << 4;
const WDE: u8 = 1 << 3;

/// WDP3..0, with WDP3 sitting at bit 5
#[derive(Clone, Copy)]
#[repr(u8)]
pub enum WatchdogTimeout {
    Ms16 = 0,
    Ms32 = 1,
    Ms64 = 2,
    Ms125 = 3,
    Ms250 = 4,
    Ms500 = 5,
    Ms1000 = 6,
    Ms2000 = 7,
    Ms4000 = 0x20,
    Ms8000 = 0x21,
}

/// Watchdog in interrupt-and-reset mode.
///
/// A timeout first raises the WDT interrupt, and the hardware clears WDTIE
/// while doing so. Unless [`Feed::feed`] re-arms it, the next timeout resets
/// the chip.
pub struct Watchdog {
    wdt: WDT,
}

impl Watchdog {
    #[inline]
    pub fn new(wdt: WDT) -> Self {
        Self { wdt }
    }
}

impl WatchdogEnable for Watchdog {
    type Time = WatchdogTimeout;

    fn start<T>(&mut self, period: T)
    where
        T: Into<Self::Time>,
    {
        let period = period.into();
        unsafe {
            // timed sequence: change enable, then the new setting
            self.wdt.wdtcr.modify(|r, w| w.bits(r.bits() | WDCE | WDE));
            self.wdt
                .wdtcr
                .write(|w| w.bits(WDTIF | WDTIE | WDE | period as u8));
        }
    }
}

impl Feed for Watchdog {
    #[inline]
    fn feed(&mut self) {
        avr_device::asm::wdr();
        unsafe {
            self.wdt.wdtcr.modify(|r, w| w.bits(r.bits() | WDTIE));
        }
    }
}
