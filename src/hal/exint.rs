use avr_device::attiny13a::{CPU, EXINT};

use super::gpio::board::TxSense;

// MCUCR
const ISC0_MASK: u8 = 0b11;
const ISC0_FALLING: u8 = 0b10;
// GIMSK
const INT0: u8 = 1 << 6;
// GIFR
const INTF0: u8 = 1 << 6;

/// Route falling edges on the TX sense pin to the INT0 vector.
///
/// Only the ISC0 bits of MCUCR are touched, the sleep setup shares that
/// register.
pub fn listen_falling_edge(cpu: &CPU, exint: EXINT, _pin: TxSense) {
    unsafe {
        cpu.mcucr
            .modify(|r, w| w.bits((r.bits() & !ISC0_MASK) | ISC0_FALLING));
        exint.gifr.write(|w| w.bits(INTF0));
        exint.gimsk.write(|w| w.bits(INT0));
    }
}
