use avr_device::attiny13a::CPU;

use crate::os::Idle;

// MCUCR
const SE: u8 = 1 << 5;
const SM_MASK: u8 = 0b11 << 3;

#[derive(Clone, Copy)]
#[repr(u8)]
pub enum SleepMode {
    Idle = 0,
    AdcNoiseReduction = 1,
    PowerDown = 2,
}

pub struct Power {
    cpu: CPU,
}

impl Power {
    pub fn new(cpu: CPU) -> Self {
        Self { cpu }
    }

    /// Shared with the INT0 sense setup in MCUCR
    pub fn cpu(&self) -> &CPU {
        &self.cpu
    }

    /// Forget the cause of the last reset.
    #[inline]
    pub fn clear_reset_flags(&mut self) {
        unsafe {
            self.cpu.mcusr.write(|w| w.bits(0));
        }
    }

    #[inline]
    pub fn set_sleep_mode(&mut self, mode: SleepMode) {
        unsafe {
            self.cpu
                .mcucr
                .modify(|r, w| w.bits((r.bits() & !SM_MASK) | ((mode as u8) << 3)));
        }
    }

    /// Leaves the interrupt sense bits in MCUCR alone.
    #[inline]
    pub fn enable_sleep(&mut self) {
        unsafe {
            self.cpu.mcucr.modify(|r, w| w.bits(r.bits() | SE));
        }
    }
}

impl Idle for Power {
    #[inline]
    fn wait_for_interrupt(&mut self) {
        avr_device::asm::sleep();
    }
}
