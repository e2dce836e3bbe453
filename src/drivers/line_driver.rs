//! Transceiver driver-enable and status LED outputs

use embedded_hal::digital::v2::{OutputPin, StatefulOutputPin};

/// Output side of the controller.
///
/// The driver-enable pin is active high, the LED is active low. Only the
/// timing engine changes these; the driver is never on while the LED is off.
pub struct LineOutputs<DE, LED> {
    driver: DE,
    led: LED,
}

impl<DE: OutputPin, LED: OutputPin> LineOutputs<DE, LED> {
    pub fn new(driver: DE, led: LED) -> Self {
        Self { driver, led }
    }

    /// Power-on levels: receive mode, LED dark
    pub fn idle(&mut self) {
        self.driver.set_low().ok();
        self.led.set_high().ok();
    }

    /// Start of a transmission: driver on, LED on
    #[inline]
    pub fn assert_all(&mut self) {
        self.driver.set_high().ok();
        self.led.set_low().ok();
    }

    #[inline]
    pub fn release_driver(&mut self) {
        self.driver.set_low().ok();
    }

    /// Turns the LED off. The driver must already be released.
    #[inline]
    pub fn release_led(&mut self) {
        self.led.set_high().ok();
    }

    pub fn release(self) -> (DE, LED) {
        (self.driver, self.led)
    }
}

impl<DE: StatefulOutputPin, LED: StatefulOutputPin> LineOutputs<DE, LED> {
    pub fn driver_enabled(&self) -> bool {
        self.driver.is_set_high().unwrap_or(false)
    }

    pub fn led_lit(&self) -> bool {
        self.led.is_set_low().unwrap_or(false)
    }
}
