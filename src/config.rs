//! Configuration constants for the RS-485 driver-enable firmware
//!
//! Everything here is fixed at build time. The only runtime "setting" is the
//! trimpot position sampled by [`crate::drivers::calibration`].

/// CPU frequency in Hz (internal RC oscillator at full speed)
pub const CPU_FREQ_HZ: u32 = 9_600_000;

/// Timer/Counter0 clock prescaler
pub const TIMER_PRESCALE: u32 = 1024;

/// Timer ticks per second (9375, one tick is ~106.67 us)
pub const TICKS_PER_SECOND: u32 = CPU_FREQ_HZ / TIMER_PRESCALE;

/// Ticks between two overflows of the free-running 8-bit counter.
/// This is the LED hold time after the driver has been released (~27 ms).
pub const TIMER_RANGE_TICKS: u16 = 256;

/// Bit periods the driver stays enabled after a start bit: start, 8 data,
/// stop, plus two bits of margin for the scaled-down tick resolution.
pub const BYTE_WINDOW_BITS: u32 = 12;

/// Watchdog period in milliseconds
pub const WDT_TIMEOUT_MS: u16 = 4000;

/// Watchdog period expressed in timer ticks
pub const WDT_TIMEOUT_TICKS: u32 = WDT_TIMEOUT_MS as u32 * TICKS_PER_SECOND / 1000;

/// PORTB bit driving the transceiver's DE input (active high)
pub const DRIVER_ENABLE_BIT: u8 = 0;

/// PORTB bit carrying the UART TX line (INT0)
pub const TX_SENSE_BIT: u8 = 1;

/// PORTB bit of the status LED (active low)
pub const LED_BIT: u8 = 3;

/// PORTB bit of the timing trimpot
pub const TRIMPOT_BIT: u8 = 4;

/// ADC multiplexer channel of the trimpot (ADC2 on PB4)
pub const TRIMPOT_ADC_CHANNEL: u8 = 2;

/// DDRB at power-on: DE and LED are outputs, everything else inputs
pub const PORTB_DIRECTION: u8 = (1 << DRIVER_ENABLE_BIT) | (1 << LED_BIT);

/// PORTB at power-on: driver off, LED off, pull-ups on TX sense and unused pins
pub const PORTB_INITIAL: u8 = (1 << TX_SENSE_BIT) | (1 << 2) | (1 << LED_BIT) | (1 << 5);
