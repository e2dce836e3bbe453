//! Trimpot calibration of the driver-enable pulse length

use core::marker::PhantomData;
use core::sync::atomic::{AtomicU8, Ordering};

use embedded_hal::adc::{Channel, OneShot};

use crate::config::{BYTE_WINDOW_BITS, TICKS_PER_SECOND};

/// Timer ticks covering 12 bit times, indexed by calibration index.
///
/// | bit rate | 12 bits   | scaled   | ticks |
/// |----------|-----------|----------|-------|
/// | 115200   | 105 us    | 106 us   | 1     |
/// | 57600    | 209 us    | 213 us   | 2     |
/// | 38400    | 313 us    | 320 us   | 3     |
/// | 19200    | 625 us    | 640 us   | 6     |
/// | 9600     | 1250 us   | 1280 us  | 12    |
/// | 4800     | 2500 us   | 2560 us  | 24    |
/// | 2400     | 5000 us   | 5013 us  | 47    |
/// | 1200     | 10000 us  | 10026 us | 94    |
pub const TICK_TABLE: [u8; 8] = [1, 2, 3, 6, 12, 24, 47, 94];

/// Bit rate each [`TICK_TABLE`] entry was derived from
pub const BIT_RATES: [u32; 8] = [115_200, 57_600, 38_400, 19_200, 9600, 4800, 2400, 1200];

/// Pulse length used until the first conversion completes (19200 bps)
pub const DEFAULT_TICKS: u8 = 6;

/// Whole ticks needed to cover [`BYTE_WINDOW_BITS`] bit times at `bit_rate`.
pub const fn byte_window_ticks(bit_rate: u32) -> u32 {
    (BYTE_WINDOW_BITS * TICKS_PER_SECOND + bit_rate - 1) / bit_rate
}

/// Counter value that makes the timer overflow after exactly `ticks` ticks.
///
/// The prescaler is reset together with the counter load, so a full tick
/// elapses before the first increment: 255 overflows after one tick, 254
/// after two and so on.
pub const fn preload_for(ticks: u8) -> u8 {
    0u8.wrapping_sub(ticks)
}

/// 3-bit selector into [`TICK_TABLE`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CalibrationIndex(u8);

impl CalibrationIndex {
    pub const MAX: u8 = 7;

    /// Keep the top 3 bits of a 10-bit conversion result.
    pub const fn from_sample(sample: u16) -> Self {
        Self(((sample >> 7) & 7) as u8)
    }

    pub const fn new(index: u8) -> Option<Self> {
        if index <= Self::MAX {
            Some(Self(index))
        } else {
            None
        }
    }

    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn ticks(self) -> u8 {
        TICK_TABLE[self.0 as usize]
    }

    #[inline]
    pub const fn bit_rate(self) -> u32 {
        BIT_RATES[self.0 as usize]
    }
}

/// Current pulse length, stored as the timer preload.
///
/// Written by the main loop, read by the edge interrupt. A single byte, so a
/// reader sees either the old or the new setting, never a mix.
pub struct PulseTicks(AtomicU8);

impl PulseTicks {
    pub const fn new() -> Self {
        Self(AtomicU8::new(preload_for(DEFAULT_TICKS)))
    }

    /// Value to load into the counter
    #[inline]
    pub fn preload(&self) -> u8 {
        self.0.load(Ordering::Relaxed)
    }

    /// Ticks until the first overflow after a trigger
    #[inline]
    pub fn ticks(&self) -> u16 {
        256 - self.preload() as u16
    }

    #[inline]
    pub fn set_ticks(&self, ticks: u8) {
        self.0.store(preload_for(ticks), Ordering::Relaxed);
    }
}

impl Default for PulseTicks {
    fn default() -> Self {
        Self::new()
    }
}

/// Polls the trimpot conversion and publishes the matching pulse length.
///
/// `A` is the ADC marker type the pin is a [`Channel`] of.
pub struct Calibration<A, ADC, PIN> {
    adc: ADC,
    pin: PIN,
    current: Option<CalibrationIndex>,
    _adc: PhantomData<A>,
}

impl<A, ADC, PIN> Calibration<A, ADC, PIN>
where
    ADC: OneShot<A, u16, PIN>,
    PIN: Channel<A>,
{
    pub fn new(adc: ADC, pin: PIN) -> Self {
        Self {
            adc,
            pin,
            current: None,
            _adc: PhantomData,
        }
    }

    /// Consume a finished conversion, if any, and update `pulse`.
    ///
    /// The ADC implementation restarts the conversion once a result has been
    /// read. Returns the index resolved from this poll.
    pub fn poll(&mut self, pulse: &PulseTicks) -> Option<CalibrationIndex> {
        let sample = match self.adc.read(&mut self.pin) {
            Ok(sample) => sample,
            Err(nb::Error::WouldBlock) => return None,
            Err(nb::Error::Other(_)) => {
                log::warn!("trimpot conversion failed, keeping {} ticks", pulse.ticks());
                return None;
            }
        };

        let index = CalibrationIndex::from_sample(sample);
        pulse.set_ticks(index.ticks());

        if self.current != Some(index) {
            log::debug!(
                "calibration index {} ({} bps, {} ticks)",
                index.value(),
                index.bit_rate(),
                index.ticks()
            );
            self.current = Some(index);
        }
        Some(index)
    }

    /// Index of the last completed conversion
    pub fn current(&self) -> Option<CalibrationIndex> {
        self.current
    }

    pub fn adc_mut(&mut self) -> &mut ADC {
        &mut self.adc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    struct FakeAdc;
    struct FakePin;

    impl Channel<FakeAdc> for FakePin {
        type ID = u8;
        fn channel() -> u8 {
            2
        }
    }

    /// Hands out queued results, `None` meaning "still converting".
    struct Script {
        results: std::vec::Vec<Option<u16>>,
    }

    impl OneShot<FakeAdc, u16, FakePin> for Script {
        type Error = Infallible;

        fn read(&mut self, _pin: &mut FakePin) -> nb::Result<u16, Infallible> {
            match self.results.remove(0) {
                Some(sample) => Ok(sample),
                None => Err(nb::Error::WouldBlock),
            }
        }
    }

    #[derive(Debug)]
    struct Overrun;

    /// Fails every read after the first one.
    struct FailsAfterFirst {
        first: Option<u16>,
    }

    impl OneShot<FakeAdc, u16, FakePin> for FailsAfterFirst {
        type Error = Overrun;

        fn read(&mut self, _pin: &mut FakePin) -> nb::Result<u16, Overrun> {
            self.first.take().ok_or(nb::Error::Other(Overrun))
        }
    }

    #[test]
    fn adc_error_keeps_previous_pulse() {
        let pulse = PulseTicks::new();
        let adc = FailsAfterFirst {
            first: Some(5 << 7),
        };
        let mut calibration: Calibration<FakeAdc, _, _> = Calibration::new(adc, FakePin);

        assert_eq!(calibration.poll(&pulse), CalibrationIndex::new(5));
        assert_eq!(pulse.ticks(), 24);

        for _ in 0..3 {
            assert_eq!(calibration.poll(&pulse), None);
            assert_eq!(pulse.ticks(), 24);
            assert_eq!(calibration.current(), CalibrationIndex::new(5));
        }
    }

    #[test]
    fn table_follows_bit_rates() {
        for (ticks, rate) in TICK_TABLE.iter().zip(BIT_RATES.iter()) {
            assert_eq!(byte_window_ticks(*rate), *ticks as u32, "{} bps", rate);
        }
        assert!(TICK_TABLE.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn every_index_preloads_exact_countdown() {
        for i in 0..=CalibrationIndex::MAX {
            let index = CalibrationIndex::new(i).unwrap();
            let pulse = PulseTicks::new();
            pulse.set_ticks(index.ticks());
            assert_eq!(pulse.preload() as u16, 256 - TICK_TABLE[i as usize] as u16);
            assert_eq!(pulse.ticks(), TICK_TABLE[i as usize] as u16);
        }
    }

    #[test]
    fn sample_keeps_top_three_bits() {
        assert_eq!(CalibrationIndex::from_sample(0).value(), 0);
        assert_eq!(CalibrationIndex::from_sample(127).value(), 0);
        assert_eq!(CalibrationIndex::from_sample(128).value(), 1);
        assert_eq!(CalibrationIndex::from_sample(512).value(), 4);
        assert_eq!(CalibrationIndex::from_sample(1023).value(), 7);
        // stray high bits of a 16-bit register are ignored
        assert_eq!(CalibrationIndex::from_sample(0xfc00 | 300).value(), 2);
        assert_eq!(CalibrationIndex::new(8), None);
    }

    #[test]
    fn default_pulse_is_six_ticks() {
        let pulse = PulseTicks::default();
        assert_eq!(pulse.preload(), 250);
        assert_eq!(pulse.ticks(), 6);
    }

    #[test]
    fn poll_only_updates_on_finished_conversion() {
        let pulse = PulseTicks::new();
        let adc = Script {
            results: std::vec![None, Some(7 << 7), None, Some(1 << 7)],
        };
        let mut calibration: Calibration<FakeAdc, _, _> = Calibration::new(adc, FakePin);

        assert_eq!(calibration.poll(&pulse), None);
        assert_eq!(pulse.ticks(), 6);
        assert_eq!(calibration.current(), None);

        assert_eq!(calibration.poll(&pulse), CalibrationIndex::new(7));
        assert_eq!(pulse.ticks(), 94);

        assert_eq!(calibration.poll(&pulse), None);
        assert_eq!(pulse.ticks(), 94);

        assert_eq!(calibration.poll(&pulse), CalibrationIndex::new(1));
        assert_eq!(pulse.ticks(), 2);
        assert_eq!(calibration.current(), CalibrationIndex::new(1));
    }
}
