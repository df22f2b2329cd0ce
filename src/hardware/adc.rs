//! Analog input management.
//!
//! The input converter is a 14-bit successive approximation ADC with a single, fixed input
//! channel. Each conversion is started by software and polled for completion, so acquisition
//! blocks the sample handler. The poll loop is bounded: a conversion that has not finished
//! after [ADC_MAX_POLLS](super::design_parameters::ADC_MAX_POLLS) polls is reported as
//! [Error::Timeout] instead of stalling the handler forever.
use super::design_parameters::{ADC_BITS, ADC_MAX_POLLS, DAC_BITS};

/// A raw, right-aligned ADC conversion result.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AdcCode(pub u16);

impl AdcCode {
    /// The largest code the converter produces.
    pub const MAX: u16 = (1 << ADC_BITS) - 1;

    /// Map the code onto the output converter's range.
    ///
    /// This is `floor(code * 2^DAC_BITS / 2^ADC_BITS)`, i.e. a right shift by the difference
    /// in resolution.
    pub fn rescale(self) -> u16 {
        self.0 >> (ADC_BITS - DAC_BITS)
    }
}

impl From<u16> for AdcCode {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<AdcCode> for f32 {
    /// The rescaled code as a filter input.
    fn from(code: AdcCode) -> f32 {
        code.rescale() as f32
    }
}

/// Represents the errors that can occur during acquisition.
#[derive(Copy, Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// The conversion did not complete within the poll budget.
    #[error("ADC conversion timed out")]
    Timeout,
}

/// A source of one analog sample per call.
pub trait AnalogIn {
    type Error;

    /// Acquire one sample. May block for up to the converter's worst-case conversion time.
    fn read(&mut self) -> Result<AdcCode, Self::Error>;
}

/// Register-level access to a software-triggered converter.
pub trait Converter {
    /// Enable the converter and set its start-of-conversion bit.
    fn start_conversion(&mut self);

    /// Whether a conversion is in progress.
    fn is_busy(&mut self) -> bool;

    /// The latest conversion result.
    fn result(&mut self) -> u16;
}

/// An [AnalogIn] that busy-waits on a [Converter].
pub struct BlockingAdc<C> {
    converter: C,
    max_polls: u32,
}

impl<C: Converter> BlockingAdc<C> {
    /// Construct the ADC with the default poll budget.
    pub fn new(converter: C) -> Self {
        Self::with_poll_budget(converter, ADC_MAX_POLLS)
    }

    /// Construct the ADC.
    ///
    /// # Args
    /// * `converter` - The converter registers.
    /// * `max_polls` - The number of busy-flag reads after which a conversion is abandoned.
    pub fn with_poll_budget(converter: C, max_polls: u32) -> Self {
        Self {
            converter,
            max_polls,
        }
    }

    /// Release the converter.
    pub fn free(self) -> C {
        self.converter
    }
}

impl<C: Converter> AnalogIn for BlockingAdc<C> {
    type Error = Error;

    fn read(&mut self) -> Result<AdcCode, Error> {
        self.converter.start_conversion();
        for _ in 0..self.max_polls {
            if !self.converter.is_busy() {
                return Ok(AdcCode(self.converter.result()));
            }
        }
        Err(Error::Timeout)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// A converter that stays busy for a fixed number of polls.
    struct SlowConverter {
        latency: u32,
        remaining: u32,
        value: u16,
        conversions: u32,
    }

    impl SlowConverter {
        fn new(latency: u32, value: u16) -> Self {
            Self {
                latency,
                remaining: 0,
                value,
                conversions: 0,
            }
        }
    }

    impl Converter for SlowConverter {
        fn start_conversion(&mut self) {
            self.remaining = self.latency;
            self.conversions += 1;
        }

        fn is_busy(&mut self) -> bool {
            if self.remaining > 0 {
                self.remaining -= 1;
                true
            } else {
                false
            }
        }

        fn result(&mut self) -> u16 {
            self.value
        }
    }

    #[test]
    fn rescale_is_shift() {
        for r in 0..=AdcCode::MAX {
            assert_eq!(AdcCode(r).rescale(), r >> 2);
            assert_eq!(AdcCode(r).rescale() as u32, r as u32 * 4096 / 16384);
        }
        assert_eq!(AdcCode(AdcCode::MAX).rescale(), 4095);
        assert_eq!(AdcCode(16384).rescale(), 4096);
        assert_eq!(f32::from(AdcCode(8191)), 2047.);
    }

    #[test]
    fn blocking_read() {
        let mut adc = BlockingAdc::with_poll_budget(SlowConverter::new(10, 1234), 20);
        assert_eq!(adc.read(), Ok(AdcCode(1234)));
        assert_eq!(adc.read(), Ok(AdcCode(1234)));
        assert_eq!(adc.free().conversions, 2);
    }

    #[test]
    fn timeout() {
        let mut adc = BlockingAdc::with_poll_budget(SlowConverter::new(20, 1), 20);
        assert_eq!(adc.read(), Err(Error::Timeout));
        let mut adc = BlockingAdc::new(SlowConverter::new(ADC_MAX_POLLS, 1));
        assert_eq!(adc.read(), Err(Error::Timeout));
    }

    #[test]
    fn poll_budget() {
        use crate::hardware::design_parameters::{
            ADC_CLOCK, ADC_CONVERSION_CYCLES, ADC_POLL_CYCLES, MCLK,
            SAMPLE_PERIOD,
        };

        // A full conversion at one MCLK cycle per poll completes.
        let conversion = ADC_CONVERSION_CYCLES * (MCLK.raw() / ADC_CLOCK.raw());
        let mut adc = BlockingAdc::new(SlowConverter::new(conversion, 7));
        assert_eq!(adc.read(), Ok(AdcCode(7)));

        // A lost conversion gives up before the next tick.
        let worst_us = ADC_MAX_POLLS * ADC_POLL_CYCLES / (MCLK.raw() / 1_000_000);
        assert!(worst_us < SAMPLE_PERIOD.ticks(), "{worst_us}");
    }
}
