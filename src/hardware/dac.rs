//! Analog output management.
//!
//! The output converter is an external 12-bit DAC (AD7247) with a parallel data bus. The data
//! word is presented on two GPIO ports, the upper nibble (DB11-DB8) and the lower byte
//! (DB7-DB0), between a /WR disable and a /WR enable strobe. The channel select is fixed
//! during setup and not managed here.
use arbitrary_int::{u12, u4, Number};
use bitbybit::bitfield;
use embedded_hal::digital::{self, OutputPin};
use serde::{Deserialize, Serialize};

/// The parallel bus layout of a DAC data word.
#[bitfield(u16, default = 0)]
#[derive(Debug, PartialEq)]
pub struct DacWord {
    #[bits(8..=11, r)]
    high: u4,
    #[bits(0..=7, r)]
    low: u8,
}

/// How filter outputs outside of the converter range are mapped onto it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputMode {
    /// Clamp to `[0, DacCode::MAX]`.
    #[default]
    Saturate,
    /// Keep the low 12 bits of the two's complement value.
    Wrap,
}

/// A 12-bit DAC output code.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DacCode(u12);

impl Default for DacCode {
    fn default() -> Self {
        Self(u12::new(0))
    }
}

impl DacCode {
    /// The largest output code.
    pub const MAX: u16 = u12::MAX.value();

    pub fn new(value: u12) -> Self {
        Self(value)
    }

    pub fn value(self) -> u16 {
        self.0.value()
    }

    /// Convert a filter output to a DAC code.
    ///
    /// The output is truncated towards zero and then mapped into range according to `mode`.
    ///
    /// # Returns
    /// The code and whether the output was out of range.
    pub fn from_output(y: f32, mode: OutputMode) -> (Self, bool) {
        // Saturating float to int cast, NaN maps to 0.
        let y = y as i32;
        let clipped = !(0..=Self::MAX as i32).contains(&y);
        let code = match mode {
            OutputMode::Saturate => y.clamp(0, Self::MAX as i32) as u16,
            OutputMode::Wrap => y as u16 & u12::MASK,
        };
        (Self(u12::new(code)), clipped)
    }

    /// The word as presented on the parallel bus.
    pub fn word(self) -> DacWord {
        DacWord::new_with_raw_value(self.value())
    }

    /// The upper four data bits, DB11-DB8.
    pub fn high_nibble(self) -> u8 {
        self.word().high().value()
    }

    /// The lower eight data bits, DB7-DB0.
    pub fn low_byte(self) -> u8 {
        self.word().low()
    }
}

impl From<DacCode> for u16 {
    fn from(code: DacCode) -> u16 {
        code.value()
    }
}

/// Represents the errors that can occur while driving the DAC bus.
#[derive(Copy, Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("DAC bus write failed: {0:?}")]
    Bus(digital::ErrorKind),
}

impl<E: digital::Error> From<E> for Error {
    fn from(value: E) -> Self {
        Self::Bus(value.kind())
    }
}

/// A sink of one analog sample per call.
pub trait AnalogOut {
    type Error;

    /// Output one sample. Must complete before the next tick.
    fn write(&mut self, code: DacCode) -> Result<(), Self::Error>;
}

/// A byte-wide GPIO output port.
///
/// Implementations for ports shared with other signals must leave the bits they do not own
/// unchanged.
pub trait Port: digital::ErrorType {
    fn write(&mut self, value: u8) -> Result<(), Self::Error>;
}

/// A parallel-bus DAC with a /WR strobe.
pub struct ParallelDac<H, L, WR> {
    high: H,
    low: L,
    wr: WR,
}

impl<H, L, WR> ParallelDac<H, L, WR>
where
    H: Port,
    L: Port,
    WR: OutputPin,
{
    /// Construct the DAC.
    ///
    /// # Args
    /// * `high` - The port carrying DB11-DB8 in its lower nibble.
    /// * `low` - The port carrying DB7-DB0.
    /// * `wr` - The active-low write strobe.
    pub fn new(high: H, low: L, wr: WR) -> Self {
        Self { high, low, wr }
    }

    /// Release the ports and strobe pin.
    pub fn free(self) -> (H, L, WR) {
        (self.high, self.low, self.wr)
    }
}

impl<H, L, WR> AnalogOut for ParallelDac<H, L, WR>
where
    H: Port,
    L: Port,
    WR: OutputPin,
{
    type Error = Error;

    fn write(&mut self, code: DacCode) -> Result<(), Error> {
        // Disable writes while the bus settles, then enable to latch.
        self.wr.set_high()?;
        self.high.write(code.high_nibble())?;
        self.low.write(code.low_byte())?;
        self.wr.set_low()?;
        Ok(())
    }
}
