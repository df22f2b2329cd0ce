//! Filter telemetry.
//!
//! # Design
//! The sample handler only bumps counters and records the latest raw codes, which keeps the
//! per-tick overhead to a handful of stores. Formatting into JSON happens on demand, outside of
//! the handler.
use heapless::String;
use serde::Serialize;

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct Telemetry {
    /// Ticks serviced by the sample handler.
    pub ticks: u32,
    /// Ticks lost because the handler did not finish before the next one was raised.
    pub overruns: u32,
    /// Filter outputs that fell outside of the DAC range.
    pub clipped: u32,
    /// Acquisitions or output writes that failed.
    pub errors: u32,
    /// The latest raw ADC code.
    pub latest_input: u16,
    /// The latest DAC code.
    pub latest_output: u16,
}

impl Telemetry {
    /// Render the telemetry as JSON.
    pub fn to_json(&self) -> Result<String<160>, serde_json_core::ser::Error> {
        serde_json_core::to_string(self)
    }
}
