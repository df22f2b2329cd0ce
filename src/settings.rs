//! Notch filter settings.
//!
//! # Design
//! The filter taps are compile-time constants and not part of the settings. The settings only
//! select how the firmware treats conditions outside of the steady-state control contract:
//! filter outputs beyond the DAC range and missed sample deadlines.
//!
//! Settings are fixed when the [Engine](crate::engine::Engine) is constructed. They can be
//! given as JSON, e.g. `{"output":"Wrap","log_overruns":false}`; missing fields take their
//! default values.
use serde::{Deserialize, Serialize};

pub use crate::hardware::dac::OutputMode;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Mapping of out-of-range filter outputs onto DAC codes.
    ///
    /// # Value
    /// `"Saturate"` (default) or `"Wrap"`
    pub output: OutputMode,

    /// Log a warning whenever a sample deadline is missed.
    ///
    /// # Value
    /// `true` (default) or `false`
    pub log_overruns: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output: OutputMode::Saturate,
            log_overruns: true,
        }
    }
}

impl Settings {
    /// Parse settings from JSON.
    pub fn from_json(json: &[u8]) -> Result<Self, serde_json_core::de::Error> {
        let (settings, _) = serde_json_core::from_slice(json)?;
        Ok(settings)
    }
}
