//! Module for the converter and timer collaborators of the notch filter.
pub mod adc;
pub mod dac;
pub mod design_parameters;
pub mod timers;

pub use adc::{AdcCode, AnalogIn, BlockingAdc, Converter};
pub use dac::{AnalogOut, DacCode, OutputMode, ParallelDac, Port};
pub use timers::{ClockConfig, Divider, SampleClock, TickSource};
