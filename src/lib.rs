#![cfg_attr(not(test), no_std)]

pub mod engine;
pub mod hardware;
pub mod settings;
pub mod telemetry;

pub use engine::Engine;
pub use settings::Settings;
pub use telemetry::Telemetry;
