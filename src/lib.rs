//! Sway - sensor-driven synthesizer control
//!
//! Maps live sensor and controller input (a Bluetooth potentiometer and
//! battery level, device orientation and motion) onto parameters of an
//! external software synthesizer, with configurable clamping, angular
//! wrap-around, and linear rescaling.

pub mod config;
pub mod engine;
pub mod input;
pub mod math;
pub mod synth;

pub use config::InstrumentConfig;
pub use engine::Engine;
pub use input::{Adapter, InputEvent};
