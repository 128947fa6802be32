//! Speech-activity monitoring for the live transcription overlay.
//!
//! Turns a raw audio-level signal into discrete activity pulses and a
//! content-free "anticipated text" preview, cleared automatically after a
//! silence timeout.

pub mod monitor;
pub mod pattern;

pub use monitor::{Activation, ActivityMonitor};
