//! Shared types, events, configuration, and errors for the murmur overlay
//! engine.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod store;
pub mod types;

pub use config::OverlayConfig;
pub use error::{OverlayError, Result};
pub use events::TranscriptEvent;
pub use store::{JsonFileStore, MemoryStore, PreferenceStore};
pub use types::*;
