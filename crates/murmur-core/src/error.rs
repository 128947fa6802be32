use thiserror::Error;

/// Top-level error type for the overlay engine.
///
/// Each variant wraps a subsystem-specific failure. Sub-crates use this type
/// directly so the `?` operator works seamlessly across crate boundaries.
/// There are no fatal error states in the overlay core: callers log and
/// continue, never tear down the event loop over a single bad value.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OverlayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Preference store error: {0}")]
    Store(String),

    #[error("Reveal error: {0}")]
    Reveal(String),

    #[error("Activity error: {0}")]
    Activity(String),

    #[error("Position error: {0}")]
    Position(String),

    #[error("Editor error: {0}")]
    Editor(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for OverlayError {
    fn from(err: toml::de::Error) -> Self {
        OverlayError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for OverlayError {
    fn from(err: toml::ser::Error) -> Self {
        OverlayError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for OverlayError {
    fn from(err: serde_json::Error) -> Self {
        OverlayError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for overlay operations.
pub type Result<T> = std::result::Result<T, OverlayError>;
