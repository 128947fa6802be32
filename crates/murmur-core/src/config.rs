use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::types::{Anchor, OverlayMode, RevealAlgorithm};

/// Top-level configuration for the overlay engine.
///
/// Loaded from a TOML file by the host. Each section covers one subsystem;
/// all fields default to the tuned values the overlay ships with, so a
/// missing or partial file is never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub overlay: WindowConfig,
    pub reveal: RevealConfig,
    pub activity: ActivityConfig,
}

impl OverlayConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: OverlayConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file is missing
    /// or unparseable.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// Overlay window placement and appearance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Default anchor used when no user-dragged position is persisted.
    pub anchor: Anchor,
    /// Window opacity, 0.0 to 1.0.
    pub opacity: f64,
    /// Fixed overlay width in logical pixels.
    pub width: f64,
    /// Fixed overlay height in logical pixels.
    pub height: f64,
    /// Padding kept between the overlay and the screen edge for anchored
    /// positions.
    pub edge_padding: f64,
    /// Mode the overlay opens in.
    pub initial_mode: OverlayMode,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            anchor: Anchor::TopRight,
            opacity: 0.92,
            width: 400.0,
            height: 160.0,
            edge_padding: 20.0,
            initial_mode: OverlayMode::Teleprompter,
        }
    }
}

/// Reveal animation tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Algorithm applied to incoming chunks.
    pub algorithm: RevealAlgorithm,
    /// Discrete animation steps for a scramble-decrypt reveal.
    pub scramble_steps: u32,
    /// Total scramble-decrypt duration in milliseconds.
    pub scramble_duration_ms: u64,
    /// Hold at full reveal before merging into the completed text, so the
    /// finished state is visually perceived.
    pub completion_pause_ms: u64,
    /// Typewriter advance rate.
    pub typewriter_ms_per_char: u64,
    /// Upper bound on a typewriter reveal's total duration.
    pub typewriter_max_ms: u64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            algorithm: RevealAlgorithm::ScrambleDecrypt,
            scramble_steps: 35,
            scramble_duration_ms: 2500,
            completion_pause_ms: 300,
            typewriter_ms_per_char: 30,
            typewriter_max_ms: 2000,
        }
    }
}

/// Speech-activity sampling tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    /// Audio-level sampling cadence in milliseconds.
    pub sample_interval_ms: u64,
    /// Absolute floor: levels at or below this never activate.
    pub level_threshold: f64,
    /// Rate-of-change floor: the level must move at least this much between
    /// samples. Keeps a loud but static background from triggering.
    pub delta_threshold: f64,
    /// Silence duration after which the anticipated preview is cleared.
    pub silence_timeout_ms: u64,
    /// Notional utterance length used to size the synthesized pattern.
    pub notional_utterance_ms: u64,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 150,
            level_threshold: 0.01,
            delta_threshold: 0.005,
            silence_timeout_ms: 1500,
            notional_utterance_ms: 800,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_tuned_values() {
        let config = OverlayConfig::default();
        assert_eq!(config.overlay.anchor, Anchor::TopRight);
        assert_eq!(config.reveal.scramble_steps, 35);
        assert_eq!(config.reveal.scramble_duration_ms, 2500);
        assert_eq!(config.reveal.completion_pause_ms, 300);
        assert_eq!(config.reveal.typewriter_ms_per_char, 30);
        assert_eq!(config.reveal.typewriter_max_ms, 2000);
        assert_eq!(config.activity.sample_interval_ms, 150);
        assert_eq!(config.activity.level_threshold, 0.01);
        assert_eq!(config.activity.delta_threshold, 0.005);
        assert_eq!(config.activity.silence_timeout_ms, 1500);
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlay.toml");

        let mut config = OverlayConfig::default();
        config.overlay.anchor = Anchor::BottomLeft;
        config.reveal.algorithm = RevealAlgorithm::Typewriter;
        config.activity.silence_timeout_ms = 2000;

        config.save(&path).unwrap();
        let loaded = OverlayConfig::load(&path).unwrap();

        assert_eq!(loaded.overlay.anchor, Anchor::BottomLeft);
        assert_eq!(loaded.reveal.algorithm, RevealAlgorithm::Typewriter);
        assert_eq!(loaded.activity.silence_timeout_ms, 2000);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: OverlayConfig = toml::from_str(
            r#"
            [overlay]
            anchor = "bottom-right"
            opacity = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.overlay.anchor, Anchor::BottomRight);
        assert_eq!(config.overlay.opacity, 0.5);
        // Unspecified sections keep their defaults.
        assert_eq!(config.reveal.scramble_steps, 35);
        assert_eq!(config.activity.sample_interval_ms, 150);
    }

    #[test]
    fn test_load_or_default_on_missing_file() {
        let config = OverlayConfig::load_or_default(Path::new("/nonexistent/overlay.toml"));
        assert_eq!(config.overlay.anchor, Anchor::TopRight);
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "overlay = [[[").unwrap();
        assert!(OverlayConfig::load(&path).is_err());
    }
}
