//! Reveal strategies.
//!
//! Each incoming chunk picks one strategy for its whole lifecycle. A strategy
//! is pure: it maps a step index to a progress value and a progress value to
//! a display string. The engine owns all timing and state, so strategies stay
//! trivially testable.

use murmur_core::config::RevealConfig;
use murmur_core::types::RevealAlgorithm;

/// Timing plan for one chunk's reveal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RevealSchedule {
    /// Number of discrete animation steps.
    pub total_steps: u32,
    /// Milliseconds between steps.
    pub step_interval_ms: u64,
    /// Hold at full reveal before the terminal transition.
    pub completion_pause_ms: u64,
}

/// A reveal algorithm: scheduling, easing, and rendering for one chunk.
pub trait RevealStrategy: Send + Sync {
    /// Build the timing plan for `text`.
    fn schedule(&self, text: &str, config: &RevealConfig) -> RevealSchedule;

    /// Progress in `[0, 1]` after `step` of `total_steps`.
    fn progress_at(&self, step: u32, total_steps: u32) -> f64;

    /// Display string for `original` at `progress`. `mask` is the frozen
    /// mask built at chunk creation (empty for strategies that don't mask).
    fn render(&self, original: &str, mask: &str, progress: f64) -> String;
}

/// Select the strategy implementation for an algorithm.
pub fn strategy_for(algorithm: RevealAlgorithm) -> &'static dyn RevealStrategy {
    match algorithm {
        RevealAlgorithm::ScrambleDecrypt => &ScrambleDecrypt,
        RevealAlgorithm::Typewriter => &Typewriter,
    }
}

/// Number of characters considered revealed at `progress`.
fn revealed_chars(original: &str, progress: f64) -> usize {
    let len = original.chars().count();
    ((len as f64) * progress.clamp(0.0, 1.0)).floor() as usize
}

/// Progressive scramble-decrypt.
///
/// A fixed number of steps over a fixed duration, eased so early steps reveal
/// slowly and later steps accelerate. Characters left of the progress front
/// are real; the rest show their frozen mask symbol.
pub struct ScrambleDecrypt;

impl RevealStrategy for ScrambleDecrypt {
    fn schedule(&self, _text: &str, config: &RevealConfig) -> RevealSchedule {
        let total_steps = config.scramble_steps.max(1);
        RevealSchedule {
            total_steps,
            step_interval_ms: (config.scramble_duration_ms / total_steps as u64).max(1),
            completion_pause_ms: config.completion_pause_ms,
        }
    }

    fn progress_at(&self, step: u32, total_steps: u32) -> f64 {
        let linear = step as f64 / total_steps.max(1) as f64;
        linear.powf(0.7)
    }

    fn render(&self, original: &str, mask: &str, progress: f64) -> String {
        let revealed = revealed_chars(original, progress);
        original
            .chars()
            .take(revealed)
            .chain(mask.chars().skip(revealed))
            .collect()
    }
}

/// Character-by-character typewriter.
///
/// No masking; the display is a plain prefix of the original. Duration is
/// proportional to length (capped), advancing uniformly rather than eased.
pub struct Typewriter;

impl RevealStrategy for Typewriter {
    fn schedule(&self, text: &str, config: &RevealConfig) -> RevealSchedule {
        let chars = text.chars().count().max(1) as u64;
        let duration_ms = (chars * config.typewriter_ms_per_char).min(config.typewriter_max_ms);
        let total_steps = chars as u32;
        RevealSchedule {
            total_steps,
            step_interval_ms: (duration_ms / chars).max(1),
            completion_pause_ms: config.completion_pause_ms,
        }
    }

    fn progress_at(&self, step: u32, total_steps: u32) -> f64 {
        step as f64 / total_steps.max(1) as f64
    }

    fn render(&self, original: &str, _mask: &str, progress: f64) -> String {
        original.chars().take(revealed_chars(original, progress)).collect()
    }
}
