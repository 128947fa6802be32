//! Speech-activity monitor.
//!
//! Samples an externally fed scalar audio level and derives discrete
//! "speech is happening" pulses. Activation needs both an absolute floor and
//! a rate-of-change floor, so a loud but static background (fan, hum) never
//! triggers continuously. Each activation synthesizes one content-free
//! pseudo-word preview and re-arms a silence timer; when the timer fires
//! uninterrupted, the preview is cleared.
//!
//! The monitor is clock-driven like the reveal engine: the owner calls
//! `sample` at the configured cadence and `tick` to expire silence. While
//! suspended the monitor is fully inert: samples are ignored and no timer
//! is armed.

use murmur_core::config::ActivityConfig;
use murmur_core::types::{SpeechActivity, Timestamp};

use crate::pattern;

/// Outcome of one qualifying activity sample.
#[derive(Clone, Debug, PartialEq)]
pub struct Activation {
    /// The freshly synthesized preview. Replaces, never appends to, any
    /// previous preview.
    pub pattern: String,
    pub at: Timestamp,
}

/// Derives speech-activity pulses from a periodically sampled audio level.
pub struct ActivityMonitor {
    config: ActivityConfig,
    prev_level: f64,
    last_sample_at: Option<Timestamp>,
    activity: SpeechActivity,
    silence_deadline: Option<Timestamp>,
    suspended: bool,
}

impl ActivityMonitor {
    /// Create a monitor in the suspended (inert) state. The owner resumes it
    /// once the overlay is visible, in teleprompter mode, and recording.
    pub fn new(config: ActivityConfig) -> Self {
        Self {
            config,
            prev_level: 0.0,
            last_sample_at: None,
            activity: SpeechActivity::default(),
            silence_deadline: None,
            suspended: true,
        }
    }

    /// Feed one audio-level sample.
    ///
    /// Samples arriving faster than the configured cadence are ignored (the
    /// delta threshold calibrates level movement against fixed-interval
    /// comparisons, so oversampling would read real speech as drift).
    ///
    /// Returns an `Activation` when the sample qualifies as speech: level
    /// above the absolute threshold AND moving faster than the delta
    /// threshold. Every activation re-arms the silence timer.
    pub fn sample(&mut self, level: f64, now: Timestamp) -> Option<Activation> {
        if self.suspended {
            return None;
        }
        if let Some(last) = self.last_sample_at {
            if now.elapsed_ms_since(last) < self.config.sample_interval_ms as i64 {
                return None;
            }
        }
        self.last_sample_at = Some(now);

        let delta = (level - self.prev_level).abs();
        self.prev_level = level;

        if level <= self.config.level_threshold || delta <= self.config.delta_threshold {
            return None;
        }

        let pattern = pattern::synthesize(level, self.config.notional_utterance_ms);
        self.activity = SpeechActivity {
            is_active: true,
            last_activity_time: Some(now),
            current_pattern: pattern.clone(),
        };
        self.silence_deadline = Some(now.plus_ms(self.config.silence_timeout_ms));
        tracing::debug!(level, delta, "Speech activity detected");

        Some(Activation { pattern, at: now })
    }

    /// Fire the silence timeout if it has elapsed.
    ///
    /// Returns `true` exactly when activity just went inactive, which is the
    /// owner's cue to clear the anticipated preview.
    pub fn tick(&mut self, now: Timestamp) -> bool {
        match self.silence_deadline {
            Some(deadline) if deadline.0 <= now.0 => {
                self.silence_deadline = None;
                self.activity.is_active = false;
                self.activity.current_pattern.clear();
                tracing::debug!("Silence timeout, activity cleared");
                true
            }
            _ => false,
        }
    }

    /// Stop sampling entirely: drop any pending silence timer and current
    /// activity. Safe to call repeatedly.
    pub fn suspend(&mut self) {
        if !self.suspended {
            tracing::debug!("Activity monitor suspended");
        }
        self.suspended = true;
        self.prev_level = 0.0;
        self.last_sample_at = None;
        self.silence_deadline = None;
        self.activity = SpeechActivity::default();
    }

    /// Resume sampling. The previous-level baseline restarts at zero so the
    /// first loud sample after resume registers as a transition.
    pub fn resume(&mut self) {
        if self.suspended {
            tracing::debug!("Activity monitor resumed");
        }
        self.suspended = false;
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn activity(&self) -> &SpeechActivity {
        &self.activity
    }
}

// =============================================================================
// Tests
// =============================================================================
