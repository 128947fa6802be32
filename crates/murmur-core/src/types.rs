use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Time
// =============================================================================

/// Millisecond-precision wall-clock timestamp.
///
/// The overlay works at sub-second granularity (animation steps, sampling
/// ticks), so this is millis since the Unix epoch rather than seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    /// Returns this timestamp advanced by `ms` milliseconds.
    pub fn plus_ms(&self, ms: u64) -> Self {
        Self(self.0 + ms as i64)
    }

    /// Milliseconds elapsed between `earlier` and `self` (negative if
    /// `earlier` is actually later).
    pub fn elapsed_ms_since(&self, earlier: Timestamp) -> i64 {
        self.0 - earlier.0
    }
}

// =============================================================================
// Enums
// =============================================================================

/// The reveal animation applied to an incoming chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealAlgorithm {
    /// Progressive scramble-decrypt: masked characters resolve left to right
    /// over an eased schedule.
    #[default]
    ScrambleDecrypt,
    /// Character-by-character typewriter with no masking.
    Typewriter,
}

/// Presentation mode of the overlay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayMode {
    /// Read-only, animated presentation of transcription.
    #[default]
    Teleprompter,
    /// Direct, unanimated editable buffer of accumulated transcription.
    Editor,
}

impl fmt::Display for OverlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayMode::Teleprompter => write!(f, "Teleprompter"),
            OverlayMode::Editor => write!(f, "Editor"),
        }
    }
}

/// Window visibility of the overlay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Visible,
    Minimized,
    Closed,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Visible => write!(f, "Visible"),
            Visibility::Minimized => write!(f, "Minimized"),
            Visibility::Closed => write!(f, "Closed"),
        }
    }
}

/// Named screen anchor for the computed (non-user-set) overlay position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    #[default]
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

// =============================================================================
// Geometry
// =============================================================================

/// On-screen position of the overlay's top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Screen dimensions used to compute anchored positions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

// =============================================================================
// Transcription state
// =============================================================================

/// A chunk of speech text currently mid-reveal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecryptingChunk {
    /// Unique per reveal instance, never reused.
    pub id: Uuid,
    /// Immutable source of truth for this chunk.
    pub original_text: String,
    /// Mutates on every animation step.
    pub display_text: String,
    /// Monotonically non-decreasing within one chunk's lifecycle.
    pub progress: f64,
    pub created_at: Timestamp,
}

impl DecryptingChunk {
    pub fn new(original_text: String, display_text: String, created_at: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            original_text,
            display_text,
            progress: 0.0,
            created_at,
        }
    }

    /// True once the chunk has fully revealed (`progress == 1` iff
    /// `display_text == original_text`).
    pub fn is_complete(&self) -> bool {
        self.progress >= 1.0
    }
}

/// The three text slots composed into the teleprompter view.
///
/// Owned by the coordinator behind a single lock and mutated only by the
/// reveal engine and the coordinator itself. All multi-field transitions
/// (notably the chunk terminal transition) happen under one lock acquisition
/// so partial states are never observable.
#[derive(Clone, Debug, Default)]
pub struct TranscriptionState {
    /// Append-only concatenation of fully revealed chunks, space-joined.
    pub completed_text: String,
    /// Chunks mid-reveal; insertion order is arrival order, removal order is
    /// completion order.
    pub decrypting_chunks: Vec<DecryptingChunk>,
    /// Ephemeral preview synthesized from audio activity. Superseded by any
    /// real chunk arrival.
    pub anticipated_text: String,
    pub last_activity_time: Option<Timestamp>,
}

impl TranscriptionState {
    /// Register a new chunk and clear the anticipated preview.
    ///
    /// Clearing happens at reveal *start*: a chunk beginning reveal means
    /// real data has arrived and the synthetic preview is stale.
    pub fn push_chunk(&mut self, chunk: DecryptingChunk) {
        self.anticipated_text.clear();
        self.decrypting_chunks.push(chunk);
    }

    /// Terminal transition for a revealed chunk.
    ///
    /// Atomically appends the chunk's original text to `completed_text`
    /// (space-joined), removes the chunk, and clears any leftover anticipated
    /// preview. Returns `false` if the chunk id is no longer present, which
    /// makes the transition idempotent under racing ticks.
    pub fn commit_chunk(&mut self, id: Uuid) -> bool {
        let Some(index) = self.decrypting_chunks.iter().position(|c| c.id == id) else {
            return false;
        };
        let chunk = self.decrypting_chunks.remove(index);
        self.append_completed(&chunk.original_text);
        self.anticipated_text.clear();
        true
    }

    /// Append text directly to the completed buffer (editor-mode arrivals
    /// bypass the reveal animation).
    pub fn append_completed(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if !self.completed_text.is_empty() {
            self.completed_text.push(' ');
        }
        self.completed_text.push_str(text);
    }

    /// Reset all three text slots.
    pub fn clear(&mut self) {
        self.completed_text.clear();
        self.decrypting_chunks.clear();
        self.anticipated_text.clear();
        self.last_activity_time = None;
    }
}

// =============================================================================
// Speech activity
// =============================================================================

/// Derived per sampling tick, never persisted.
#[derive(Clone, Debug, Default)]
pub struct SpeechActivity {
    pub is_active: bool,
    pub last_activity_time: Option<Timestamp>,
    pub current_pattern: String,
}

// =============================================================================
// Edit state
// =============================================================================

/// Editable buffer state for editor mode.
///
/// `has_edits` is derived, never stored: it is exactly
/// `edited_text != original_text`. Save and discard reset the comparison by
/// moving one side onto the other.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditState {
    pub original_text: String,
    pub edited_text: String,
}

impl EditState {
    pub fn seeded(text: String) -> Self {
        Self {
            original_text: text.clone(),
            edited_text: text,
        }
    }

    pub fn has_edits(&self) -> bool {
        self.edited_text != self.original_text
    }

    /// Commit the edited text as the new baseline.
    pub fn save(&mut self) -> String {
        self.original_text = self.edited_text.clone();
        self.edited_text.clone()
    }

    /// Revert the edited text to the baseline.
    pub fn discard(&mut self) {
        self.edited_text = self.original_text.clone();
    }
}

// =============================================================================
// Tests
// =============================================================================
