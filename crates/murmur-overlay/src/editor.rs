//! Mode controller: teleprompter ⇄ editor.
//!
//! A two-state machine with an editable buffer attached to the editor side.
//! Entering the editor seeds the buffer from the accumulated transcript, but
//! never over an in-progress edit; new transcription must not clobber what
//! the user is typing.

use murmur_core::types::{EditState, OverlayMode};

/// Owns the overlay's presentation mode and the editor buffer.
pub struct ModeController {
    mode: OverlayMode,
    edit: EditState,
}

impl ModeController {
    pub fn new(initial: OverlayMode) -> Self {
        Self {
            mode: initial,
            edit: EditState::default(),
        }
    }

    pub fn mode(&self) -> OverlayMode {
        self.mode
    }

    pub fn has_edits(&self) -> bool {
        self.edit.has_edits()
    }

    /// The current editor buffer contents.
    pub fn text(&self) -> &str {
        &self.edit.edited_text
    }

    /// Switch to editor mode, seeding the buffer from `seed`: the completed
    /// text plus the unmasked originals of any chunks still mid-reveal.
    ///
    /// Seeding is skipped while `has_edits()` holds, so toggling back and
    /// forth never loses typed-but-unsaved changes.
    pub fn enter_editor(&mut self, seed: &str) {
        if self.mode == OverlayMode::Editor {
            return;
        }
        self.mode = OverlayMode::Editor;
        if !self.edit.has_edits() {
            self.edit = EditState::seeded(seed.to_string());
        }
        tracing::debug!(seeded = !self.edit.has_edits(), "Entered editor mode");
    }

    /// Switch back to the read-only teleprompter. The edit buffer stays as
    /// is; unsaved changes survive for the next editor entry.
    pub fn enter_teleprompter(&mut self) {
        if self.mode != OverlayMode::Teleprompter {
            self.mode = OverlayMode::Teleprompter;
            tracing::debug!("Entered teleprompter mode");
        }
    }

    /// Replace the editor buffer (keystroke binding from the host).
    pub fn set_text(&mut self, text: &str) {
        self.edit.edited_text = text.to_string();
    }

    /// Commit the buffer as the new baseline and return the committed text.
    pub fn save(&mut self) -> String {
        let text = self.edit.save();
        tracing::debug!(text_len = text.len(), "Edits saved");
        text
    }

    /// Revert the buffer to the baseline.
    pub fn discard(&mut self) {
        self.edit.discard();
        tracing::debug!("Edits discarded");
    }

    /// Drop all edit state (used by the coordinator's `clear`).
    pub fn reset(&mut self) {
        self.edit = EditState::default();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_mode_is_configurable() {
        assert_eq!(ModeController::new(OverlayMode::Teleprompter).mode(), OverlayMode::Teleprompter);
        assert_eq!(ModeController::new(OverlayMode::Editor).mode(), OverlayMode::Editor);
    }

    #[test]
    fn test_enter_editor_seeds_buffer() {
        let mut mc = ModeController::new(OverlayMode::Teleprompter);
        mc.enter_editor("hello world still revealing");
        assert_eq!(mc.mode(), OverlayMode::Editor);
        assert_eq!(mc.text(), "hello world still revealing");
        assert!(!mc.has_edits());
    }

    #[test]
    fn test_enter_editor_does_not_clobber_in_progress_edit() {
        let mut mc = ModeController::new(OverlayMode::Teleprompter);
        mc.enter_editor("first seed");
        mc.set_text("user typed something");
        mc.enter_teleprompter();

        // New transcription accumulated while away; re-entering must keep
        // the unsaved edit.
        mc.enter_editor("first seed plus more");
        assert_eq!(mc.text(), "user typed something");
        assert!(mc.has_edits());
    }

    #[test]
    fn test_reentry_without_edits_reseeds() {
        let mut mc = ModeController::new(OverlayMode::Teleprompter);
        mc.enter_editor("old");
        mc.enter_teleprompter();
        mc.enter_editor("old plus newly revealed");
        assert_eq!(mc.text(), "old plus newly revealed");
    }

    #[test]
    fn test_enter_editor_twice_is_noop() {
        let mut mc = ModeController::new(OverlayMode::Teleprompter);
        mc.enter_editor("seed");
        mc.enter_editor("other seed");
        assert_eq!(mc.text(), "seed");
    }

    #[test]
    fn test_save_commits_baseline() {
        let mut mc = ModeController::new(OverlayMode::Teleprompter);
        mc.enter_editor("draft");
        mc.set_text("final text");

        let committed = mc.save();
        assert_eq!(committed, "final text");
        assert!(!mc.has_edits());

        // The new baseline survives mode round-trips and reseeding applies
        // again only because has_edits is false.
        mc.enter_teleprompter();
        mc.enter_editor("fresh seed");
        assert_eq!(mc.text(), "fresh seed");
    }

    #[test]
    fn test_discard_reverts_to_pre_edit_text() {
        let mut mc = ModeController::new(OverlayMode::Teleprompter);
        mc.enter_editor("the original");
        mc.set_text("the original but mangled");

        mc.discard();
        assert_eq!(mc.text(), "the original");
        assert!(!mc.has_edits());
    }

    #[test]
    fn test_reset_drops_everything() {
        let mut mc = ModeController::new(OverlayMode::Teleprompter);
        mc.enter_editor("seed");
        mc.set_text("dirty");
        mc.reset();
        assert_eq!(mc.text(), "");
        assert!(!mc.has_edits());
    }
}
