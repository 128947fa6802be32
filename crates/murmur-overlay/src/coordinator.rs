//! Top-level overlay orchestrator.
//!
//! Wires backend transcript events into the reveal engine, the audio-level
//! feed into the activity monitor, and composes the visible text out of the
//! three slots (completed / decrypting / anticipated). Owns the host-facing
//! contract: close, minimize/restore, clear, save/discard edits.
//!
//! Everything is driven by one clock: the async `run` loop drains the event
//! subscription and calls `tick` at a fixed cadence; tests call `tick` and
//! `handle_event` directly with fake timestamps.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tokio::sync::Notify;

use murmur_activity::ActivityMonitor;
use murmur_core::config::OverlayConfig;
use murmur_core::events::TranscriptEvent;
use murmur_core::store::PreferenceStore;
use murmur_core::types::{
    Anchor, OverlayMode, Position, Timestamp, TranscriptionState, Viewport, Visibility,
};
use murmur_reveal::RevealEngine;

use crate::editor::ModeController;
use crate::position::PositionController;

/// Cadence of the wall-clock run loop.
const RUN_TICK_MS: u64 = 10;

pub type SaveCallback = Box<dyn Fn(String) + Send + Sync>;
pub type NotifyCallback = Box<dyn Fn() + Send + Sync>;
/// Host-supplied clipboard write. Failures are logged, never surfaced.
pub type ClipboardFn = Box<dyn Fn(&str) -> murmur_core::Result<()> + Send + Sync>;

/// Callbacks into the host application.
#[derive(Default)]
pub struct HostCallbacks {
    pub on_save_edits: Option<SaveCallback>,
    pub on_discard_edits: Option<NotifyCallback>,
    pub on_close: Option<NotifyCallback>,
}

/// The floating live-transcription overlay.
pub struct OverlayCoordinator {
    config: OverlayConfig,
    state: Arc<Mutex<TranscriptionState>>,
    reveal: RevealEngine,
    monitor: Mutex<ActivityMonitor>,
    mode: Mutex<ModeController>,
    position: Mutex<PositionController>,
    visibility: Mutex<Visibility>,
    recording: AtomicBool,
    callbacks: HostCallbacks,
    clipboard: Option<ClipboardFn>,
    shutdown: Notify,
}

impl OverlayCoordinator {
    pub fn new(
        config: OverlayConfig,
        store: Arc<dyn PreferenceStore>,
        viewport: Viewport,
        callbacks: HostCallbacks,
    ) -> Self {
        let state = Arc::new(Mutex::new(TranscriptionState::default()));
        let reveal = RevealEngine::new(Arc::clone(&state), config.reveal.clone());
        let monitor = ActivityMonitor::new(config.activity.clone());
        let mode = ModeController::new(config.overlay.initial_mode);
        let position = PositionController::new(store, config.overlay.clone(), viewport);

        let coordinator = Self {
            config,
            state,
            reveal,
            monitor: Mutex::new(monitor),
            mode: Mutex::new(mode),
            position: Mutex::new(position),
            visibility: Mutex::new(Visibility::Visible),
            recording: AtomicBool::new(false),
            callbacks,
            clipboard: None,
            shutdown: Notify::new(),
        };
        coordinator.refresh_monitor_gate();
        coordinator
    }

    /// Attach a clipboard writer.
    pub fn with_clipboard(mut self, clipboard: ClipboardFn) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    // -------------------------------------------------------------------------
    // Lock helpers (never nested in reverse order; state is always innermost)
    // -------------------------------------------------------------------------

    fn state(&self) -> MutexGuard<'_, TranscriptionState> {
        self.state.lock().expect("transcription state mutex poisoned")
    }

    fn mode_ctl(&self) -> MutexGuard<'_, ModeController> {
        self.mode.lock().expect("mode mutex poisoned")
    }

    fn position_ctl(&self) -> MutexGuard<'_, PositionController> {
        self.position.lock().expect("position mutex poisoned")
    }

    fn monitor_ctl(&self) -> MutexGuard<'_, ActivityMonitor> {
        self.monitor.lock().expect("monitor mutex poisoned")
    }

    // -------------------------------------------------------------------------
    // Event intake
    // -------------------------------------------------------------------------

    /// Route one backend event.
    ///
    /// Intake is gated on visibility: a minimized or closed overlay drops
    /// events outright, the same observable behavior as a torn-down
    /// subscription. Nothing reveals while the window is hidden.
    ///
    /// Teleprompter mode funnels both event classes into the reveal engine.
    /// Editor mode appends final transcripts directly to the completed text
    /// (no animation while actively editing) and drops partial chunks.
    pub fn handle_event(&self, event: TranscriptEvent, now: Timestamp) {
        let visibility = self.visibility();
        if visibility != Visibility::Visible {
            tracing::debug!(
                event = event.event_name(),
                %visibility,
                "Event dropped while overlay hidden"
            );
            return;
        }

        let mode = self.mode_ctl().mode();
        match (&event, mode) {
            (_, OverlayMode::Teleprompter) => {
                self.reveal
                    .begin_reveal(event.text(), self.config.reveal.algorithm, now);
                self.state().last_activity_time = Some(now);
            }
            (TranscriptEvent::Final { text, .. }, OverlayMode::Editor) => {
                let mut state = self.state();
                state.append_completed(text);
                state.last_activity_time = Some(now);
            }
            (TranscriptEvent::Chunk { id, .. }, OverlayMode::Editor) => {
                tracing::debug!(chunk = id, "Partial chunk ignored in editor mode");
            }
            (other, OverlayMode::Editor) => {
                tracing::debug!(event = other.event_name(), "Event ignored in editor mode");
            }
        }
    }

    /// Route one raw backend payload, tolerating malformed events.
    ///
    /// One bad payload must not stop future transcription display: the
    /// failure is logged and the subscription lives on.
    pub fn handle_raw_event(&self, payload: serde_json::Value, now: Timestamp) {
        match serde_json::from_value::<TranscriptEvent>(payload) {
            Ok(event) => self.handle_event(event, now),
            Err(e) => tracing::warn!(error = %e, "Dropping malformed transcript event"),
        }
    }

    /// Feed one audio-level sample into the activity monitor. Publishes a
    /// fresh anticipated preview on qualifying activity.
    pub fn sample_audio_level(&self, level: f64, now: Timestamp) {
        let activation = self.monitor_ctl().sample(level, now);
        if let Some(activation) = activation {
            let mut state = self.state();
            state.anticipated_text = activation.pattern;
            state.last_activity_time = Some(activation.at);
        }
    }

    /// Advance all clock-driven machinery to `now`: reveal steps, terminal
    /// transitions, and the silence timeout.
    pub fn tick(&self, now: Timestamp) {
        self.reveal.tick(now);
        let silence_fired = self.monitor_ctl().tick(now);
        if silence_fired {
            self.state().anticipated_text.clear();
        }
    }

    // -------------------------------------------------------------------------
    // Composition
    // -------------------------------------------------------------------------

    /// The text the host should render: the three concatenated regions in
    /// teleprompter mode, or the editable buffer in editor mode.
    pub fn visible_text(&self) -> String {
        if self.mode_ctl().mode() == OverlayMode::Editor {
            return self.mode_ctl().text().to_string();
        }

        let state = self.state();
        let mut parts: Vec<&str> = Vec::new();
        if !state.completed_text.is_empty() {
            parts.push(&state.completed_text);
        }
        for chunk in &state.decrypting_chunks {
            if !chunk.display_text.is_empty() {
                parts.push(&chunk.display_text);
            }
        }
        if !state.anticipated_text.is_empty() {
            parts.push(&state.anticipated_text);
        }
        parts.join(" ")
    }

    // -------------------------------------------------------------------------
    // Mode
    // -------------------------------------------------------------------------

    pub fn mode(&self) -> OverlayMode {
        self.mode_ctl().mode()
    }

    /// Switch to editor mode. Seeds the buffer from the completed text plus
    /// the unmasked originals of chunks still mid-reveal, then cancels those
    /// reveals, since their text now lives in the buffer.
    pub fn enter_editor(&self) {
        let seed = {
            let state = self.state();
            let mut parts: Vec<&str> = Vec::new();
            if !state.completed_text.is_empty() {
                parts.push(&state.completed_text);
            }
            for chunk in &state.decrypting_chunks {
                parts.push(&chunk.original_text);
            }
            parts.join(" ")
        };
        self.mode_ctl().enter_editor(&seed);
        self.reveal.cancel_all();
        self.refresh_monitor_gate();
    }

    /// Switch back to the read-only teleprompter.
    pub fn enter_teleprompter(&self) {
        self.mode_ctl().enter_teleprompter();
        self.refresh_monitor_gate();
    }

    pub fn set_edit_text(&self, text: &str) {
        self.mode_ctl().set_text(text);
    }

    pub fn has_edits(&self) -> bool {
        self.mode_ctl().has_edits()
    }

    /// Commit the editor buffer and hand it to the host.
    pub fn save_edits(&self) {
        let text = self.mode_ctl().save();
        if let Some(cb) = &self.callbacks.on_save_edits {
            cb(text);
        }
    }

    /// Revert the editor buffer and notify the host.
    pub fn discard_edits(&self) {
        self.mode_ctl().discard();
        if let Some(cb) = &self.callbacks.on_discard_edits {
            cb();
        }
    }

    // -------------------------------------------------------------------------
    // Visibility and lifecycle
    // -------------------------------------------------------------------------

    pub fn visibility(&self) -> Visibility {
        *self.visibility.lock().expect("visibility mutex poisoned")
    }

    fn set_visibility(&self, visibility: Visibility) {
        *self.visibility.lock().expect("visibility mutex poisoned") = visibility;
        tracing::debug!(%visibility, "Overlay visibility changed");
    }

    pub fn minimize(&self) {
        self.set_visibility(Visibility::Minimized);
        self.refresh_monitor_gate();
    }

    pub fn restore(&self) {
        self.set_visibility(Visibility::Visible);
        self.refresh_monitor_gate();
    }

    /// Close the overlay: cancel every in-flight reveal, silence the monitor,
    /// stop the run loop, and notify the host. No cancelled reveal will ever
    /// fire its terminal transition afterwards.
    pub fn close(&self) {
        self.set_visibility(Visibility::Closed);
        self.reveal.cancel_all();
        self.monitor_ctl().suspend();
        self.shutdown.notify_one();
        if let Some(cb) = &self.callbacks.on_close {
            cb();
        }
    }

    /// Reset all three text slots and all edit state.
    pub fn clear(&self) {
        self.reveal.cancel_all();
        self.state().clear();
        self.mode_ctl().reset();
        tracing::debug!("Overlay cleared");
    }

    /// Recording started/stopped. Participates in monitor gating.
    pub fn set_recording(&self, recording: bool) {
        self.recording.store(recording, Ordering::SeqCst);
        self.refresh_monitor_gate();
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    /// The activity monitor runs only while the overlay is visible, in
    /// teleprompter mode, and a recording is in progress.
    fn refresh_monitor_gate(&self) {
        let active = self.visibility() == Visibility::Visible
            && self.mode_ctl().mode() == OverlayMode::Teleprompter
            && self.is_recording();
        let mut monitor = self.monitor_ctl();
        if active {
            monitor.resume();
        } else {
            monitor.suspend();
        }
    }

    // -------------------------------------------------------------------------
    // Position passthrough
    // -------------------------------------------------------------------------

    pub fn position(&self) -> Position {
        self.position_ctl().position()
    }

    pub fn begin_drag(&self, pointer: Position) {
        self.position_ctl().begin_drag(pointer);
    }

    pub fn drag_to(&self, pointer: Position) {
        self.position_ctl().drag_to(pointer);
    }

    pub fn end_drag(&self) {
        self.position_ctl().end_drag();
    }

    pub fn set_anchor(&self, anchor: Anchor) {
        self.position_ctl().set_anchor(anchor);
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.position_ctl().set_viewport(viewport);
    }

    // -------------------------------------------------------------------------
    // Clipboard
    // -------------------------------------------------------------------------

    /// Copy the visible transcript via the host clipboard. Failure is logged
    /// without user-facing interruption. Returns whether the copy succeeded.
    pub fn copy_transcript(&self) -> bool {
        let Some(clipboard) = &self.clipboard else {
            tracing::debug!("No clipboard writer attached");
            return false;
        };
        let text = self.visible_text();
        match clipboard(&text) {
            Ok(()) => {
                tracing::debug!(text_len = text.len(), "Transcript copied to clipboard");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Clipboard copy failed");
                false
            }
        }
    }

    // -------------------------------------------------------------------------
    // Run loop
    // -------------------------------------------------------------------------

    /// Drain the backend subscription and drive the shared clock until the
    /// channel closes or `detach`/`close` is called.
    ///
    /// The subscription lives exactly as long as this future: dropping or
    /// shutting it down tears the intake path all the way down, so a stale
    /// loop can never double-deliver chunks.
    pub async fn run(&self, mut events: mpsc::Receiver<TranscriptEvent>) {
        loop {
            tokio::select! {
                maybe_event = events.recv() => {
                    match maybe_event {
                        Some(event) => self.handle_event(event, Timestamp::now()),
                        None => {
                            tracing::debug!("Event channel closed, overlay detached");
                            return;
                        }
                    }
                }
                _ = tokio::time::sleep(std::time::Duration::from_millis(RUN_TICK_MS)) => {
                    self.tick(Timestamp::now());
                }
                _ = self.shutdown.notified() => {
                    tracing::debug!("Overlay run loop stopped");
                    return;
                }
            }
        }
    }

    /// Stop the run loop without the rest of the close contract.
    pub fn detach(&self) {
        self.shutdown.notify_one();
    }
}

// =============================================================================
// Tests
// =============================================================================
