//! Per-chunk reveal state machine driven by a single shared clock.
//!
//! Every chunk mid-reveal is an explicit `{step, total_steps}` record advanced
//! by `tick(now)` rather than an independent timer handle, so the whole engine
//! runs deterministically under a fake clock in tests. The async `run` loop
//! just calls `tick` with wall-clock time until shutdown.
//!
//! Lifecycle per chunk: Revealing (steps fire strictly in sequence, no skipped
//! progress) -> Holding (a short pause at full reveal) -> terminal transition
//! (append to completed text, remove from the decrypting set). Cancellation
//! removes the record, so a cancelled reveal can never fire its terminal
//! transition later.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Notify;
use uuid::Uuid;

use murmur_core::config::RevealConfig;
use murmur_core::types::{DecryptingChunk, RevealAlgorithm, Timestamp, TranscriptionState};

use crate::mask;
use crate::strategy::{strategy_for, RevealSchedule};

/// Granularity of the wall-clock runner. Finer than the shortest step
/// interval (typewriter at 10 ms/step when capped), coarse enough to idle.
const RUN_TICK_MS: u64 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Revealing,
    /// Fully revealed, waiting out the completion pause.
    Holding { until: Timestamp },
}

/// Scheduling record for one chunk mid-reveal.
#[derive(Debug)]
struct ActiveReveal {
    chunk_id: Uuid,
    original: String,
    mask: String,
    algorithm: RevealAlgorithm,
    step: u32,
    schedule: RevealSchedule,
    next_step_at: Timestamp,
    phase: Phase,
}

/// Owns the animation of incoming chunks from masked to legible.
///
/// Shares the `TranscriptionState` with the coordinator; all multi-field
/// mutations happen under that single lock. Multiple chunks may be mid-reveal
/// concurrently with independent schedules; `completed_text` reflects
/// completion order, not arrival order, when durations differ (the backend
/// may emit overlapping spans, and this engine does not reorder them).
pub struct RevealEngine {
    state: Arc<Mutex<TranscriptionState>>,
    reveals: Mutex<Vec<ActiveReveal>>,
    config: RevealConfig,
    shutdown: Notify,
}

impl RevealEngine {
    pub fn new(state: Arc<Mutex<TranscriptionState>>, config: RevealConfig) -> Self {
        Self {
            state,
            reveals: Mutex::new(Vec::new()),
            config,
            shutdown: Notify::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, TranscriptionState> {
        self.state.lock().expect("transcription state mutex poisoned")
    }

    fn reveals(&self) -> MutexGuard<'_, Vec<ActiveReveal>> {
        self.reveals.lock().expect("reveal list mutex poisoned")
    }

    /// Register a chunk and begin its reveal. Fire-and-forget: exactly one
    /// terminal transition will follow per returned id, unless the reveal is
    /// cancelled first.
    ///
    /// Clears the anticipated preview immediately, real data has arrived.
    /// Text with nothing to reveal is dropped: whitespace-only chunks (the
    /// backend emits empties for silent spans) and punctuation-only chunks,
    /// whose mask would equal the original and show as revealed at step
    /// zero.
    pub fn begin_reveal(
        &self,
        text: &str,
        algorithm: RevealAlgorithm,
        now: Timestamp,
    ) -> Option<Uuid> {
        if text.chars().all(mask::is_preserved) {
            tracing::debug!("Ignoring chunk with no revealable content");
            return None;
        }

        let strategy = strategy_for(algorithm);
        let schedule = strategy.schedule(text, &self.config);
        let mask = match algorithm {
            RevealAlgorithm::ScrambleDecrypt => mask::mask_text(text),
            RevealAlgorithm::Typewriter => String::new(),
        };
        let display = strategy.render(text, &mask, 0.0);

        let chunk = DecryptingChunk::new(text.to_string(), display, now);
        let chunk_id = chunk.id;
        self.state().push_chunk(chunk);

        self.reveals().push(ActiveReveal {
            chunk_id,
            original: text.to_string(),
            mask,
            algorithm,
            step: 0,
            next_step_at: now.plus_ms(schedule.step_interval_ms),
            schedule,
            phase: Phase::Revealing,
        });

        tracing::debug!(
            chunk_id = %chunk_id,
            ?algorithm,
            total_steps = schedule.total_steps,
            "Reveal started"
        );
        Some(chunk_id)
    }

    /// Advance every due reveal to `now`.
    ///
    /// Steps fire strictly in sequence even when the clock jumps past several
    /// due times at once; each step's display is written through to the shared
    /// chunk so progress is monotonic within a chunk's lifecycle.
    pub fn tick(&self, now: Timestamp) {
        let mut reveals = self.reveals();
        let mut committed: Vec<Uuid> = Vec::new();

        for reveal in reveals.iter_mut() {
            loop {
                match reveal.phase {
                    Phase::Revealing if reveal.next_step_at.0 <= now.0 => {
                        let due = reveal.next_step_at;
                        reveal.step += 1;
                        let strategy = strategy_for(reveal.algorithm);

                        if reveal.step >= reveal.schedule.total_steps {
                            self.write_chunk(reveal.chunk_id, reveal.original.clone(), 1.0);
                            reveal.phase = Phase::Holding {
                                until: due.plus_ms(reveal.schedule.completion_pause_ms),
                            };
                        } else {
                            let progress =
                                strategy.progress_at(reveal.step, reveal.schedule.total_steps);
                            let display =
                                strategy.render(&reveal.original, &reveal.mask, progress);
                            self.write_chunk(reveal.chunk_id, display, progress);
                            reveal.next_step_at = due.plus_ms(reveal.schedule.step_interval_ms);
                        }
                    }
                    Phase::Holding { until } if until.0 <= now.0 => {
                        if self.state().commit_chunk(reveal.chunk_id) {
                            tracing::debug!(chunk_id = %reveal.chunk_id, "Reveal committed");
                        }
                        committed.push(reveal.chunk_id);
                        break;
                    }
                    _ => break,
                }
            }
        }

        reveals.retain(|r| !committed.contains(&r.chunk_id));
    }

    fn write_chunk(&self, id: Uuid, display: String, progress: f64) {
        let mut state = self.state();
        if let Some(chunk) = state.decrypting_chunks.iter_mut().find(|c| c.id == id) {
            chunk.display_text = display;
            chunk.progress = progress;
        }
    }

    /// Cancel all in-flight reveals and drop their chunks without committing.
    ///
    /// Returns the number of reveals cancelled. None of them will ever fire
    /// a terminal transition.
    pub fn cancel_all(&self) -> usize {
        let cancelled: Vec<Uuid> = {
            let mut reveals = self.reveals();
            reveals.drain(..).map(|r| r.chunk_id).collect()
        };
        if !cancelled.is_empty() {
            let mut state = self.state();
            state.decrypting_chunks.retain(|c| !cancelled.contains(&c.id));
            tracing::debug!(count = cancelled.len(), "Reveals cancelled");
        }
        cancelled.len()
    }

    /// Number of chunks currently mid-reveal.
    pub fn active_count(&self) -> usize {
        self.reveals().len()
    }

    /// Drive the tick from wall-clock time until `shutdown()` is called.
    pub async fn run(&self) {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(std::time::Duration::from_millis(RUN_TICK_MS)) => {
                    self.tick(Timestamp::now());
                }
                _ = self.shutdown.notified() => {
                    tracing::debug!("Reveal engine stopped");
                    return;
                }
            }
        }
    }

    /// Signal the run loop to stop.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with_defaults() -> (Arc<Mutex<TranscriptionState>>, RevealEngine) {
        let state = Arc::new(Mutex::new(TranscriptionState::default()));
        let engine = RevealEngine::new(Arc::clone(&state), RevealConfig::default());
        (state, engine)
    }

    fn completed(state: &Arc<Mutex<TranscriptionState>>) -> String {
        state.lock().unwrap().completed_text.clone()
    }

    fn chunk_count(state: &Arc<Mutex<TranscriptionState>>) -> usize {
        state.lock().unwrap().decrypting_chunks.len()
    }

    #[test]
    fn test_begin_reveal_registers_chunk_at_zero_progress() {
        let (state, engine) = engine_with_defaults();
        let t0 = Timestamp(0);

        let id = engine
            .begin_reveal("hello world", RevealAlgorithm::ScrambleDecrypt, t0)
            .unwrap();

        let guard = state.lock().unwrap();
        let chunk = &guard.decrypting_chunks[0];
        assert_eq!(chunk.id, id);
        assert_eq!(chunk.original_text, "hello world");
        assert_eq!(chunk.progress, 0.0);
        assert_eq!(
            chunk.display_text.chars().count(),
            "hello world".chars().count()
        );
        assert_ne!(chunk.display_text, "hello world");
    }

    #[test]
    fn test_begin_reveal_drops_empty_text() {
        let (state, engine) = engine_with_defaults();
        assert!(engine
            .begin_reveal("   ", RevealAlgorithm::ScrambleDecrypt, Timestamp(0))
            .is_none());
        assert_eq!(chunk_count(&state), 0);
        assert_eq!(engine.active_count(), 0);
    }

    #[test]
    fn test_begin_reveal_drops_punctuation_only_text() {
        // "..." masks to itself, which would read as fully revealed at
        // progress zero; such chunks carry no speech content and are dropped.
        let (state, engine) = engine_with_defaults();
        for text in ["...", "!?", ". ! ?"] {
            assert!(engine
                .begin_reveal(text, RevealAlgorithm::ScrambleDecrypt, Timestamp(0))
                .is_none());
            assert!(engine
                .begin_reveal(text, RevealAlgorithm::Typewriter, Timestamp(0))
                .is_none());
        }
        assert_eq!(chunk_count(&state), 0);

        // Punctuation attached to real words still reveals.
        let id = engine
            .begin_reveal("done.", RevealAlgorithm::ScrambleDecrypt, Timestamp(0))
            .unwrap();
        let guard = state.lock().unwrap();
        let chunk = &guard.decrypting_chunks[0];
        assert_eq!(chunk.id, id);
        assert_ne!(chunk.display_text, "done.");
    }

    #[test]
    fn test_begin_reveal_clears_anticipated_text() {
        let (state, engine) = engine_with_defaults();
        state.lock().unwrap().anticipated_text = "### ####".to_string();

        engine.begin_reveal("real words", RevealAlgorithm::ScrambleDecrypt, Timestamp(0));
        assert!(state.lock().unwrap().anticipated_text.is_empty());
    }

    #[test]
    fn test_scramble_reveal_full_lifecycle() {
        let (state, engine) = engine_with_defaults();
        let t0 = Timestamp(0);
        let interval = 2500 / 35; // 71 ms
        engine.begin_reveal("hello world", RevealAlgorithm::ScrambleDecrypt, t0);

        // After the whole duration the chunk is fully revealed but held.
        engine.tick(Timestamp(2500));
        {
            let guard = state.lock().unwrap();
            let chunk = &guard.decrypting_chunks[0];
            assert_eq!(chunk.progress, 1.0);
            assert_eq!(chunk.display_text, "hello world");
            assert!(guard.completed_text.is_empty());
        }

        // The terminal transition fires once the pause elapses
        // (final step due at 35 * interval, plus the 300 ms hold).
        let commit_at = (35 * interval) as i64 + 300;
        engine.tick(Timestamp(commit_at - 1));
        assert!(completed(&state).is_empty());

        engine.tick(Timestamp(commit_at));
        assert_eq!(completed(&state), "hello world");
        assert_eq!(chunk_count(&state), 0);
        assert_eq!(engine.active_count(), 0);
    }

    #[test]
    fn test_progress_and_prefix_are_monotonic_per_step() {
        let (state, engine) = engine_with_defaults();
        let text = "the quick brown fox";
        engine.begin_reveal(text, RevealAlgorithm::ScrambleDecrypt, Timestamp(0));

        let mut prev_progress = 0.0;
        let mut prev_prefix = 0;
        for ms in (0..=2600).step_by(10) {
            engine.tick(Timestamp(ms));
            let guard = state.lock().unwrap();
            if let Some(chunk) = guard.decrypting_chunks.first() {
                assert!(chunk.progress >= prev_progress);
                prev_progress = chunk.progress;

                let prefix = chunk
                    .display_text
                    .chars()
                    .zip(text.chars())
                    .take_while(|(shown, original)| shown == original)
                    .count();
                assert!(prefix >= prev_prefix, "revealed prefix shrank at {} ms", ms);
                prev_prefix = prefix;

                // progress == 1 iff display == original, at every step.
                assert_eq!(chunk.progress == 1.0, chunk.display_text == text);
            }
        }
    }

    #[test]
    fn test_typewriter_reveal_full_lifecycle() {
        let (state, engine) = engine_with_defaults();
        engine.begin_reveal("hello", RevealAlgorithm::Typewriter, Timestamp(0));

        // 5 chars at 30 ms/char; after 2 steps the display is a 2-char prefix.
        engine.tick(Timestamp(60));
        {
            let guard = state.lock().unwrap();
            assert_eq!(guard.decrypting_chunks[0].display_text, "he");
        }

        // Final step at 150 ms, commit after the 300 ms pause.
        engine.tick(Timestamp(450));
        assert_eq!(completed(&state), "hello");
        assert_eq!(chunk_count(&state), 0);
    }

    #[test]
    fn test_terminal_transition_fires_exactly_once() {
        let (state, engine) = engine_with_defaults();
        engine.begin_reveal("once only", RevealAlgorithm::Typewriter, Timestamp(0));

        engine.tick(Timestamp(10_000));
        engine.tick(Timestamp(20_000));
        engine.tick(Timestamp(30_000));
        assert_eq!(completed(&state), "once only");
    }

    #[test]
    fn test_completed_text_reflects_completion_order() {
        let (state, engine) = engine_with_defaults();
        // Slow scramble arrives first, quick typewriter second.
        engine.begin_reveal("slow utterance", RevealAlgorithm::ScrambleDecrypt, Timestamp(0));
        engine.begin_reveal("hi", RevealAlgorithm::Typewriter, Timestamp(0));

        // The typewriter chunk finishes first (60 ms + pause) while the
        // scramble is still mid-reveal.
        engine.tick(Timestamp(1000));
        assert_eq!(completed(&state), "hi");
        assert_eq!(engine.active_count(), 1);

        engine.tick(Timestamp(5000));
        assert_eq!(completed(&state), "hi slow utterance");
        assert_eq!(engine.active_count(), 0);
    }

    #[test]
    fn test_concurrent_reveals_are_independent() {
        let (state, engine) = engine_with_defaults();
        engine.begin_reveal("first span", RevealAlgorithm::ScrambleDecrypt, Timestamp(0));
        engine.begin_reveal("second span", RevealAlgorithm::ScrambleDecrypt, Timestamp(500));
        assert_eq!(engine.active_count(), 2);

        engine.tick(Timestamp(1250));
        let guard = state.lock().unwrap();
        // The earlier chunk is further along than the later one.
        assert!(guard.decrypting_chunks[0].progress > guard.decrypting_chunks[1].progress);
    }

    #[test]
    fn test_cancelled_reveal_never_commits() {
        let (state, engine) = engine_with_defaults();
        engine.begin_reveal("doomed text", RevealAlgorithm::ScrambleDecrypt, Timestamp(0));
        engine.tick(Timestamp(1000));

        assert_eq!(engine.cancel_all(), 1);
        assert_eq!(chunk_count(&state), 0);

        // Ticking far past the would-be terminal transition does nothing.
        engine.tick(Timestamp(60_000));
        assert!(completed(&state).is_empty());
    }

    #[test]
    fn test_cancel_all_on_idle_engine() {
        let (_state, engine) = engine_with_defaults();
        assert_eq!(engine.cancel_all(), 0);
    }

    #[test]
    fn test_clock_jump_catches_up_without_skipping_commit() {
        let (state, engine) = engine_with_defaults();
        engine.begin_reveal("jumped", RevealAlgorithm::Typewriter, Timestamp(0));

        // A single tick far in the future walks through every step and the
        // pause in one call.
        engine.tick(Timestamp(100_000));
        assert_eq!(completed(&state), "jumped");
        assert_eq!(engine.active_count(), 0);
    }

    #[test]
    fn test_scenario_chunk_seven_hello_world() {
        // Chunk {id: 7, text: "hello world"} arrives on an empty overlay.
        let (state, engine) = engine_with_defaults();
        let id = engine
            .begin_reveal("hello world", RevealAlgorithm::ScrambleDecrypt, Timestamp(0))
            .unwrap();

        engine.tick(Timestamp(10_000));
        let guard = state.lock().unwrap();
        assert_eq!(guard.completed_text, "hello world");
        assert!(guard.decrypting_chunks.is_empty());
        assert!(!guard.decrypting_chunks.iter().any(|c| c.id == id));
    }

    #[tokio::test]
    async fn test_run_loop_shutdown() {
        let (_state, engine) = engine_with_defaults();
        engine.shutdown();
        tokio::time::timeout(std::time::Duration::from_secs(2), engine.run())
            .await
            .expect("Engine should shut down within timeout");
    }

    #[tokio::test]
    async fn test_run_loop_commits_in_wall_clock_time() {
        let state = Arc::new(Mutex::new(TranscriptionState::default()));
        let engine = Arc::new(RevealEngine::new(
            Arc::clone(&state),
            RevealConfig {
                typewriter_ms_per_char: 1,
                completion_pause_ms: 10,
                ..RevealConfig::default()
            },
        ));

        engine.begin_reveal("ok", RevealAlgorithm::Typewriter, Timestamp::now());

        let runner = Arc::clone(&engine);
        let handle = tokio::spawn(async move { runner.run().await });

        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        engine.shutdown();
        tokio::time::timeout(std::time::Duration::from_secs(2), handle)
            .await
            .expect("Run task should stop")
            .unwrap();

        assert_eq!(state.lock().unwrap().completed_text, "ok");
    }
}
