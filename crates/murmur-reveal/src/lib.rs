//! Reveal engine for the live transcription overlay.
//!
//! Animates incoming speech chunks from obscured to legible via one of two
//! strategies (scramble-decrypt, typewriter), merging each chunk into the
//! completed transcript exactly once on completion. All animation state is
//! advanced by a single `tick(now)` clock so tests run deterministically.

pub mod engine;
pub mod mask;
pub mod strategy;

pub use engine::RevealEngine;
pub use strategy::{RevealSchedule, RevealStrategy, ScrambleDecrypt, Typewriter};
