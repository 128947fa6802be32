//! Overlay window orchestration for the live transcription overlay.
//!
//! Composes the reveal engine, activity monitor, position persistence, and
//! teleprompter/editor mode handling behind one coordinator the host embeds.

pub mod coordinator;
pub mod editor;
pub mod position;

pub use coordinator::{HostCallbacks, OverlayCoordinator};
pub use editor::ModeController;
pub use position::{compute_position, PositionController};
