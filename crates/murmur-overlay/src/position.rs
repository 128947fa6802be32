//! Overlay placement: anchored defaults, the drag protocol, and persistence.
//!
//! Position has two provenances. The *computed* position derives from a named
//! anchor plus viewport and overlay dimensions; the *user-set* position is
//! written on drag release and persisted across sessions. A user-set value
//! wins over the computed default until explicitly cleared; anchor changes
//! only move an overlay the user has never dragged.

use std::sync::Arc;

use murmur_core::config::WindowConfig;
use murmur_core::store::PreferenceStore;
use murmur_core::types::{Anchor, Position, Viewport};

/// Store key for the last user-dragged position. Independent of other
/// application settings.
pub const POSITION_KEY: &str = "overlay-position";

/// Pointer-to-origin offset captured once at press time.
#[derive(Clone, Copy, Debug)]
struct DragState {
    offset: Position,
}

/// Tracks the overlay's on-screen placement.
pub struct PositionController {
    store: Arc<dyn PreferenceStore>,
    window: WindowConfig,
    viewport: Viewport,
    position: Position,
    user_override: bool,
    drag: Option<DragState>,
}

impl PositionController {
    /// Create a controller, restoring any persisted user position. Store
    /// failures degrade to the computed anchor default with a warning.
    pub fn new(store: Arc<dyn PreferenceStore>, window: WindowConfig, viewport: Viewport) -> Self {
        let (position, user_override) = match store.load(POSITION_KEY) {
            Ok(Some(value)) if !value.is_null() => match serde_json::from_value(value) {
                Ok(position) => (position, true),
                Err(e) => {
                    tracing::warn!(error = %e, "Persisted position unreadable, using anchor default");
                    (compute_position(window.anchor, viewport, &window), false)
                }
            },
            Ok(_) => (compute_position(window.anchor, viewport, &window), false),
            Err(e) => {
                tracing::warn!(error = %e, "Preference store load failed, using anchor default");
                (compute_position(window.anchor, viewport, &window), false)
            }
        };

        Self {
            store,
            window,
            viewport,
            position,
            user_override,
            drag: None,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn has_user_override(&self) -> bool {
        self.user_override
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Change the configured anchor. Recomputes the position only while no
    /// user override exists.
    pub fn set_anchor(&mut self, anchor: Anchor) {
        self.window.anchor = anchor;
        if !self.user_override {
            self.position = compute_position(anchor, self.viewport, &self.window);
        }
    }

    /// Viewport resize. Same precedence rule as anchor changes.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if !self.user_override {
            self.position = compute_position(self.window.anchor, viewport, &self.window);
        }
    }

    /// Press inside the header region: capture the pointer-to-origin offset,
    /// held constant through the drag.
    pub fn begin_drag(&mut self, pointer: Position) {
        self.drag = Some(DragState {
            offset: Position::new(pointer.x - self.position.x, pointer.y - self.position.y),
        });
    }

    /// Pointer move while dragging. Unclamped: bounds enforcement is the
    /// host's policy decision.
    pub fn drag_to(&mut self, pointer: Position) {
        if let Some(drag) = self.drag {
            self.position = Position::new(pointer.x - drag.offset.x, pointer.y - drag.offset.y);
        }
    }

    /// Release: persist the resulting position and end the drag. A store
    /// failure is logged, not surfaced; the in-session position still holds.
    pub fn end_drag(&mut self) {
        if self.drag.take().is_none() {
            return;
        }
        self.user_override = true;
        match serde_json::to_value(self.position) {
            Ok(value) => {
                if let Err(e) = self.store.save(POSITION_KEY, value) {
                    tracing::warn!(error = %e, "Failed to persist overlay position");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize overlay position"),
        }
        tracing::debug!(x = self.position.x, y = self.position.y, "Overlay position saved");
    }

    /// Drop the user override and return to the computed anchor default.
    ///
    /// The original app never exposed this; it exists so hosts can offer a
    /// "reset position" affordance.
    pub fn clear_override(&mut self) {
        self.user_override = false;
        self.position = compute_position(self.window.anchor, self.viewport, &self.window);
        if let Err(e) = self.store.save(POSITION_KEY, serde_json::Value::Null) {
            tracing::warn!(error = %e, "Failed to clear persisted overlay position");
        }
    }
}

/// Compute the anchored position from viewport and overlay dimensions with a
/// constant edge padding.
pub fn compute_position(anchor: Anchor, viewport: Viewport, window: &WindowConfig) -> Position {
    let pad = window.edge_padding;
    let x = match anchor {
        Anchor::TopLeft | Anchor::CenterLeft | Anchor::BottomLeft => pad,
        Anchor::TopCenter | Anchor::Center | Anchor::BottomCenter => {
            (viewport.width - window.width) / 2.0
        }
        Anchor::TopRight | Anchor::CenterRight | Anchor::BottomRight => {
            viewport.width - window.width - pad
        }
    };
    let y = match anchor {
        Anchor::TopLeft | Anchor::TopCenter | Anchor::TopRight => pad,
        Anchor::CenterLeft | Anchor::Center | Anchor::CenterRight => {
            (viewport.height - window.height) / 2.0
        }
        Anchor::BottomLeft | Anchor::BottomCenter | Anchor::BottomRight => {
            viewport.height - window.height - pad
        }
    };
    Position::new(x, y)
}

// =============================================================================
// Tests
// =============================================================================
