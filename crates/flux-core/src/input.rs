//! Host-agnostic pointer and keyboard events.
//!
//! Hosts translate their native events (DOM pointer events, winit events)
//! into these types before handing them to the drag coordinator or a widget
//! gesture.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Key name used for gesture cancellation.
pub const ESCAPE: &str = "Escape";

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Pointer event type for unified mouse/touch handling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
}

impl PointerEvent {
    /// Pointer position carried by the event.
    pub fn position(&self) -> Point {
        match *self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Move { position } => position,
        }
    }

    /// Whether this is a press or release of the primary button.
    pub fn is_primary(&self) -> bool {
        matches!(
            self,
            PointerEvent::Down { button: MouseButton::Left, .. }
                | PointerEvent::Up { button: MouseButton::Left, .. }
        )
    }
}

/// Keyboard event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed(String),
    Released(String),
}

impl KeyEvent {
    /// Whether this event is an Escape key press.
    pub fn is_escape(&self) -> bool {
        matches!(self, KeyEvent::Pressed(key) if key == ESCAPE)
    }
}

/// Returns true once `current` is farther than `threshold` from `origin` on
/// either axis.
///
/// Per-axis comparison keeps a diagonal wobble of a few pixels from turning a
/// click into a drag.
pub fn exceeds_threshold(origin: Point, current: Point, threshold: f64) -> bool {
    let delta: Vec2 = current - origin;
    delta.x.abs() > threshold || delta.y.abs() > threshold
}
