//! Resize handles on a widget's frame.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Hit radius around a handle, in pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 8.0;

/// The corner or edge being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResizeHandle {
    // Corner handles
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    // Edge handles
    Top,
    Bottom,
    Left,
    Right,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::TopLeft,
        ResizeHandle::TopRight,
        ResizeHandle::BottomLeft,
        ResizeHandle::BottomRight,
        ResizeHandle::Top,
        ResizeHandle::Bottom,
        ResizeHandle::Left,
        ResizeHandle::Right,
    ];

    pub fn moves_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::BottomLeft | Self::Left)
    }

    pub fn moves_right(self) -> bool {
        matches!(self, Self::TopRight | Self::BottomRight | Self::Right)
    }

    pub fn moves_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::TopRight | Self::Top)
    }

    pub fn moves_bottom(self) -> bool {
        matches!(self, Self::BottomLeft | Self::BottomRight | Self::Bottom)
    }

    /// Handle position on `bounds`.
    pub fn position(self, bounds: Rect) -> Point {
        let center = bounds.center();
        match self {
            Self::TopLeft => Point::new(bounds.x0, bounds.y0),
            Self::TopRight => Point::new(bounds.x1, bounds.y0),
            Self::BottomLeft => Point::new(bounds.x0, bounds.y1),
            Self::BottomRight => Point::new(bounds.x1, bounds.y1),
            Self::Top => Point::new(center.x, bounds.y0),
            Self::Bottom => Point::new(center.x, bounds.y1),
            Self::Left => Point::new(bounds.x0, center.y),
            Self::Right => Point::new(bounds.x1, center.y),
        }
    }
}

/// Hit test the handles of `bounds`. Corners win over edges.
pub fn hit_test_handle(bounds: Rect, point: Point, tolerance: f64) -> Option<ResizeHandle> {
    ResizeHandle::ALL.into_iter().find(|handle| {
        let pos = handle.position(bounds);
        let dx = point.x - pos.x;
        let dy = point.y - pos.y;
        dx * dx + dy * dy <= tolerance * tolerance
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_moved() {
        assert!(ResizeHandle::TopLeft.moves_left() && ResizeHandle::TopLeft.moves_top());
        assert!(!ResizeHandle::Right.moves_top());
        assert!(ResizeHandle::Bottom.moves_bottom() && !ResizeHandle::Bottom.moves_left());
    }

    #[test]
    fn test_hit_test_handle() {
        let bounds = Rect::new(100.0, 100.0, 300.0, 200.0);
        assert_eq!(
            hit_test_handle(bounds, Point::new(302.0, 203.0), HANDLE_HIT_TOLERANCE),
            Some(ResizeHandle::BottomRight)
        );
        assert_eq!(
            hit_test_handle(bounds, Point::new(200.0, 99.0), HANDLE_HIT_TOLERANCE),
            Some(ResizeHandle::Top)
        );
        assert_eq!(
            hit_test_handle(bounds, Point::new(200.0, 150.0), HANDLE_HIT_TOLERANCE),
            None
        );
    }
}
