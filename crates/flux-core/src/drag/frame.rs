//! Animation-frame coalescing of pointer moves.

use kurbo::Point;

/// Buffers pointer moves until the next animation frame.
///
/// When disabled every move passes straight through.
#[derive(Debug, Clone, Default)]
pub struct FrameBatcher {
    enabled: bool,
    pending: Option<Point>,
}

impl FrameBatcher {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            pending: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Offer a move. Returns the point to process now, or `None` if it was
    /// buffered for the next frame (replacing any earlier buffered move).
    pub fn push(&mut self, point: Point) -> Option<Point> {
        if !self.enabled {
            return Some(point);
        }
        self.pending = Some(point);
        None
    }

    /// Whether the host should request an animation frame.
    pub fn needs_frame(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the buffered move, if any.
    pub fn take(&mut self) -> Option<Point> {
        self.pending.take()
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}
