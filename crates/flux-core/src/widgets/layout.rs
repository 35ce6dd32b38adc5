//! Widget geometry: clamping, grid snapping, move and resize.

use super::handles::ResizeHandle;
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Visible area widgets must stay inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Position and size of a widget in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WidgetLayout {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl WidgetLayout {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect.x0, rect.y0, rect.width(), rect.height())
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.origin(), self.size())
    }

    /// Keep the widget fully inside the viewport.
    ///
    /// A widget larger than the viewport is shrunk to fit and pinned at 0.
    pub fn clamped(self, viewport: Viewport) -> Self {
        let width = self.width.min(viewport.width).max(0.0);
        let height = self.height.min(viewport.height).max(0.0);
        Self {
            x: self.x.clamp(0.0, viewport.width - width),
            y: self.y.clamp(0.0, viewport.height - height),
            width,
            height,
        }
    }

    /// Snap the origin to the grid.
    pub fn snapped_origin(self, pitch: f64) -> Self {
        Self {
            x: snap(self.x, pitch),
            y: snap(self.y, pitch),
            ..self
        }
    }

    /// Snap all four edges to the grid, never collapsing below one cell.
    pub fn snapped(self, pitch: f64) -> Self {
        let x0 = snap(self.x, pitch);
        let y0 = snap(self.y, pitch);
        let x1 = snap(self.x + self.width, pitch).max(x0 + pitch);
        let y1 = snap(self.y + self.height, pitch).max(y0 + pitch);
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Check the clamping invariant.
    pub fn is_within(&self, viewport: Viewport) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.x + self.width <= viewport.width
            && self.y + self.height <= viewport.height
    }
}

/// Round `value` to the nearest multiple of `pitch`.
pub fn snap(value: f64, pitch: f64) -> f64 {
    (value / pitch).round() * pitch
}

/// Options shared by move and resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutRules {
    pub viewport: Viewport,
    /// Grid pitch when build mode is on.
    pub snap: Option<f64>,
    pub min_size: Size,
}

/// Layout after dragging `start` by `delta`.
pub fn move_layout(start: WidgetLayout, delta: Vec2, rules: &LayoutRules) -> WidgetLayout {
    let mut moved = WidgetLayout {
        x: start.x + delta.x,
        y: start.y + delta.y,
        ..start
    };
    if let Some(pitch) = rules.snap {
        moved = moved.snapped_origin(pitch);
    }
    moved.clamped(rules.viewport)
}

/// Layout after dragging `handle` of `start` by `delta`.
pub fn resize_layout(
    start: WidgetLayout,
    handle: ResizeHandle,
    delta: Vec2,
    rules: &LayoutRules,
) -> WidgetLayout {
    let r = start.rect();
    let (mut x0, mut y0, mut x1, mut y1) = (r.x0, r.y0, r.x1, r.y1);

    if handle.moves_left() {
        x0 += delta.x;
    }
    if handle.moves_right() {
        x1 += delta.x;
    }
    if handle.moves_top() {
        y0 += delta.y;
    }
    if handle.moves_bottom() {
        y1 += delta.y;
    }

    if let Some(pitch) = rules.snap {
        if handle.moves_left() {
            x0 = snap(x0, pitch);
        }
        if handle.moves_right() {
            x1 = snap(x1, pitch);
        }
        if handle.moves_top() {
            y0 = snap(y0, pitch);
        }
        if handle.moves_bottom() {
            y1 = snap(y1, pitch);
        }
    }

    // Dragged edges stop at the viewport.
    x0 = x0.max(0.0);
    y0 = y0.max(0.0);
    x1 = x1.min(rules.viewport.width);
    y1 = y1.min(rules.viewport.height);

    // Minimum size pushes the dragged edge back.
    if x1 - x0 < rules.min_size.width {
        if handle.moves_left() {
            x0 = x1 - rules.min_size.width;
        } else {
            x1 = x0 + rules.min_size.width;
        }
    }
    if y1 - y0 < rules.min_size.height {
        if handle.moves_top() {
            y0 = y1 - rules.min_size.height;
        } else {
            y1 = y0 + rules.min_size.height;
        }
    }

    WidgetLayout::new(x0, y0, x1 - x0, y1 - y0).clamped(rules.viewport)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(snap: Option<f64>) -> LayoutRules {
        LayoutRules {
            viewport: Viewport::new(800.0, 600.0),
            snap,
            min_size: Size::new(120.0, 80.0),
        }
    }

    #[test]
    fn test_clamp_inside_viewport() {
        let viewport = Viewport::new(800.0, 600.0);
        let layout = WidgetLayout::new(750.0, -20.0, 200.0, 100.0).clamped(viewport);
        assert_eq!(layout, WidgetLayout::new(600.0, 0.0, 200.0, 100.0));
        assert!(layout.is_within(viewport));
    }

    #[test]
    fn test_clamp_oversized_widget() {
        let viewport = Viewport::new(300.0, 200.0);
        let layout = WidgetLayout::new(50.0, 50.0, 500.0, 400.0).clamped(viewport);
        assert_eq!(layout, WidgetLayout::new(0.0, 0.0, 300.0, 200.0));
    }

    #[test]
    fn test_move_clamps() {
        let start = WidgetLayout::new(100.0, 100.0, 200.0, 150.0);
        let moved = move_layout(start, Vec2::new(5000.0, -5000.0), &rules(None));
        assert_eq!(moved, WidgetLayout::new(600.0, 0.0, 200.0, 150.0));
    }

    #[test]
    fn test_move_snaps_in_build_mode() {
        let start = WidgetLayout::new(100.0, 100.0, 200.0, 150.0);
        let moved = move_layout(start, Vec2::new(13.0, 27.0), &rules(Some(20.0)));
        assert_eq!(moved.origin(), Point::new(120.0, 120.0));
        assert_eq!(moved.size(), start.size());
    }

    #[test]
    fn test_resize_bottom_right() {
        let start = WidgetLayout::new(100.0, 100.0, 200.0, 150.0);
        let resized = resize_layout(
            start,
            ResizeHandle::BottomRight,
            Vec2::new(50.0, 30.0),
            &rules(None),
        );
        assert_eq!(resized, WidgetLayout::new(100.0, 100.0, 250.0, 180.0));
    }

    #[test]
    fn test_resize_top_left_respects_min_size() {
        let start = WidgetLayout::new(100.0, 100.0, 200.0, 150.0);
        let resized = resize_layout(
            start,
            ResizeHandle::TopLeft,
            Vec2::new(190.0, 140.0),
            &rules(None),
        );
        // Right and bottom edges stay put.
        assert_eq!(resized, WidgetLayout::new(180.0, 170.0, 120.0, 80.0));
    }

    #[test]
    fn test_resize_stops_at_viewport_edge() {
        let start = WidgetLayout::new(600.0, 400.0, 150.0, 150.0);
        let resized = resize_layout(
            start,
            ResizeHandle::BottomRight,
            Vec2::new(500.0, 500.0),
            &rules(None),
        );
        assert_eq!(resized, WidgetLayout::new(600.0, 400.0, 200.0, 200.0));
        assert!(resized.is_within(Viewport::new(800.0, 600.0)));
    }

    #[test]
    fn test_resize_snaps_dragged_edge_only() {
        let start = WidgetLayout::new(100.0, 100.0, 200.0, 150.0);
        let resized = resize_layout(
            start,
            ResizeHandle::Right,
            Vec2::new(33.0, 99.0),
            &rules(Some(20.0)),
        );
        assert_eq!(resized, WidgetLayout::new(100.0, 100.0, 240.0, 150.0));
    }

    #[test]
    fn test_snapped_never_collapses() {
        let layout = WidgetLayout::new(3.0, 3.0, 4.0, 4.0).snapped(20.0);
        assert_eq!(layout, WidgetLayout::new(0.0, 0.0, 20.0, 20.0));
    }

    #[test]
    fn test_random_gestures_stay_inside() {
        let viewport = Viewport::new(800.0, 600.0);
        let rules = rules(Some(20.0));
        let start = WidgetLayout::new(300.0, 200.0, 200.0, 150.0);
        let deltas = [
            Vec2::new(-900.0, 17.0),
            Vec2::new(33.3, -777.0),
            Vec2::new(1000.0, 1000.0),
            Vec2::new(-3.0, 2.5),
        ];
        let handles = [
            ResizeHandle::TopLeft,
            ResizeHandle::TopRight,
            ResizeHandle::BottomLeft,
            ResizeHandle::BottomRight,
            ResizeHandle::Top,
            ResizeHandle::Bottom,
            ResizeHandle::Left,
            ResizeHandle::Right,
        ];
        for delta in deltas {
            assert!(move_layout(start, delta, &rules).is_within(viewport));
            for handle in handles {
                let resized = resize_layout(start, handle, delta, &rules);
                assert!(resized.is_within(viewport), "{:?} {:?} -> {:?}", handle, delta, resized);
            }
        }
    }
}
