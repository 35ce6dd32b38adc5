//! Floating overlay that follows the pointer during a drag.

use super::{DragItem, ItemKind};
use kurbo::{Point, Rect, Size, Vec2};

/// Render state for the drag overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub title: String,
    pub kind: ItemKind,
    /// Top-left of the overlay in screen coordinates.
    pub position: Point,
    /// Pointer offset from the item origin at press time.
    pub grab_offset: Vec2,
    /// Target currently under the pointer, for highlight.
    pub hovered: Option<String>,
}

impl Overlay {
    pub fn new(item: &DragItem, press: Point) -> Self {
        let grab_offset = press - item.origin;
        Self {
            title: item.title.clone(),
            kind: item.kind,
            position: item.origin,
            grab_offset,
            hovered: None,
        }
    }

    /// Move the overlay so the grab point stays under the pointer.
    pub fn follow(&mut self, pointer: Point) {
        self.position = pointer - self.grab_offset;
    }

    pub fn rect(&self, size: Size) -> Rect {
        Rect::from_origin_size(self.position, size)
    }
}
