//! Reorderable toolbar segments.
//!
//! Each segment registers itself as a [`TargetKind::ToolbarSlot`] drop
//! target. Dropping a segment on another one inserts it before or after that
//! segment depending on which half of it the pointer is over.

use crate::drag::{DragEvent, DropTargetRegistry, ItemKind, TargetKind};
use crate::error::FluxResult;
use crate::storage::SharedBackend;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Backend key holding the persisted order.
pub const ORDER_KEY: &str = "flux_toolbar_order";

/// A toolbar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolbarSegment {
    pub id: String,
    pub label: String,
}

impl ToolbarSegment {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Ordered toolbar segments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Toolbar {
    segments: Vec<ToolbarSegment>,
}

impl Toolbar {
    pub fn new(segments: Vec<ToolbarSegment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[ToolbarSegment] {
        &self.segments
    }

    pub fn ids(&self) -> Vec<&str> {
        self.segments.iter().map(|s| s.id.as_str()).collect()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.segments.iter().position(|s| s.id == id)
    }

    /// Move the segment at `from` so it ends up at index `to`.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if from >= self.segments.len() || to >= self.segments.len() {
            return false;
        }
        if from != to {
            let segment = self.segments.remove(from);
            self.segments.insert(to, segment);
        }
        true
    }

    /// Register every segment's rectangle as a drop slot.
    pub fn register_targets(&self, registry: &mut DropTargetRegistry, rects: &[(String, Rect)]) {
        for (id, rect) in rects {
            if self.index_of(id).is_some() {
                registry.register(id.clone(), TargetKind::ToolbarSlot, *rect);
            }
        }
    }

    /// Apply a terminal drag event. Returns true if the order changed.
    ///
    /// Only drops of a segment onto a toolbar slot reorder; anything else
    /// leaves the toolbar untouched.
    pub fn handle_drag_event(&mut self, event: &DragEvent) -> bool {
        let DragEvent::Drop {
            item,
            target,
            pointer,
        } = event
        else {
            return false;
        };
        if item.kind != ItemKind::Segment || target.kind != TargetKind::ToolbarSlot {
            return false;
        }
        let (Some(from), Some(over)) = (self.index_of(&item.id), self.index_of(&target.id)) else {
            return false;
        };
        let to = insertion_index(from, over, target.rect, *pointer);
        if to == from {
            return false;
        }
        log::debug!("Toolbar: moving {} from {} to {}", item.id, from, to);
        self.reorder(from, to)
    }

    /// Restore a persisted order. Unknown ids are ignored; segments missing
    /// from the stored order keep their relative order at the end.
    pub fn apply_order(&mut self, order: &[String]) {
        let mut ordered = Vec::with_capacity(self.segments.len());
        for id in order {
            if let Some(index) = self.segments.iter().position(|s| &s.id == id) {
                ordered.push(self.segments.remove(index));
            }
        }
        ordered.append(&mut self.segments);
        self.segments = ordered;
    }

    pub async fn load_order(&mut self, backend: &SharedBackend) -> FluxResult<()> {
        if let Some(json) = backend.get(ORDER_KEY).await? {
            let order: Vec<String> = serde_json::from_str(&json)?;
            self.apply_order(&order);
        }
        Ok(())
    }

    pub async fn save_order(&self, backend: &SharedBackend) -> FluxResult<()> {
        let order: Vec<&str> = self.ids();
        backend.set(ORDER_KEY, serde_json::to_string(&order)?).await?;
        Ok(())
    }
}

/// Final index for a segment currently at `from`, dropped over the segment
/// at `over` whose bounds are `rect`.
fn insertion_index(from: usize, over: usize, rect: Rect, pointer: Point) -> usize {
    let after = pointer.x >= rect.center().x;
    // Index in the list with the dragged segment removed.
    let over_after_removal = if over > from { over - 1 } else { over };
    if after { over_after_removal + 1 } else { over_after_removal }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag::{DragCoordinator, DragItem};
    use crate::storage::{block_on, MemoryBackend};
    use std::sync::Arc;

    fn toolbar() -> Toolbar {
        Toolbar::new(vec![
            ToolbarSegment::new("timer", "Timer"),
            ToolbarSegment::new("council", "Council"),
            ToolbarSegment::new("docs", "Docs"),
            ToolbarSegment::new("sheets", "Sheets"),
        ])
    }

    fn rects() -> Vec<(String, Rect)> {
        ["timer", "council", "docs", "sheets"]
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let x = i as f64 * 100.0;
                (id.to_string(), Rect::new(x, 0.0, x + 100.0, 40.0))
            })
            .collect()
    }

    fn drag_segment(toolbar: &mut Toolbar, id: &str, from_x: f64, to_x: f64) -> bool {
        let mut coord = DragCoordinator::default();
        toolbar.register_targets(coord.targets_mut(), &rects());
        let item = DragItem::new(id, ItemKind::Segment, id, Point::new(from_x - 50.0, 0.0));
        coord.start_drag(item, Point::new(from_x, 20.0));
        coord.pointer_moved(Point::new(to_x, 20.0));
        let event = coord.pointer_released(Point::new(to_x, 20.0)).unwrap();
        toolbar.handle_drag_event(&event)
    }

    #[test]
    fn test_reorder() {
        let mut toolbar = toolbar();
        assert!(toolbar.reorder(0, 2));
        assert_eq!(toolbar.ids(), vec!["council", "docs", "timer", "sheets"]);
        assert!(!toolbar.reorder(0, 9));
    }

    #[test]
    fn test_drop_on_right_half_inserts_after() {
        let mut toolbar = toolbar();
        assert!(drag_segment(&mut toolbar, "timer", 50.0, 280.0));
        assert_eq!(toolbar.ids(), vec!["council", "docs", "timer", "sheets"]);
    }

    #[test]
    fn test_drop_on_left_half_inserts_before() {
        let mut toolbar = toolbar();
        assert!(drag_segment(&mut toolbar, "sheets", 350.0, 110.0));
        assert_eq!(toolbar.ids(), vec!["timer", "sheets", "council", "docs"]);
    }

    #[test]
    fn test_drop_outside_is_noop() {
        let mut toolbar = toolbar();
        assert!(!drag_segment(&mut toolbar, "timer", 50.0, 900.0));
        assert_eq!(toolbar, self::toolbar());
    }

    #[test]
    fn test_drop_next_to_itself_is_noop() {
        let mut toolbar = toolbar();
        // Left half of the neighbour: already there.
        assert!(!drag_segment(&mut toolbar, "timer", 50.0, 120.0));
        assert_eq!(toolbar, self::toolbar());
    }

    #[test]
    fn test_apply_order_tolerates_unknown_and_missing() {
        let mut toolbar = toolbar();
        toolbar.apply_order(&["docs".to_string(), "ghost".to_string(), "timer".to_string()]);
        assert_eq!(toolbar.ids(), vec!["docs", "timer", "council", "sheets"]);
    }

    #[test]
    fn test_order_persists() {
        let backend: SharedBackend = Arc::new(MemoryBackend::new());
        let mut toolbar = toolbar();
        toolbar.reorder(3, 0);
        block_on(toolbar.save_order(&backend)).unwrap();

        let mut restored = self::toolbar();
        block_on(restored.load_order(&backend)).unwrap();
        assert_eq!(restored.ids(), vec!["sheets", "timer", "council", "docs"]);
    }
}
