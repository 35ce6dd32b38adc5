//! Registry of drop-target rectangles.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// What a drop target accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    /// A folder on the desktop canvas.
    Folder,
    /// A segment position in the toolbar.
    ToolbarSlot,
}

/// A registered region that can receive a dragged item.
#[derive(Debug, Clone, PartialEq)]
pub struct DropTarget {
    pub id: String,
    pub kind: TargetKind,
    /// Last measured bounds in screen coordinates.
    pub rect: Rect,
    /// Set when scrolling or resizing may have moved the element.
    stale: bool,
}

impl DropTarget {
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Point-in-rectangle containment against the cached bounds.
    pub fn contains(&self, point: Point) -> bool {
        !self.stale && self.rect.contains(point)
    }
}

/// Measures the current bounds of a target element, `None` once it is gone.
pub type Measure = Box<dyn Fn(&str) -> Option<Rect>>;

/// Drop targets in registration order; later registrations sit on top.
#[derive(Default)]
pub struct DropTargetRegistry {
    targets: Vec<DropTarget>,
    measure: Option<Measure>,
}

impl DropTargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the function used to re-measure stale targets.
    pub fn set_measure(&mut self, measure: impl Fn(&str) -> Option<Rect> + 'static) {
        self.measure = Some(Box::new(measure));
    }

    /// Register or re-register a target. Re-registering moves it to the top.
    pub fn register(&mut self, id: impl Into<String>, kind: TargetKind, rect: Rect) {
        let id = id.into();
        self.targets.retain(|t| t.id != id);
        self.targets.push(DropTarget {
            id,
            kind,
            rect,
            stale: false,
        });
    }

    /// Remove a target, e.g. when its element unmounts.
    pub fn unregister(&mut self, id: &str) -> bool {
        let before = self.targets.len();
        self.targets.retain(|t| t.id != id);
        self.targets.len() != before
    }

    /// Mark every cached rectangle stale (scroll or viewport resize).
    pub fn invalidate_all(&mut self) {
        for target in &mut self.targets {
            target.stale = true;
        }
    }

    /// Mark one cached rectangle stale.
    pub fn invalidate(&mut self, id: &str) {
        if let Some(target) = self.targets.iter_mut().find(|t| t.id == id) {
            target.stale = true;
        }
    }

    pub fn has_stale(&self) -> bool {
        self.targets.iter().any(|t| t.stale)
    }

    /// Re-measure stale targets with the installed measure function.
    ///
    /// Targets whose element can no longer be measured are dropped. Without a
    /// measure function stale targets stay stale and never hit.
    pub fn refresh(&mut self) {
        let Some(measure) = &self.measure else {
            return;
        };
        self.targets.retain_mut(|target| {
            if !target.stale {
                return true;
            }
            match measure(&target.id) {
                Some(rect) => {
                    target.rect = rect;
                    target.stale = false;
                    true
                }
                None => {
                    log::debug!("Drop target {} vanished during refresh", target.id);
                    false
                }
            }
        });
    }

    /// Topmost target containing `point`, never `exclude`.
    pub fn hit_test(&self, point: Point, exclude: Option<&str>) -> Option<&DropTarget> {
        self.targets
            .iter()
            .rev()
            .filter(|t| Some(t.id.as_str()) != exclude)
            .find(|t| t.contains(point))
    }

    pub fn get(&self, id: &str) -> Option<&DropTarget> {
        self.targets.iter().find(|t| t.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DropTarget> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl std::fmt::Debug for DropTargetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DropTargetRegistry")
            .field("targets", &self.targets)
            .field("measure", &self.measure.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> DropTargetRegistry {
        let mut reg = DropTargetRegistry::new();
        reg.register("work", TargetKind::Folder, Rect::new(0.0, 0.0, 100.0, 100.0));
        reg.register("games", TargetKind::Folder, Rect::new(200.0, 0.0, 300.0, 100.0));
        reg
    }

    #[test]
    fn test_hit_test_containment() {
        let reg = registry();
        assert_eq!(reg.hit_test(Point::new(50.0, 50.0), None).unwrap().id, "work");
        assert_eq!(reg.hit_test(Point::new(250.0, 10.0), None).unwrap().id, "games");
        assert!(reg.hit_test(Point::new(150.0, 50.0), None).is_none());
    }

    #[test]
    fn test_hit_test_excludes_dragged_item() {
        let reg = registry();
        assert!(reg.hit_test(Point::new(50.0, 50.0), Some("work")).is_none());
    }

    #[test]
    fn test_topmost_wins_on_overlap() {
        let mut reg = registry();
        reg.register("inner", TargetKind::Folder, Rect::new(10.0, 10.0, 40.0, 40.0));
        assert_eq!(reg.hit_test(Point::new(20.0, 20.0), None).unwrap().id, "inner");
        // Excluding the top one falls through to the one beneath.
        assert_eq!(
            reg.hit_test(Point::new(20.0, 20.0), Some("inner")).unwrap().id,
            "work"
        );
    }

    #[test]
    fn test_unregister() {
        let mut reg = registry();
        assert!(reg.unregister("work"));
        assert!(!reg.unregister("work"));
        assert!(reg.hit_test(Point::new(50.0, 50.0), None).is_none());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_stale_targets_never_hit() {
        let mut reg = registry();
        reg.invalidate_all();
        assert!(reg.has_stale());
        assert!(reg.hit_test(Point::new(50.0, 50.0), None).is_none());

        // No measure function: refresh leaves them stale.
        reg.refresh();
        assert!(reg.has_stale());
    }

    #[test]
    fn test_refresh_remeasures_and_drops_vanished() {
        let mut reg = registry();
        reg.set_measure(|id| match id {
            "work" => Some(Rect::new(0.0, 500.0, 100.0, 600.0)),
            _ => None,
        });
        reg.invalidate_all();
        reg.refresh();

        assert!(!reg.has_stale());
        assert_eq!(reg.len(), 1);
        assert!(reg.hit_test(Point::new(50.0, 50.0), None).is_none());
        assert_eq!(reg.hit_test(Point::new(50.0, 550.0), None).unwrap().id, "work");
    }

    #[test]
    fn test_reregister_replaces_rect() {
        let mut reg = registry();
        reg.register("work", TargetKind::Folder, Rect::new(400.0, 400.0, 500.0, 500.0));
        assert_eq!(reg.len(), 2);
        assert!(reg.hit_test(Point::new(50.0, 50.0), None).is_none());
        assert_eq!(reg.get("work").unwrap().rect.x0, 400.0);
    }
}
