//! Pointer-based drag-and-drop.
//!
//! The [`DragCoordinator`] tracks one gesture at a time:
//!
//! - a press on an item records a *pending* gesture,
//! - moving past the threshold turns it into a drag,
//! - every move re-runs the hit test and moves the overlay,
//! - release or Escape ends it with exactly one [`DragEvent`].
//!
//! The coordinator never mutates application state; consumers react to the
//! terminal event.

mod frame;
mod listeners;
mod overlay;
mod targets;

pub use frame::FrameBatcher;
pub use listeners::{ListenerHook, ListenerKind, ListenerTable, Subscription, GESTURE_LISTENERS};
pub use overlay::Overlay;
pub use targets::{DropTarget, DropTargetRegistry, Measure, TargetKind};

use crate::config::FluxConfig;
use crate::input::{exceeds_threshold, KeyEvent, PointerEvent};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Movement threshold in pixels to start dragging.
pub const DRAG_THRESHOLD_PX: f64 = crate::config::DEFAULT_DRAG_THRESHOLD;

/// Kind of thing being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Folder,
    Document,
    Widget,
    Segment,
}

/// The item carried by a gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct DragItem {
    pub id: String,
    pub kind: ItemKind,
    pub title: String,
    /// Top-left of the item on screen when the gesture started.
    pub origin: Point,
}

impl DragItem {
    pub fn new(
        id: impl Into<String>,
        kind: ItemKind,
        title: impl Into<String>,
        origin: Point,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            origin,
        }
    }
}

/// Where the coordinator is in a gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum DragPhase {
    Idle,
    /// Pressed but not yet past the threshold.
    Pending { item: DragItem, press: Point },
    Dragging {
        item: DragItem,
        pointer: Point,
        hovered: Option<String>,
    },
}

/// Terminal event of a gesture. Exactly one is produced per gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum DragEvent {
    /// Released before crossing the threshold.
    Click { item: DragItem },
    /// Released over a drop target.
    Drop {
        item: DragItem,
        target: DropTarget,
        pointer: Point,
    },
    /// Released over empty space.
    Released { item: DragItem, pointer: Point },
    /// Aborted with Escape or [`DragCoordinator::cancel`].
    Cancelled { item: DragItem },
}

impl DragEvent {
    pub fn item(&self) -> &DragItem {
        match self {
            DragEvent::Click { item }
            | DragEvent::Drop { item, .. }
            | DragEvent::Released { item, .. }
            | DragEvent::Cancelled { item } => item,
        }
    }
}

/// Tracks a single in-flight pointer gesture.
#[derive(Debug)]
pub struct DragCoordinator {
    phase: DragPhase,
    threshold: f64,
    targets: DropTargetRegistry,
    listeners: ListenerTable,
    subscription: Option<Subscription>,
    frames: FrameBatcher,
    overlay: Option<Overlay>,
}

impl Default for DragCoordinator {
    fn default() -> Self {
        Self::new(&FluxConfig::default())
    }
}

impl DragCoordinator {
    pub fn new(config: &FluxConfig) -> Self {
        Self::with_listeners(config, ListenerTable::new())
    }

    /// Coordinator sharing a host-provided listener table.
    pub fn with_listeners(config: &FluxConfig, listeners: ListenerTable) -> Self {
        Self {
            phase: DragPhase::Idle,
            threshold: config.drag_threshold,
            targets: DropTargetRegistry::new(),
            listeners,
            subscription: None,
            frames: FrameBatcher::new(config.frame_batching),
            overlay: None,
        }
    }

    pub fn phase(&self) -> &DragPhase {
        &self.phase
    }

    /// Whether the threshold has been crossed.
    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging { .. })
    }

    /// Whether any gesture (pending or active) is in flight.
    pub fn is_active(&self) -> bool {
        !matches!(self.phase, DragPhase::Idle)
    }

    pub fn hovered_target(&self) -> Option<&str> {
        match &self.phase {
            DragPhase::Dragging { hovered, .. } => hovered.as_deref(),
            _ => None,
        }
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn targets(&self) -> &DropTargetRegistry {
        &self.targets
    }

    pub fn targets_mut(&mut self) -> &mut DropTargetRegistry {
        &mut self.targets
    }

    pub fn listeners(&self) -> &ListenerTable {
        &self.listeners
    }

    /// Whether the host should schedule an animation frame.
    pub fn needs_frame(&self) -> bool {
        self.frames.needs_frame()
    }

    /// Record a press on `item` at `press`. Ignored while another gesture is
    /// in flight.
    pub fn start_drag(&mut self, item: DragItem, press: Point) -> bool {
        if self.is_active() {
            log::debug!("Ignoring press on {}: gesture already in flight", item.id);
            return false;
        }
        log::debug!("Press on {} at ({}, {})", item.id, press.x, press.y);
        self.subscription = Some(self.listeners.subscribe(&GESTURE_LISTENERS));
        self.phase = DragPhase::Pending { item, press };
        true
    }

    /// Route a pointer event. Presses are ignored: gestures start through
    /// [`DragCoordinator::start_drag`], which knows the item. Only a release
    /// of the primary button ends a gesture.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Option<DragEvent> {
        match event {
            PointerEvent::Down { .. } => None,
            PointerEvent::Move { position } => {
                self.pointer_moved(position);
                None
            }
            PointerEvent::Up { position, .. } if event.is_primary() => {
                self.pointer_released(position)
            }
            PointerEvent::Up { .. } => None,
        }
    }

    /// Route a key event; Escape cancels.
    pub fn handle_key(&mut self, event: &KeyEvent) -> Option<DragEvent> {
        if event.is_escape() { self.cancel() } else { None }
    }

    pub fn pointer_moved(&mut self, position: Point) {
        if !self.is_active() {
            return;
        }
        if let Some(point) = self.frames.push(position) {
            self.process_move(point);
        }
    }

    /// Process the move buffered since the last frame.
    pub fn on_animation_frame(&mut self) {
        if let Some(point) = self.frames.take() {
            self.process_move(point);
        }
    }

    pub fn pointer_released(&mut self, position: Point) -> Option<DragEvent> {
        // The release position wins over anything still buffered.
        self.frames.clear();
        self.process_move(position);

        let event = match std::mem::replace(&mut self.phase, DragPhase::Idle) {
            DragPhase::Idle => return None,
            DragPhase::Pending { item, .. } => DragEvent::Click { item },
            DragPhase::Dragging {
                item,
                pointer,
                hovered,
            } => match hovered.and_then(|id| self.targets.get(&id).cloned()) {
                Some(target) => {
                    log::debug!("Dropped {} onto {}", item.id, target.id);
                    DragEvent::Drop {
                        item,
                        target,
                        pointer,
                    }
                }
                None => {
                    log::debug!("Released {} over empty space", item.id);
                    DragEvent::Released { item, pointer }
                }
            },
        };
        self.reset();
        Some(event)
    }

    /// Abort the gesture without a move.
    pub fn cancel(&mut self) -> Option<DragEvent> {
        let item = match std::mem::replace(&mut self.phase, DragPhase::Idle) {
            DragPhase::Idle => return None,
            DragPhase::Pending { item, .. } | DragPhase::Dragging { item, .. } => item,
        };
        log::debug!("Cancelled drag of {}", item.id);
        self.reset();
        Some(DragEvent::Cancelled { item })
    }

    fn reset(&mut self) {
        self.phase = DragPhase::Idle;
        self.overlay = None;
        self.frames.clear();
        self.subscription = None;
    }

    fn process_move(&mut self, position: Point) {
        if let DragPhase::Pending { item, press } = &self.phase {
            if !exceeds_threshold(*press, position, self.threshold) {
                return;
            }
            log::debug!("Drag started for {}", item.id);
            self.overlay = Some(Overlay::new(item, *press));
            self.phase = DragPhase::Dragging {
                item: item.clone(),
                pointer: position,
                hovered: None,
            };
        }

        if self.targets.has_stale() {
            self.targets.refresh();
        }

        if let DragPhase::Dragging {
            item,
            pointer,
            hovered,
        } = &mut self.phase
        {
            *pointer = position;
            *hovered = self
                .targets
                .hit_test(position, Some(&item.id))
                .map(|t| t.id.clone());
            if let Some(overlay) = &mut self.overlay {
                overlay.follow(position);
                overlay.hovered = hovered.clone();
            }
        }
    }
}
