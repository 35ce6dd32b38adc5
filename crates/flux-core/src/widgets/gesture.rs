//! Move/resize gesture on a single widget.

use super::layout::WidgetLayout;
use super::store::{GestureMode, WidgetStore};
use crate::input::exceeds_threshold;
use kurbo::Point;

/// An in-flight widget move or resize.
///
/// Created on press, updated on every pointer move, and ended with
/// [`WidgetGesture::finish`] or [`WidgetGesture::cancel`].
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetGesture {
    widget: String,
    mode: GestureMode,
    press: Point,
    start: WidgetLayout,
    active: bool,
}

impl WidgetGesture {
    /// Start from a press at `press`, using the store's hit test to pick the
    /// widget and mode.
    pub fn begin(store: &mut WidgetStore, press: Point) -> Option<Self> {
        let (widget, mode) = store.hit_test(press)?;
        Self::begin_on(store, widget, mode, press)
    }

    /// Start a gesture on a known widget.
    pub fn begin_on(
        store: &mut WidgetStore,
        widget: String,
        mode: GestureMode,
        press: Point,
    ) -> Option<Self> {
        let start = store.layout(&widget)?;
        store.bring_to_front(&widget);
        Some(Self {
            widget,
            mode,
            press,
            start,
            active: false,
        })
    }

    pub fn widget(&self) -> &str {
        &self.widget
    }

    pub fn mode(&self) -> GestureMode {
        self.mode
    }

    /// Whether the pointer has moved past the threshold.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Apply a pointer move. Returns the new layout once the gesture is active.
    pub fn update(&mut self, store: &mut WidgetStore, pointer: Point) -> Option<WidgetLayout> {
        if !self.active {
            if !exceeds_threshold(self.press, pointer, store.config().drag_threshold) {
                return None;
            }
            self.active = true;
        }
        let delta = pointer - self.press;
        let layout = match self.mode {
            GestureMode::Move => store.drag(&self.widget, self.start, delta),
            GestureMode::Resize(handle) => store.resize(&self.widget, self.start, handle, delta),
        };
        Some(layout)
    }

    /// End the gesture at `pointer`. Returns the final layout if the widget
    /// changed.
    pub fn finish(mut self, store: &mut WidgetStore, pointer: Point) -> Option<WidgetLayout> {
        let layout = self.update(store, pointer)?;
        (layout != self.start).then_some(layout)
    }

    /// Abort and restore the layout from before the press.
    pub fn cancel(self, store: &mut WidgetStore) {
        store.set_layout(&self.widget, self.start);
    }
}
