//! Draggable, resizable dashboard widgets.
//!
//! - [`WidgetStore`] holds layout and style per widget and persists them
//! - [`WidgetGesture`] turns pointer events into moves and resizes
//! - every stored layout is clamped into the current [`Viewport`]

mod gesture;
mod handles;
mod layout;
mod store;
mod style;

pub use gesture::WidgetGesture;
pub use handles::{hit_test_handle, ResizeHandle, HANDLE_HIT_TOLERANCE};
pub use layout::{move_layout, resize_layout, snap, LayoutRules, Viewport, WidgetLayout};
pub use store::{GestureMode, WidgetStore, LAYOUTS_KEY, STYLES_KEY};
pub use style::{ResolvedStyle, StyleField, WidgetStyle};
