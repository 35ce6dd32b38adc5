//! Flux Core Library
//!
//! Platform-agnostic interaction and persistence logic for the Flux dashboard:
//! pointer drag-and-drop, widget geometry, toolbar ordering and the local
//! table store backing the desktop file system.

pub mod config;
pub mod desktop;
pub mod drag;
pub mod error;
pub mod input;
pub mod optimistic;
pub mod storage;
pub mod toolbar;
pub mod widgets;

pub use config::FluxConfig;
pub use desktop::{
    Desktop, DesktopState, DocumentKind, DocumentPatch, DocumentRecord, FolderRecord, ItemRef,
    PendingMove,
};
pub use drag::{
    DragCoordinator, DragEvent, DragItem, DragPhase, DropTarget, DropTargetRegistry, ItemKind,
    ListenerKind, ListenerTable, Overlay, TargetKind, DRAG_THRESHOLD_PX,
};
pub use error::{FluxError, FluxResult};
pub use input::{KeyEvent, MouseButton, PointerEvent};
pub use optimistic::{Optimistic, PendingId};
pub use storage::{KeyValueBackend, LocalDb, MemoryBackend, Record, StorageError, StorageResult};
pub use toolbar::{Toolbar, ToolbarSegment};
pub use widgets::{Viewport, WidgetGesture, WidgetLayout, WidgetStore, WidgetStyle};
