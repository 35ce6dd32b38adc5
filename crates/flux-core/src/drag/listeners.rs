//! Scoped global listener subscriptions.
//!
//! A gesture needs document-level pointer-move, pointer-up and key-down
//! listeners only while it is in flight. Each gesture holds a
//! [`Subscription`] guard; dropping the guard releases its listeners, so a
//! coordinator torn down mid-gesture cannot leak handlers.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Global listener kinds a gesture needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    PointerMove,
    PointerUp,
    KeyDown,
}

/// Listeners a drag gesture subscribes to.
pub const GESTURE_LISTENERS: [ListenerKind; 3] = [
    ListenerKind::PointerMove,
    ListenerKind::PointerUp,
    ListenerKind::KeyDown,
];

/// Called with `(kind, attached)` when a kind gains its first or loses its
/// last subscriber. Host adapters attach and detach real handlers here.
pub type ListenerHook = Rc<dyn Fn(ListenerKind, bool)>;

#[derive(Default)]
struct Inner {
    counts: HashMap<ListenerKind, usize>,
    hook: Option<ListenerHook>,
}

/// Reference-counted table of live listener kinds.
#[derive(Clone, Default)]
pub struct ListenerTable {
    inner: Rc<RefCell<Inner>>,
}

impl ListenerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table that reports attach/detach transitions to `hook`.
    pub fn with_hook(hook: impl Fn(ListenerKind, bool) + 'static) -> Self {
        let table = Self::default();
        table.inner.borrow_mut().hook = Some(Rc::new(hook));
        table
    }

    /// Acquire listeners for `kinds` until the returned guard is dropped.
    pub fn subscribe(&self, kinds: &[ListenerKind]) -> Subscription {
        let mut attached = Vec::new();
        let hook = {
            let mut inner = self.inner.borrow_mut();
            for &kind in kinds {
                let count = inner.counts.entry(kind).or_insert(0);
                *count += 1;
                if *count == 1 {
                    attached.push(kind);
                }
            }
            inner.hook.clone()
        };
        // Hook runs outside the borrow so it may inspect the table.
        if let Some(hook) = hook {
            for kind in attached {
                hook(kind, true);
            }
        }
        Subscription {
            table: Rc::downgrade(&self.inner),
            kinds: kinds.to_vec(),
        }
    }

    pub fn is_active(&self, kind: ListenerKind) -> bool {
        self.inner
            .borrow()
            .counts
            .get(&kind)
            .is_some_and(|&count| count > 0)
    }

    /// Total live subscriptions across all kinds.
    pub fn active_count(&self) -> usize {
        self.inner.borrow().counts.values().sum()
    }
}

impl std::fmt::Debug for ListenerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerTable")
            .field("counts", &self.inner.borrow().counts)
            .finish()
    }
}

/// Guard releasing its listeners on drop.
#[derive(Debug)]
pub struct Subscription {
    table: Weak<RefCell<Inner>>,
    kinds: Vec<ListenerKind>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(inner) = self.table.upgrade() else {
            return;
        };
        let mut detached = Vec::new();
        let hook = {
            let mut inner = inner.borrow_mut();
            for kind in &self.kinds {
                if let Some(count) = inner.counts.get_mut(kind) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        inner.counts.remove(kind);
                        detached.push(*kind);
                    }
                }
            }
            inner.hook.clone()
        };
        if let Some(hook) = hook {
            for kind in detached {
                hook(kind, false);
            }
        }
    }
}
