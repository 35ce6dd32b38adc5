//! Optimistic state with explicit confirmation and rollback.
//!
//! Changes are applied to the visible state immediately and kept as
//! tentative until the caller confirms or rolls them back. Rolling back one
//! change rebuilds the visible state from the confirmed state plus the
//! remaining tentative changes, so unrelated in-flight changes survive.

use std::fmt;

/// Handle to a tentative change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingId(u64);

type Change<S> = Box<dyn Fn(&mut S)>;

/// State split into a confirmed part and a tentative overlay.
pub struct Optimistic<S: Clone> {
    confirmed: S,
    current: S,
    pending: Vec<(PendingId, Change<S>)>,
    next_id: u64,
}

impl<S: Clone> Optimistic<S> {
    /// Wrap an already-confirmed state.
    pub fn new(state: S) -> Self {
        Self {
            current: state.clone(),
            confirmed: state,
            pending: Vec::new(),
            next_id: 0,
        }
    }

    /// Visible state, including tentative changes.
    pub fn state(&self) -> &S {
        &self.current
    }

    /// State as of the last confirmation.
    pub fn confirmed(&self) -> &S {
        &self.confirmed
    }

    /// Apply a tentative change.
    ///
    /// The change may be replayed on rollback of an earlier change, so it
    /// must only depend on the state it is given.
    pub fn apply(&mut self, change: impl Fn(&mut S) + 'static) -> PendingId {
        let id = PendingId(self.next_id);
        self.next_id += 1;
        change(&mut self.current);
        self.pending.push((id, Box::new(change)));
        id
    }

    /// Make a tentative change durable. Returns false for an unknown id.
    pub fn confirm(&mut self, id: PendingId) -> bool {
        let Some(index) = self.pending.iter().position(|(p, _)| *p == id) else {
            return false;
        };
        let (_, change) = self.pending.remove(index);
        change(&mut self.confirmed);
        true
    }

    /// Discard a tentative change. Returns false for an unknown id.
    pub fn rollback(&mut self, id: PendingId) -> bool {
        let Some(index) = self.pending.iter().position(|(p, _)| *p == id) else {
            return false;
        };
        self.pending.remove(index);
        self.current = self.confirmed.clone();
        for (_, change) in &self.pending {
            change(&mut self.current);
        }
        true
    }

    pub fn is_pending(&self, id: PendingId) -> bool {
        self.pending.iter().any(|(p, _)| *p == id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Replace the state wholesale, dropping every tentative change.
    pub fn reset(&mut self, state: S) {
        self.current = state.clone();
        self.confirmed = state;
        self.pending.clear();
    }
}

impl<S: Clone + fmt::Debug> fmt::Debug for Optimistic<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Optimistic")
            .field("confirmed", &self.confirmed)
            .field("current", &self.current)
            .field("pending", &self.pending.len())
            .finish()
    }
}
