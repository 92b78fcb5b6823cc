//! Linear undo/redo history of full-state snapshots.
//!
//! The history is a sequence of snapshots with a cursor. The snapshot at the
//! cursor always equals the live state right after a mutation; undo and redo
//! just move the cursor and hand back a copy of the snapshot there.

use std::collections::VecDeque;

use crate::constants::MAX_HISTORY_SNAPSHOTS;

/// Bounded snapshot history.
///
/// Invariant: never empty, and `cursor < snapshots.len()`.
#[derive(Debug, Clone)]
pub struct SnapshotHistory<T: Clone> {
    snapshots: VecDeque<T>,
    cursor: usize,
    max_snapshots: usize,
}

impl<T: Clone + Default> Default for SnapshotHistory<T> {
    fn default() -> Self {
        Self::new(T::default(), MAX_HISTORY_SNAPSHOTS)
    }
}

impl<T: Clone> SnapshotHistory<T> {
    /// Create a history holding only `initial`.
    ///
    /// `max_snapshots` is raised to 1 if zero.
    pub fn new(initial: T, max_snapshots: usize) -> Self {
        let mut snapshots = VecDeque::new();
        snapshots.push_back(initial);
        Self {
            snapshots,
            cursor: 0,
            max_snapshots: max_snapshots.max(1),
        }
    }

    /// Record a new state.
    ///
    /// Drops any redo tail, appends `state`, moves the cursor onto it and
    /// evicts the oldest snapshot when over capacity.
    pub fn push(&mut self, state: T) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push_back(state);
        self.cursor = self.snapshots.len() - 1;

        while self.snapshots.len() > self.max_snapshots {
            self.snapshots.pop_front();
            self.cursor -= 1;
        }
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// Step back; returns a copy of the snapshot now at the cursor.
    pub fn undo(&mut self) -> Option<T> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.snapshots.get(self.cursor).cloned()
    }

    /// Step forward; returns a copy of the snapshot now at the cursor.
    pub fn redo(&mut self) -> Option<T> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.snapshots.get(self.cursor).cloned()
    }

    /// Snapshot at the cursor.
    pub fn current(&self) -> Option<&T> {
        self.snapshots.get(self.cursor)
    }

    /// Discard everything and start over from `initial`.
    pub fn reset(&mut self, initial: T) {
        self.snapshots.clear();
        self.snapshots.push_back(initial);
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn max_snapshots(&self) -> usize {
        self.max_snapshots
    }

    /// Number of undo steps available.
    pub fn undo_count(&self) -> usize {
        self.cursor
    }

    /// Number of redo steps available.
    pub fn redo_count(&self) -> usize {
        self.snapshots.len() - 1 - self.cursor
    }
}
