//! Undo registration
//!
//! [`StoreRef::send_with_undo`] computes an action's inverse from the state
//! the action is about to change and hands it to an [`UndoSink`]. The sink
//! is shared (`Rc<RefCell<_>>`) because registration happens inside the
//! drain, which may be later than the call. Hosts with their own undo
//! manager implement the sink; [`UndoStack`] is a small in-process one.

use std::collections::VecDeque;
use std::fmt;

use crate::action::BoxedAction;
use crate::handle::StoreRef;

/// Receiver for inverse actions
pub trait UndoSink<S, C> {
    /// Store an inverse so it can be sent later
    fn register_undo(&mut self, name: &'static str, inverse: BoxedAction<S, C>);
}

struct Entry<S, C> {
    name: &'static str,
    inverse: BoxedAction<S, C>,
}

/// Last-in, first-out stack of inverse actions
pub struct UndoStack<S, C = ()> {
    entries: VecDeque<Entry<S, C>>,
    limit: Option<usize>,
}

impl<S: 'static, C: 'static> UndoStack<S, C> {
    /// Create an unbounded stack
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            limit: None,
        }
    }

    /// Create a stack that forgets its oldest entries beyond `limit`
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit),
            limit: Some(limit),
        }
    }

    /// Number of undoable steps
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there is nothing to undo
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name of the step [`undo`](Self::undo) would revert
    pub fn peek_name(&self) -> Option<&'static str> {
        self.entries.back().map(|entry| entry.name)
    }

    /// Send the most recent inverse to `store`. Returns `false` if the stack
    /// was empty.
    pub fn undo(&mut self, store: &StoreRef<S, C>) -> bool {
        match self.entries.pop_back() {
            Some(entry) => {
                tracing::debug!(action = entry.name, "Undoing");
                store.send_named(entry.name, entry.inverse);
                true
            }
            None => false,
        }
    }

    /// Forget every step
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<S: 'static, C: 'static> Default for UndoStack<S, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, C> UndoSink<S, C> for UndoStack<S, C> {
    fn register_undo(&mut self, name: &'static str, inverse: BoxedAction<S, C>) {
        if self.limit == Some(0) {
            return;
        }
        if let Some(limit) = self.limit {
            while self.entries.len() >= limit {
                self.entries.pop_front();
            }
        }
        self.entries.push_back(Entry { name, inverse });
    }
}

impl<S, C> fmt::Debug for UndoStack<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoStack")
            .field("entries", &self.entries.len())
            .field("limit", &self.limit)
            .finish()
    }
}
