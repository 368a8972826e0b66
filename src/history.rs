//! BoundedStack<T> — a fixed-capacity LIFO store.
//!
//! Backs the undo and redo histories: one instance per direction, per
//! session. Storage is a contiguous `Vec` whose length is the top-of-stack
//! index plus one, so push and pop are O(1) with no key churn.
//!
//! Exceeding capacity or popping empty are hard errors, not silent drops —
//! they surface unexpected unbounded growth and caller-logic bugs.

use crate::error::HistoryError;

/// Default capacity, sized well above realistic per-session mutation counts.
pub const DEFAULT_CAPACITY: usize = 100;

/// A bounded last-in-first-out stack.
#[derive(Debug, Clone)]
pub struct BoundedStack<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> BoundedStack<T> {
    /// Create an empty stack with [`DEFAULT_CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty stack holding at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            capacity,
        }
    }

    /// Append to the top. Fails with [`HistoryError::Overflow`] if the stack
    /// is already at capacity; the stack is unchanged on failure.
    pub fn push(&mut self, item: T) -> Result<(), HistoryError> {
        if self.items.len() == self.capacity {
            return Err(HistoryError::Overflow {
                capacity: self.capacity,
            });
        }
        self.items.push(item);
        Ok(())
    }

    /// Remove and return the top entry. Fails with
    /// [`HistoryError::Underflow`] if empty.
    pub fn pop(&mut self) -> Result<T, HistoryError> {
        self.items.pop().ok_or(HistoryError::Underflow)
    }

    /// Return the top entry without removing it; same underflow failure.
    pub fn peek(&self) -> Result<&T, HistoryError> {
        self.items.last().ok_or(HistoryError::Underflow)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Current count, `0 <= len <= capacity`.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Remove all entries; always succeeds.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> Default for BoundedStack<T> {
    fn default() -> Self {
        Self::new()
    }
}
