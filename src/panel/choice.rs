use std::ops::{Deref, DerefMut};

/// An ordered list of labelled choices with at most one of them selected, like the model of a
/// combo box.
///
/// Changing the selection queues a notification, which the owner collects with
/// [`take_changes`](ChoiceList::take_changes) and treats as a user selection. Changes made through
/// the guard returned by [`block_signals`](ChoiceList::block_signals) queue nothing, which is how
/// the list is rebuilt without reporting every intermediate selection.
#[derive(Debug, Clone)]
pub struct ChoiceList<T> {
    entries: Vec<(String, T)>,
    current: Option<usize>,
    blocked: bool,
    changes: Vec<usize>,
}

impl<T> ChoiceList<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            current: None,
            blocked: false,
            changes: Vec::new(),
        }
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The labels of all the choices, in order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(label, _)| label.as_str())
    }

    /// The values of all the choices, in order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, value)| value)
    }

    #[allow(missing_docs)]
    pub fn label(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|(label, _)| label.as_str())
    }

    #[allow(missing_docs)]
    pub fn value(&self, index: usize) -> Option<&T> {
        self.entries.get(index).map(|(_, value)| value)
    }

    /// The index of the selected choice.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// The value of the selected choice.
    pub fn current_value(&self) -> Option<&T> {
        self.current.and_then(|index| self.value(index))
    }

    /// The index of the first choice whose value satisfies the predicate.
    pub fn position<P: FnMut(&T) -> bool>(&self, mut predicate: P) -> Option<usize> {
        self.entries.iter().position(|(_, value)| predicate(value))
    }

    /// Appends a choice. Appending to an empty list selects the new choice.
    pub fn push<S: Into<String>>(&mut self, label: S, value: T) {
        self.entries.push((label.into(), value));
        if self.current.is_none() {
            self.select(self.entries.len() - 1);
        }
    }

    /// Removes all the choices, leaving nothing selected.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current = None;
    }

    /// Selects the choice at the given index. Returns `false` and changes nothing if there is no
    /// such choice.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.entries.len() {
            return false;
        }
        if self.current != Some(index) {
            self.current = Some(index);
            if !self.blocked {
                self.changes.push(index);
            }
        }
        true
    }

    /// Leaves nothing selected.
    pub fn clear_selection(&mut self) {
        self.current = None;
    }

    /// Returns the selections made since the last call, oldest first.
    pub fn take_changes(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.changes)
    }

    /// Suspends change notifications until the returned guard is dropped.
    pub fn block_signals(&mut self) -> SignalBlocker<'_, T> {
        let was_blocked = std::mem::replace(&mut self.blocked, true);
        SignalBlocker {
            list: self,
            was_blocked,
        }
    }
}

impl<T> Default for ChoiceList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Gives access to a [`ChoiceList`] while its change notifications are suspended.
pub struct SignalBlocker<'a, T> {
    list: &'a mut ChoiceList<T>,
    was_blocked: bool,
}

impl<T> Deref for SignalBlocker<'_, T> {
    type Target = ChoiceList<T>;
    fn deref(&self) -> &Self::Target {
        self.list
    }
}

impl<T> DerefMut for SignalBlocker<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.list
    }
}

impl<T> Drop for SignalBlocker<'_, T> {
    fn drop(&mut self) {
        self.list.blocked = self.was_blocked;
    }
}
