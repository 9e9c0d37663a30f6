#![forbid(unsafe_code)]

//! Change-notifying ordered list used as a mirroring source.
//!
//! # Design
//!
//! [`ObservableList<T>`] keeps its items in shared, reference-counted storage.
//! Cloning the handle shares the same list, subscribers and version counter.
//! Every mutation raises exactly one [`ChangeEvent`], followed by the
//! [`PropertyChange::Count`] (when the length changed) and
//! [`PropertyChange::Items`] property notifications.
//!
//! # Invariants
//!
//! 1. `version` increments by exactly 1 per structural mutation.
//! 2. Subscribers observe the list already mutated: reading the list from a
//!    callback returns the post-edit state.
//! 3. No-op edits (`move_item(i, i)`, `clear()` on an empty list) raise nothing.
//!
//! # Failure Modes
//!
//! - Subscriber failures are returned from the mutating call after every
//!   subscriber ran. The mutation itself is not rolled back.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::event::{ChangeEvent, PropertyChange};
use crate::notify::{Notifier, Subscription};

struct ListInner<T> {
    items: RefCell<Vec<T>>,
    version: Cell<u64>,
    changes: Notifier<ChangeEvent<T>>,
    properties: Notifier<PropertyChange>,
}

/// A shared, version-tracked list with structural change notification.
pub struct ObservableList<T> {
    inner: Rc<ListInner<T>>,
}

impl<T> Clone for ObservableList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug + 'static> std::fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableList")
            .field("items", &self.inner.items.borrow())
            .field("version", &self.inner.version.get())
            .field("subscriber_count", &self.inner.changes.subscriber_count())
            .finish()
    }
}

impl<T: Clone + 'static> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> FromIterator<T> for ObservableList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T: Clone + 'static> ObservableList<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            inner: Rc::new(ListInner {
                items: RefCell::new(items),
                version: Cell::new(0),
                changes: Notifier::new(),
                properties: Notifier::new(),
            }),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.items.borrow().get(index).cloned()
    }

    /// Clone of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        self.inner.items.borrow().clone()
    }

    /// Borrow the contents without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.inner.items.borrow())
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Whether both handles share the same storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn index_of(&self, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.inner.items.borrow().iter().position(|x| x == item)
    }

    pub fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.index_of(item).is_some()
    }

    pub fn push(&self, item: T) -> Result<()> {
        let index = self.len();
        self.insert(index, item)
    }

    pub fn insert(&self, index: usize, item: T) -> Result<()> {
        let event = {
            let mut items = self.inner.items.borrow_mut();
            if index > items.len() {
                return Err(Error::IndexOutOfBounds {
                    index,
                    len: items.len(),
                });
            }
            items.insert(index, item.clone());
            ChangeEvent::add(item, index)
        };
        self.publish(&event, true)
    }

    pub fn remove_at(&self, index: usize) -> Result<T> {
        let removed = {
            let mut items = self.inner.items.borrow_mut();
            if index >= items.len() {
                return Err(Error::IndexOutOfBounds {
                    index,
                    len: items.len(),
                });
            }
            items.remove(index)
        };
        self.publish(&ChangeEvent::remove(removed.clone(), index), true)?;
        Ok(removed)
    }

    /// Remove the first element equal to `item`. Returns whether one was found.
    pub fn remove(&self, item: &T) -> Result<bool>
    where
        T: PartialEq,
    {
        match self.index_of(item) {
            Some(index) => self.remove_at(index).map(|_| true),
            None => Ok(false),
        }
    }

    /// Replace the element at `index`, returning the previous one.
    pub fn replace(&self, index: usize, item: T) -> Result<T> {
        let old = {
            let mut items = self.inner.items.borrow_mut();
            let len = items.len();
            let slot = items
                .get_mut(index)
                .ok_or(Error::IndexOutOfBounds { index, len })?;
            std::mem::replace(slot, item.clone())
        };
        self.publish(&ChangeEvent::replace(item, old.clone(), index), false)?;
        Ok(old)
    }

    /// Move the element at `from` so that it ends up at `to`.
    pub fn move_item(&self, from: usize, to: usize) -> Result<()> {
        let event = {
            let mut items = self.inner.items.borrow_mut();
            let len = items.len();
            if from >= len || to >= len {
                return Err(Error::IndexOutOfBounds {
                    index: from.max(to),
                    len,
                });
            }
            if from == to {
                return Ok(());
            }
            let item = items.remove(from);
            items.insert(to, item.clone());
            ChangeEvent::moved(item, from, to)
        };
        self.publish(&event, false)
    }

    pub fn clear(&self) -> Result<()> {
        {
            let mut items = self.inner.items.borrow_mut();
            if items.is_empty() {
                return Ok(());
            }
            items.clear();
        }
        self.publish(&ChangeEvent::reset(), true)
    }

    /// Subscribe to structural changes.
    pub fn subscribe(
        &self,
        callback: impl Fn(&ChangeEvent<T>) -> Result<()> + 'static,
    ) -> Subscription {
        self.inner.changes.subscribe(callback)
    }

    /// Subscribe to `Count` / `Items` property notifications.
    pub fn subscribe_properties(
        &self,
        callback: impl Fn(&PropertyChange) -> Result<()> + 'static,
    ) -> Subscription {
        self.inner.properties.subscribe(callback)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.changes.subscriber_count()
    }

    fn publish(&self, event: &ChangeEvent<T>, count_changed: bool) -> Result<()> {
        self.inner.version.set(self.inner.version.get() + 1);
        let structural = self.inner.changes.notify(event);
        let count = if count_changed {
            self.inner.properties.notify(&PropertyChange::Count)
        } else {
            Ok(())
        };
        let items = self.inner.properties.notify(&PropertyChange::Items);
        structural.and(count).and(items)
    }
}
