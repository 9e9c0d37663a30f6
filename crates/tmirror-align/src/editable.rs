#![forbid(unsafe_code)]

//! The edit seam the aligner drives.
//!
//! Every structural edit the aligner performs goes through [`EditableList`],
//! so the same algorithm drives a plain `Vec` and a change-notifying
//! [`ObservableList`] (where each edit raises exactly one change event).

use tmirror_core::{ObservableList, Result};

/// An ordered collection supporting positional edits.
pub trait EditableList {
    type Item;

    fn item_count(&self) -> usize;

    /// Run `f` on the item at `index`. Panics if `index` is out of bounds.
    fn with_item<R>(&self, index: usize, f: impl FnOnce(&Self::Item) -> R) -> R;

    fn insert_item(&mut self, index: usize, item: Self::Item) -> Result<()>;

    fn replace_item(&mut self, index: usize, item: Self::Item) -> Result<Self::Item>;

    fn remove_item(&mut self, index: usize) -> Result<Self::Item>;

    /// Move the item at `from` so that it ends up at `to`.
    fn move_item(&mut self, from: usize, to: usize) -> Result<()>;

    /// Remove everything in one edit, returning the removed items in order.
    fn clear_items(&mut self) -> Result<Vec<Self::Item>>;
}

impl<T> EditableList for Vec<T> {
    type Item = T;

    fn item_count(&self) -> usize {
        self.len()
    }

    fn with_item<R>(&self, index: usize, f: impl FnOnce(&T) -> R) -> R {
        f(&self[index])
    }

    fn insert_item(&mut self, index: usize, item: T) -> Result<()> {
        self.insert(index, item);
        Ok(())
    }

    fn replace_item(&mut self, index: usize, item: T) -> Result<T> {
        Ok(std::mem::replace(&mut self[index], item))
    }

    fn remove_item(&mut self, index: usize) -> Result<T> {
        Ok(self.remove(index))
    }

    fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        let item = self.remove(from);
        self.insert(to, item);
        Ok(())
    }

    fn clear_items(&mut self) -> Result<Vec<T>> {
        Ok(std::mem::take(self))
    }
}

impl<T: Clone + 'static> EditableList for ObservableList<T> {
    type Item = T;

    fn item_count(&self) -> usize {
        self.len()
    }

    fn with_item<R>(&self, index: usize, f: impl FnOnce(&T) -> R) -> R {
        self.with(|items| f(&items[index]))
    }

    fn insert_item(&mut self, index: usize, item: T) -> Result<()> {
        self.insert(index, item)
    }

    fn replace_item(&mut self, index: usize, item: T) -> Result<T> {
        self.replace(index, item)
    }

    fn remove_item(&mut self, index: usize) -> Result<T> {
        self.remove_at(index)
    }

    fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        ObservableList::move_item(self, from, to)
    }

    fn clear_items(&mut self) -> Result<Vec<T>> {
        let removed = self.snapshot();
        self.clear()?;
        Ok(removed)
    }
}
