#![forbid(unsafe_code)]

//! Source/mirror pairs and the edit adapter that turns aligner edits on the
//! pair list into mirror-side change events.

use tmirror_align::EditableList;
use tmirror_core::{ChangeEvent, Result};

/// One mirrored source element and the mirror value generated for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converted<S, T> {
    pub before: S,
    pub after: T,
}

/// Pair list under alignment. Every edit is applied to `pairs` and recorded
/// as a [`ChangeEvent`] over the mirror values, to be published once the
/// pass releases its borrows.
pub(crate) struct PairEdits<'a, S, T> {
    pub(crate) pairs: &'a mut Vec<Converted<S, T>>,
    pub(crate) events: &'a mut Vec<ChangeEvent<T>>,
}

impl<S, T: Clone> EditableList for PairEdits<'_, S, T> {
    type Item = Converted<S, T>;

    fn item_count(&self) -> usize {
        self.pairs.len()
    }

    fn with_item<R>(&self, index: usize, f: impl FnOnce(&Converted<S, T>) -> R) -> R {
        f(&self.pairs[index])
    }

    fn insert_item(&mut self, index: usize, item: Converted<S, T>) -> Result<()> {
        self.events.push(ChangeEvent::add(item.after.clone(), index));
        self.pairs.insert(index, item);
        Ok(())
    }

    fn replace_item(&mut self, index: usize, item: Converted<S, T>) -> Result<Converted<S, T>> {
        let new_after = item.after.clone();
        let old = std::mem::replace(&mut self.pairs[index], item);
        self.events
            .push(ChangeEvent::replace(new_after, old.after.clone(), index));
        Ok(old)
    }

    fn remove_item(&mut self, index: usize) -> Result<Converted<S, T>> {
        let old = self.pairs.remove(index);
        self.events.push(ChangeEvent::remove(old.after.clone(), index));
        Ok(old)
    }

    fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        let pair = self.pairs.remove(from);
        self.events
            .push(ChangeEvent::moved(pair.after.clone(), from, to));
        self.pairs.insert(to, pair);
        Ok(())
    }

    fn clear_items(&mut self) -> Result<Vec<Converted<S, T>>> {
        self.events.push(ChangeEvent::reset());
        Ok(std::mem::take(self.pairs))
    }
}
