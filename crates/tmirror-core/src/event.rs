#![forbid(unsafe_code)]

//! Structured change events raised by change-notifying sequences.
//!
//! Both source sequences ([`crate::list::ObservableList`]) and derived mirror
//! sequences emit the same [`ChangeEvent`] shape, so a consumer can stack
//! further mirrors on top without telling "real" and derived sequences apart.

use std::fmt;

/// What kind of structural edit a [`ChangeEvent`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    Add,
    Remove,
    Replace,
    Move,
    /// The sequence changed wholesale (typically cleared).
    Reset,
}

/// One structural edit of an ordered sequence.
///
/// | action    | `new_items` | `new_index` | `old_items` | `old_index` |
/// |-----------|-------------|-------------|-------------|-------------|
/// | `Add`     | added       | insert pos  | -           | -           |
/// | `Remove`  | -           | -           | removed     | removed pos |
/// | `Replace` | new value   | pos         | old value   | pos         |
/// | `Move`    | moved       | target pos  | moved       | source pos  |
/// | `Reset`   | -           | -           | -           | -           |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent<T> {
    pub action: ChangeAction,
    pub new_items: Vec<T>,
    pub new_index: Option<usize>,
    pub old_items: Vec<T>,
    pub old_index: Option<usize>,
}

impl<T> ChangeEvent<T> {
    #[must_use]
    pub fn add(item: T, index: usize) -> Self {
        Self {
            action: ChangeAction::Add,
            new_items: vec![item],
            new_index: Some(index),
            old_items: Vec::new(),
            old_index: None,
        }
    }

    #[must_use]
    pub fn remove(item: T, index: usize) -> Self {
        Self {
            action: ChangeAction::Remove,
            new_items: Vec::new(),
            new_index: None,
            old_items: vec![item],
            old_index: Some(index),
        }
    }

    #[must_use]
    pub fn replace(new_item: T, old_item: T, index: usize) -> Self {
        Self {
            action: ChangeAction::Replace,
            new_items: vec![new_item],
            new_index: Some(index),
            old_items: vec![old_item],
            old_index: Some(index),
        }
    }

    /// A move of `item` from `from` to `to`. The item is listed on both sides.
    #[must_use]
    pub fn moved(item: T, from: usize, to: usize) -> Self
    where
        T: Clone,
    {
        Self {
            action: ChangeAction::Move,
            new_items: vec![item.clone()],
            new_index: Some(to),
            old_items: vec![item],
            old_index: Some(from),
        }
    }

    #[must_use]
    pub fn reset() -> Self {
        Self {
            action: ChangeAction::Reset,
            new_items: Vec::new(),
            new_index: None,
            old_items: Vec::new(),
            old_index: None,
        }
    }

    /// Convert the payload while keeping action and positions.
    #[must_use]
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> ChangeEvent<U> {
        ChangeEvent {
            action: self.action,
            new_items: self.new_items.into_iter().map(&mut f).collect(),
            new_index: self.new_index,
            old_items: self.old_items.into_iter().map(&mut f).collect(),
            old_index: self.old_index,
        }
    }

    #[must_use]
    pub fn is_reset(&self) -> bool {
        self.action == ChangeAction::Reset
    }
}

/// Name of a non-structural property that changed on a sequence or node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyChange {
    /// Element count of a sequence.
    Count,
    /// Indexer contents of a sequence.
    Items,
    /// Parent back-reference of a wrapper node.
    Parent,
    /// Imitating flag of a wrapper node.
    Imitating,
}

impl fmt::Display for PropertyChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Count => "Count",
            Self::Items => "Items[]",
            Self::Parent => "Parent",
            Self::Imitating => "IsImitating",
        };
        f.write_str(name)
    }
}
