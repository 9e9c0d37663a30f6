#![forbid(unsafe_code)]

//! The boundary a mirror consumes: an ordered, optionally change-notifying
//! sequence.

use std::rc::Rc;

use crate::error::Result;
use crate::event::{ChangeEvent, PropertyChange};
use crate::list::ObservableList;
use crate::notify::Subscription;

pub type ChangeCallback<S> = Rc<dyn Fn(&ChangeEvent<S>) -> Result<()>>;
pub type PropertyCallback = Rc<dyn Fn(&PropertyChange) -> Result<()>>;

/// An ordered sequence a mirror can read and, when supported, watch.
///
/// A sequence that cannot notify returns `None` from [`watch`](Self::watch);
/// mirrors over it are synchronized once, when imitation starts, and never
/// again until imitation is restarted.
pub trait SourceSequence<S> {
    /// Current contents, in order.
    fn snapshot(&self) -> Vec<S>;

    /// Register for structural change events.
    fn watch(&self, on_change: ChangeCallback<S>) -> Option<Subscription>;

    /// Register for property-change notifications, if the sequence has any.
    fn watch_properties(&self, _on_property: PropertyCallback) -> Option<Subscription> {
        None
    }
}

impl<S: Clone + 'static> SourceSequence<S> for ObservableList<S> {
    fn snapshot(&self) -> Vec<S> {
        ObservableList::snapshot(self)
    }

    fn watch(&self, on_change: ChangeCallback<S>) -> Option<Subscription> {
        Some(self.subscribe(move |event| on_change(event)))
    }

    fn watch_properties(&self, on_property: PropertyCallback) -> Option<Subscription> {
        Some(self.subscribe_properties(move |property| on_property(property)))
    }
}

impl<S: Clone> SourceSequence<S> for Vec<S> {
    fn snapshot(&self) -> Vec<S> {
        self.clone()
    }

    fn watch(&self, _on_change: ChangeCallback<S>) -> Option<Subscription> {
        None
    }
}

impl<S, Q: SourceSequence<S> + ?Sized> SourceSequence<S> for Rc<Q> {
    fn snapshot(&self) -> Vec<S> {
        (**self).snapshot()
    }

    fn watch(&self, on_change: ChangeCallback<S>) -> Option<Subscription> {
        (**self).watch(on_change)
    }

    fn watch_properties(&self, on_property: PropertyCallback) -> Option<Subscription> {
        (**self).watch_properties(on_property)
    }
}
