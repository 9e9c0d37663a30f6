#![forbid(unsafe_code)]

//! Subscriber registry with RAII unsubscription.
//!
//! # Design
//!
//! [`Notifier<E>`] keeps its callbacks as `Weak` references; the strong `Rc`
//! lives inside the [`Subscription`] guard handed back to the subscriber.
//! Dropping the guard makes the callback unreachable, and the dead entry is
//! pruned lazily on the next [`Notifier::notify`].
//!
//! Callbacks are fallible. A failing subscriber does not stop the fan-out:
//! every live subscriber is still called and the first error is returned to
//! whoever triggered the notification.
//!
//! # Re-entrancy
//!
//! The registry borrow is released before any callback runs, so a callback
//! may subscribe, unsubscribe, or trigger further notifications (including on
//! the same notifier). Notification is synchronous: `notify` returns only after
//! every callback, and everything those callbacks triggered, has finished.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{trace, warn};

use crate::error::{Error, Result};

type CallbackRc<E> = Rc<dyn Fn(&E) -> Result<()>>;
type CallbackWeak<E> = Weak<dyn Fn(&E) -> Result<()>>;

/// Registration-ordered list of weakly-held subscriber callbacks.
pub struct Notifier<E> {
    subscribers: RefCell<Vec<CallbackWeak<E>>>,
}

impl<E> Default for Notifier<E> {
    fn default() -> Self {
        Self {
            subscribers: RefCell::new(Vec::new()),
        }
    }
}

impl<E> std::fmt::Debug for Notifier<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("subscriber_count", &self.subscribers.borrow().len())
            .finish()
    }
}

impl<E: 'static> Notifier<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. It stays registered for as long as the returned
    /// guard is alive.
    pub fn subscribe(&self, callback: impl Fn(&E) -> Result<()> + 'static) -> Subscription {
        let strong: CallbackRc<E> = Rc::new(callback);
        self.subscribers.borrow_mut().push(Rc::downgrade(&strong));
        // `Rc<dyn Fn>` cannot coerce to `Rc<dyn Any>`, so box the Rc itself.
        Subscription {
            guard: Some(Box::new(strong)),
        }
    }

    /// Number of registered callbacks, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    /// Whether at least one callback is still alive.
    #[must_use]
    pub fn has_live_subscribers(&self) -> bool {
        self.subscribers
            .borrow()
            .iter()
            .any(|w| w.strong_count() > 0)
    }

    /// Call every live subscriber with `event`, in registration order.
    ///
    /// Returns the first subscriber failure, after all subscribers ran.
    pub fn notify(&self, event: &E) -> Result<()> {
        let callbacks: Vec<CallbackRc<E>> = {
            let mut subscribers = self.subscribers.borrow_mut();
            subscribers.retain(|w| w.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };

        if callbacks.is_empty() {
            return Ok(());
        }
        trace!(subscribers = callbacks.len(), "notifier fan-out");

        let mut first_error: Option<Error> = None;
        for (position, callback) in callbacks.iter().enumerate() {
            if let Err(err) = callback(event) {
                warn!(position, error = %err, "subscriber failed during notification");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// RAII guard for a registered callback.
///
/// Dropping the guard releases the strong reference, so the notifier's
/// `Weak` entry stops upgrading.
pub struct Subscription {
    guard: Option<Box<dyn Any>>,
}

impl Subscription {
    /// A guard that holds nothing, for sources that never notify.
    #[must_use]
    pub fn detached() -> Self {
        Self { guard: None }
    }

    /// Whether this guard keeps a callback alive.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.guard.is_some()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.is_attached())
            .finish()
    }
}
