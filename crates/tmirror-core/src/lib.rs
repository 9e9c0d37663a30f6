#![forbid(unsafe_code)]

//! tmirror core primitives.
//!
//! This crate holds everything the mirroring engine consumes or emits at its
//! boundary:
//!
//! - [`ChangeEvent`] / [`PropertyChange`] - the structured notification shape
//!   shared by source and mirror sequences.
//! - [`Notifier`] / [`Subscription`] - synchronous, weakly-held subscriber
//!   registry with RAII unsubscription.
//! - [`ObservableList`] - a change-notifying list, the canonical source.
//! - [`SourceSequence`] - the trait mirrors are built over.
//! - [`TreeNode`] - a plain mutable source tree.
//! - [`Error`] - the error taxonomy, and [`MirrorConfig`] for tuning.
//!
//! # Threading
//!
//! Everything here is single-threaded (`Rc`/`RefCell`). Notifications are
//! delivered synchronously through ordinary call-stack recursion.

pub mod config;
pub mod error;
pub mod event;
pub mod list;
pub mod node;
pub mod notify;
pub mod source;

pub use config::{AlignConfig, ConfigError, MirrorConfig, TreeConfig, VERIFY_ENV_VAR};
pub use error::{BoxError, Error, Result, TreeError};
pub use event::{ChangeAction, ChangeEvent, PropertyChange};
pub use list::ObservableList;
pub use node::TreeNode;
pub use notify::{Notifier, Subscription};
pub use source::{ChangeCallback, PropertyCallback, SourceSequence};
