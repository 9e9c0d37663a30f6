#![forbid(unsafe_code)]

//! tmirror public facade crate.
//!
//! Keeps a derived sequence or tree in sync with a mutable source: every
//! source change is answered by a greedy, move-aware alignment pass, so
//! mirror elements that merely moved keep their identity.
//!
//! - [`Aligner`] edits a list until it matches a target sequence.
//! - [`ImitableCollection`] mirrors a [`SourceSequence`] and can be paused,
//!   resumed, and disposed.
//! - [`WrapperNode`] (feature `tree`) mirrors a hierarchical source lazily,
//!   one imitable collection per node.
//!
//! ```
//! use tmirror::prelude::*;
//!
//! let source: ObservableList<&str> = ["A", "B"].into_iter().collect();
//! let mirror = ImitableCollection::new(source.clone(), |s: &&str| s.to_lowercase()).unwrap();
//! source.push("C").unwrap();
//! assert_eq!(mirror.snapshot(), vec!["a", "b", "c"]);
//! ```

// --- Core re-exports -------------------------------------------------------

pub use tmirror_core::{
    AlignConfig, BoxError, ChangeAction, ChangeEvent, ConfigError, Error, MirrorConfig, Notifier,
    ObservableList, PropertyChange, Result, SourceSequence, Subscription, TreeConfig, TreeError,
    TreeNode,
};

// --- Alignment re-exports --------------------------------------------------

pub use tmirror_align::{AlignReport, Aligner, EditableList};

// --- Imitation re-exports --------------------------------------------------

pub use tmirror_imitate::{CollectionBuilder, Converted, ImitableCollection};

// --- Tree re-exports -------------------------------------------------------

#[cfg(feature = "tree")]
pub use tmirror_tree::{
    ChildSlot, Children, ClosureStrategy, TreeNodeStrategy, WrapStrategy, WrapperNode,
};

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Aligner, ChangeAction, ChangeEvent, Error, ImitableCollection, MirrorConfig,
        ObservableList, Result, SourceSequence, TreeNode,
    };

    #[cfg(feature = "tree")]
    pub use crate::{ChildSlot, TreeNodeStrategy, WrapStrategy, WrapperNode};

    pub use crate::{align, core, imitate};

    #[cfg(feature = "tree")]
    pub use crate::tree;
}

pub use tmirror_align as align;
pub use tmirror_core as core;
pub use tmirror_imitate as imitate;
#[cfg(feature = "tree")]
pub use tmirror_tree as tree;
