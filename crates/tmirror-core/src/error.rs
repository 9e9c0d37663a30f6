#![forbid(unsafe_code)]

//! Error taxonomy shared by every tmirror crate.
//!
//! - [`Error::Disposed`]: a lifecycle operation reached a collection or node
//!   after its teardown completed. Always a caller ordering bug.
//! - [`Error::Generator`]: a caller-supplied conversion failed while building
//!   a mirror element. Never retried; the caller may catch it and skip the
//!   offending source element.
//! - [`Error::Tree`]: the plain source tree rejected a structural edit.
//!
//! Alignment contract violations are not represented here. They are internal
//! invariant breaks and trip assertions instead.

use thiserror::Error;

use crate::config::ConfigError;

/// Carrier for failures raised by caller-supplied generators.
pub type BoxError = Box<dyn std::error::Error + 'static>;

/// Standard result type for tmirror APIs.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{what} was used after it was disposed")]
    Disposed { what: &'static str },

    #[error("{}: {source}", generator_context(.absent_input))]
    Generator {
        absent_input: bool,
        #[source]
        source: BoxError,
    },

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

fn generator_context(absent_input: &bool) -> &'static str {
    if *absent_input {
        "mirror generator received an absent source element"
    } else {
        "mirror generator failed"
    }
}

impl Error {
    #[must_use]
    pub fn disposed(what: &'static str) -> Self {
        Self::Disposed { what }
    }

    /// Wrap a generator failure, recording whether the input was absent.
    #[must_use]
    pub fn generator(absent_input: bool, source: impl Into<BoxError>) -> Self {
        Self::Generator {
            absent_input,
            source: source.into(),
        }
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        matches!(self, Self::Disposed { .. })
    }
}

/// Structural violations reported by [`crate::node::TreeNode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node already has a parent")]
    AlreadyParented,

    #[error("adding the node would create a cycle")]
    Cycle,

    #[error("node is not a child of this parent")]
    NotAChild,
}
