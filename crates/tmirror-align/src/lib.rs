#![forbid(unsafe_code)]

//! Sequence alignment for tmirror.
//!
//! [`Aligner`] edits a live ordered collection until it matches a target
//! sequence, reusing elements that merely moved instead of destroying and
//! recreating them. All edits go through the [`EditableList`] seam, so the
//! same pass drives a plain `Vec` or a change-notifying list.
//!
//! ```
//! use tmirror_align::Aligner;
//!
//! let mut list = vec!['a', 'b', 'c'];
//! let report = Aligner::identity().align(&mut list, &['c', 'a', 'b']).unwrap();
//! assert_eq!(list, vec!['c', 'a', 'b']);
//! assert_eq!(report.moved, 1);
//! ```

pub mod aligner;
pub mod editable;

pub use aligner::{AlignReport, Aligner};
pub use editable::EditableList;
