#![forbid(unsafe_code)]

//! Imitable collections for tmirror.
//!
//! An [`ImitableCollection`] mirrors a [`SourceSequence`](tmirror_core::SourceSequence)
//! through a converter, keeps itself aligned while imitating, and can be
//! paused, cleared, resumed, and disposed. It is itself a source sequence,
//! so mirrors stack.
//!
//! ```
//! use tmirror_core::ObservableList;
//! use tmirror_imitate::ImitableCollection;
//!
//! let source: ObservableList<char> = "AB".chars().collect();
//! let mirror = ImitableCollection::new(source.clone(), |c: &char| c.to_ascii_lowercase()).unwrap();
//! source.push('C').unwrap();
//! assert_eq!(mirror.snapshot(), vec!['a', 'b', 'c']);
//! ```

pub mod collection;
pub mod converted;

pub use collection::{CollectionBuilder, ImitableCollection};
pub use converted::Converted;
