#![forbid(unsafe_code)]

//! Wrapper trees for tmirror.
//!
//! A [`WrapperNode`] mirrors one node of a hierarchical source. Its children
//! are an imitable collection of [`ChildSlot`]s, materialized on first access
//! and kept aligned with the source's children while the node imitates. A
//! [`WrapStrategy`] supplies everything source-specific.
//!
//! ```
//! use tmirror_core::TreeNode;
//! use tmirror_tree::{TreeNodeStrategy, WrapperNode};
//!
//! let root = TreeNode::new("root");
//! root.append_child(&TreeNode::new("leaf")).unwrap();
//!
//! let mirror = WrapperNode::wrap(TreeNodeStrategy::new(), root.clone()).unwrap();
//! assert_eq!(mirror.children().unwrap().len(), 1);
//!
//! root.append_child(&TreeNode::new("second")).unwrap();
//! assert_eq!(mirror.child_nodes().len(), 2);
//! mirror.dispose().unwrap();
//! ```

pub mod node;
pub mod strategy;

pub use node::{Children, WrapperNode};
pub use strategy::{ChildSlot, ClosureStrategy, TreeNodeStrategy, WrapStrategy};
