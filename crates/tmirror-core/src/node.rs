#![forbid(unsafe_code)]

//! Plain mutable source tree.
//!
//! [`TreeNode<V>`] is the simplest tree a mirror can observe: each node owns an
//! [`ObservableList`] of children and holds a weak back-reference to its
//! parent. Equality and hashing follow node identity, never value equality,
//! so two nodes carrying the same value are still distinct sources.
//!
//! Structural edits go through the node methods, which keep parent links
//! consistent and reject duplicates and cycles. Editing [`TreeNode::children`]
//! directly bypasses those checks.

use std::cell::RefCell;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use crate::error::{Error, Result, TreeError};
use crate::list::ObservableList;

struct NodeInner<V: 'static> {
    value: RefCell<V>,
    children: ObservableList<TreeNode<V>>,
    parent: RefCell<Weak<NodeInner<V>>>,
}

/// Shared handle to a node of a plain source tree.
pub struct TreeNode<V: 'static> {
    inner: Rc<NodeInner<V>>,
}

impl<V> Clone for TreeNode<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V> PartialEq for TreeNode<V> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<V> Eq for TreeNode<V> {}

impl<V> Hash for TreeNode<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.inner), state);
    }
}

impl<V: std::fmt::Debug + 'static> std::fmt::Debug for TreeNode<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeNode")
            .field("value", &self.inner.value.borrow())
            .field("children", &self.inner.children.len())
            .finish()
    }
}

impl<V: 'static> TreeNode<V> {
    #[must_use]
    pub fn new(value: V) -> Self {
        Self {
            inner: Rc::new(NodeInner {
                value: RefCell::new(value),
                children: ObservableList::new(),
                parent: RefCell::new(Weak::new()),
            }),
        }
    }

    #[must_use]
    pub fn value(&self) -> V
    where
        V: Clone,
    {
        self.inner.value.borrow().clone()
    }

    pub fn with_value<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value, returning the previous one. Not a structural edit.
    pub fn replace_value(&self, value: V) -> V {
        std::mem::replace(&mut *self.inner.value.borrow_mut(), value)
    }

    /// The live child list. Mirrors subscribe to this.
    #[must_use]
    pub fn children(&self) -> ObservableList<TreeNode<V>> {
        self.inner.children.clone()
    }

    #[must_use]
    pub fn parent(&self) -> Option<TreeNode<V>> {
        self.inner
            .parent
            .borrow()
            .upgrade()
            .map(|inner| TreeNode { inner })
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        std::iter::successors(self.parent(), TreeNode::parent).count()
    }

    /// Whether `self` is a proper ancestor of `other`.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &TreeNode<V>) -> bool {
        std::iter::successors(other.parent(), TreeNode::parent).any(|a| a == *self)
    }

    pub fn append_child(&self, child: &TreeNode<V>) -> Result<()> {
        self.insert_child(self.inner.children.len(), child)
    }

    pub fn insert_child(&self, index: usize, child: &TreeNode<V>) -> Result<()> {
        if child.parent().is_some() {
            return Err(TreeError::AlreadyParented.into());
        }
        if child == self || child.is_ancestor_of(self) {
            return Err(TreeError::Cycle.into());
        }
        let len = self.inner.children.len();
        if index > len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        *child.inner.parent.borrow_mut() = Rc::downgrade(&self.inner);
        self.inner.children.insert(index, child.clone())
    }

    pub fn remove_child(&self, child: &TreeNode<V>) -> Result<()> {
        let index = self
            .inner
            .children
            .index_of(child)
            .ok_or(TreeError::NotAChild)?;
        *child.inner.parent.borrow_mut() = Weak::new();
        self.inner.children.remove_at(index).map(|_| ())
    }

    pub fn move_child(&self, from: usize, to: usize) -> Result<()> {
        self.inner.children.move_item(from, to)
    }

    /// Remove this node from its parent, if any.
    pub fn detach(&self) -> Result<()> {
        match self.parent() {
            Some(parent) => parent.remove_child(self),
            None => Ok(()),
        }
    }
}
