#![forbid(unsafe_code)]

//! How a wrapper tree reads its source and builds its nodes.
//!
//! A [`WrapStrategy`] is the single injection point of a wrapper tree: it
//! tells the tree where a source element's children live, what value each
//! wrapper carries, which source elements are terminal sentinels, and what to
//! do with wrappers that leave the tree.

use std::marker::PhantomData;
use std::rc::Rc;

use tmirror_core::{BoxError, SourceSequence, TreeNode};
use tracing::warn;

use crate::node::WrapperNode;

/// Source-side hooks for a wrapper tree.
pub trait WrapStrategy: Sized + 'static {
    /// One element of the source tree. Wrappers compare equal when their
    /// sources do.
    type Source: Clone + PartialEq + 'static;

    /// Per-node payload produced by [`value`](Self::value).
    type Value: 'static;

    /// The ordered children of `source`, or `None` for a leaf.
    fn children(&self, source: &Self::Source) -> Option<Rc<dyn SourceSequence<Self::Source>>>;

    /// Build the payload of the wrapper for `source`.
    fn value(&self, source: &Self::Source) -> Result<Self::Value, BoxError>;

    /// Whether `source` stands for a terminal placeholder. Sentinels occupy a
    /// slot in their parent's children but get no wrapper and never expand.
    fn is_sentinel(&self, _source: &Self::Source) -> bool {
        false
    }

    /// Whether `source` counts as absent when [`value`](Self::value) fails on
    /// it.
    fn is_absent(&self, _source: &Self::Source) -> bool {
        false
    }

    /// A child left its parent's children. The default disposes it; an
    /// override that keeps the wrapper alive owns re-attaching or pausing it.
    fn manage_removed(&self, slot: ChildSlot<Self>) {
        if let ChildSlot::Real(node) = slot {
            if let Err(err) = node.dispose() {
                warn!(error = %err, "disposing a removed wrapper node failed");
            }
        }
    }

    /// Called exactly once per node, right after it is marked disposed and
    /// before it detaches from its parent.
    fn on_disposed(&self, _node: &WrapperNode<Self>) {}
}

/// One entry of a wrapper's children.
pub enum ChildSlot<M: WrapStrategy> {
    Real(WrapperNode<M>),
    Sentinel,
}

impl<M: WrapStrategy> Clone for ChildSlot<M> {
    fn clone(&self) -> Self {
        match self {
            Self::Real(node) => Self::Real(node.clone()),
            Self::Sentinel => Self::Sentinel,
        }
    }
}

/// Slots compare like their wrappers, by source.
impl<M: WrapStrategy> PartialEq for ChildSlot<M> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Real(a), Self::Real(b)) => a == b,
            (Self::Sentinel, Self::Sentinel) => true,
            _ => false,
        }
    }
}

impl<M: WrapStrategy> std::fmt::Debug for ChildSlot<M>
where
    M::Source: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Real(node) => f.debug_tuple("Real").field(node).finish(),
            Self::Sentinel => f.write_str("Sentinel"),
        }
    }
}

impl<M: WrapStrategy> ChildSlot<M> {
    #[must_use]
    pub fn node(&self) -> Option<&WrapperNode<M>> {
        match self {
            Self::Real(node) => Some(node),
            Self::Sentinel => None,
        }
    }

    #[must_use]
    pub fn into_node(self) -> Option<WrapperNode<M>> {
        match self {
            Self::Real(node) => Some(node),
            Self::Sentinel => None,
        }
    }

    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Sentinel)
    }

    /// Same wrapper instance (or both sentinels).
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Real(a), Self::Real(b)) => a.ptr_eq(b),
            (Self::Sentinel, Self::Sentinel) => true,
            _ => false,
        }
    }
}

type ChildrenFn<S> = Box<dyn Fn(&S) -> Option<Rc<dyn SourceSequence<S>>>>;
type ValueFn<S, V> = Box<dyn Fn(&S) -> Result<V, BoxError>>;
type PredicateFn<S> = Box<dyn Fn(&S) -> bool>;
type DisposedFn<S, V> = Box<dyn Fn(&WrapperNode<ClosureStrategy<S, V>>)>;

/// A [`WrapStrategy`] assembled from closures.
pub struct ClosureStrategy<S: Clone + PartialEq + 'static, V: 'static> {
    children: ChildrenFn<S>,
    value: ValueFn<S, V>,
    sentinel: Option<PredicateFn<S>>,
    absent: Option<PredicateFn<S>>,
    on_disposed: Option<DisposedFn<S, V>>,
}

impl<S: Clone + PartialEq + 'static, V: 'static> std::fmt::Debug for ClosureStrategy<S, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureStrategy")
            .field("sentinel", &self.sentinel.is_some())
            .field("absent", &self.absent.is_some())
            .field("on_disposed", &self.on_disposed.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: Clone + PartialEq + 'static, V: 'static> ClosureStrategy<S, V> {
    pub fn new(
        children: impl Fn(&S) -> Option<Rc<dyn SourceSequence<S>>> + 'static,
        value: impl Fn(&S) -> Result<V, BoxError> + 'static,
    ) -> Self {
        Self {
            children: Box::new(children),
            value: Box::new(value),
            sentinel: None,
            absent: None,
            on_disposed: None,
        }
    }

    #[must_use]
    pub fn sentinel_when(mut self, sentinel: impl Fn(&S) -> bool + 'static) -> Self {
        self.sentinel = Some(Box::new(sentinel));
        self
    }

    #[must_use]
    pub fn absent_when(mut self, absent: impl Fn(&S) -> bool + 'static) -> Self {
        self.absent = Some(Box::new(absent));
        self
    }

    #[must_use]
    pub fn on_disposed(mut self, hook: impl Fn(&WrapperNode<Self>) + 'static) -> Self {
        self.on_disposed = Some(Box::new(hook));
        self
    }
}

impl<S: Clone + PartialEq + 'static, V: 'static> WrapStrategy for ClosureStrategy<S, V> {
    type Source = S;
    type Value = V;

    fn children(&self, source: &S) -> Option<Rc<dyn SourceSequence<S>>> {
        (self.children)(source)
    }

    fn value(&self, source: &S) -> Result<V, BoxError> {
        (self.value)(source)
    }

    fn is_sentinel(&self, source: &S) -> bool {
        self.sentinel.as_ref().is_some_and(|sentinel| sentinel(source))
    }

    fn is_absent(&self, source: &S) -> bool {
        self.absent.as_ref().is_some_and(|absent| absent(source))
    }

    fn on_disposed(&self, node: &WrapperNode<Self>) {
        if let Some(hook) = &self.on_disposed {
            hook(node);
        }
    }
}

/// Mirrors a [`TreeNode`] tree; each wrapper carries a copy of its node's
/// value.
pub struct TreeNodeStrategy<V> {
    _value: PhantomData<fn() -> V>,
}

impl<V> Default for TreeNodeStrategy<V> {
    fn default() -> Self {
        Self {
            _value: PhantomData,
        }
    }
}

impl<V> std::fmt::Debug for TreeNodeStrategy<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TreeNodeStrategy")
    }
}

impl<V> TreeNodeStrategy<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<V: Clone + 'static> WrapStrategy for TreeNodeStrategy<V> {
    type Source = TreeNode<V>;
    type Value = V;

    fn children(&self, source: &TreeNode<V>) -> Option<Rc<dyn SourceSequence<TreeNode<V>>>> {
        Some(Rc::new(source.children()))
    }

    fn value(&self, source: &TreeNode<V>) -> Result<V, BoxError> {
        Ok(source.value())
    }
}
