#![forbid(unsafe_code)]

//! Wrapper nodes: one mirror node per source tree node.
//!
//! # Design
//!
//! A [`WrapperNode`] holds its source element, the value its strategy built
//! for it, and, once materialized, an [`ImitableCollection`] of its children.
//! Child wrappers are owned by that collection; the parent link is weak.
//!
//! Expansion is lazy. The children collection is created on the first call
//! to [`WrapperNode::children`], and starts imitating if the node does. Each
//! child is created through `generate_and_setup_child`, which parents it and
//! arms it to imitate (subject to [`TreeConfig::max_depth`]), so the next
//! level subscribes as soon as it is looked at.
//!
//! # Lifecycle
//!
//! ```text
//! Active --dispose--> Disposing --(subtree torn down)--> Disposed
//! ```
//!
//! - `pause_imitation` marks the whole materialized subtree non-imitating
//!   first, then clears child collections deepest level first. With the
//!   default [`WrapStrategy::manage_removed`], that disposes every descendant
//!   bottom-up.
//! - `dispose` pauses, disposes the children collection, disposes whatever
//!   descendants are still alive (artificial children, retained wrappers)
//!   bottom-up, fires [`WrapStrategy::on_disposed`], and detaches from the
//!   parent. The `Disposing` state makes re-entrant calls no-ops.
//!
//! # Failure Modes
//!
//! - Any lifecycle call on a disposed node returns [`Error::Disposed`].
//! - A failing [`WrapStrategy::value`] surfaces as [`Error::Generator`] from
//!   whichever call ran the alignment (`children`, `imitate_source_subtree`,
//!   or the source mutation).

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use tmirror_core::{
    Error, MirrorConfig, Notifier, PropertyChange, Result, SourceSequence, Subscription,
    TreeConfig, TreeError,
};
use tmirror_imitate::ImitableCollection;
use tracing::debug_span;

use crate::strategy::{ChildSlot, WrapStrategy};

/// The children collection of a wrapper node.
pub type Children<M> = ImitableCollection<<M as WrapStrategy>::Source, ChildSlot<M>>;

const WHAT: &str = "wrapper node";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Active,
    Disposing,
    Disposed,
}

struct NodeInner<M: WrapStrategy> {
    source: M::Source,
    value: M::Value,
    strategy: Rc<M>,
    config: Rc<MirrorConfig>,
    parent: RefCell<Weak<NodeInner<M>>>,
    children: RefCell<Option<Children<M>>>,
    artificial: RefCell<Vec<WrapperNode<M>>>,
    imitating: Cell<bool>,
    lifecycle: Cell<Lifecycle>,
    properties: Notifier<PropertyChange>,
}

/// Shared handle to one node of a wrapper tree.
pub struct WrapperNode<M: WrapStrategy> {
    inner: Rc<NodeInner<M>>,
}

impl<M: WrapStrategy> Clone for WrapperNode<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Wrappers are equal when their sources are.
impl<M: WrapStrategy> PartialEq for WrapperNode<M> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.source == other.inner.source
    }
}

impl<M: WrapStrategy> Eq for WrapperNode<M> where M::Source: Eq {}

impl<M: WrapStrategy> Hash for WrapperNode<M>
where
    M::Source: Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.source.hash(state);
    }
}

impl<M: WrapStrategy> std::fmt::Debug for WrapperNode<M>
where
    M::Source: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WrapperNode")
            .field("source", &self.inner.source)
            .field("imitating", &self.inner.imitating.get())
            .field("lifecycle", &self.inner.lifecycle.get())
            .finish_non_exhaustive()
    }
}

impl<M: WrapStrategy> WrapperNode<M> {
    /// Wrap `source` as the root of a mirror tree with default configuration.
    pub fn wrap(strategy: M, source: M::Source) -> Result<Self> {
        Self::wrap_with_config(strategy, source, MirrorConfig::default())
    }

    /// Wrap `source` as a root. Descendants are not wrapped until accessed.
    pub fn wrap_with_config(strategy: M, source: M::Source, config: MirrorConfig) -> Result<Self> {
        let strategy = Rc::new(strategy);
        let value = strategy
            .value(&source)
            .map_err(|err| Error::generator(strategy.is_absent(&source), err))?;
        let imitating = config.tree.start_imitating;
        Ok(Self::from_parts(
            source,
            value,
            strategy,
            Rc::new(config),
            imitating,
        ))
    }

    fn from_parts(
        source: M::Source,
        value: M::Value,
        strategy: Rc<M>,
        config: Rc<MirrorConfig>,
        imitating: bool,
    ) -> Self {
        Self {
            inner: Rc::new(NodeInner {
                source,
                value,
                strategy,
                config,
                parent: RefCell::new(Weak::new()),
                children: RefCell::new(None),
                artificial: RefCell::new(Vec::new()),
                imitating: Cell::new(imitating),
                lifecycle: Cell::new(Lifecycle::Active),
                properties: Notifier::new(),
            }),
        }
    }

    // --- reads ----------------------------------------------------------

    #[must_use]
    pub fn source(&self) -> &M::Source {
        &self.inner.source
    }

    #[must_use]
    pub fn value(&self) -> &M::Value {
        &self.inner.value
    }

    #[must_use]
    pub fn strategy(&self) -> &M {
        &self.inner.strategy
    }

    #[must_use]
    pub fn tree_config(&self) -> &TreeConfig {
        &self.inner.config.tree
    }

    #[must_use]
    pub fn is_imitating(&self) -> bool {
        self.inner.imitating.get()
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.lifecycle.get() == Lifecycle::Disposed
    }

    /// Whether both handles refer to the same wrapper instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The owning wrapper, or `None` for a root or detached node.
    #[must_use]
    pub fn parent(&self) -> Option<WrapperNode<M>> {
        self.inner
            .parent
            .borrow()
            .upgrade()
            .map(|inner| WrapperNode { inner })
    }

    /// Parent, grandparent, and so on up to the root.
    #[must_use]
    pub fn ancestors(&self) -> Vec<WrapperNode<M>> {
        let mut out = Vec::new();
        let mut cursor = self.parent();
        while let Some(node) = cursor {
            cursor = node.parent();
            out.push(node);
        }
        out
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.ancestors().len()
    }

    #[must_use]
    pub fn root(&self) -> WrapperNode<M> {
        self.ancestors().pop().unwrap_or_else(|| self.clone())
    }

    /// Whether the children collection has been created.
    #[must_use]
    pub fn is_materialized(&self) -> bool {
        self.inner.children.borrow().is_some()
    }

    /// Source-backed child wrappers materialized so far, without triggering
    /// materialization. Sentinels are skipped.
    #[must_use]
    pub fn child_nodes(&self) -> Vec<WrapperNode<M>> {
        let children = self.inner.children.borrow().clone();
        children
            .map(|children| {
                children
                    .iter()
                    .filter_map(ChildSlot::into_node)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Children attached through [`attach_artificial`](Self::attach_artificial).
    #[must_use]
    pub fn artificial_children(&self) -> Vec<WrapperNode<M>> {
        self.inner.artificial.borrow().clone()
    }

    /// Every materialized descendant (source-backed and artificial), in level
    /// order. Does not materialize anything.
    #[must_use]
    pub fn descendants_level_order(&self) -> Vec<WrapperNode<M>> {
        let mut out = Vec::new();
        let mut queue = VecDeque::from([self.clone()]);
        while let Some(node) = queue.pop_front() {
            for child in node
                .child_nodes()
                .into_iter()
                .chain(node.artificial_children())
            {
                queue.push_back(child.clone());
                out.push(child);
            }
        }
        out
    }

    /// Subscribe to `Parent` and `Imitating` changes of this node.
    pub fn subscribe_properties(
        &self,
        callback: impl Fn(&PropertyChange) -> Result<()> + 'static,
    ) -> Subscription {
        self.inner.properties.subscribe(callback)
    }

    // --- children -------------------------------------------------------

    /// The children of this node, materializing them on first access.
    ///
    /// A newly materialized collection starts imitating when this node is
    /// imitating; otherwise it stays empty until
    /// [`imitate_source_subtree`](Self::imitate_source_subtree).
    pub fn children(&self) -> Result<Children<M>> {
        self.ensure_live()?;
        if let Some(existing) = self.inner.children.borrow().as_ref() {
            return Ok(existing.clone());
        }

        let collection = self.build_children()?;
        *self.inner.children.borrow_mut() = Some(collection.clone());
        if self.is_imitating() {
            collection.imitate()?;
        }
        Ok(collection)
    }

    /// A derived mirror of this node's children, through `f`.
    ///
    /// Slots are matched by wrapper identity, so a child that was torn down
    /// and recreated for the same source is mapped again.
    pub fn map_children<U: Clone + 'static>(
        &self,
        f: impl FnMut(&ChildSlot<M>) -> U + 'static,
    ) -> Result<ImitableCollection<ChildSlot<M>, U>> {
        ImitableCollection::builder(self.children()?, f)
            .matches(ChildSlot::ptr_eq)
            .build()
    }

    fn build_children(&self) -> Result<Children<M>> {
        let strategy = &self.inner.strategy;
        let source: Rc<dyn SourceSequence<M::Source>> = strategy
            .children(&self.inner.source)
            .unwrap_or_else(|| Rc::new(Vec::new()));

        let parent = Rc::downgrade(&self.inner);
        let removal = Rc::clone(strategy);
        let absence = Rc::clone(strategy);
        ImitableCollection::try_builder(source, move |child: &M::Source| {
            match parent.upgrade() {
                Some(inner) => WrapperNode { inner }.generate_and_setup_child(child),
                None => Err(Error::disposed(WHAT)),
            }
        })
        .on_removed(move |slot| removal.manage_removed(slot))
        .absent_when(move |child| absence.is_absent(child))
        .align_config(self.inner.config.align.clone())
        .start_paused()
        .build()
    }

    fn generate_and_setup_child(&self, source: &M::Source) -> Result<ChildSlot<M>> {
        let strategy = &self.inner.strategy;
        if strategy.is_sentinel(source) {
            return Ok(ChildSlot::Sentinel);
        }
        let value = strategy
            .value(source)
            .map_err(|err| Error::generator(false, err))?;

        let depth = self.depth() + 1;
        let imitating = self.inner.config.tree.expands_at(depth);
        let child = Self::from_parts(
            source.clone(),
            value,
            Rc::clone(strategy),
            Rc::clone(&self.inner.config),
            imitating,
        );
        *child.inner.parent.borrow_mut() = Rc::downgrade(&self.inner);
        Ok(ChildSlot::Real(child))
    }

    fn materialized(&self) -> Option<Children<M>> {
        self.inner.children.borrow().clone()
    }

    // --- artificial children --------------------------------------------

    /// Attach a wrapper that is not backed by this node's source children.
    /// It is torn down together with this node.
    pub fn attach_artificial(&self, child: &WrapperNode<M>) -> Result<()> {
        self.ensure_live()?;
        child.ensure_live()?;
        if child.parent().is_some() {
            return Err(TreeError::AlreadyParented.into());
        }
        if child.ptr_eq(self) || self.ancestors().iter().any(|a| a.ptr_eq(child)) {
            return Err(TreeError::Cycle.into());
        }
        *child.inner.parent.borrow_mut() = Rc::downgrade(&self.inner);
        self.inner.artificial.borrow_mut().push(child.clone());
        child.inner.properties.notify(&PropertyChange::Parent)
    }

    /// Detach an artificial child without disposing it.
    pub fn detach_artificial(&self, child: &WrapperNode<M>) -> Result<()> {
        self.ensure_live()?;
        let removed = {
            let mut artificial = self.inner.artificial.borrow_mut();
            let before = artificial.len();
            artificial.retain(|existing| !existing.ptr_eq(child));
            artificial.len() != before
        };
        if !removed {
            return Err(TreeError::NotAChild.into());
        }
        child.clear_parent()
    }

    fn clear_parent(&self) -> Result<()> {
        let had_parent = {
            let mut parent = self.inner.parent.borrow_mut();
            let had = parent.upgrade().is_some();
            *parent = Weak::new();
            had
        };
        if had_parent {
            self.inner.properties.notify(&PropertyChange::Parent)
        } else {
            Ok(())
        }
    }

    // --- lifecycle ------------------------------------------------------

    /// Stop imitating across the whole materialized subtree and drop its
    /// children, deepest level first.
    pub fn pause_imitation(&self) -> Result<()> {
        self.ensure_live()?;
        self.pause_subtree(&self.descendants_level_order())
    }

    /// Resume imitating. Re-expands one level; deeper levels expand lazily
    /// as they are accessed. Artificial children resume along with their
    /// host, since the pause walk took them down too.
    pub fn imitate_source_subtree(&self) -> Result<()> {
        self.ensure_live()?;
        let _span = debug_span!("tmirror.resume", depth = self.depth()).entered();
        self.set_imitating(true)?;
        if let Some(children) = self.materialized() {
            children.imitate()?;
        }
        let mut first_error = None;
        for child in self.artificial_children() {
            if let Err(err) = child.imitate_source_subtree() {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Tear down this node and its subtree. Idempotent.
    pub fn dispose(&self) -> Result<()> {
        if self.inner.lifecycle.get() != Lifecycle::Active {
            return Ok(());
        }
        self.inner.lifecycle.set(Lifecycle::Disposing);

        let descendants = self.descendants_level_order();
        let _span = debug_span!("tmirror.dispose", descendants = descendants.len()).entered();
        let mut first_error = None;
        let mut keep = |result: Result<()>| {
            if let Err(err) = result {
                first_error.get_or_insert(err);
            }
        };

        keep(self.pause_subtree(&descendants));
        if let Some(children) = self.materialized() {
            keep(children.dispose());
        }
        for node in descendants.iter().rev() {
            keep(node.dispose());
        }

        self.inner.lifecycle.set(Lifecycle::Disposed);
        self.inner.strategy.on_disposed(self);

        if let Some(parent) = self.parent() {
            parent
                .inner
                .artificial
                .borrow_mut()
                .retain(|existing| !existing.ptr_eq(self));
        }
        keep(self.clear_parent());
        first_error.map_or(Ok(()), Err)
    }

    fn pause_subtree(&self, descendants: &[WrapperNode<M>]) -> Result<()> {
        let _span = debug_span!("tmirror.pause", descendants = descendants.len()).entered();
        let mut first_error = None;
        let mut keep = |result: Result<()>| {
            if let Err(err) = result {
                first_error.get_or_insert(err);
            }
        };

        for node in descendants {
            keep(node.set_imitating(false));
        }
        for node in descendants.iter().rev() {
            if node.is_disposed() {
                continue;
            }
            if let Some(children) = node.materialized() {
                if !children.is_disposed() {
                    keep(children.clear_and_pause());
                }
            }
        }
        keep(self.set_imitating(false));
        if let Some(children) = self.materialized() {
            if !children.is_disposed() {
                keep(children.clear_and_pause());
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn set_imitating(&self, imitating: bool) -> Result<()> {
        if self.inner.imitating.replace(imitating) == imitating {
            return Ok(());
        }
        self.inner.properties.notify(&PropertyChange::Imitating)
    }

    fn ensure_live(&self) -> Result<()> {
        match self.inner.lifecycle.get() {
            Lifecycle::Active => Ok(()),
            Lifecycle::Disposing | Lifecycle::Disposed => Err(Error::disposed(WHAT)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{ClosureStrategy, TreeNodeStrategy};
    use tmirror_core::{ObservableList, TreeNode};

    type Source = TreeNode<&'static str>;

    fn node(value: &'static str, children: &[&Source]) -> Source {
        let node = TreeNode::new(value);
        for child in children {
            node.append_child(child).unwrap();
        }
        node
    }

    /// r -> [a -> [a1, a2], b]
    fn sample() -> (Source, Source, Source) {
        let a = node("a", &[&node("a1", &[]), &node("a2", &[])]);
        let b = node("b", &[]);
        let root = node("r", &[&a, &b]);
        (root, a, b)
    }

    fn values(nodes: &[WrapperNode<TreeNodeStrategy<&'static str>>]) -> Vec<&'static str> {
        nodes.iter().map(|n| *n.value()).collect()
    }

    fn materialize_all<M: WrapStrategy>(node: &WrapperNode<M>) {
        let children = node.children().unwrap();
        for slot in children.iter() {
            if let Some(child) = slot.node() {
                materialize_all(child);
            }
        }
    }

    #[test]
    fn children_are_materialized_lazily() {
        let (root, _, _) = sample();
        let wrapped = WrapperNode::wrap(TreeNodeStrategy::new(), root).unwrap();
        assert!(!wrapped.is_materialized());
        assert!(wrapped.descendants_level_order().is_empty());

        let children = wrapped.children().unwrap();
        assert_eq!(children.len(), 2);
        let a = children.get(0).unwrap().into_node().unwrap();
        assert!(!a.is_materialized());
        assert!(a.is_imitating());
        assert!(a.parent().unwrap().ptr_eq(&wrapped));
        assert_eq!(a.depth(), 1);
    }

    #[test]
    fn source_edits_flow_into_the_mirror() {
        let (root, a, b) = sample();
        let wrapped = WrapperNode::wrap(TreeNodeStrategy::new(), root.clone()).unwrap();
        materialize_all(&wrapped);
        let old_b = wrapped.child_nodes()[1].clone();

        let c = node("c", &[]);
        root.append_child(&c).unwrap();
        assert_eq!(values(&wrapped.child_nodes()), vec!["a", "b", "c"]);

        root.remove_child(&b).unwrap();
        assert_eq!(values(&wrapped.child_nodes()), vec!["a", "c"]);
        assert!(old_b.is_disposed());
        assert!(old_b.parent().is_none());

        a.children().move_item(1, 0).unwrap();
        let a_wrapped = wrapped.child_nodes()[0].clone();
        assert_eq!(values(&a_wrapped.child_nodes()), vec!["a2", "a1"]);
    }

    #[test]
    fn moved_children_keep_their_wrapper() {
        let (root, _, _) = sample();
        let wrapped = WrapperNode::wrap(TreeNodeStrategy::new(), root.clone()).unwrap();
        let before = wrapped.children().unwrap().snapshot();
        root.move_child(1, 0).unwrap();
        let after = wrapped.children().unwrap().snapshot();
        assert!(before[0].ptr_eq(&after[1]));
        assert!(before[1].ptr_eq(&after[0]));
    }

    #[test]
    fn pause_and_resume_rebuilds_one_level() {
        let (root, _, _) = sample();
        let built = Rc::new(Cell::new(0));
        let built_clone = Rc::clone(&built);
        let strategy = ClosureStrategy::new(
            |s: &Source| Some(Rc::new(s.children()) as Rc<dyn SourceSequence<Source>>),
            move |s: &Source| {
                built_clone.set(built_clone.get() + 1);
                Ok(s.value())
            },
        );
        let wrapped = WrapperNode::wrap(strategy, root).unwrap();
        materialize_all(&wrapped);
        assert_eq!(built.get(), 5);
        let old = wrapped.descendants_level_order();
        let old_sources: Vec<Source> = old.iter().map(|n| n.source().clone()).collect();

        wrapped.pause_imitation().unwrap();
        assert!(!wrapped.is_imitating());
        assert!(wrapped.children().unwrap().is_empty());
        assert!(old.iter().all(WrapperNode::is_disposed));

        wrapped.imitate_source_subtree().unwrap();
        assert_eq!(built.get(), 5 + 2);
        materialize_all(&wrapped);
        assert_eq!(built.get(), 5 + 4);

        let new = wrapped.descendants_level_order();
        let new_sources: Vec<Source> = new.iter().map(|n| n.source().clone()).collect();
        assert_eq!(new_sources, old_sources);
        assert!(new.iter().all(|n| !n.is_disposed()));
    }

    #[test]
    fn dispose_cascades_bottom_up_exactly_once() {
        let (root, _, _) = sample();
        let log: Rc<RefCell<Vec<(&'static str, usize)>>> = Rc::default();
        let log_clone = Rc::clone(&log);
        let strategy = ClosureStrategy::new(
            |s: &Source| Some(Rc::new(s.children()) as Rc<dyn SourceSequence<Source>>),
            |s: &Source| Ok(s.value()),
        )
        .on_disposed(move |n| log_clone.borrow_mut().push((*n.value(), n.depth())));
        let wrapped = WrapperNode::wrap(strategy, root).unwrap();
        materialize_all(&wrapped);

        wrapped.dispose().unwrap();
        wrapped.dispose().unwrap();

        let log = log.borrow();
        let mut names: Vec<&str> = log.iter().map(|(name, _)| *name).collect();
        assert_eq!(names.len(), 5);
        assert_eq!(*names.last().unwrap(), "r");
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 5);
        assert!(log.windows(2).all(|w| w[0].1 >= w[1].1), "{log:?}");
        assert!(wrapped.is_disposed());
    }

    #[test]
    fn disposing_a_node_disposes_its_artificial_children() {
        let g = WrapperNode::wrap(TreeNodeStrategy::new(), node("g", &[])).unwrap();
        let extra = WrapperNode::wrap(TreeNodeStrategy::new(), node("extra", &[])).unwrap();
        g.attach_artificial(&extra).unwrap();
        assert!(extra.parent().unwrap().ptr_eq(&g));
        assert_eq!(g.descendants_level_order().len(), 1);

        g.dispose().unwrap();
        assert!(extra.is_disposed());
        assert!(extra.parent().is_none());
    }

    #[test]
    fn artificial_subtree_comes_back_after_pause_and_resume() {
        let g = WrapperNode::wrap(TreeNodeStrategy::new(), node("g", &[])).unwrap();
        let x = WrapperNode::wrap(TreeNodeStrategy::new(), node("x", &[&node("x1", &[])]))
            .unwrap();
        g.attach_artificial(&x).unwrap();
        assert_eq!(x.children().unwrap().len(), 1);

        g.pause_imitation().unwrap();
        assert!(!x.is_imitating());
        assert!(x.child_nodes().is_empty());

        g.imitate_source_subtree().unwrap();
        assert!(x.is_imitating());
        assert!(!x.is_disposed());
        assert_eq!(values(&x.child_nodes()), vec!["x1"]);
        assert!(x.parent().unwrap().ptr_eq(&g));
    }

    #[test]
    fn on_disposed_sees_the_disposed_state() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let strategy = ClosureStrategy::new(
            |s: &Source| Some(Rc::new(s.children()) as Rc<dyn SourceSequence<Source>>),
            |s: &Source| Ok(s.value()),
        )
        .on_disposed(move |n| {
            seen_clone
                .borrow_mut()
                .push((n.is_disposed(), n.parent().is_some()));
        });
        let wrapped = WrapperNode::wrap(strategy, node("r", &[&node("c", &[])])).unwrap();
        wrapped.children().unwrap();

        wrapped.dispose().unwrap();
        // The child still sees its parent; the root has none.
        assert_eq!(*seen.borrow(), vec![(true, true), (true, false)]);
    }

    #[test]
    fn artificial_attach_rejects_bad_links() {
        let (root, _, _) = sample();
        let wrapped = WrapperNode::wrap(TreeNodeStrategy::new(), root).unwrap();
        let a = wrapped.children().unwrap().get(0).unwrap().into_node().unwrap();

        let err = a.attach_artificial(&wrapped).unwrap_err();
        assert!(matches!(err, Error::Tree(TreeError::Cycle)));
        let err = wrapped.attach_artificial(&a).unwrap_err();
        assert!(matches!(err, Error::Tree(TreeError::AlreadyParented)));

        let loose = WrapperNode::wrap(TreeNodeStrategy::new(), node("x", &[])).unwrap();
        let err = wrapped.detach_artificial(&loose).unwrap_err();
        assert!(matches!(err, Error::Tree(TreeError::NotAChild)));

        wrapped.attach_artificial(&loose).unwrap();
        wrapped.detach_artificial(&loose).unwrap();
        assert!(loose.parent().is_none());
        assert!(!loose.is_disposed());
    }

    #[test]
    fn max_depth_creates_deeper_nodes_paused() {
        let (root, _, _) = sample();
        let mut config = MirrorConfig::default();
        config.tree.max_depth = Some(1);
        let wrapped = WrapperNode::wrap_with_config(TreeNodeStrategy::new(), root, config).unwrap();

        wrapped.children().unwrap();
        let a = wrapped.child_nodes()[0].clone();
        assert!(!a.is_imitating());
        assert!(a.children().unwrap().is_empty());

        a.imitate_source_subtree().unwrap();
        assert_eq!(values(&a.child_nodes()), vec!["a1", "a2"]);
        assert!(!a.child_nodes()[0].is_imitating());
    }

    #[test]
    fn disposed_node_rejects_lifecycle_calls() {
        let wrapped = WrapperNode::wrap(TreeNodeStrategy::new(), node("r", &[])).unwrap();
        wrapped.dispose().unwrap();
        assert!(wrapped.children().unwrap_err().is_disposed());
        assert!(wrapped.pause_imitation().unwrap_err().is_disposed());
        assert!(wrapped.imitate_source_subtree().unwrap_err().is_disposed());
        assert!(wrapped.child_nodes().is_empty());
    }

    #[test]
    fn sentinel_children_take_a_slot_without_a_wrapper() {
        let list: ObservableList<u32> = ObservableList::from_vec(vec![1, 0, 2]);
        let strategy = ClosureStrategy::new(
            move |s: &u32| {
                (*s == 100).then(|| Rc::new(list.clone()) as Rc<dyn SourceSequence<u32>>)
            },
            |s: &u32| Ok(*s),
        )
        .sentinel_when(|s| *s == 0);
        let wrapped = WrapperNode::wrap(strategy, 100).unwrap();

        let children = wrapped.children().unwrap();
        assert_eq!(children.len(), 3);
        assert!(children.get(1).unwrap().is_sentinel());
        assert_eq!(wrapped.child_nodes().len(), 2);
    }

    #[test]
    fn failing_value_surfaces_from_children() {
        let strategy = ClosureStrategy::new(
            |s: &Option<u32>| {
                s.filter(|v| *v == 1).map(|_| {
                    Rc::new(vec![Some(2u32), None]) as Rc<dyn SourceSequence<Option<u32>>>
                })
            },
            |s: &Option<u32>| s.ok_or_else(|| "missing".into()),
        )
        .absent_when(Option::is_none);
        let wrapped = WrapperNode::wrap(strategy, Some(1)).unwrap();
        let err = wrapped.children().unwrap_err();
        assert!(matches!(
            err,
            Error::Generator {
                absent_input: true,
                ..
            }
        ));
    }

    #[test]
    fn map_children_tracks_the_live_children() {
        let (root, _, b) = sample();
        let wrapped = WrapperNode::wrap(TreeNodeStrategy::new(), root.clone()).unwrap();
        let labels = wrapped
            .map_children(|slot| slot.node().map(|n| n.value().to_uppercase()))
            .unwrap();
        assert_eq!(
            labels.snapshot(),
            vec![Some("A".to_string()), Some("B".to_string())]
        );
        root.remove_child(&b).unwrap();
        assert_eq!(labels.snapshot(), vec![Some("A".to_string())]);
    }

    #[test]
    fn property_changes_are_raised() {
        let (root, _, _) = sample();
        let wrapped = WrapperNode::wrap(TreeNodeStrategy::new(), root).unwrap();
        let seen: Rc<RefCell<Vec<PropertyChange>>> = Rc::default();
        let seen_clone = Rc::clone(&seen);
        let _sub = wrapped.subscribe_properties(move |p| {
            seen_clone.borrow_mut().push(*p);
            Ok(())
        });

        wrapped.pause_imitation().unwrap();
        wrapped.imitate_source_subtree().unwrap();
        let parent = WrapperNode::wrap(TreeNodeStrategy::new(), node("p", &[])).unwrap();
        parent.attach_artificial(&wrapped).unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![
                PropertyChange::Imitating,
                PropertyChange::Imitating,
                PropertyChange::Parent
            ]
        );
        assert!(wrapped.root().ptr_eq(&parent));
    }

    #[test]
    fn wrappers_compare_by_source() {
        let (root, _, _) = sample();
        let first = WrapperNode::wrap(TreeNodeStrategy::new(), root.clone()).unwrap();
        let second = WrapperNode::wrap(TreeNodeStrategy::new(), root).unwrap();
        assert_eq!(first, second);
        assert!(!first.ptr_eq(&second));
    }
}
