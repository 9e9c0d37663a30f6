#![forbid(unsafe_code)]

//! End-to-end tests for wrapper trees over a mutable source tree.
//!
//! 1. `mirror_shape` - expansion, source edits, several mirrors per source
//! 2. `lifecycle` - pause/resume, disposal from either end
//! 3. `retention` - strategies that keep removed wrappers alive

use std::cell::RefCell;
use std::rc::Rc;

use tmirror_core::{BoxError, SourceSequence, TreeNode};
use tmirror_tree::{ChildSlot, TreeNodeStrategy, WrapStrategy, WrapperNode};

type Source = TreeNode<String>;

fn leaf(value: &str) -> Source {
    TreeNode::new(value.to_string())
}

fn branch(value: &str, children: &[&Source]) -> Source {
    let node = leaf(value);
    for child in children {
        node.append_child(child).unwrap();
    }
    node
}

fn labels<M: WrapStrategy<Value = String>>(nodes: &[WrapperNode<M>]) -> Vec<String> {
    nodes.iter().map(|n| n.value().clone()).collect()
}

// =========================================================================
// 1. Mirror shape
// =========================================================================

mod mirror_shape {
    use super::*;

    #[test]
    fn grandchildren_follow_their_own_source_lists() {
        let docs = branch("docs", &[&leaf("intro"), &leaf("usage")]);
        let root = branch("root", &[&docs, &leaf("src")]);
        let mirror = WrapperNode::wrap(TreeNodeStrategy::new(), root.clone()).unwrap();

        let docs_mirror = mirror.children().unwrap().get(0).unwrap().into_node().unwrap();
        docs_mirror.children().unwrap();
        assert_eq!(labels(&docs_mirror.child_nodes()), vec!["intro", "usage"]);

        docs.insert_child(1, &leaf("install")).unwrap();
        assert_eq!(
            labels(&docs_mirror.child_nodes()),
            vec!["intro", "install", "usage"]
        );
        assert_eq!(docs_mirror.child_nodes()[1].depth(), 2);
        assert!(docs_mirror.child_nodes()[1].root().ptr_eq(&mirror));
    }

    #[test]
    fn reparenting_a_source_subtree_moves_it_between_mirrors() {
        let moving = branch("moving", &[&leaf("payload")]);
        let left = branch("left", &[&moving]);
        let right = leaf("right");
        let root = branch("root", &[&left, &right]);
        let mirror = WrapperNode::wrap(TreeNodeStrategy::new(), root).unwrap();

        let sides = mirror.children().unwrap().snapshot();
        let left_mirror = sides[0].node().unwrap().clone();
        let right_mirror = sides[1].node().unwrap().clone();
        left_mirror.children().unwrap();
        right_mirror.children().unwrap();
        let old = left_mirror.child_nodes()[0].clone();

        moving.detach().unwrap();
        right.append_child(&moving).unwrap();

        assert!(left_mirror.child_nodes().is_empty());
        assert!(old.is_disposed());
        let new = right_mirror.child_nodes()[0].clone();
        assert_eq!(new, old);
        assert!(!new.ptr_eq(&old));
        assert!(new.parent().unwrap().ptr_eq(&right_mirror));
    }

    #[test]
    fn two_mirrors_of_one_source_are_independent() {
        let root = branch("root", &[&leaf("a")]);
        let first = WrapperNode::wrap(TreeNodeStrategy::new(), root.clone()).unwrap();
        let second = WrapperNode::wrap(TreeNodeStrategy::new(), root.clone()).unwrap();
        first.children().unwrap();
        second.children().unwrap();

        second.pause_imitation().unwrap();
        root.append_child(&leaf("b")).unwrap();

        assert_eq!(labels(&first.child_nodes()), vec!["a", "b"]);
        assert!(second.child_nodes().is_empty());

        second.imitate_source_subtree().unwrap();
        assert_eq!(labels(&second.child_nodes()), vec!["a", "b"]);
    }
}

// =========================================================================
// 2. Lifecycle
// =========================================================================

mod lifecycle {
    use super::*;

    #[test]
    fn disposing_a_middle_node_then_the_root() {
        let middle = branch("middle", &[&leaf("deep")]);
        let root = branch("root", &[&middle]);
        let mirror = WrapperNode::wrap(TreeNodeStrategy::new(), root.clone()).unwrap();
        let middle_mirror = mirror.children().unwrap().get(0).unwrap().into_node().unwrap();
        let deep_mirror = middle_mirror.children().unwrap().get(0).unwrap().into_node().unwrap();

        middle_mirror.dispose().unwrap();
        assert!(deep_mirror.is_disposed());
        assert!(middle_mirror.parent().is_none());

        // The source still has the child, so the disposed wrapper stays in
        // its slot until the source drops it.
        assert_eq!(mirror.child_nodes().len(), 1);
        root.remove_child(&middle).unwrap();
        assert!(mirror.child_nodes().is_empty());

        mirror.dispose().unwrap();
        assert!(mirror.is_disposed());
    }

    #[test]
    fn source_edits_after_dispose_are_ignored() {
        let root = branch("root", &[&leaf("a")]);
        let mirror = WrapperNode::wrap(TreeNodeStrategy::new(), root.clone()).unwrap();
        mirror.children().unwrap();
        mirror.dispose().unwrap();

        root.append_child(&leaf("b")).unwrap();
        assert!(mirror.child_nodes().is_empty());
        assert_eq!(root.children().subscriber_count(), 0);
    }

    #[test]
    fn paused_root_does_not_subscribe() {
        let root = branch("root", &[&leaf("a")]);
        let mut config = tmirror_core::MirrorConfig::default();
        config.tree.start_imitating = false;
        let mirror = WrapperNode::wrap_with_config(TreeNodeStrategy::new(), root.clone(), config)
            .unwrap();

        assert!(mirror.children().unwrap().is_empty());
        assert_eq!(root.children().subscriber_count(), 0);

        mirror.imitate_source_subtree().unwrap();
        assert_eq!(labels(&mirror.child_nodes()), vec!["a"]);
        assert_eq!(root.children().subscriber_count(), 1);
    }
}

// =========================================================================
// 3. Retention
// =========================================================================

mod retention {
    use super::*;

    /// Keeps removed wrappers paused instead of disposing them.
    #[derive(Default)]
    struct Retaining {
        parked: RefCell<Vec<WrapperNode<Retaining>>>,
    }

    impl WrapStrategy for Retaining {
        type Source = Source;
        type Value = String;

        fn children(&self, source: &Source) -> Option<Rc<dyn SourceSequence<Source>>> {
            Some(Rc::new(source.children()))
        }

        fn value(&self, source: &Source) -> Result<String, BoxError> {
            Ok(source.value())
        }

        fn manage_removed(&self, slot: ChildSlot<Self>) {
            if let ChildSlot::Real(node) = slot {
                node.pause_imitation().unwrap();
                self.parked.borrow_mut().push(node);
            }
        }
    }

    #[test]
    fn removed_wrappers_are_parked_not_disposed() {
        let gone = branch("gone", &[&leaf("inner")]);
        let root = branch("root", &[&gone]);
        let mirror = WrapperNode::wrap(Retaining::default(), root.clone()).unwrap();
        let gone_mirror = mirror.children().unwrap().get(0).unwrap().into_node().unwrap();
        gone_mirror.children().unwrap();

        root.remove_child(&gone).unwrap();
        assert!(mirror.child_nodes().is_empty());
        assert!(!gone_mirror.is_disposed());
        assert!(!gone_mirror.is_imitating());

        // Pausing the parked node released its own child first, which the
        // strategy parked too.
        let parked = mirror.strategy().parked.borrow().clone();
        assert_eq!(labels(&parked), vec!["inner", "gone"]);
        assert!(parked[1].ptr_eq(&gone_mirror));
        assert!(parked.iter().all(|n| !n.is_disposed()));
        assert!(gone_mirror.child_nodes().is_empty());
    }
}
