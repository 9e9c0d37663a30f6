#![forbid(unsafe_code)]

//! Span hierarchy for wrapper lifecycle calls.
//!
//! `tmirror.dispose` on a root wraps a `tmirror.pause` of its subtree, and
//! the removed children are disposed inside that pause.
//!
//! Run:
//!   cargo test -p tmirror-tree --test tracing_lifecycle_spans

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tmirror_core::TreeNode;
use tmirror_tree::{TreeNodeStrategy, WrapperNode};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Capture layer
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
    parent_name: Option<String>,
}

struct SpanCapture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for SpanCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if !attrs.metadata().name().starts_with("tmirror.") {
            return;
        }
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);

        let parent_name = ctx
            .current_span()
            .id()
            .and_then(|pid| ctx.span(pid))
            .map(|span_ref| span_ref.name().to_string());

        self.spans.lock().unwrap().push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
            parent_name,
        });
    }
}

fn capture(run: impl FnOnce()) -> Vec<CapturedSpan> {
    let spans = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(SpanCapture {
        spans: spans.clone(),
    });
    tracing::subscriber::with_default(subscriber, run);
    let captured = spans.lock().unwrap().clone();
    captured
}

fn two_leaf_mirror() -> WrapperNode<TreeNodeStrategy<&'static str>> {
    let root = TreeNode::new("root");
    root.append_child(&TreeNode::new("a")).unwrap();
    root.append_child(&TreeNode::new("b")).unwrap();
    let mirror = WrapperNode::wrap(TreeNodeStrategy::new(), root).unwrap();
    mirror.children().unwrap();
    mirror
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn child_disposal_nests_under_the_root_pause() {
    let mirror = two_leaf_mirror();
    let spans = capture(|| mirror.dispose().unwrap());

    let disposes: Vec<&CapturedSpan> = spans
        .iter()
        .filter(|s| s.name == "tmirror.dispose")
        .collect();
    assert_eq!(disposes.len(), 3);

    let root = disposes
        .iter()
        .find(|s| s.parent_name.is_none())
        .expect("root dispose span");
    assert_eq!(root.fields["descendants"], "2");

    let children: Vec<_> = disposes
        .iter()
        .filter(|s| s.parent_name.as_deref() == Some("tmirror.pause"))
        .collect();
    assert_eq!(children.len(), 2);
    assert!(children.iter().all(|s| s.fields["descendants"] == "0"));
}

#[test]
fn pause_and_resume_open_their_own_spans() {
    let mirror = two_leaf_mirror();
    let spans = capture(|| {
        mirror.pause_imitation().unwrap();
        mirror.imitate_source_subtree().unwrap();
    });

    let pause = spans
        .iter()
        .find(|s| s.name == "tmirror.pause" && s.parent_name.is_none())
        .expect("pause span");
    assert_eq!(pause.fields["descendants"], "2");

    let resume = spans
        .iter()
        .find(|s| s.name == "tmirror.resume")
        .expect("resume span");
    assert_eq!(resume.fields["depth"], "0");
    assert!(
        spans
            .iter()
            .any(|s| s.name == "tmirror.align" && s.parent_name.as_deref() == Some("tmirror.resume"))
    );
}
