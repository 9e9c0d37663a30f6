#![forbid(unsafe_code)]

//! Greedy, move-aware sequence alignment.
//!
//! # Algorithm
//!
//! [`Aligner::align`] walks the target sequence index by index, keeping the
//! list's prefix `[0, i)` equal to the converted target prefix:
//!
//! 1. `list[i]` already matches `target[i]`: advance.
//! 2. A later `list[j]` (first match, left to right) matches `target[i]`:
//!    - if `list[i]` is still needed by the remaining target, move `list[j]`
//!      to `i` and advance. The moved element keeps its identity;
//!    - otherwise `list[i]` is garbage: remove it and re-examine slot `i`.
//! 3. Nothing ahead matches `target[i]`:
//!    - past the end of the list, or `list[i]` still needed later: insert a
//!      converted element at `i`;
//!    - otherwise replace `list[i]` with a converted element.
//!
//! Once the target is exhausted, surplus elements are removed from the tail
//! backward. An empty target against a non-empty list is a single clear.
//!
//! This is not a globally minimal diff, but a pure reordering of `n`
//! elements costs at most `n - 1` moves and nothing else, an identical
//! sequence costs nothing, and single insert/remove runs cost one edit per
//! element.
//!
//! # Failure Modes
//!
//! - **Converter failure**: the error is returned immediately. Edits already
//!   applied stay applied; the list prefix up to the failing index is aligned.
//! - **Contract violation**: with [`AlignConfig::verify`] set, a list that
//!   does not match the target after a pass panics. This can only happen if
//!   the list is mutated behind the aligner's back during the pass.

use tmirror_core::{AlignConfig, Result};
use tracing::{debug, info_span, trace};
use web_time::Instant;

use crate::editable::EditableList;

type ConvertFn<S, T> = Box<dyn FnMut(&S) -> Result<T>>;
type MatchFn<S, T> = Box<dyn Fn(&T, &S) -> bool>;

/// Structural edits performed by one [`Aligner::align`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignReport {
    pub inserted: usize,
    pub removed: usize,
    pub replaced: usize,
    pub moved: usize,
    /// The pass emptied the list in a single clear.
    pub cleared: bool,
}

impl AlignReport {
    /// Number of edit operations issued (a clear counts as one).
    #[must_use]
    pub fn edits(&self) -> usize {
        self.inserted + self.removed + self.replaced + self.moved + usize::from(self.cleared)
    }

    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.edits() == 0
    }
}

/// Aligns an [`EditableList`] of `T` with a target sequence of `S`.
///
/// `convert` builds a list element for a target element that has no match;
/// `matches` decides whether an existing list element stands for a target
/// element.
pub struct Aligner<S, T> {
    convert: ConvertFn<S, T>,
    matches: MatchFn<S, T>,
    config: AlignConfig,
}

impl<S, T> std::fmt::Debug for Aligner<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aligner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: Clone + PartialEq + 'static> Aligner<S, S> {
    /// Aligner whose list holds the target elements themselves.
    #[must_use]
    pub fn identity() -> Self {
        Self::new(|s: &S| Ok(s.clone()), |item: &S, s: &S| item == s)
    }
}

impl<S, T> Aligner<S, T> {
    pub fn new(
        convert: impl FnMut(&S) -> Result<T> + 'static,
        matches: impl Fn(&T, &S) -> bool + 'static,
    ) -> Self {
        Self {
            convert: Box::new(convert),
            matches: Box::new(matches),
            config: AlignConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: AlignConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the matching predicate.
    #[must_use]
    pub fn with_matcher(mut self, matches: impl Fn(&T, &S) -> bool + 'static) -> Self {
        self.matches = Box::new(matches);
        self
    }

    #[must_use]
    pub fn config(&self) -> &AlignConfig {
        &self.config
    }

    /// Align `list` with `target`, dropping removed elements.
    pub fn align<L>(&mut self, list: &mut L, target: &[S]) -> Result<AlignReport>
    where
        L: EditableList<Item = T>,
    {
        self.align_with(list, target, drop)
    }

    /// Align `list` with `target`, handing every removed or replaced element
    /// to `on_removed` in the order it left the list.
    pub fn align_with<L>(
        &mut self,
        list: &mut L,
        target: &[S],
        mut on_removed: impl FnMut(T),
    ) -> Result<AlignReport>
    where
        L: EditableList<Item = T>,
    {
        let started = Instant::now();
        let span = info_span!(
            "tmirror.align",
            target_len = target.len(),
            inserted = tracing::field::Empty,
            removed = tracing::field::Empty,
            replaced = tracing::field::Empty,
            moved = tracing::field::Empty,
            cleared = tracing::field::Empty,
            duration_us = tracing::field::Empty
        );
        let _entered = span.enter();

        let mut converted = vec![false; target.len()];
        let report = self.run(list, target, &mut converted, &mut on_removed)?;

        if self.config.verify {
            self.verify(list, target, &converted);
        }

        let duration_us = started.elapsed().as_micros() as u64;
        span.record("inserted", report.inserted as u64);
        span.record("removed", report.removed as u64);
        span.record("replaced", report.replaced as u64);
        span.record("moved", report.moved as u64);
        span.record("cleared", report.cleared);
        span.record("duration_us", duration_us);
        if !report.is_noop() {
            debug!(
                edits = report.edits(),
                list_len = list.item_count(),
                duration_us,
                "alignment pass applied edits"
            );
        }
        Ok(report)
    }

    fn run<L>(
        &mut self,
        list: &mut L,
        target: &[S],
        converted: &mut [bool],
        on_removed: &mut impl FnMut(T),
    ) -> Result<AlignReport>
    where
        L: EditableList<Item = T>,
    {
        let mut report = AlignReport::default();

        if target.is_empty() {
            if list.item_count() > 0 {
                for item in list.clear_items()? {
                    on_removed(item);
                }
                report.cleared = true;
                self.trace_edit("clear", 0, 0);
            }
            return Ok(report);
        }

        let mut i = 0;
        while i < target.len() {
            let wanted = &target[i];
            let len = list.item_count();

            if i < len && list.with_item(i, |item| (self.matches)(item, wanted)) {
                i += 1;
                continue;
            }

            let found = (i + 1..len).find(|&j| list.with_item(j, |item| (self.matches)(item, wanted)));
            let current_needed = i < len
                && list.with_item(i, |item| {
                    target[i + 1..].iter().any(|later| (self.matches)(item, later))
                });

            match found {
                Some(j) if current_needed => {
                    list.move_item(j, i)?;
                    report.moved += 1;
                    self.trace_edit("move", j, i);
                    i += 1;
                }
                Some(_) => {
                    // The current slot holds nothing the target still wants.
                    on_removed(list.remove_item(i)?);
                    report.removed += 1;
                    self.trace_edit("remove", i, i);
                }
                None if i >= len || current_needed => {
                    let item = (self.convert)(wanted)?;
                    list.insert_item(i, item)?;
                    converted[i] = true;
                    report.inserted += 1;
                    self.trace_edit("insert", i, i);
                    i += 1;
                }
                None => {
                    let item = (self.convert)(wanted)?;
                    on_removed(list.replace_item(i, item)?);
                    converted[i] = true;
                    report.replaced += 1;
                    self.trace_edit("replace", i, i);
                    i += 1;
                }
            }
        }

        while list.item_count() > target.len() {
            let last = list.item_count() - 1;
            on_removed(list.remove_item(last)?);
            report.removed += 1;
            self.trace_edit("remove", last, last);
        }

        Ok(report)
    }

    fn trace_edit(&self, op: &'static str, from: usize, to: usize) {
        if self.config.trace_edits {
            trace!(op, from, to, "alignment edit");
        }
    }

    /// Slots filled by `convert` during the pass are only checked for
    /// presence: a freshly converted element need not satisfy `matches`
    /// against its own input (NaN, custom matchers).
    fn verify<L>(&self, list: &L, target: &[S], converted: &[bool])
    where
        L: EditableList<Item = T>,
    {
        assert_eq!(
            list.item_count(),
            target.len(),
            "alignment contract violated: list length differs from target"
        );
        for (index, wanted) in target.iter().enumerate() {
            if converted[index] {
                continue;
            }
            assert!(
                list.with_item(index, |item| (self.matches)(item, wanted)),
                "alignment contract violated: element at index {index} does not match target"
            );
        }
    }
}
