#![forbid(unsafe_code)]

//! Live, pausable mirror of a [`SourceSequence`].
//!
//! # Design
//!
//! An [`ImitableCollection<S, T>`] keeps a list of [`Converted`] pairs, one
//! per source element, and exposes the `after` halves as its own sequence.
//! While imitating it watches the source; every source change triggers a
//! full [`Aligner`] pass against a fresh snapshot instead of a localized
//! patch. That costs O(n) per source event but stays correct when the source
//! changes several times before the mirror observes it.
//!
//! Each pass runs in three phases:
//!
//! 1. Align the pair list while holding the state borrow. Edits are recorded
//!    as mirror [`ChangeEvent`]s and removed values are set aside.
//! 2. Release the borrow, hand removed values to `on_removed` in the order
//!    they left the list.
//! 3. Publish the recorded events, then `Count` / `Items` property changes.
//!
//! Source changes that arrive during phases 2 and 3 (a subscriber mutating
//! the source) are coalesced into one more pass once the current one ends.
//!
//! # Failure Modes
//!
//! - **Generator failure**: the pass stops at the failing element and the
//!   error is returned from whichever call triggered the pass (`imitate`,
//!   `resync`, or the source mutation itself). Edits already applied stay.
//! - **Converter re-entry**: a converter that reads the collection it is
//!   populating hits a held `RefCell` borrow and panics. A converter that
//!   mutates the source only schedules another pass.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tmirror_align::{AlignReport, Aligner};
use tmirror_core::{
    AlignConfig, ChangeCallback, ChangeEvent, Error, Notifier, PropertyCallback, PropertyChange,
    Result, SourceSequence, Subscription,
};
use tracing::debug;

use crate::converted::{Converted, PairEdits};

type ConvertFn<S, T> = Box<dyn FnMut(&S) -> Result<T>>;
type RemovedFn<T> = Box<dyn FnMut(T)>;
type MatchFn<S> = Box<dyn Fn(&S, &S) -> bool>;
type AbsentFn<S> = Box<dyn Fn(&S) -> bool>;

const WHAT: &str = "imitable collection";

struct State<S, T> {
    pairs: Vec<Converted<S, T>>,
    imitating: bool,
    disposed: bool,
}

struct Shared<S, T> {
    source: Rc<dyn SourceSequence<S>>,
    state: RefCell<State<S, T>>,
    aligner: RefCell<Aligner<S, Converted<S, T>>>,
    on_removed: RefCell<Option<RemovedFn<T>>>,
    watches: RefCell<Vec<Subscription>>,
    syncing: Cell<bool>,
    resync_pending: Cell<bool>,
    /// A pending rerun was requested through `resync`, which runs while
    /// paused too.
    resync_forced: Cell<bool>,
    changes: Notifier<ChangeEvent<T>>,
    properties: Notifier<PropertyChange>,
}

/// A mirror sequence of `T`, generated from and kept aligned with a source
/// sequence of `S`.
///
/// Cloning yields another handle to the same collection.
pub struct ImitableCollection<S, T> {
    shared: Rc<Shared<S, T>>,
}

impl<S, T> Clone for ImitableCollection<S, T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<S, T> std::fmt::Debug for ImitableCollection<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("ImitableCollection")
            .field("len", &state.pairs.len())
            .field("imitating", &state.imitating)
            .field("disposed", &state.disposed)
            .finish()
    }
}

impl<S: Clone + PartialEq + 'static, T: Clone + 'static> ImitableCollection<S, T> {
    /// Mirror `source` through `convert`, imitating immediately.
    pub fn new(
        source: impl SourceSequence<S> + 'static,
        convert: impl FnMut(&S) -> T + 'static,
    ) -> Result<Self> {
        Self::builder(source, convert).build()
    }

    /// Start configuring a mirror with an infallible converter.
    pub fn builder(
        source: impl SourceSequence<S> + 'static,
        mut convert: impl FnMut(&S) -> T + 'static,
    ) -> CollectionBuilder<S, T> {
        Self::try_builder(source, move |s| Ok(convert(s)))
    }

    /// Start configuring a mirror with a fallible converter.
    ///
    /// Converter failures should be reported as [`Error::Generator`]; a
    /// predicate set with [`CollectionBuilder::absent_when`] then classifies
    /// whether the offending element was absent.
    pub fn try_builder(
        source: impl SourceSequence<S> + 'static,
        convert: impl FnMut(&S) -> Result<T> + 'static,
    ) -> CollectionBuilder<S, T> {
        CollectionBuilder {
            source: Rc::new(source),
            convert: Box::new(convert),
            on_removed: None,
            matches: None,
            absent_when: None,
            start_imitating: true,
            config: AlignConfig::default(),
        }
    }

    // --- reads ----------------------------------------------------------

    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.state.borrow().pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mirror element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.shared
            .state
            .borrow()
            .pairs
            .get(index)
            .map(|pair| pair.after.clone())
    }

    /// Current mirror contents, in order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<T> {
        self.shared
            .state
            .borrow()
            .pairs
            .iter()
            .map(|pair| pair.after.clone())
            .collect()
    }

    /// Source elements the mirror currently stands for, in order.
    #[must_use]
    pub fn sources(&self) -> Vec<S> {
        self.shared
            .state
            .borrow()
            .pairs
            .iter()
            .map(|pair| pair.before.clone())
            .collect()
    }

    /// Borrow the pair list.
    ///
    /// The closure must not mutate this collection or its source.
    pub fn with_pairs<R>(&self, f: impl FnOnce(&[Converted<S, T>]) -> R) -> R {
        f(&self.shared.state.borrow().pairs)
    }

    /// Iterate over a snapshot of the mirror.
    pub fn iter(&self) -> std::vec::IntoIter<T> {
        self.snapshot().into_iter()
    }

    #[must_use]
    pub fn is_imitating(&self) -> bool {
        self.shared.state.borrow().imitating
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.shared.state.borrow().disposed
    }

    /// Whether both handles refer to the same collection.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    // --- subscriptions --------------------------------------------------

    /// Subscribe to mirror-side structural changes.
    pub fn subscribe(
        &self,
        callback: impl Fn(&ChangeEvent<T>) -> Result<()> + 'static,
    ) -> Subscription {
        self.shared.changes.subscribe(callback)
    }

    /// Subscribe to property changes: this collection's own `Count` / `Items`
    /// plus whatever the source raises while imitating.
    pub fn subscribe_properties(
        &self,
        callback: impl Fn(&PropertyChange) -> Result<()> + 'static,
    ) -> Subscription {
        self.shared.properties.subscribe(callback)
    }

    // --- lifecycle ------------------------------------------------------

    /// Start following the source and align with its current content.
    ///
    /// No-op when already imitating.
    pub fn imitate(&self) -> Result<()> {
        {
            let mut state = self.shared.state.borrow_mut();
            if state.disposed {
                return Err(Error::disposed(WHAT));
            }
            if state.imitating {
                return Ok(());
            }
            state.imitating = true;
        }
        self.watch_source();
        let report = self.sync(false)?;
        debug!(
            len = self.len(),
            edits = report.edits(),
            "imitable collection imitating"
        );
        Ok(())
    }

    /// Stop following the source. The mirror keeps its current content.
    pub fn pause(&self) -> Result<()> {
        self.ensure_live()?;
        self.stop_watching();
        debug!(len = self.len(), "imitable collection paused");
        Ok(())
    }

    /// Stop following the source and empty the mirror, handing every mirror
    /// element to `on_removed` in list order. Raises one reset event.
    pub fn clear_and_pause(&self) -> Result<()> {
        self.ensure_live()?;
        self.clear_and_stop()
    }

    /// Re-run alignment against the current source content.
    ///
    /// Works while paused too; this is how a snapshot-only source is picked
    /// up again.
    pub fn resync(&self) -> Result<AlignReport> {
        self.ensure_live()?;
        self.sync(true)
    }

    /// Tear down: clear and pause, then release every internal subscription
    /// and the removal callback. Idempotent.
    pub fn dispose(&self) -> Result<()> {
        {
            let mut state = self.shared.state.borrow_mut();
            if state.disposed {
                return Ok(());
            }
            state.disposed = true;
        }
        let outcome = self.clear_and_stop();
        self.shared.on_removed.borrow_mut().take();
        debug!("imitable collection disposed");
        outcome
    }

    // --- internals ------------------------------------------------------

    fn ensure_live(&self) -> Result<()> {
        if self.is_disposed() {
            Err(Error::disposed(WHAT))
        } else {
            Ok(())
        }
    }

    fn watch_source(&self) {
        let weak = Rc::downgrade(&self.shared);
        let on_change: ChangeCallback<S> = Rc::new(move |_event: &ChangeEvent<S>| {
            match weak.upgrade() {
                Some(shared) => ImitableCollection { shared }.source_changed(),
                None => Ok(()),
            }
        });
        let weak = Rc::downgrade(&self.shared);
        let on_property: PropertyCallback =
            Rc::new(move |property: &PropertyChange| match weak.upgrade() {
                Some(shared) => shared.properties.notify(property),
                None => Ok(()),
            });

        let mut watches = self.shared.watches.borrow_mut();
        watches.extend(self.shared.source.watch(on_change));
        watches.extend(self.shared.source.watch_properties(on_property));
    }

    fn stop_watching(&self) {
        self.shared.state.borrow_mut().imitating = false;
        let released = std::mem::take(&mut *self.shared.watches.borrow_mut());
        drop(released);
    }

    fn clear_and_stop(&self) -> Result<()> {
        self.stop_watching();
        let drained: Vec<T> = self
            .shared
            .state
            .borrow_mut()
            .pairs
            .drain(..)
            .map(|pair| pair.after)
            .collect();
        debug!(len = drained.len(), "imitable collection cleared and paused");
        if drained.is_empty() {
            return Ok(());
        }
        self.release(drained);
        self.publish(vec![ChangeEvent::reset()], true)
    }

    fn source_changed(&self) -> Result<()> {
        // A converter or hook mutated the source mid-pass.
        if self.shared.syncing.get() {
            self.shared.resync_pending.set(true);
            return Ok(());
        }
        let state = self.shared.state.borrow();
        if !state.imitating || state.disposed {
            return Ok(());
        }
        drop(state);
        self.sync(false).map(|_| ())
    }

    /// Run alignment passes until no source change is pending. Reruns stop
    /// once the collection is paused or disposed, unless `resync` asked for
    /// them.
    fn sync(&self, forced: bool) -> Result<AlignReport> {
        let shared = &self.shared;
        if shared.syncing.get() {
            shared.resync_pending.set(true);
            if forced {
                shared.resync_forced.set(true);
            }
            return Ok(AlignReport::default());
        }

        shared.syncing.set(true);
        let mut total = AlignReport::default();
        let outcome = loop {
            match self.sync_once() {
                Ok(report) => accumulate(&mut total, report),
                Err(err) => break Err(err),
            }
            let rerun = shared.resync_pending.replace(false);
            let forced = shared.resync_forced.replace(false);
            if !rerun || self.is_disposed() || !(forced || self.is_imitating()) {
                break Ok(total);
            }
        };
        shared.syncing.set(false);
        shared.resync_pending.set(false);
        shared.resync_forced.set(false);
        outcome
    }

    fn sync_once(&self) -> Result<AlignReport> {
        let shared = &self.shared;
        let target = shared.source.snapshot();
        let mut events = Vec::new();
        let mut removed = Vec::new();

        let (outcome, len_before, len_after) = {
            let mut state = shared.state.borrow_mut();
            let mut aligner = shared.aligner.borrow_mut();
            let len_before = state.pairs.len();
            let mut edits = PairEdits {
                pairs: &mut state.pairs,
                events: &mut events,
            };
            let outcome =
                aligner.align_with(&mut edits, &target, |pair: Converted<S, T>| {
                    removed.push(pair.after);
                });
            (outcome, len_before, state.pairs.len())
        };

        self.release(removed);
        let published = self.publish(events, len_before != len_after);
        let report = outcome?;
        published?;
        Ok(report)
    }

    fn release(&self, removed: Vec<T>) {
        if removed.is_empty() {
            return;
        }
        // Taken out for the duration so the hook may touch this collection.
        let hook = self.shared.on_removed.borrow_mut().take();
        match hook {
            Some(mut hook) => {
                for item in removed {
                    hook(item);
                }
                let mut slot = self.shared.on_removed.borrow_mut();
                if slot.is_none() && !self.is_disposed() {
                    *slot = Some(hook);
                }
            }
            None => drop(removed),
        }
    }

    fn publish(&self, events: Vec<ChangeEvent<T>>, count_changed: bool) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        let mut first_error = None;
        for event in &events {
            if let Err(err) = self.shared.changes.notify(event) {
                first_error.get_or_insert(err);
            }
        }
        if count_changed {
            if let Err(err) = self.shared.properties.notify(&PropertyChange::Count) {
                first_error.get_or_insert(err);
            }
        }
        if let Err(err) = self.shared.properties.notify(&PropertyChange::Items) {
            first_error.get_or_insert(err);
        }
        first_error.map_or(Ok(()), Err)
    }
}

fn accumulate(total: &mut AlignReport, pass: AlignReport) {
    total.inserted += pass.inserted;
    total.removed += pass.removed;
    total.replaced += pass.replaced;
    total.moved += pass.moved;
    total.cleared |= pass.cleared;
}

impl<'a, S: Clone + PartialEq + 'static, T: Clone + 'static> IntoIterator
    for &'a ImitableCollection<S, T>
{
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<S: Clone + PartialEq + 'static, T: Clone + 'static> SourceSequence<T>
    for ImitableCollection<S, T>
{
    fn snapshot(&self) -> Vec<T> {
        ImitableCollection::snapshot(self)
    }

    fn watch(&self, on_change: ChangeCallback<T>) -> Option<Subscription> {
        Some(self.subscribe(move |event| on_change(event)))
    }

    fn watch_properties(&self, on_property: PropertyCallback) -> Option<Subscription> {
        Some(self.subscribe_properties(move |property| on_property(property)))
    }
}

/// Configures an [`ImitableCollection`] before its first alignment.
pub struct CollectionBuilder<S, T> {
    source: Rc<dyn SourceSequence<S>>,
    convert: ConvertFn<S, T>,
    on_removed: Option<RemovedFn<T>>,
    matches: Option<MatchFn<S>>,
    absent_when: Option<AbsentFn<S>>,
    start_imitating: bool,
    config: AlignConfig,
}

impl<S, T> std::fmt::Debug for CollectionBuilder<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionBuilder")
            .field("start_imitating", &self.start_imitating)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: Clone + PartialEq + 'static, T: Clone + 'static> CollectionBuilder<S, T> {
    /// Called once for every mirror element that leaves the collection.
    #[must_use]
    pub fn on_removed(mut self, on_removed: impl FnMut(T) + 'static) -> Self {
        self.on_removed = Some(Box::new(on_removed));
        self
    }

    /// Decide whether an existing pair (by its source half) stands for a
    /// source element. Defaults to `==`.
    #[must_use]
    pub fn matches(mut self, matches: impl Fn(&S, &S) -> bool + 'static) -> Self {
        self.matches = Some(Box::new(matches));
        self
    }

    /// Classify source elements as absent, for generator failure reports.
    #[must_use]
    pub fn absent_when(mut self, absent: impl Fn(&S) -> bool + 'static) -> Self {
        self.absent_when = Some(Box::new(absent));
        self
    }

    #[must_use]
    pub fn start_imitating(mut self, start: bool) -> Self {
        self.start_imitating = start;
        self
    }

    /// Build without aligning; the mirror stays empty until
    /// [`ImitableCollection::imitate`].
    #[must_use]
    pub fn start_paused(self) -> Self {
        self.start_imitating(false)
    }

    #[must_use]
    pub fn align_config(mut self, config: AlignConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the collection, running the first alignment pass if it starts
    /// imitating.
    pub fn build(self) -> Result<ImitableCollection<S, T>> {
        let Self {
            source,
            mut convert,
            on_removed,
            matches,
            absent_when,
            start_imitating,
            config,
        } = self;

        let generate = move |s: &S| -> Result<Converted<S, T>> {
            match convert(s) {
                Ok(after) => Ok(Converted {
                    before: s.clone(),
                    after,
                }),
                Err(Error::Generator {
                    absent_input: false,
                    source,
                }) if absent_when.as_ref().is_some_and(|absent| absent(s)) => {
                    Err(Error::Generator {
                        absent_input: true,
                        source,
                    })
                }
                Err(err) => Err(err),
            }
        };
        let aligner = match matches {
            Some(matches) => Aligner::new(generate, move |pair: &Converted<S, T>, s: &S| {
                matches(&pair.before, s)
            }),
            None => Aligner::new(generate, |pair: &Converted<S, T>, s: &S| pair.before == *s),
        }
        .with_config(config);

        let collection = ImitableCollection {
            shared: Rc::new(Shared {
                source,
                state: RefCell::new(State {
                    pairs: Vec::new(),
                    imitating: false,
                    disposed: false,
                }),
                aligner: RefCell::new(aligner),
                on_removed: RefCell::new(on_removed),
                watches: RefCell::new(Vec::new()),
                syncing: Cell::new(false),
                resync_pending: Cell::new(false),
                resync_forced: Cell::new(false),
                changes: Notifier::new(),
                properties: Notifier::new(),
            }),
        };
        if start_imitating {
            collection.imitate()?;
        }
        Ok(collection)
    }
}
