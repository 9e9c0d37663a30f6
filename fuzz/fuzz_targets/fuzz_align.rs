#![no_main]

use std::rc::Rc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tmirror_align::Aligner;
use tmirror_core::{AlignConfig, ObservableList};

#[derive(Debug, Arbitrary)]
struct Input {
    start: Vec<u8>,
    targets: Vec<Vec<u8>>,
}

fuzz_target!(|input: Input| {
    // Keep keys in a small alphabet so duplicates and moves are common.
    let start: Vec<u8> = input.start.iter().take(64).map(|k| k % 16).collect();
    let list = ObservableList::from_vec(start.iter().map(|k| Rc::new(*k)).collect());
    let events = Rc::new(std::cell::Cell::new(0usize));
    let counter = Rc::clone(&events);
    let _sub = list.subscribe(move |_| {
        counter.set(counter.get() + 1);
        Ok(())
    });

    let mut aligner = Aligner::new(
        |key: &u8| Ok(Rc::new(*key)),
        |item: &Rc<u8>, key: &u8| **item == *key,
    )
    .with_config(AlignConfig {
        verify: true,
        ..AlignConfig::default()
    });

    for target in input.targets.iter().take(8) {
        let target: Vec<u8> = target.iter().take(64).map(|k| k % 16).collect();
        let before = list.snapshot();
        events.set(0);

        let report = aligner
            .align(&mut list.clone(), &target)
            .expect("infallible converter");

        // Post-conditions that must always hold:
        let after: Vec<u8> = list.snapshot().iter().map(|k| **k).collect();
        assert_eq!(after, target, "list does not match target");
        assert_eq!(events.get(), report.edits(), "one event per edit");
        if before.iter().map(|k| **k).eq(target.iter().copied()) {
            assert!(report.is_noop(), "identical sequence produced edits");
        }
        let again = aligner
            .align(&mut list.clone(), &target)
            .expect("infallible converter");
        assert!(again.is_noop(), "second pass was not a no-op");
    }
});
