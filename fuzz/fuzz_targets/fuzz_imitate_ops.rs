#![no_main]

use std::cell::RefCell;
use std::rc::Rc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tmirror_core::ObservableList;
use tmirror_imitate::ImitableCollection;

#[derive(Debug, Arbitrary)]
enum Op {
    Push(u8),
    Insert(u8, u8),
    RemoveAt(u8),
    Replace(u8, u8),
    Move(u8, u8),
    Clear,
    Pause,
    ClearAndPause,
    Imitate,
}

fuzz_target!(|ops: Vec<Op>| {
    let source: ObservableList<u8> = ObservableList::new();
    let live = Rc::new(RefCell::new(0i64));
    let created = Rc::clone(&live);
    let dropped = Rc::clone(&live);
    let mirror = ImitableCollection::builder(source.clone(), move |v: &u8| {
        *created.borrow_mut() += 1;
        u16::from(*v) * 3
    })
    .on_removed(move |_| *dropped.borrow_mut() -= 1)
    .build()
    .expect("empty source");

    for op in ops.iter().take(256) {
        let len = source.len();
        let at = |i: u8, extra: usize| usize::from(i) % (len + extra).max(1);
        let _ = match *op {
            Op::Push(v) => source.push(v % 8),
            Op::Insert(i, v) => source.insert(at(i, 1), v % 8),
            Op::RemoveAt(i) if len > 0 => source.remove_at(at(i, 0)).map(drop),
            Op::Replace(i, v) if len > 0 => source.replace(at(i, 0), v % 8).map(drop),
            Op::Move(a, b) if len > 0 => source.move_item(at(a, 0), at(b, 0)),
            Op::Clear => source.clear(),
            Op::Pause => mirror.pause(),
            Op::ClearAndPause => mirror.clear_and_pause(),
            Op::Imitate => mirror.imitate(),
            _ => Ok(()),
        };

        // Post-conditions that must always hold:
        assert_eq!(*live.borrow() as usize, mirror.len(), "leaked or double-removed element");
        if mirror.is_imitating() {
            let expected: Vec<u16> = source.snapshot().iter().map(|v| u16::from(*v) * 3).collect();
            assert_eq!(mirror.snapshot(), expected, "mirror diverged from source");
        }
    }

    mirror.dispose().expect("dispose");
    assert_eq!(*live.borrow(), 0, "elements outlived dispose");
});
