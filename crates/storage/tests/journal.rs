use proptest::prelude::*;
use storage::StorageMap;
use types::{VmError, Word};

#[test]
fn revert_restores_previous_values() {
    let mut storage = StorageMap::new();
    storage.write(Word::from(1u64), Word::from(10u64));

    let snapshot = storage.snapshot();
    storage.write(Word::from(1u64), Word::from(11u64));
    storage.write(Word::from(2u64), Word::from(20u64));
    storage.array_push(Word::from(3u64), Word::from(30u64));

    storage.revert_to(snapshot).expect("snapshot is valid");
    assert_eq!(storage.read(&Word::from(1u64)), Word::from(10u64));
    assert_eq!(storage.read(&Word::from(2u64)), Word::ZERO);
    assert_eq!(storage.array_len(&Word::from(3u64)), Word::ZERO);
    assert_eq!(storage.len(), 1);
}

#[test]
fn nested_snapshots_unwind_in_order() {
    let mut storage = StorageMap::new();
    let outer = storage.snapshot();
    storage.write(Word::from(1u64), Word::from(1u64));
    let inner = storage.snapshot();
    storage.write(Word::from(1u64), Word::from(2u64));

    storage.revert_to(inner).expect("inner");
    assert_eq!(storage.read(&Word::from(1u64)), Word::from(1u64));
    storage.revert_to(outer).expect("outer");
    assert!(storage.is_empty());
}

#[test]
fn stale_snapshot_is_rejected() {
    let mut storage = StorageMap::new();
    storage.write(Word::from(1u64), Word::from(1u64));
    let snapshot = storage.snapshot();
    storage.commit();
    assert_eq!(
        storage.revert_to(snapshot),
        Err(VmError::InvalidSnapshot {
            id: 1,
            journal_len: 0
        })
    );
    assert_eq!(storage.read(&Word::from(1u64)), Word::from(1u64));
}

#[test]
fn dump_lists_live_slots() {
    let mut storage = StorageMap::new();
    storage.write(Word::from(2u64), Word::from(0x2au64));
    let dump = storage.to_string();
    assert!(dump.starts_with("--- Storage Dump ---"));
    assert!(dump.contains(
        "Slot: 0x0000000000000000000000000000000000000000000000000000000000000002"
    ));
    assert!(dump.contains(
        "Value: 0x000000000000000000000000000000000000000000000000000000000000002a"
    ));
}

proptest! {
    #[test]
    fn any_write_sequence_reverts_to_snapshot(
        seed in prop::collection::vec((0u64..16, any::<u64>()), 0..32),
        writes in prop::collection::vec((0u64..16, any::<u64>()), 0..32),
    ) {
        let mut storage = StorageMap::new();
        for (slot, value) in &seed {
            storage.write(Word::from(*slot), Word::from(*value));
        }
        let before: Vec<Word> = (0u64..16).map(|s| storage.read(&Word::from(s))).collect();

        let snapshot = storage.snapshot();
        for (slot, value) in &writes {
            storage.write(Word::from(*slot), Word::from(*value));
        }
        storage.revert_to(snapshot).unwrap();

        let after: Vec<Word> = (0u64..16).map(|s| storage.read(&Word::from(s))).collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn last_write_wins(slot in any::<u64>(), values in prop::collection::vec(any::<u64>(), 1..8)) {
        let mut storage = StorageMap::new();
        for value in &values {
            storage.write(Word::from(slot), Word::from(*value));
        }
        let expected = Word::from(*values.last().unwrap());
        prop_assert_eq!(storage.read(&Word::from(slot)), expected);
        prop_assert_eq!(storage.read(&Word::from(slot)), expected);
    }
}
