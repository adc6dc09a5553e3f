use storage::{HashFunction, SlotDerivation, StorageMap};
use types::{VmError, Word};

fn word(hex_str: &str) -> Word {
    let bytes = hex::decode(hex_str).expect("valid hex");
    Word::from_be_slice(&bytes).expect("at most 32 bytes")
}

#[test]
fn unwritten_slot_reads_zero() {
    let storage = StorageMap::new();
    assert_eq!(storage.read(&Word::from(7u64)), Word::ZERO);
    assert!(storage.is_empty());
}

#[test]
fn reads_are_idempotent() {
    let mut storage = StorageMap::new();
    storage.write(Word::from(3u64), Word::from(0xabcdu64));
    let first = storage.read(&Word::from(3u64));
    let second = storage.read(&Word::from(3u64));
    assert_eq!(first, second);
    assert_eq!(first, Word::from(0xabcdu64));
}

#[test]
fn writing_zero_clears_the_slot() {
    let mut storage = StorageMap::new();
    storage.write(Word::from(1u64), Word::from(5u64));
    assert_eq!(storage.len(), 1);
    storage.write(Word::from(1u64), Word::ZERO);
    assert!(storage.is_empty());
    assert_eq!(storage.read(&Word::from(1u64)), Word::ZERO);
}

#[test]
fn keccak_slot_hash_matches_known_values() {
    let storage = StorageMap::new();
    assert_eq!(
        storage.slot_hash(&Word::ZERO),
        word("290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563")
    );
    assert_eq!(
        storage.slot_hash(&Word::from(1u64)),
        word("b10e2d527612073b26eecdfd717e6a320cf44b4afac2b0732d9fcbe2b7fa0cf6")
    );
}

#[test]
fn sha256_hasher_is_configurable() {
    let storage = StorageMap::with_hasher(HashFunction::Sha256);
    assert_eq!(
        storage.slot_hash(&Word::ZERO),
        word("66687aadf862bd776c8fc18b8e9f8e20089714856ee233b3902a591d0d5f2925")
    );
}

#[test]
fn dynamic_array_push_lays_out_length_and_elements() {
    // scalar at slot 0, dynamic array declared at slot 1
    let mut storage = StorageMap::new();
    let scalar = Word::from(0u64);
    let array = Word::from(1u64);
    storage.write(scalar, Word::from(1234u64));

    storage.array_push(array, Word::from(42u64));
    storage.array_push(array, Word::from(99u64));

    assert_eq!(storage.read(&array), Word::from(2u64));

    let first = storage.derive_array_slot(array, Word::ZERO);
    assert_eq!(first, storage.slot_hash(&array));
    assert_eq!(
        first,
        word("b10e2d527612073b26eecdfd717e6a320cf44b4afac2b0732d9fcbe2b7fa0cf6")
    );
    assert_eq!(storage.read(&first), Word::from(42u64));

    let second = storage.derive_array_slot(array, Word::from(1u64));
    assert_eq!(
        second,
        word("b10e2d527612073b26eecdfd717e6a320cf44b4afac2b0732d9fcbe2b7fa0cf7")
    );
    assert_eq!(storage.read(&second), Word::from(99u64));

    assert_eq!(storage.read(&scalar), Word::from(1234u64));
}

#[test]
fn array_get_and_pop_respect_length() {
    let mut storage = StorageMap::new();
    let base = Word::from(4u64);
    storage.array_push(base, Word::from(10u64));

    assert_eq!(storage.array_get(base, Word::ZERO), Ok(Word::from(10u64)));
    assert!(matches!(
        storage.array_get(base, Word::from(1u64)),
        Err(VmError::ArrayIndexOutOfBounds { .. })
    ));

    assert_eq!(storage.array_pop(base), Ok(Word::from(10u64)));
    assert_eq!(storage.array_len(&base), Word::ZERO);
    assert!(storage.is_empty());
    assert!(matches!(
        storage.array_pop(base),
        Err(VmError::ArrayIndexOutOfBounds { .. })
    ));
}

#[test]
fn mapping_slot_hashes_key_then_base() {
    let mut storage = StorageMap::new();
    let base = Word::ZERO;
    let key = Word::from(0xbeefu64);

    let slot = storage.derive_mapping_slot(base, key);
    assert_eq!(slot, HashFunction::Keccak256.hash_pair(&key, &base));
    assert_ne!(slot, HashFunction::Keccak256.hash_pair(&base, &key));
    assert_ne!(slot, storage.slot_hash(&base).wrapping_add(key));

    storage.write(slot, Word::from(777u64));
    assert_eq!(storage.read(&slot), Word::from(777u64));
}

#[test]
fn mapping_of_zero_key_at_slot_zero() {
    let storage = StorageMap::new();
    assert_eq!(
        storage.derive_mapping_slot(Word::ZERO, Word::ZERO),
        word("ad3228b676f7d3cd4284a5443f17f1962b36e491b30a40b2405849e597ba5fb5")
    );
}

#[test]
fn struct_members_take_sequential_slots() {
    let storage = StorageMap::new();
    let base = Word::from(5u64);
    assert_eq!(storage.derive_struct_member_slot(base, 0), base);
    assert_eq!(storage.derive_struct_member_slot(base, 2), Word::from(7u64));
}

#[test]
fn derive_slot_dispatches_every_strategy() {
    let storage = StorageMap::new();
    let base = Word::from(1u64);
    assert_eq!(
        storage.derive_slot(SlotDerivation::Sequential { index: 3 }),
        Word::from(3u64)
    );
    assert_eq!(
        storage.derive_slot(SlotDerivation::HashedArray {
            base,
            index: Word::from(2u64)
        }),
        storage.slot_hash(&base).wrapping_add(Word::from(2u64))
    );
    assert_eq!(
        storage.derive_slot(SlotDerivation::HashedMapping {
            base,
            key: Word::from(9u64)
        }),
        storage.derive_mapping_slot(base, Word::from(9u64))
    );
    assert_eq!(
        storage.derive_slot(SlotDerivation::PackedStruct { base, member: 1 }),
        Word::from(2u64)
    );
}

#[test]
fn array_slot_arithmetic_wraps_at_2_256() {
    let storage = StorageMap::new();
    let max = Word([0xff; 32]);
    let base = Word::from(1u64);
    let wrapped = storage.derive_array_slot(base, max);
    assert_eq!(
        wrapped.wrapping_add(Word::from(1u64)),
        storage.slot_hash(&base)
    );
}
