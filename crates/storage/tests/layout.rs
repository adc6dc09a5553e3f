use storage::{SlotPosition, StorageLayout, StorageMap, VariableKind};
use types::{VmError, Word};

#[test]
fn scalars_take_declaration_order_slots() {
    let mut layout = StorageLayout::new();
    let a = layout.declare_scalar("a", 32).unwrap();
    let b = layout.declare_scalar("b", 32).unwrap();
    let items = layout.declare_dynamic_array("items");

    assert_eq!(a, SlotPosition::whole(Word::from(0u64)));
    assert_eq!(b, SlotPosition::whole(Word::from(1u64)));
    assert_eq!(items, Word::from(2u64));
    assert_eq!(layout.slots_used(), 3);
}

#[test]
fn small_scalars_share_a_slot() {
    let mut layout = StorageLayout::new();
    let flag = layout.declare_scalar("flag", 1).unwrap();
    let owner = layout.declare_scalar("owner", 20).unwrap();
    let counter = layout.declare_scalar("counter", 16).unwrap();

    assert_eq!(flag.slot, Word::ZERO);
    assert_eq!(flag.offset, 0);
    assert_eq!(owner.slot, Word::ZERO);
    assert_eq!(owner.offset, 1);
    // 21 + 16 > 32, so counter starts slot 1
    assert_eq!(counter.slot, Word::from(1u64));
    assert_eq!(counter.offset, 0);
}

#[test]
fn containers_start_a_fresh_slot() {
    let mut layout = StorageLayout::new();
    layout.declare_scalar("small", 8).unwrap();
    let balances = layout.declare_mapping("balances");
    let point = layout.declare_struct("point", 3);
    let fixed = layout.declare_fixed_array("fixed", 2);
    let after = layout.declare_scalar("after", 1).unwrap();

    assert_eq!(balances, Word::from(1u64));
    assert_eq!(point, Word::from(2u64));
    assert_eq!(fixed, Word::from(5u64));
    assert_eq!(after.slot, Word::from(7u64));

    let decl = layout.get("point").unwrap();
    assert_eq!(decl.kind, VariableKind::Struct { members: 3 });
}

#[test]
fn invalid_scalar_size_is_rejected() {
    let mut layout = StorageLayout::new();
    assert!(matches!(
        layout.declare_scalar("zero", 0),
        Err(VmError::InvalidConfig(_))
    ));
    assert!(matches!(
        layout.declare_scalar("wide", 33),
        Err(VmError::InvalidConfig(_))
    ));
}

#[test]
fn packed_values_do_not_clobber_neighbours() {
    let mut layout = StorageLayout::new();
    let flag = layout.declare_scalar("flag", 1).unwrap();
    let count = layout.declare_scalar("count", 4).unwrap();

    let mut storage = StorageMap::new();
    storage.write_packed(&flag, Word::from(1u64)).unwrap();
    storage.write_packed(&count, Word::from(0xdeadbeefu64)).unwrap();

    assert_eq!(storage.read_packed(&flag).unwrap(), Word::from(1u64));
    assert_eq!(storage.read_packed(&count).unwrap(), Word::from(0xdeadbeefu64));

    let raw = storage.read(&Word::ZERO);
    assert_eq!(&raw.0[27..], &[0xde, 0xad, 0xbe, 0xef, 0x01]);

    storage.write_packed(&flag, Word::ZERO).unwrap();
    assert_eq!(storage.read_packed(&count).unwrap(), Word::from(0xdeadbeefu64));
}

#[test]
fn packed_write_rejects_wide_values() {
    let mut layout = StorageLayout::new();
    let flag = layout.declare_scalar("flag", 1).unwrap();
    let mut storage = StorageMap::new();
    assert_eq!(
        storage.write_packed(&flag, Word::from(0x100u64)),
        Err(VmError::PackedValueOverflow {
            value: Word::from(0x100u64),
            size: 1
        })
    );
    assert!(storage.is_empty());
}
