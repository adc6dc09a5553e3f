use once_cell::sync::Lazy;
use vm::probe::{decode_call, probe_memory, probe_storage, slot_hash};
use vm::{AbiType, AbiValue, CallData, ContextConfig, ExecutionContext, Word};

/// Raw memory words after allocating the array `[2, 4]` in fresh memory.
static ARRAY_LAYOUT: Lazy<Vec<(usize, u64)>> = Lazy::new(|| {
    vec![
        (0, 0),    // scratch
        (1, 0),    // scratch
        (2, 0xe0), // free pointer after the allocation
        (3, 0),    // zero word
        (4, 2),    // length
        (5, 2),    // element 0
        (6, 4),    // element 1
    ]
});

fn fresh_context() -> ExecutionContext {
    ExecutionContext::new(CallData::default(), &ContextConfig::default())
}

#[test]
fn array_allocation_layout() {
    for (word_index, expected) in ARRAY_LAYOUT.iter() {
        let mut ctx = fresh_context();
        let elements = [Word::from(2u64), Word::from(4u64)];
        let word = probe_memory(&mut ctx, &elements, *word_index).unwrap();
        assert_eq!(word, Word::from(*expected), "word {}", word_index);
    }
}

#[test]
fn array_allocation_moves_free_pointer() {
    let mut ctx = fresh_context();
    let elements = [Word::from(2u64), Word::from(4u64)];
    probe_memory(&mut ctx, &elements, 0).unwrap();
    assert_eq!(ctx.memory().free_pointer(), 0xe0);
    assert_eq!(ctx.memory().high_water_mark(), 0xe0);
    // 7 words of expansion
    assert_eq!(ctx.gas_used(), 21);
}

#[test]
fn probe_reads_past_allocation_are_charged() {
    let mut ctx = fresh_context();
    let word = probe_memory(&mut ctx, &[Word::from(9u64)], 7).unwrap();
    assert_eq!(word, Word::ZERO);
    assert_eq!(ctx.memory().high_water_mark(), 0x100);
}

#[test]
fn storage_probes_see_pushed_elements() {
    let mut ctx = fresh_context();
    let base = Word::from(1u64);
    let element_slot = ctx.storage_mut().array_push(base, Word::from(42u64));

    assert_eq!(element_slot, slot_hash(&ctx, &base));
    assert_eq!(
        element_slot,
        Word(
            hex::decode("b10e2d527612073b26eecdfd717e6a320cf44b4afac2b0732d9fcbe2b7fa0cf6")
                .unwrap()
                .try_into()
                .unwrap()
        )
    );
    assert_eq!(probe_storage(&ctx, &element_slot), Word::from(42u64));
    assert_eq!(probe_storage(&ctx, &base), Word::from(1u64));
}

#[test]
fn decode_probe_matches_encoder() {
    let values = vec![
        AbiValue::uint(7),
        AbiValue::String("hello".to_string()),
        AbiValue::Bool(true),
    ];
    let calldata = CallData::from_call([0xde, 0xad, 0xbe, 0xef], &values).unwrap();
    let types = [AbiType::Uint(256), AbiType::String, AbiType::Bool];
    assert_eq!(decode_call(calldata.as_bytes(), &types).unwrap(), values);
}
