//! In-process entry points used to check exact layouts from the outside.

use types::{VmResult, Word, WORD_SIZE};

use crate::abi::{AbiType, AbiValue};
use crate::calldata::CallData;
use crate::execution_context::ExecutionContext;

/// Allocates a dynamic array holding `elements` and returns the raw memory
/// word at `word_index * 32`. The read is charged like any other load.
pub fn probe_memory(
    ctx: &mut ExecutionContext,
    elements: &[Word],
    word_index: usize,
) -> VmResult<Word> {
    ctx.alloc_array(elements)?;
    let offset = word_index.saturating_mul(WORD_SIZE);
    ctx.mload_at(offset)
}

pub fn probe_storage(ctx: &ExecutionContext, slot: &Word) -> Word {
    ctx.storage().read(slot)
}

pub fn slot_hash(ctx: &ExecutionContext, base: &Word) -> Word {
    ctx.slot_hash(base)
}

pub fn decode_call(bytes: &[u8], types: &[AbiType]) -> VmResult<Vec<AbiValue>> {
    CallData::new(bytes).decode(types)
}
