use types::Word;

use crate::hash::HashFunction;

/// How a logical variable's storage slot is computed.
///
/// Every slot address the storage map hands out goes through
/// [`SlotDerivation::resolve`], so the arithmetic for each container kind
/// lives in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotDerivation {
    /// The N-th top-level declaration lives at slot N.
    Sequential { index: u64 },
    /// Element `index` of a dynamic array declared at `base`:
    /// `hash(base) + index`.
    HashedArray { base: Word, index: Word },
    /// Value for `key` in a mapping declared at `base`:
    /// `hash(key ++ base)`.
    HashedMapping { base: Word, key: Word },
    /// Member `member` of an unpacked struct starting at `base`:
    /// `base + member`.
    PackedStruct { base: Word, member: u64 },
}

impl SlotDerivation {
    pub fn resolve(&self, hasher: HashFunction) -> Word {
        match *self {
            SlotDerivation::Sequential { index } => Word::from(index),
            SlotDerivation::HashedArray { base, index } => {
                hasher.hash_word(&base).wrapping_add(index)
            }
            SlotDerivation::HashedMapping { base, key } => hasher.hash_pair(&key, &base),
            SlotDerivation::PackedStruct { base, member } => {
                base.wrapping_add(Word::from(member))
            }
        }
    }
}
