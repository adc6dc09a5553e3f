use std::collections::BTreeMap;
use std::fmt;

use types::{VmError, VmResult, Word, U256, WORD_SIZE};

pub mod derivation;
pub mod hash;
pub mod layout;

pub use derivation::SlotDerivation;
pub use hash::HashFunction;
pub use layout::{Declaration, SlotPosition, StorageLayout, VariableKind};

/// Handle returned by [`StorageMap::snapshot`]: the journal length at the
/// time it was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Snapshot(usize);

impl Snapshot {
    pub fn id(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
struct JournalEntry {
    slot: Word,
    previous: Word,
}

/// Persistent word-addressed storage of one contract-equivalent entity.
///
/// SLOT MODEL: storage is a sparse map from 32-byte slot identifiers to
/// 32-byte values. There is no "absent" state: a slot that was never
/// written reads as the zero word, and writing zero removes the entry from
/// the backing map so `len()` only counts live slots.
///
/// DERIVATION: scalars sit at their declaration index, while containers
/// hash their declared slot (see [`SlotDerivation`]) with the configured
/// [`HashFunction`].
///
/// ROLLBACK: every write records the previous value in a journal, so a
/// caller can take a [`Snapshot`] before a call and [`revert_to`] it if the
/// call fails. Whether to do so is the caller's policy.
///
/// [`revert_to`]: StorageMap::revert_to
#[derive(Debug, Clone, Default)]
pub struct StorageMap {
    slots: BTreeMap<Word, Word>,
    hasher: HashFunction,
    journal: Vec<JournalEntry>,
}

impl StorageMap {
    /// Creates an empty storage map hashing with Keccak-256.
    pub fn new() -> Self {
        Self::with_hasher(HashFunction::default())
    }

    /// Creates an empty storage map deriving container slots with `hasher`.
    pub fn with_hasher(hasher: HashFunction) -> Self {
        Self {
            slots: BTreeMap::new(),
            hasher,
            journal: Vec::new(),
        }
    }

    /// Hash used by every derived slot of this map.
    pub fn hasher(&self) -> HashFunction {
        self.hasher
    }

    /// Reads a slot. Never fails; unwritten slots are zero.
    pub fn read(&self, slot: &Word) -> Word {
        self.slots.get(slot).copied().unwrap_or(Word::ZERO)
    }

    /// Writes a slot, recording the previous value for rollback.
    pub fn write(&mut self, slot: Word, value: Word) {
        let previous = self.read(&slot);
        self.journal.push(JournalEntry { slot, previous });
        self.put(slot, value);
        tracing::debug!(%slot, %previous, %value, "sstore");
    }

    /// `true` once the slot holds a non-zero value.
    pub fn is_set(&self, slot: &Word) -> bool {
        self.slots.contains_key(slot)
    }

    /// Number of slots holding a non-zero value.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Non-zero slots in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&Word, &Word)> {
        self.slots.iter()
    }

    // --- slot derivation ---

    /// `hash(encode(base))`, the first element slot of a dynamic array.
    pub fn slot_hash(&self, base: &Word) -> Word {
        self.hasher.hash_word(base)
    }

    /// Resolves any [`SlotDerivation`] with this map's hash.
    pub fn derive_slot(&self, derivation: SlotDerivation) -> Word {
        derivation.resolve(self.hasher)
    }

    /// Slot of element `index` of the dynamic array declared at `base`:
    /// `hash(base) + index`, modulo 2^256.
    pub fn derive_array_slot(&self, base: Word, index: Word) -> Word {
        self.derive_slot(SlotDerivation::HashedArray { base, index })
    }

    /// Slot of `key` in the mapping declared at `base`: `hash(key ++ base)`.
    ///
    /// ORDER: the key comes first. Swapping the operands addresses a
    /// different slot.
    pub fn derive_mapping_slot(&self, base: Word, key: Word) -> Word {
        self.derive_slot(SlotDerivation::HashedMapping { base, key })
    }

    /// Slot of member `member` of an unpacked struct starting at `base`.
    pub fn derive_struct_member_slot(&self, base: Word, member: u64) -> Word {
        self.derive_slot(SlotDerivation::PackedStruct { base, member })
    }

    // --- dynamic arrays ---

    /// Length of the dynamic array declared at `base`, stored in `base`
    /// itself.
    pub fn array_len(&self, base: &Word) -> Word {
        self.read(base)
    }

    /// Appends `value`: element at `hash(base) + len`, then `len + 1` at `base`.
    pub fn array_push(&mut self, base: Word, value: Word) -> Word {
        let length = self.read(&base);
        let slot = self.derive_array_slot(base, length);
        self.write(slot, value);
        self.write(base, length.wrapping_add(Word::from(1u64)));
        slot
    }

    /// Element `index` of the array at `base`.
    ///
    /// BOUNDS: `index` must be below the stored length; anything else is
    /// [`VmError::ArrayIndexOutOfBounds`] even if the derived slot holds a
    /// value.
    pub fn array_get(&self, base: Word, index: Word) -> VmResult<Word> {
        let length = self.read(&base);
        if index.to_u256() >= length.to_u256() {
            return Err(VmError::ArrayIndexOutOfBounds { index, length });
        }
        Ok(self.read(&self.derive_array_slot(base, index)))
    }

    /// Removes and returns the last element, zeroing its slot.
    pub fn array_pop(&mut self, base: Word) -> VmResult<Word> {
        let length = self.read(&base);
        if length.is_zero() {
            return Err(VmError::ArrayIndexOutOfBounds {
                index: Word::ZERO,
                length,
            });
        }
        let last = Word::from(length.to_u256() - U256::one());
        let slot = self.derive_array_slot(base, last);
        let value = self.read(&slot);
        self.write(slot, Word::ZERO);
        self.write(base, last);
        Ok(value)
    }

    // --- packed values ---

    /// Reads the `position.size` bytes sitting `position.offset` bytes up
    /// from the low-order end of the slot, right-aligned into a word.
    pub fn read_packed(&self, position: &SlotPosition) -> VmResult<Word> {
        let (start, end) = packed_range(position)?;
        let word = self.read(&position.slot);
        let mut out = [0u8; WORD_SIZE];
        out[WORD_SIZE - position.size..].copy_from_slice(&word.0[start..end]);
        Ok(Word(out))
    }

    /// Overwrites only the packed bytes of `position`, keeping neighbours.
    pub fn write_packed(&mut self, position: &SlotPosition, value: Word) -> VmResult<()> {
        let (start, end) = packed_range(position)?;
        if value.bits() > position.size * 8 {
            return Err(VmError::PackedValueOverflow {
                value,
                size: position.size,
            });
        }
        let mut word = self.read(&position.slot);
        word.0[start..end].copy_from_slice(&value.0[WORD_SIZE - position.size..]);
        self.write(position.slot, word);
        Ok(())
    }

    // --- journal ---

    /// Marks the current journal position. Pass it to
    /// [`revert_to`](Self::revert_to) to undo every later write.
    pub fn snapshot(&self) -> Snapshot {
        tracing::debug!(id = self.journal.len(), "storage snapshot");
        Snapshot(self.journal.len())
    }

    /// Undoes every write made after `snapshot` was taken.
    pub fn revert_to(&mut self, snapshot: Snapshot) -> VmResult<()> {
        if snapshot.0 > self.journal.len() {
            return Err(VmError::InvalidSnapshot {
                id: snapshot.0,
                journal_len: self.journal.len(),
            });
        }
        let undone = self.journal.len() - snapshot.0;
        while self.journal.len() > snapshot.0 {
            if let Some(entry) = self.journal.pop() {
                self.put(entry.slot, entry.previous);
            }
        }
        tracing::debug!(id = snapshot.0, undone, "storage reverted");
        Ok(())
    }

    /// Drops the journal. Outstanding snapshots other than the empty one
    /// become invalid.
    pub fn commit(&mut self) {
        self.journal.clear();
    }

    /// Dumps the contents of storage to stdout.
    pub fn pretty_print(&self) {
        print!("{}", self);
    }

    fn put(&mut self, slot: Word, value: Word) {
        if value.is_zero() {
            self.slots.remove(&slot);
        } else {
            self.slots.insert(slot, value);
        }
    }
}

fn packed_range(position: &SlotPosition) -> VmResult<(usize, usize)> {
    let fits = position
        .offset
        .checked_add(position.size)
        .is_some_and(|end| end <= WORD_SIZE);
    if position.size == 0 || !fits {
        return Err(VmError::InvalidConfig(format!(
            "packed position offset {} size {} does not fit in a slot",
            position.offset, position.size
        )));
    }
    let end = WORD_SIZE - position.offset;
    Ok((end - position.size, end))
}

impl fmt::Display for StorageMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Storage Dump ---")?;
        for (slot, value) in &self.slots {
            writeln!(f, "Slot: {} | Value: {}", slot, value)?;
        }
        writeln!(f, "--------------------")
    }
}
