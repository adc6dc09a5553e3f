//! Declaration-order slot assignment.
//!
//! Top-level variables are laid out in the order they are declared. Scalars
//! narrower than a word share a slot with their neighbours while they fit,
//! filling each slot from the low-order end. Containers and structs always
//! start on a fresh slot and the variable after them does too.

use types::{VmError, VmResult, Word, WORD_SIZE};

/// Where a (possibly packed) value lives: `size` bytes, `offset` bytes up
/// from the low-order end of `slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPosition {
    pub slot: Word,
    pub offset: usize,
    pub size: usize,
}

impl SlotPosition {
    /// A full-width value occupying all of `slot`.
    pub fn whole(slot: Word) -> Self {
        Self {
            slot,
            offset: 0,
            size: WORD_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// A value type of `size` bytes (1..=32).
    Scalar { size: usize },
    /// Length in the declared slot, elements at `hash(slot) + i`.
    DynamicArray,
    /// Nothing stored at the declared slot itself.
    Mapping,
    /// `len` full-word elements in consecutive slots.
    FixedArray { len: u64 },
    /// `members` full-word members in consecutive slots.
    Struct { members: u64 },
}

impl VariableKind {
    fn slots_used(&self) -> u64 {
        match self {
            VariableKind::Scalar { .. } | VariableKind::DynamicArray | VariableKind::Mapping => 1,
            VariableKind::FixedArray { len } => (*len).max(1),
            VariableKind::Struct { members } => (*members).max(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub kind: VariableKind,
    pub position: SlotPosition,
}

#[derive(Debug, Default, Clone)]
pub struct StorageLayout {
    next_slot: u64,
    next_offset: usize,
    declarations: Vec<Declaration>,
}

impl StorageLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_scalar(&mut self, name: &str, size: usize) -> VmResult<SlotPosition> {
        if size == 0 || size > WORD_SIZE {
            return Err(VmError::InvalidConfig(format!(
                "scalar `{}` has size {}, expected 1..=32 bytes",
                name, size
            )));
        }
        if self.next_offset + size > WORD_SIZE {
            self.next_slot += 1;
            self.next_offset = 0;
        }
        let position = SlotPosition {
            slot: Word::from(self.next_slot),
            offset: self.next_offset,
            size,
        };
        self.next_offset += size;
        if self.next_offset == WORD_SIZE {
            self.next_slot += 1;
            self.next_offset = 0;
        }
        self.push(name, VariableKind::Scalar { size }, position);
        Ok(position)
    }

    pub fn declare_dynamic_array(&mut self, name: &str) -> Word {
        self.declare_container(name, VariableKind::DynamicArray)
    }

    pub fn declare_mapping(&mut self, name: &str) -> Word {
        self.declare_container(name, VariableKind::Mapping)
    }

    pub fn declare_fixed_array(&mut self, name: &str, len: u64) -> Word {
        self.declare_container(name, VariableKind::FixedArray { len })
    }

    pub fn declare_struct(&mut self, name: &str, members: u64) -> Word {
        self.declare_container(name, VariableKind::Struct { members })
    }

    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name == name)
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Number of slots consumed so far, counting a partially filled slot.
    pub fn slots_used(&self) -> u64 {
        self.next_slot + u64::from(self.next_offset > 0)
    }

    fn declare_container(&mut self, name: &str, kind: VariableKind) -> Word {
        if self.next_offset > 0 {
            self.next_slot += 1;
            self.next_offset = 0;
        }
        let slot = Word::from(self.next_slot);
        self.next_slot += kind.slots_used();
        self.push(name, kind, SlotPosition::whole(slot));
        slot
    }

    fn push(&mut self, name: &str, kind: VariableKind, position: SlotPosition) {
        tracing::debug!(name, ?kind, slot = %position.slot, offset = position.offset, "declared storage variable");
        self.declarations.push(Declaration {
            name: name.to_string(),
            kind,
            position,
        });
    }
}
