use std::fmt;

use types::{MemoryAccess, VmError, VmResult, Word, WORD_SIZE};

use crate::metering::GasAccountant;

/// Start of the two scratch words.
pub const SCRATCH_OFFSET: usize = 0x00;
/// Word mirroring the free pointer.
pub const FREE_POINTER_OFFSET: usize = 0x40;
/// Word that is never intentionally written and always reads zero.
pub const ZERO_WORD_OFFSET: usize = 0x60;
/// First byte handed out by [`MemoryRegion::allocate`].
pub const FREE_MEMORY_START: usize = 0x80;

/// Transient byte-addressable memory of one execution.
///
/// The backing buffer only grows. `high_water_mark` is the number of bytes
/// covered so far, always a multiple of 32; touching anything past it bills
/// the expansion to the [`GasAccountant`] before the access happens, and a
/// refused charge leaves the region exactly as it was.
///
/// The free pointer is owned here rather than trusted from memory: it
/// starts at [`FREE_MEMORY_START`] and is copied into the word at
/// [`FREE_POINTER_OFFSET`] on every allocation so raw reads see the
/// conventional layout.
#[derive(Debug, Clone)]
pub struct MemoryRegion {
    mem: Vec<u8>,
    high_water_mark: usize,
    free_pointer: usize,
}

impl Default for MemoryRegion {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRegion {
    /// Creates an empty region with the free pointer at
    /// [`FREE_MEMORY_START`]. Nothing is charged until the first access.
    pub fn new() -> Self {
        Self {
            mem: Vec::new(),
            high_water_mark: 0,
            free_pointer: FREE_MEMORY_START,
        }
    }

    /// Bytes covered so far; always a multiple of 32.
    pub fn high_water_mark(&self) -> usize {
        self.high_water_mark
    }

    pub fn size_in_words(&self) -> usize {
        self.high_water_mark / WORD_SIZE
    }

    /// Next offset [`allocate`](Self::allocate) will hand out.
    pub fn free_pointer(&self) -> usize {
        self.free_pointer
    }

    /// Uncharged view of everything below the high-water mark.
    pub fn as_bytes(&self) -> &[u8] {
        &self.mem
    }

    /// Reads the 32 bytes at `offset`.
    ///
    /// GAS: expansion to cover `offset + 32` is charged first; a refused
    /// charge leaves the region unchanged.
    pub fn load(&mut self, offset: usize, gas: &mut GasAccountant) -> VmResult<Word> {
        self.expand(offset, WORD_SIZE, 0, gas)?;
        let mut out = [0u8; WORD_SIZE];
        out.copy_from_slice(&self.mem[offset..offset + WORD_SIZE]);
        let word = Word(out);
        tracing::trace!(offset, %word, "mload");
        Ok(word)
    }

    /// Writes `word` big-endian at `offset`, charging expansion to cover
    /// `offset + 32` first.
    pub fn store(&mut self, offset: usize, word: Word, gas: &mut GasAccountant) -> VmResult<()> {
        self.expand(offset, WORD_SIZE, 0, gas)?;
        self.mem[offset..offset + WORD_SIZE].copy_from_slice(word.as_bytes());
        tracing::trace!(offset, %word, "mstore");
        Ok(())
    }

    /// Writes one byte at `offset`, charging expansion to cover
    /// `offset + 1` first.
    pub fn store8(&mut self, offset: usize, byte: u8, gas: &mut GasAccountant) -> VmResult<()> {
        self.expand(offset, 1, 0, gas)?;
        self.mem[offset] = byte;
        tracing::trace!(offset, byte, "mstore8");
        Ok(())
    }

    /// Writes `data` at `offset`. `surcharge` is billed together with the
    /// expansion so the copy either happens and is paid for in full, or not
    /// at all.
    pub fn store_bytes(
        &mut self,
        offset: usize,
        data: &[u8],
        surcharge: u64,
        gas: &mut GasAccountant,
    ) -> VmResult<()> {
        self.expand(offset, data.len(), surcharge, gas)?;
        if !data.is_empty() {
            self.mem[offset..offset + data.len()].copy_from_slice(data);
        }
        Ok(())
    }

    /// Hands out `size` bytes at the current free pointer and advances it by
    /// `size` rounded up to a whole word.
    ///
    /// LAYOUT: the new pointer is written to the word at
    /// [`FREE_POINTER_OFFSET`]. The allocated bytes themselves are not
    /// touched, so their expansion is billed on first access.
    pub fn allocate(&mut self, size: usize, gas: &mut GasAccountant) -> VmResult<usize> {
        let base = self.free_pointer;
        let next = round_up_to_word(size)
            .and_then(|advance| base.checked_add(advance))
            .ok_or_else(|| unaffordable(gas, base, size))?;
        self.store(FREE_POINTER_OFFSET, Word::from(next), gas)?;
        self.free_pointer = next;
        tracing::debug!(base, size, free_pointer = next, "allocate");
        Ok(base)
    }

    /// Charges for and performs the growth needed to cover
    /// `[offset, offset + size)`, plus `surcharge`, as one unit.
    fn expand(
        &mut self,
        offset: usize,
        size: usize,
        surcharge: u64,
        gas: &mut GasAccountant,
    ) -> VmResult<()> {
        let access = MemoryAccess { offset, size };
        let target = if size == 0 {
            self.high_water_mark
        } else {
            offset
                .checked_add(size)
                .and_then(round_up_to_word)
                .ok_or_else(|| unaffordable(gas, offset, size))?
                .max(self.high_water_mark)
        };

        let expansion = gas
            .schedule()
            .memory_expansion_cost(self.high_water_mark, target)
            .ok_or_else(|| unaffordable(gas, offset, size))?;
        let cost = expansion
            .checked_add(surcharge)
            .ok_or_else(|| unaffordable(gas, offset, size))?;
        // nothing grows until the charge is accepted
        gas.charge_for(cost, Some(access))?;

        if target > self.high_water_mark {
            tracing::debug!(
                from = self.high_water_mark,
                to = target,
                cost = expansion,
                "memory expansion"
            );
            self.mem.resize(target, 0);
            self.high_water_mark = target;
        }
        Ok(())
    }

    /// Dumps the contents of memory to stdout.
    pub fn pretty_print(&self) {
        print!("{}", self);
    }
}

fn round_up_to_word(size: usize) -> Option<usize> {
    size.checked_next_multiple_of(WORD_SIZE)
}

fn unaffordable(gas: &GasAccountant, offset: usize, size: usize) -> VmError {
    VmError::OutOfGas {
        required: u64::MAX,
        remaining: gas.remaining(),
        access: Some(MemoryAccess { offset, size }),
    }
}

impl fmt::Display for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Memory Dump ({} bytes) ---", self.high_water_mark)?;
        for (i, row) in self.mem.chunks(WORD_SIZE).enumerate() {
            writeln!(f, "0x{:04x}: {}", i * WORD_SIZE, hex::encode(row))?;
        }
        writeln!(f, "--------------------")
    }
}
