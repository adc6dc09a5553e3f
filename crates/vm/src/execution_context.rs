use std::collections::HashSet;

use storage::{Snapshot, StorageMap};
use types::{VmError, VmResult, Word, WORD_SIZE};

use crate::calldata::CallData;
use crate::config::ContextConfig;
use crate::memory::MemoryRegion;
use crate::metering::GasAccountant;
use crate::stack::Stack;

/// Owns one instance of every data region for a single call.
///
/// The stack-driven operations follow the usual argument order (first
/// argument on top) and only pop their arguments once the operation has
/// succeeded, so a failure leaves the stack, memory and gas counter as they
/// were. Storage is the only region that outlives the context; take it back
/// with [`into_storage`](Self::into_storage).
#[derive(Debug)]
pub struct ExecutionContext {
    stack: Stack,
    memory: MemoryRegion,
    storage: StorageMap,
    calldata: CallData,
    gas: GasAccountant,
    warm_slots: HashSet<Word>,
}

impl ExecutionContext {
    pub fn new(calldata: CallData, config: &ContextConfig) -> Self {
        Self::with_storage(StorageMap::with_hasher(config.hash_function), calldata, config)
    }

    /// Runs against existing storage, e.g. the one returned by a previous
    /// context's [`into_storage`](Self::into_storage).
    pub fn with_storage(storage: StorageMap, calldata: CallData, config: &ContextConfig) -> Self {
        tracing::debug!(
            gas_limit = config.gas_limit,
            calldata_len = calldata.len(),
            "new execution context"
        );
        Self {
            stack: Stack::new(),
            memory: MemoryRegion::new(),
            storage,
            calldata,
            gas: GasAccountant::with_schedule(config.gas_limit, config.schedule),
            warm_slots: HashSet::new(),
        }
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    pub fn memory(&self) -> &MemoryRegion {
        &self.memory
    }

    pub fn storage(&self) -> &StorageMap {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut StorageMap {
        &mut self.storage
    }

    pub fn calldata(&self) -> &CallData {
        &self.calldata
    }

    pub fn gas(&self) -> &GasAccountant {
        &self.gas
    }

    pub fn gas_used(&self) -> u64 {
        self.gas.used()
    }

    /// Ends the call. Stack and memory are dropped; storage is returned.
    pub fn into_storage(self) -> StorageMap {
        tracing::debug!(gas_used = self.gas.used(), "execution context finished");
        self.storage
    }

    // --- stack ---

    pub fn push(&mut self, word: Word) -> VmResult<()> {
        self.stack.push(word)
    }

    pub fn pop(&mut self) -> VmResult<Word> {
        self.stack.pop()
    }

    pub fn dup(&mut self, n: usize) -> VmResult<()> {
        self.stack.dup(n)
    }

    pub fn swap(&mut self, n: usize) -> VmResult<()> {
        self.stack.swap(n)
    }

    // --- memory ---

    /// `offset` on top; replaced by the loaded word.
    pub fn mload(&mut self) -> VmResult<()> {
        let offset = self.memory_offset(self.stack.peek(0)?)?;
        let word = self.memory.load(offset, &mut self.gas)?;
        self.stack.set_top(word);
        Ok(())
    }

    /// `offset` on top, `value` below it.
    pub fn mstore(&mut self) -> VmResult<()> {
        let offset = self.memory_offset(self.stack.peek(0)?)?;
        let value = self.stack.peek(1)?;
        self.memory.store(offset, value, &mut self.gas)?;
        self.stack.drop_top(2);
        Ok(())
    }

    /// `offset` on top, `value` below it; writes the value's low byte.
    pub fn mstore8(&mut self) -> VmResult<()> {
        let offset = self.memory_offset(self.stack.peek(0)?)?;
        let value = self.stack.peek(1)?;
        self.memory.store8(offset, value.low_byte(), &mut self.gas)?;
        self.stack.drop_top(2);
        Ok(())
    }

    pub fn mload_at(&mut self, offset: usize) -> VmResult<Word> {
        self.memory.load(offset, &mut self.gas)
    }

    pub fn mstore_at(&mut self, offset: usize, word: Word) -> VmResult<()> {
        self.memory.store(offset, word, &mut self.gas)
    }

    pub fn allocate(&mut self, size: usize) -> VmResult<usize> {
        self.memory.allocate(size, &mut self.gas)
    }

    /// Lays out a dynamic array at the free pointer (length word, then one
    /// word per element) and returns its base offset.
    pub fn alloc_array(&mut self, elements: &[Word]) -> VmResult<usize> {
        let mut data = Vec::with_capacity((elements.len() + 1) * WORD_SIZE);
        data.extend_from_slice(Word::from(elements.len()).as_bytes());
        for element in elements {
            data.extend_from_slice(element.as_bytes());
        }
        self.alloc_raw(&data)
    }

    /// Lays out a length-prefixed byte string at the free pointer, padded
    /// to a whole word, and returns its base offset.
    pub fn alloc_bytes(&mut self, bytes: &[u8]) -> VmResult<usize> {
        let padded = bytes.len().div_ceil(WORD_SIZE) * WORD_SIZE;
        let mut data = Vec::with_capacity(WORD_SIZE + padded);
        data.extend_from_slice(Word::from(bytes.len()).as_bytes());
        data.extend_from_slice(bytes);
        data.resize(WORD_SIZE + padded, 0);
        self.alloc_raw(&data)
    }

    // Contents go in before the pointer moves, so a refused expansion leaves
    // the pointer untouched. The 0x40 word is covered by then and the
    // pointer update is free.
    fn alloc_raw(&mut self, data: &[u8]) -> VmResult<usize> {
        let base = self.memory.free_pointer();
        self.memory.store_bytes(base, data, 0, &mut self.gas)?;
        self.memory.allocate(data.len(), &mut self.gas)
    }

    // --- storage ---

    /// `slot` on top; replaced by the stored value.
    pub fn sload(&mut self) -> VmResult<()> {
        let slot = self.stack.peek(0)?;
        let warm = self.warm_slots.contains(&slot);
        let cost = self.gas.schedule().sload_cost(warm);
        self.gas.charge(cost)?;
        self.warm_slots.insert(slot);
        let value = self.storage.read(&slot);
        self.stack.set_top(value);
        Ok(())
    }

    /// `slot` on top, `value` below it.
    pub fn sstore(&mut self) -> VmResult<()> {
        let slot = self.stack.peek(0)?;
        let value = self.stack.peek(1)?;
        let warm = self.warm_slots.contains(&slot);
        let current = self.storage.read(&slot);
        let cost = self
            .gas
            .schedule()
            .sstore_cost(warm, current.is_zero(), value.is_zero())
            .ok_or_else(|| self.unaffordable())?;
        self.gas.charge(cost)?;
        self.warm_slots.insert(slot);
        self.storage.write(slot, value);
        self.stack.drop_top(2);
        Ok(())
    }

    pub fn slot_hash(&self, base: &Word) -> Word {
        self.storage.slot_hash(base)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.storage.snapshot()
    }

    pub fn revert_to(&mut self, snapshot: Snapshot) -> VmResult<()> {
        self.storage.revert_to(snapshot)
    }

    // --- calldata ---

    /// `offset` on top; replaced by the 32 calldata bytes at that offset.
    pub fn calldataload(&mut self) -> VmResult<()> {
        let raw = self.stack.peek(0)?;
        let offset = self.calldata_offset(raw)?;
        let word = self.calldata.load_word(offset)?;
        self.stack.set_top(word);
        Ok(())
    }

    pub fn calldatasize(&mut self) -> VmResult<()> {
        self.stack.push(Word::from(self.calldata.len()))
    }

    /// `dest` on top, then calldata `offset`, then `size`.
    pub fn calldatacopy(&mut self) -> VmResult<()> {
        let dest = self.memory_offset(self.stack.peek(0)?)?;
        let offset = self.stack.peek(1)?;
        let size = self.stack.peek(2)?;
        let size = size.to_usize().ok_or_else(|| self.unaffordable())?;
        let offset = self.calldata_offset(offset)?;
        let data = self.calldata.copy(offset, size)?;
        let surcharge = self
            .gas
            .schedule()
            .copy_cost(size)
            .ok_or_else(|| self.unaffordable())?;
        self.memory.store_bytes(dest, &data, surcharge, &mut self.gas)?;
        self.stack.drop_top(3);
        Ok(())
    }

    /// Dumps stack, memory and storage to stdout.
    pub fn pretty_print(&self) {
        println!("--- Stack (top first) ---");
        for (i, word) in self.stack.iter().enumerate() {
            println!("  [{}] {}", i, word);
        }
        self.memory.pretty_print();
        self.storage.pretty_print();
        println!("Gas used: {} / {}", self.gas.used(), self.gas.limit());
    }

    /// A memory offset that does not fit in `usize` could never be paid for.
    fn memory_offset(&self, word: Word) -> VmResult<usize> {
        word.to_usize().ok_or_else(|| self.unaffordable())
    }

    fn calldata_offset(&self, word: Word) -> VmResult<usize> {
        word.to_usize().ok_or(VmError::OffsetOutOfRange {
            offset: word,
            len: self.calldata.len(),
        })
    }

    fn unaffordable(&self) -> VmError {
        VmError::OutOfGas {
            required: u64::MAX,
            remaining: self.gas.remaining(),
            access: None,
        }
    }
}
