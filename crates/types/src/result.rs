use core::fmt;

use thiserror::Error;

use crate::word::Word;

/// Offset and size of the memory access that triggered a failed charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryAccess {
    pub offset: usize,
    pub size: usize,
}

impl fmt::Display for MemoryAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offset 0x{:x}, size {}", self.offset, self.size)
    }
}

/// Every failure the data-region model can surface.
///
/// Each variant carries the inputs of the operation that failed so callers
/// can report it without re-running anything. No operation retries, clamps
/// or truncates: if a variant is returned, the operation left no trace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("stack overflow: depth limit {limit} reached")]
    StackOverflow { limit: usize },

    #[error("stack underflow: requested item {requested} with depth {depth}")]
    StackUnderflow { requested: usize, depth: usize },

    #[error("invalid stack index {index}")]
    InvalidStackIndex { index: usize },

    #[error("out of gas: required {required}, remaining {remaining}{}", describe_access(.access))]
    OutOfGas {
        required: u64,
        remaining: u64,
        access: Option<MemoryAccess>,
    },

    #[error("read of {size} bytes at offset {offset} exceeds buffer length {len}")]
    OutOfBounds { offset: usize, size: usize, len: usize },

    #[error("offset {offset} cannot address a buffer of length {len}")]
    OffsetOutOfRange { offset: Word, len: usize },

    #[error("malformed encoding at offset {offset}: {reason}")]
    MalformedEncoding { offset: usize, reason: &'static str },

    #[error("invalid calldata: {len} bytes is too short for a selector")]
    InvalidCallData { len: usize },

    #[error("array index {index} out of bounds for length {length}")]
    ArrayIndexOutOfBounds { index: Word, length: Word },

    #[error("value {value} does not fit in {size} packed bytes")]
    PackedValueOverflow { value: Word, size: usize },

    #[error("invalid snapshot {id}: journal holds {journal_len} entries")]
    InvalidSnapshot { id: usize, journal_len: usize },

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

fn describe_access(access: &Option<MemoryAccess>) -> String {
    match access {
        Some(access) => format!(" ({})", access),
        None => String::new(),
    }
}

impl VmError {
    pub fn malformed(offset: usize, reason: &'static str) -> Self {
        VmError::MalformedEncoding { offset, reason }
    }
}

pub type VmResult<T> = core::result::Result<T, VmError>;
