use core::fmt;

use primitive_types::U256;

pub const WORD_SIZE: usize = 32;

/// A 32-byte big-endian value, the unit every region exchanges.
///
/// Stack entries, memory words, storage slots and storage values, and
/// calldata parameters are all `Word`s. Arithmetic is delegated to
/// [`U256`]; the byte form is what gets hashed and written to memory.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Word(pub [u8; WORD_SIZE]);

impl Word {
    pub const ZERO: Word = Word([0u8; WORD_SIZE]);

    pub fn new(bytes: [u8; WORD_SIZE]) -> Self {
        Self(bytes)
    }

    /// Left-pads `bytes` into a word, the way a short big-endian integer is
    /// widened. Returns `None` for inputs longer than 32 bytes.
    pub fn from_be_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > WORD_SIZE {
            return None;
        }
        let mut out = [0u8; WORD_SIZE];
        out[WORD_SIZE - bytes.len()..].copy_from_slice(bytes);
        Some(Word(out))
    }

    /// Right-pads `bytes` into a word (`bytesN` layout).
    pub fn from_left_aligned(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > WORD_SIZE {
            return None;
        }
        let mut out = [0u8; WORD_SIZE];
        out[..bytes.len()].copy_from_slice(bytes);
        Some(Word(out))
    }

    pub fn from_bool(value: bool) -> Self {
        Word::from(value as u64)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    pub fn as_bytes(&self) -> &[u8; WORD_SIZE] {
        &self.0
    }

    pub fn to_u256(&self) -> U256 {
        U256::from_big_endian(&self.0)
    }

    /// Converts to `usize` when the value fits, `None` otherwise.
    pub fn to_usize(&self) -> Option<usize> {
        let value = self.to_u256();
        if value > U256::from(usize::MAX) {
            return None;
        }
        Some(value.low_u64() as usize)
    }

    pub fn to_u64(&self) -> Option<u64> {
        let value = self.to_u256();
        if value > U256::from(u64::MAX) {
            return None;
        }
        Some(value.low_u64())
    }

    /// 256-bit wrapping addition. Slot arithmetic (`hash(base) + index`)
    /// is defined modulo 2^256.
    pub fn wrapping_add(&self, rhs: Word) -> Word {
        let (sum, _) = self.to_u256().overflowing_add(rhs.to_u256());
        Word::from(sum)
    }

    /// Lowest-order byte, the value `mstore8` writes.
    pub fn low_byte(&self) -> u8 {
        self.0[WORD_SIZE - 1]
    }

    /// Number of significant bits.
    pub fn bits(&self) -> usize {
        self.to_u256().bits()
    }
}

impl From<U256> for Word {
    fn from(value: U256) -> Self {
        let mut out = [0u8; WORD_SIZE];
        value.to_big_endian(&mut out);
        Word(out)
    }
}

impl From<Word> for U256 {
    fn from(value: Word) -> Self {
        value.to_u256()
    }
}

impl From<u64> for Word {
    fn from(value: u64) -> Self {
        Word::from(U256::from(value))
    }
}

impl From<usize> for Word {
    fn from(value: usize) -> Self {
        Word::from(value as u64)
    }
}

impl From<[u8; WORD_SIZE]> for Word {
    fn from(value: [u8; WORD_SIZE]) -> Self {
        Word(value)
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::LowerHex for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.to_u256())
    }
}
