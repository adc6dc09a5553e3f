use core::fmt;

use crate::word::{Word, WORD_SIZE};

pub const ADDRESS_LEN: usize = 20;

/// 20-byte account address as it appears right-aligned inside a calldata word.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(C)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    pub fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns `None` unless `slice` is exactly 20 bytes long.
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; ADDRESS_LEN] = slice.try_into().ok()?;
        Some(Address::new(bytes))
    }

    /// Extracts the low 20 bytes of a word. Returns `None` when any of the
    /// upper 12 bytes is set, since such a word is not a canonical address.
    pub fn from_word(word: &Word) -> Option<Self> {
        let (padding, body) = word.0.split_at(WORD_SIZE - ADDRESS_LEN);
        if padding.iter().any(|b| *b != 0) {
            return None;
        }
        Self::from_slice(body)
    }

    pub fn to_word(&self) -> Word {
        let mut bytes = [0u8; WORD_SIZE];
        bytes[WORD_SIZE - ADDRESS_LEN..].copy_from_slice(&self.0);
        Word(bytes)
    }

    pub fn to_bytes(&self) -> [u8; ADDRESS_LEN] {
        self.0
    }
}

impl From<Address> for Word {
    fn from(value: Address) -> Self {
        value.to_word()
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}
