use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sha3::{Digest, Keccak256};

use types::Word;

/// Word-hash used for array and mapping slot derivation.
///
/// The storage model only ever treats the hash as a black box from bytes to
/// a word. Keccak-256 is what deployed contracts use; SHA-256 exists so the
/// derivation rules can be exercised against an independent function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashFunction {
    #[default]
    Keccak256,
    Sha256,
}

impl HashFunction {
    pub fn hash(&self, data: &[u8]) -> Word {
        let digest: [u8; 32] = match self {
            HashFunction::Keccak256 => Keccak256::digest(data).into(),
            HashFunction::Sha256 => Sha256::digest(data).into(),
        };
        Word(digest)
    }

    /// Hashes the 32-byte big-endian encoding of a single word.
    pub fn hash_word(&self, word: &Word) -> Word {
        self.hash(word.as_bytes())
    }

    /// Hashes `a ++ b`, both as 32-byte encodings.
    pub fn hash_pair(&self, a: &Word, b: &Word) -> Word {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(a.as_bytes());
        buf[32..].copy_from_slice(b.as_bytes());
        self.hash(&buf)
    }
}
