use types::{VmError, VmResult, Word, WORD_SIZE};

use crate::abi::{encode_params, AbiType, AbiValue, Decoder};

pub const SELECTOR_LEN: usize = 4;

/// Immutable input buffer of one call: a 4-byte selector followed by the
/// ABI parameter section.
///
/// Nothing here zero-pads or truncates. A read that would run past the end
/// of the buffer fails with [`VmError::OutOfBounds`]; a decode that follows
/// an offset or length past the end fails with
/// [`VmError::MalformedEncoding`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallData {
    bytes: Vec<u8>,
}

impl CallData {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Builds `selector ++ encode(values)`.
    pub fn from_call(selector: [u8; SELECTOR_LEN], values: &[AbiValue]) -> VmResult<Self> {
        let mut bytes = selector.to_vec();
        bytes.extend(encode_params(values)?);
        Ok(Self { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn selector(&self) -> VmResult<[u8; SELECTOR_LEN]> {
        let mut selector = [0u8; SELECTOR_LEN];
        selector.copy_from_slice(self.bytes.get(..SELECTOR_LEN).ok_or(
            VmError::InvalidCallData {
                len: self.bytes.len(),
            },
        )?);
        Ok(selector)
    }

    /// Everything after the selector.
    pub fn params(&self) -> VmResult<&[u8]> {
        self.bytes
            .get(SELECTOR_LEN..)
            .ok_or(VmError::InvalidCallData {
                len: self.bytes.len(),
            })
    }

    /// 32 bytes at `offset` within the parameter section. A failed read
    /// reports `offset` against the length of the parameter section.
    pub fn read_word(&self, offset: usize) -> VmResult<Word> {
        let params = self.params()?;
        let slice = offset
            .checked_add(WORD_SIZE)
            .and_then(|end| params.get(offset..end))
            .ok_or(VmError::OutOfBounds {
                offset,
                size: WORD_SIZE,
                len: params.len(),
            })?;
        let mut out = [0u8; WORD_SIZE];
        out.copy_from_slice(slice);
        Ok(Word(out))
    }

    /// 32 bytes at absolute `offset`, selector included.
    pub fn load_word(&self, offset: usize) -> VmResult<Word> {
        let slice = self.slice(offset, WORD_SIZE)?;
        let mut out = [0u8; WORD_SIZE];
        out.copy_from_slice(slice);
        Ok(Word(out))
    }

    /// Copies `length` bytes starting at absolute `start`.
    pub fn copy(&self, start: usize, length: usize) -> VmResult<Vec<u8>> {
        self.slice(start, length).map(<[u8]>::to_vec)
    }

    /// Decodes consecutive static parameters whose heads start at `offset`
    /// within the parameter section.
    pub fn decode_static(&self, types: &[AbiType], offset: usize) -> VmResult<Vec<AbiValue>> {
        let params = self.params()?;
        if let Some(ty) = types.iter().find(|ty| ty.is_dynamic()) {
            tracing::debug!(%ty, "dynamic type passed to decode_static");
            return Err(VmError::malformed(offset, "dynamic type in static decode"));
        }
        Decoder::new(params).decode_tuple(types, offset)
    }

    /// Decodes the whole parameter section as a tuple of `types`, following
    /// offset words for dynamic parameters.
    pub fn decode_dynamic(&self, types: &[AbiType]) -> VmResult<Vec<AbiValue>> {
        let params = self.params()?;
        Decoder::new(params).decode_tuple(types, 0)
    }

    /// Alias of [`decode_dynamic`](Self::decode_dynamic); static-only
    /// signatures decode the same way.
    pub fn decode(&self, types: &[AbiType]) -> VmResult<Vec<AbiValue>> {
        self.decode_dynamic(types)
    }

    fn slice(&self, offset: usize, size: usize) -> VmResult<&[u8]> {
        offset
            .checked_add(size)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or(VmError::OutOfBounds {
                offset,
                size,
                len: self.bytes.len(),
            })
    }
}

impl From<Vec<u8>> for CallData {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}
