use std::cell::Cell;
use std::fmt;

use storage::HashFunction;
use types::{Address, VmError, VmResult, Word, U256, WORD_SIZE};

/// Parameter types understood by the calldata decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiType {
    Uint(usize), // bits
    Address,
    Bool,
    FixedBytes(usize),
    Bytes,
    String,
    Array(Box<AbiType>),
    FixedArray(Box<AbiType>, usize),
}

impl AbiType {
    /// Dynamic types are referenced from the head by an offset word.
    pub fn is_dynamic(&self) -> bool {
        match self {
            AbiType::Bytes | AbiType::String | AbiType::Array(_) => true,
            AbiType::FixedArray(inner, _) => inner.is_dynamic(),
            _ => false,
        }
    }

    /// Bytes this type occupies in the head of an enclosing tuple.
    pub fn head_size(&self) -> usize {
        match self {
            AbiType::FixedArray(inner, len) if !inner.is_dynamic() => {
                inner.head_size().saturating_mul(*len)
            }
            _ => WORD_SIZE,
        }
    }

    /// Parses a canonical type name such as `uint256`, `bytes32[]` or
    /// `string[2]`.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        if let Some(inner) = name.strip_suffix("[]") {
            return Some(AbiType::Array(Box::new(Self::parse(inner)?)));
        }
        if let Some(body) = name.strip_suffix(']') {
            let open = body.rfind('[')?;
            let len = body[open + 1..].parse::<usize>().ok()?;
            return Some(AbiType::FixedArray(Box::new(Self::parse(&body[..open])?), len));
        }
        match name {
            "address" => Some(AbiType::Address),
            "bool" => Some(AbiType::Bool),
            "bytes" => Some(AbiType::Bytes),
            "string" => Some(AbiType::String),
            "uint" => Some(AbiType::Uint(256)),
            s if s.starts_with("uint") => {
                let bits = s[4..].parse::<usize>().ok()?;
                (bits > 0 && bits <= 256 && bits % 8 == 0).then_some(AbiType::Uint(bits))
            }
            s if s.starts_with("bytes") => {
                let len = s[5..].parse::<usize>().ok()?;
                (len > 0 && len <= WORD_SIZE).then_some(AbiType::FixedBytes(len))
            }
            _ => None,
        }
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiType::Uint(bits) => write!(f, "uint{}", bits),
            AbiType::Address => write!(f, "address"),
            AbiType::Bool => write!(f, "bool"),
            AbiType::FixedBytes(len) => write!(f, "bytes{}", len),
            AbiType::Bytes => write!(f, "bytes"),
            AbiType::String => write!(f, "string"),
            AbiType::Array(inner) => write!(f, "{}[]", inner),
            AbiType::FixedArray(inner, len) => write!(f, "{}[{}]", inner, len),
        }
    }
}

/// A decoded parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Uint(U256),
    Address(Address),
    Bool(bool),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<AbiValue>),
    FixedArray(Vec<AbiValue>),
}

impl AbiValue {
    pub fn uint(value: u64) -> Self {
        AbiValue::Uint(U256::from(value))
    }

    pub fn is_dynamic(&self) -> bool {
        match self {
            AbiValue::Bytes(_) | AbiValue::String(_) | AbiValue::Array(_) => true,
            AbiValue::FixedArray(items) => items.iter().any(AbiValue::is_dynamic),
            _ => false,
        }
    }

    fn head_size(&self) -> usize {
        match self {
            AbiValue::FixedArray(items) if !self.is_dynamic() => {
                items.iter().map(AbiValue::head_size).sum()
            }
            _ => WORD_SIZE,
        }
    }
}

/// First four bytes of the Keccak-256 hash of a function signature, e.g.
/// `transfer(address,uint256)`.
pub fn selector_for(signature: &str) -> [u8; 4] {
    let hash = HashFunction::Keccak256.hash(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash.0[..4]);
    selector
}

/// Head/tail encoding of `values` as one parameter tuple.
pub fn encode_params(values: &[AbiValue]) -> VmResult<Vec<u8>> {
    let head_len: usize = values.iter().map(AbiValue::head_size).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();
    for value in values {
        if value.is_dynamic() {
            head.extend_from_slice(Word::from(head_len + tail.len()).as_bytes());
            tail.extend(encode_value(value)?);
        } else {
            head.extend(encode_value(value)?);
        }
    }
    head.extend(tail);
    Ok(head)
}

fn encode_value(value: &AbiValue) -> VmResult<Vec<u8>> {
    let word = match value {
        AbiValue::Uint(v) => Word::from(*v),
        AbiValue::Address(addr) => addr.to_word(),
        AbiValue::Bool(b) => Word::from_bool(*b),
        AbiValue::FixedBytes(bytes) => Word::from_left_aligned(bytes)
            .ok_or(VmError::malformed(0, "fixed bytes longer than a word"))?,
        AbiValue::Bytes(bytes) => return Ok(encode_payload(bytes)),
        AbiValue::String(s) => return Ok(encode_payload(s.as_bytes())),
        AbiValue::Array(items) => {
            let mut out = Word::from(items.len()).as_bytes().to_vec();
            out.extend(encode_params(items)?);
            return Ok(out);
        }
        AbiValue::FixedArray(items) => return encode_params(items),
    };
    Ok(word.as_bytes().to_vec())
}

fn encode_payload(bytes: &[u8]) -> Vec<u8> {
    let padded = bytes.len().div_ceil(WORD_SIZE) * WORD_SIZE;
    let mut out = Vec::with_capacity(WORD_SIZE + padded);
    out.extend_from_slice(Word::from(bytes.len()).as_bytes());
    out.extend_from_slice(bytes);
    out.resize(WORD_SIZE + padded, 0);
    out
}

/// Bounds-checked reader over a parameter section. Every offset and length
/// is validated before it is followed; any violation is
/// [`VmError::MalformedEncoding`].
///
/// BUDGET: a well-formed encoding reads each of its words once, so the
/// decoder reads at most as many words as the section holds. Offsets that
/// alias the same tail to multiply the output run out of budget and are
/// rejected.
pub(crate) struct Decoder<'a> {
    data: &'a [u8],
    budget: Cell<usize>,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            budget: Cell::new(data.len().div_ceil(WORD_SIZE)),
        }
    }

    pub(crate) fn decode_tuple(&self, types: &[AbiType], base: usize) -> VmResult<Vec<AbiValue>> {
        let mut values = Vec::with_capacity(types.len());
        let mut head = base;
        for ty in types {
            values.push(self.decode_member(ty, base, head)?);
            head = head
                .checked_add(ty.head_size())
                .ok_or(VmError::malformed(head, "head overflows"))?;
        }
        Ok(values)
    }

    /// Decodes a tuple member whose head sits at `head`; dynamic members are
    /// followed through an offset relative to `base`.
    fn decode_member(&self, ty: &AbiType, base: usize, head: usize) -> VmResult<AbiValue> {
        if !ty.is_dynamic() {
            return self.decode_value(ty, head);
        }
        let relative = self.usize_at(head, "offset does not fit")?;
        let start = base
            .checked_add(relative)
            .filter(|start| *start <= self.data.len())
            .ok_or(VmError::malformed(head, "offset points past end of calldata"))?;
        self.decode_value(ty, start)
    }

    fn decode_value(&self, ty: &AbiType, pos: usize) -> VmResult<AbiValue> {
        match ty {
            AbiType::Uint(bits) => {
                let word = self.word_at(pos)?;
                if word.bits() > *bits {
                    return Err(VmError::malformed(pos, "uint has dirty high bits"));
                }
                Ok(AbiValue::Uint(word.to_u256()))
            }
            AbiType::Address => {
                let word = self.word_at(pos)?;
                Address::from_word(&word)
                    .map(AbiValue::Address)
                    .ok_or(VmError::malformed(pos, "address has dirty high bytes"))
            }
            AbiType::Bool => match self.word_at(pos)?.to_u64() {
                Some(0) => Ok(AbiValue::Bool(false)),
                Some(1) => Ok(AbiValue::Bool(true)),
                _ => Err(VmError::malformed(pos, "bool is neither 0 nor 1")),
            },
            AbiType::FixedBytes(len) => {
                let word = self.word_at(pos)?;
                if *len == 0 || *len > WORD_SIZE || word.0[*len..].iter().any(|b| *b != 0) {
                    return Err(VmError::malformed(pos, "fixed bytes have dirty padding"));
                }
                Ok(AbiValue::FixedBytes(word.0[..*len].to_vec()))
            }
            AbiType::Bytes => Ok(AbiValue::Bytes(self.payload_at(pos)?.to_vec())),
            AbiType::String => {
                let payload = self.payload_at(pos)?;
                let s = std::str::from_utf8(payload)
                    .map_err(|_| VmError::malformed(pos, "string is not valid utf-8"))?;
                Ok(AbiValue::String(s.to_string()))
            }
            AbiType::Array(inner) => {
                let len = self.usize_at(pos, "array length does not fit")?;
                let items = self.decode_elements(inner, pos + WORD_SIZE, len)?;
                Ok(AbiValue::Array(items))
            }
            AbiType::FixedArray(inner, len) => {
                let items = self.decode_elements(inner, pos, *len)?;
                Ok(AbiValue::FixedArray(items))
            }
        }
    }

    fn decode_elements(&self, inner: &AbiType, base: usize, len: usize) -> VmResult<Vec<AbiValue>> {
        let stride = inner.head_size();
        len
            .checked_mul(stride)
            .and_then(|size| base.checked_add(size))
            .filter(|end| *end <= self.data.len())
            .ok_or(VmError::malformed(base, "array elements run past end of calldata"))?;
        if stride == 0 && len > self.data.len() {
            return Err(VmError::malformed(base, "array length exceeds calldata"));
        }
        let mut items = Vec::with_capacity(len);
        for i in 0..len {
            items.push(self.decode_member(inner, base, base + i * stride)?);
        }
        Ok(items)
    }

    fn payload_at(&self, pos: usize) -> VmResult<&'a [u8]> {
        let len = self.usize_at(pos, "length does not fit")?;
        let start = pos + WORD_SIZE;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(VmError::malformed(pos, "payload runs past end of calldata"))?;
        self.consume(len.div_ceil(WORD_SIZE), pos)?;
        Ok(&self.data[start..end])
    }

    fn consume(&self, words: usize, pos: usize) -> VmResult<()> {
        let left = self
            .budget
            .get()
            .checked_sub(words)
            .ok_or(VmError::malformed(pos, "encoding reads more words than calldata holds"))?;
        self.budget.set(left);
        Ok(())
    }

    fn usize_at(&self, pos: usize, reason: &'static str) -> VmResult<usize> {
        self.word_at(pos)?
            .to_usize()
            .ok_or(VmError::malformed(pos, reason))
    }

    fn word_at(&self, pos: usize) -> VmResult<Word> {
        let end = pos
            .checked_add(WORD_SIZE)
            .filter(|end| *end <= self.data.len())
            .ok_or(VmError::malformed(pos, "word runs past end of calldata"))?;
        self.consume(1, pos)?;
        let mut out = [0u8; WORD_SIZE];
        out.copy_from_slice(&self.data[pos..end]);
        Ok(Word(out))
    }
}
