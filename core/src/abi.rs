//! Minimal ABI codec for the contract surface this client consumes:
//! `uint256` (within u128 range), `address`, `bool`, `string`, and
//! single-level dynamic arrays of those.

use std::fmt;

use sha3::{Digest, Keccak256};

use crate::address::Address;

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// First four bytes of the keccak hash of a function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

pub fn to_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

pub fn from_hex(value: &str) -> Result<Vec<u8>, AbiError> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    hex::decode(digits).map_err(|_| AbiError::InvalidHex)
}

fn uint_word(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

fn address_word(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Uint(u128),
    Address(Address),
    Bool(bool),
    Str(String),
    UintArray(Vec<u128>),
    AddressArray(Vec<Address>),
    StrArray(Vec<String>),
}

/// Selector followed by the encoded argument tuple.
pub fn encode_call(signature: &str, tokens: &[Token]) -> Vec<u8> {
    let mut out = selector(signature).to_vec();
    out.extend_from_slice(&encode_tokens(tokens));
    out
}

/// Standard head/tail tuple encoding: static values inline, dynamic values
/// as offsets into a shared tail section.
pub fn encode_tokens(tokens: &[Token]) -> Vec<u8> {
    let head_len = 32 * tokens.len();
    let mut head: Vec<u8> = Vec::with_capacity(head_len);
    let mut tail: Vec<u8> = Vec::new();
    for token in tokens {
        match token {
            Token::Uint(value) => head.extend_from_slice(&uint_word(*value)),
            Token::Address(address) => head.extend_from_slice(&address_word(address)),
            Token::Bool(value) => head.extend_from_slice(&uint_word(u128::from(*value))),
            dynamic => {
                head.extend_from_slice(&uint_word((head_len + tail.len()) as u128));
                tail.extend_from_slice(&encode_dynamic(dynamic));
            }
        }
    }
    head.extend_from_slice(&tail);
    head
}

fn encode_dynamic(token: &Token) -> Vec<u8> {
    match token {
        Token::Str(value) => {
            let bytes = value.as_bytes();
            let mut out = uint_word(bytes.len() as u128).to_vec();
            out.extend_from_slice(bytes);
            out.resize(out.len() + (32 - bytes.len() % 32) % 32, 0);
            out
        }
        Token::UintArray(values) => {
            let mut out = uint_word(values.len() as u128).to_vec();
            for value in values {
                out.extend_from_slice(&uint_word(*value));
            }
            out
        }
        Token::AddressArray(values) => {
            let mut out = uint_word(values.len() as u128).to_vec();
            for address in values {
                out.extend_from_slice(&address_word(address));
            }
            out
        }
        Token::StrArray(values) => {
            let items: Vec<Token> = values.iter().cloned().map(Token::Str).collect();
            let mut out = uint_word(values.len() as u128).to_vec();
            out.extend_from_slice(&encode_tokens(&items));
            out
        }
        Token::Uint(_) | Token::Address(_) | Token::Bool(_) => Vec::new(),
    }
}

/// Cursor over return data. Slot accessors read the flat head tuple;
/// dynamic accessors follow the offset stored in their head slot.
pub struct Decoder<'a> {
    data: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn word(&self, offset: usize) -> Result<&'a [u8], AbiError> {
        self.data
            .get(offset..offset + 32)
            .ok_or(AbiError::OutOfRange { offset })
    }

    fn uint_at(&self, offset: usize) -> Result<u128, AbiError> {
        let word = self.word(offset)?;
        if word[..16].iter().any(|byte| *byte != 0) {
            return Err(AbiError::UintOverflow { offset });
        }
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&word[16..]);
        Ok(u128::from_be_bytes(bytes))
    }

    fn usize_at(&self, offset: usize) -> Result<usize, AbiError> {
        usize::try_from(self.uint_at(offset)?).map_err(|_| AbiError::UintOverflow { offset })
    }

    fn address_at(&self, offset: usize) -> Result<Address, AbiError> {
        let word = self.word(offset)?;
        if word[..12].iter().any(|byte| *byte != 0) {
            return Err(AbiError::InvalidAddress { offset });
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&word[12..]);
        Ok(Address::from_bytes(bytes))
    }

    fn str_at(&self, offset: usize) -> Result<String, AbiError> {
        let len = self.usize_at(offset)?;
        let start = offset + 32;
        let bytes = self
            .data
            .get(start..start + len)
            .ok_or(AbiError::OutOfRange { offset: start })?;
        String::from_utf8(bytes.to_vec()).map_err(|_| AbiError::InvalidUtf8 { offset: start })
    }

    pub fn uint(&self, slot: usize) -> Result<u128, AbiError> {
        self.uint_at(slot * 32)
    }

    pub fn address(&self, slot: usize) -> Result<Address, AbiError> {
        self.address_at(slot * 32)
    }

    pub fn boolean(&self, slot: usize) -> Result<bool, AbiError> {
        Ok(self.uint(slot)? != 0)
    }

    pub fn string(&self, slot: usize) -> Result<String, AbiError> {
        let offset = self.usize_at(slot * 32)?;
        self.str_at(offset)
    }

    pub fn uint_array(&self, slot: usize) -> Result<Vec<u128>, AbiError> {
        let offset = self.usize_at(slot * 32)?;
        let len = self.usize_at(offset)?;
        let mut out = Vec::with_capacity(len);
        for index in 0..len {
            out.push(self.uint_at(offset + 32 + 32 * index)?);
        }
        Ok(out)
    }

    pub fn address_array(&self, slot: usize) -> Result<Vec<Address>, AbiError> {
        let offset = self.usize_at(slot * 32)?;
        let len = self.usize_at(offset)?;
        let mut out = Vec::with_capacity(len);
        for index in 0..len {
            out.push(self.address_at(offset + 32 + 32 * index)?);
        }
        Ok(out)
    }

    pub fn bool_array(&self, slot: usize) -> Result<Vec<bool>, AbiError> {
        Ok(self
            .uint_array(slot)?
            .into_iter()
            .map(|value| value != 0)
            .collect())
    }

    /// `string[]`: element offsets are relative to the start of the array's
    /// own head section, after its length word.
    pub fn str_array(&self, slot: usize) -> Result<Vec<String>, AbiError> {
        let offset = self.usize_at(slot * 32)?;
        let len = self.usize_at(offset)?;
        let base = offset + 32;
        let mut out = Vec::with_capacity(len);
        for index in 0..len {
            let relative = self.usize_at(base + 32 * index)?;
            out.push(self.str_at(base + relative)?);
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiError {
    InvalidHex,
    OutOfRange { offset: usize },
    UintOverflow { offset: usize },
    InvalidAddress { offset: usize },
    InvalidUtf8 { offset: usize },
}

impl fmt::Display for AbiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiError::InvalidHex => write!(f, "invalid hex payload"),
            AbiError::OutOfRange { offset } => {
                write!(f, "return data truncated at byte {offset}")
            }
            AbiError::UintOverflow { offset } => {
                write!(f, "uint at byte {offset} exceeds supported range")
            }
            AbiError::InvalidAddress { offset } => {
                write!(f, "word at byte {offset} is not an address")
            }
            AbiError::InvalidUtf8 { offset } => {
                write!(f, "string at byte {offset} is not valid utf-8")
            }
        }
    }
}

impl std::error::Error for AbiError {}
