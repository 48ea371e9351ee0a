//! The narrow, statically-known option registry this core supports, and the
//! delta/length nibble codec shared by parsing and serialization.

use alloc::{
    string::{String, ToString},
    vec::Vec,
};

/// The options this core recognizes. Any other option number is a
/// [`crate::error::CoapError::BadOption`] on receive — there is no
/// elective/critical distinction here, every unrecognized option is
/// rejected uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoapOption {
    UriHost,
    UriPort,
    UriPath,
    ContentFormat,
    UriQuery,
    Accept,
}

impl CoapOption {
    pub fn number(self) -> u16 {
        match self {
            CoapOption::UriHost => 3,
            CoapOption::UriPort => 7,
            CoapOption::UriPath => 11,
            CoapOption::ContentFormat => 12,
            CoapOption::UriQuery => 15,
            CoapOption::Accept => 17,
        }
    }

    pub fn from_number(number: u16) -> Option<CoapOption> {
        match number {
            3 => Some(CoapOption::UriHost),
            7 => Some(CoapOption::UriPort),
            11 => Some(CoapOption::UriPath),
            12 => Some(CoapOption::ContentFormat),
            15 => Some(CoapOption::UriQuery),
            17 => Some(CoapOption::Accept),
            _ => None,
        }
    }

    pub fn kind(self) -> OptionValueKind {
        match self {
            CoapOption::UriHost => OptionValueKind::String,
            CoapOption::UriPort => OptionValueKind::Uint,
            CoapOption::UriPath => OptionValueKind::String,
            CoapOption::ContentFormat => OptionValueKind::Uint,
            CoapOption::UriQuery => OptionValueKind::String,
            CoapOption::Accept => OptionValueKind::Uint,
        }
    }

    pub fn repeatable(self) -> bool {
        matches!(self, CoapOption::UriPath | CoapOption::UriQuery)
    }
}

/// The value kind a registry entry pins its option number to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionValueKind {
    Opaque,
    Uint,
    String,
}

/// A decoded option value, typed according to its registry entry.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Opaque(Vec<u8>),
    Uint(u32),
    String(String),
}

impl OptionValue {
    pub fn decode(kind: OptionValueKind, bytes: &[u8]) -> OptionValue {
        match kind {
            OptionValueKind::Opaque => OptionValue::Opaque(bytes.to_vec()),
            OptionValueKind::Uint => OptionValue::Uint(decode_uint(bytes)),
            OptionValueKind::String => {
                OptionValue::String(String::from_utf8_lossy(bytes).to_string())
            }
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            OptionValue::Opaque(bytes) => bytes.clone(),
            OptionValue::Uint(v) => encode_uint(*v),
            OptionValue::String(s) => s.as_bytes().to_vec(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u32> {
        match self {
            OptionValue::Uint(v) => Some(*v),
            _ => None,
        }
    }
}

/// A single parsed or to-be-serialized option.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageOption {
    pub number: u16,
    pub value: OptionValue,
}

/// Encodes `v` using the minimum number of big-endian bytes (0 for v == 0).
pub fn encode_uint(v: u32) -> Vec<u8> {
    let bytes = v.to_be_bytes();
    let first_significant = bytes.iter().position(|&b| b != 0);
    match first_significant {
        None => Vec::new(),
        Some(idx) => bytes[idx..].to_vec(),
    }
}

/// Decodes a big-endian minimal-length unsigned integer. Longer-than-4-byte
/// inputs are truncated from the left, mirroring what a `u32` can hold.
pub fn decode_uint(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .rev()
        .enumerate()
        .fold(0u32, |acc, (i, &b)| {
            if i < 4 {
                acc | (b as u32) << (i * 8)
            } else {
                acc
            }
        })
}

/// The result of expanding a 4-bit delta/length nibble, shared between
/// parsing (`extend` reads bytes from the buffer) and serialization
/// (`extend` writes them).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nibble {
    /// Literal value 0..=12.
    Literal(u16),
    /// Extension byte follows; real value = byte + 13.
    Ext1,
    /// Two extension bytes follow, big-endian; real value = u16 + 269.
    Ext2,
}

/// Splits a raw 4-bit field value into its nibble form. `15` is the caller's
/// responsibility to reject as a framing error before calling this.
pub fn classify_nibble(raw: u8) -> Nibble {
    match raw {
        0..=12 => Nibble::Literal(raw as u16),
        13 => Nibble::Ext1,
        14 => Nibble::Ext2,
        _ => unreachable!("caller must reject 15 before classifying"),
    }
}

/// Chooses the 4-bit field value and any extension bytes needed to encode
/// `value` (an option delta or option length) on the wire.
pub fn encode_nibble(value: u16) -> (u8, Vec<u8>) {
    if value <= 12 {
        (value as u8, Vec::new())
    } else if value < 269 {
        (13, alloc::vec![(value - 13) as u8])
    } else {
        let biased = value - 269;
        (14, alloc::vec![(biased >> 8) as u8, (biased & 0xFF) as u8])
    }
}
