//! Field codecs: the typed, fixed-width scalars packets are built from.
//!
//! Integer fields encode as big-endian unsigned integers of their
//! declared width. The string field occupies a fixed [`STR_FIELD_WIDTH`]
//! byte slot, NUL-padded on the right.

use std::fmt;

use crate::constants::STR_FIELD_WIDTH;
use crate::error::{ProtocolError, Result};

/// The declared kind of a field slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldKind {
    U8,
    U16,
    U32,
    U64,
    Str,
}

impl FieldKind {
    /// Encoded width in bytes.
    pub const fn size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
            Self::U64 => 8,
            Self::Str => STR_FIELD_WIDTH,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::Str => "str",
        };
        f.write_str(name)
    }
}

/// A named field slot within a packet schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSlot {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSlot {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// Total encoded size of a schema's fields.
pub const fn wire_size(schema: &[FieldSlot]) -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < schema.len() {
        total += schema[i].kind.size();
        i += 1;
    }
    total
}

/// A fixed-width ASCII string of at most [`STR_FIELD_WIDTH`] bytes.
///
/// Encodes right-padded with NUL up to the declared width; decoding
/// trims trailing NULs, so a value ending in a literal NUL byte comes
/// back without it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct FixedStr(String);

impl FixedStr {
    /// Validates length and charset at construction. Fails with
    /// `StringTooLong` past the width bound and `InvalidEncoding` on any
    /// non-ASCII byte.
    pub fn new(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        if s.len() > STR_FIELD_WIDTH {
            return Err(ProtocolError::StringTooLong {
                max: STR_FIELD_WIDTH,
                actual: s.len(),
            });
        }
        if let Some(byte) = s.bytes().find(|b| !b.is_ascii()) {
            return Err(ProtocolError::InvalidEncoding { byte });
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_bytes(&self) -> [u8; STR_FIELD_WIDTH] {
        let mut bytes = [0u8; STR_FIELD_WIDTH];
        bytes[..self.0.len()].copy_from_slice(self.0.as_bytes());
        bytes
    }

    /// Decodes one string slot from the start of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < STR_FIELD_WIDTH {
            return Err(ProtocolError::TruncatedPayload {
                expected: STR_FIELD_WIDTH,
                actual: bytes.len(),
            });
        }
        let end = bytes[..STR_FIELD_WIDTH]
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |i| i + 1);
        let mut s = String::with_capacity(end);
        for &byte in &bytes[..end] {
            if !byte.is_ascii() {
                return Err(ProtocolError::InvalidEncoding { byte });
            }
            s.push(byte as char);
        }
        Ok(Self(s))
    }
}

impl fmt::Display for FixedStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for FixedStr {
    type Error = ProtocolError;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for FixedStr {
    type Error = ProtocolError;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<FixedStr> for String {
    fn from(s: FixedStr) -> Self {
        s.0
    }
}

/// A field value, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Str(FixedStr),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::U8(_) => FieldKind::U8,
            Self::U16(_) => FieldKind::U16,
            Self::U32(_) => FieldKind::U32,
            Self::U64(_) => FieldKind::U64,
            Self::Str(_) => FieldKind::Str,
        }
    }

    /// Encoded width in bytes.
    pub fn size(&self) -> usize {
        self.kind().size()
    }

    /// Checked constructor for the integer kinds. Fails with
    /// `ValueOutOfRange` when `value` does not fit the kind's width;
    /// `FieldKind::Str` never accepts an integer.
    pub fn from_u64(kind: FieldKind, value: u64) -> Result<Self> {
        let out_of_range = || ProtocolError::ValueOutOfRange { kind, value };
        match kind {
            FieldKind::U8 => u8::try_from(value).map(Self::U8).map_err(|_| out_of_range()),
            FieldKind::U16 => u16::try_from(value)
                .map(Self::U16)
                .map_err(|_| out_of_range()),
            FieldKind::U32 => u32::try_from(value)
                .map(Self::U32)
                .map_err(|_| out_of_range()),
            FieldKind::U64 => Ok(Self::U64(value)),
            FieldKind::Str => Err(out_of_range()),
        }
    }

    /// The value widened to `u64`; `None` for string fields.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::U8(v) => Some(u64::from(*v)),
            Self::U16(v) => Some(u64::from(*v)),
            Self::U32(v) => Some(u64::from(*v)),
            Self::U64(v) => Some(*v),
            Self::Str(_) => None,
        }
    }

    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        match self {
            Self::U8(v) => buf.extend_from_slice(&v.to_be_bytes()),
            Self::U16(v) => buf.extend_from_slice(&v.to_be_bytes()),
            Self::U32(v) => buf.extend_from_slice(&v.to_be_bytes()),
            Self::U64(v) => buf.extend_from_slice(&v.to_be_bytes()),
            Self::Str(v) => buf.extend_from_slice(&v.to_bytes()),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.size());
        self.encode_into(&mut buf);
        buf
    }

    /// Decodes one field of `kind` from the start of `bytes`. Exactly
    /// `kind.size()` bytes are read; shorter input fails.
    pub fn decode(kind: FieldKind, bytes: &[u8]) -> Result<Self> {
        let size = kind.size();
        let chunk = bytes.get(..size).ok_or(ProtocolError::TruncatedPayload {
            expected: size,
            actual: bytes.len(),
        })?;
        Ok(match kind {
            FieldKind::U8 => Self::U8(chunk[0]),
            FieldKind::U16 => Self::U16(u16::from_be_bytes([chunk[0], chunk[1]])),
            FieldKind::U32 => Self::U32(u32::from_be_bytes([
                chunk[0], chunk[1], chunk[2], chunk[3],
            ])),
            FieldKind::U64 => Self::U64(u64::from_be_bytes([
                chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6], chunk[7],
            ])),
            FieldKind::Str => Self::Str(FixedStr::from_bytes(chunk)?),
        })
    }
}
