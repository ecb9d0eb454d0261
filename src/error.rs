//! Protocol error types

use thiserror::Error;

use crate::fields::FieldKind;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("value {value} does not fit in a {kind} field")]
    ValueOutOfRange { kind: FieldKind, value: u64 },

    #[error("string too long: maximum {max} bytes, got {actual}")]
    StringTooLong { max: usize, actual: usize },

    #[error("invalid string byte {byte:#04x}: string fields are single-byte ASCII")]
    InvalidEncoding { byte: u8 },

    #[error("header {field} out of range: maximum {max}, got {actual}")]
    HeaderValueOutOfRange {
        field: &'static str,
        max: u32,
        actual: u32,
    },

    #[error("truncated payload: expected at least {expected} bytes, got {actual}")]
    TruncatedPayload { expected: usize, actual: usize },

    #[error("malformed {packet} payload: schema needs {expected} bytes, got {actual}")]
    MalformedPayload {
        packet: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("ENCRYPT flag set but no encryption key supplied")]
    MissingEncryptionKey,

    #[error("ENCRYPT flag set but no decryption key supplied")]
    MissingDecryptionKey,

    #[error("unknown packet id: {0:#06x}")]
    UnknownPacketType(u16),

    #[error("unexpected packet id: expected {expected:#06x}, got {actual:#06x}")]
    UnexpectedPacketType { expected: u16, actual: u16 },

    #[error("{packet} field values disagree with its declared schema")]
    SchemaMismatch { packet: &'static str },

    #[error("encryption failed")]
    EncryptionFailed,

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("invalid key material: {0}")]
    InvalidKey(String),
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
