//! Frame header codec: flags, packet id, and payload length packed into
//! one big-endian 32-bit word.

use bitflags::bitflags;

use crate::constants::{HEADER_SIZE, MAX_PAYLOAD_LEN, MAX_PID};
use crate::error::{ProtocolError, Result};

bitflags! {
    /// Per-packet flag bits carried in the top byte of the header.
    ///
    /// Only `ENCRYPT` is assigned; the remaining bits are reserved and
    /// round-trip unchanged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Flags: u8 {
        /// Payload is encrypted with an externally supplied key.
        const ENCRYPT = 0b0000_0001;
    }
}

const FLAGS_SHIFT: u32 = 24;
const PID_SHIFT: u32 = 11;

/// The fixed 4-byte frame header.
///
/// Bit layout, most significant bit first: flags 31-24, packet id
/// 23-11, payload length 10-0. The length counts the payload bytes as
/// they appear on the wire, after any encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pid: u16,
    flags: Flags,
    length: u16,
}

impl Header {
    pub const SIZE: usize = HEADER_SIZE;

    /// Builds a header, validating that `pid` and `length` fit their
    /// bit fields. `flags` is a full byte and always fits.
    pub fn new(pid: u16, flags: Flags, length: usize) -> Result<Self> {
        if pid > MAX_PID {
            return Err(ProtocolError::HeaderValueOutOfRange {
                field: "pid",
                max: u32::from(MAX_PID),
                actual: u32::from(pid),
            });
        }
        if length > MAX_PAYLOAD_LEN {
            return Err(ProtocolError::HeaderValueOutOfRange {
                field: "length",
                max: MAX_PAYLOAD_LEN as u32,
                actual: length as u32,
            });
        }
        Ok(Self {
            pid,
            flags,
            length: length as u16,
        })
    }

    pub fn pid(&self) -> u16 {
        self.pid
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Payload length in bytes.
    pub fn length(&self) -> usize {
        usize::from(self.length)
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let word = (u32::from(self.flags.bits()) << FLAGS_SHIFT)
            | (u32::from(self.pid) << PID_SHIFT)
            | u32::from(self.length);
        word.to_be_bytes()
    }

    /// Parses the first 4 bytes of `bytes`. Every bit pattern is a
    /// valid header; an unassigned pid only fails later at dispatch.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let chunk: [u8; Self::SIZE] = bytes
            .get(..Self::SIZE)
            .and_then(|b| b.try_into().ok())
            .ok_or(ProtocolError::TruncatedPayload {
                expected: Self::SIZE,
                actual: bytes.len(),
            })?;
        let word = u32::from_be_bytes(chunk);
        Ok(Self {
            pid: ((word >> PID_SHIFT) & u32::from(MAX_PID)) as u16,
            flags: Flags::from_bits_retain((word >> FLAGS_SHIFT) as u8),
            length: (word & MAX_PAYLOAD_LEN as u32) as u16,
        })
    }
}
