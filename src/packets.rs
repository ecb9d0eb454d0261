//! Packet schemas and the concrete packet types.
//!
//! A packet type declares its id and an ordered field schema once, at
//! definition time; the schema order is both the encode and decode
//! order and is part of the wire contract for that type. The trait's
//! provided `to_bytes`/`from_bytes` turn instances into framed wire
//! bytes and back:
//!
//! ```text
//! [Header(4)] [payload: schema fields in declared order, or their
//!              ciphertext when the ENCRYPT flag is set]
//! ```

use crate::crypto::{self, DecryptKey, EncryptKey};
use crate::error::{ProtocolError, Result};
use crate::fields::{FieldKind, FieldSlot, FieldValue, FixedStr, wire_size};
use crate::header::{Flags, Header};

/// A concrete packet type: a fixed id plus a fixed, ordered field
/// schema, carried by every instance alongside its flag bits.
pub trait Packet: Sized {
    /// Unique packet id carried in the header.
    const PID: u16;

    /// Type name for diagnostics.
    const NAME: &'static str;

    /// Ordered field slots making up the payload.
    const SCHEMA: &'static [FieldSlot];

    /// Instance flag bits, written into the header.
    fn flags(&self) -> Flags;

    /// Field values in schema order.
    fn fields(&self) -> Vec<FieldValue>;

    /// Rebuilds an instance from decoded field values (schema order).
    fn from_fields(flags: Flags, fields: &[FieldValue]) -> Result<Self>;

    /// Encoded payload size before encryption.
    fn payload_size() -> usize {
        wire_size(Self::SCHEMA)
    }

    /// Serializes the packet into a framed byte buffer.
    ///
    /// Fields are written in schema order; with `ENCRYPT` set the
    /// concatenation is sealed with `key` before the header is built,
    /// so the header length is that of the sealed payload.
    fn to_bytes(&self, key: Option<&EncryptKey>) -> Result<Vec<u8>> {
        let values = self.fields();
        if values.len() != Self::SCHEMA.len() {
            return Err(ProtocolError::SchemaMismatch {
                packet: Self::NAME,
            });
        }

        let mut payload = Vec::with_capacity(Self::payload_size());
        for (slot, value) in Self::SCHEMA.iter().zip(&values) {
            if value.kind() != slot.kind {
                return Err(ProtocolError::SchemaMismatch {
                    packet: Self::NAME,
                });
            }
            value.encode_into(&mut payload);
        }

        let flags = self.flags();
        if flags.contains(Flags::ENCRYPT) {
            let key = key.ok_or(ProtocolError::MissingEncryptionKey)?;
            payload = crypto::encrypt(&payload, key)?;
        }

        let header = Header::new(Self::PID, flags, payload.len())?;
        let mut out = Vec::with_capacity(Header::SIZE + payload.len());
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&payload);
        Ok(out)
    }

    /// Parses a framed byte buffer back into a packet.
    ///
    /// Exactly the header's declared payload length is consumed; bytes
    /// past it are left to the caller's framing.
    fn from_bytes(bytes: &[u8], key: Option<&DecryptKey>) -> Result<Self> {
        let header = Header::from_bytes(bytes)?;
        if header.pid() != Self::PID {
            return Err(ProtocolError::UnexpectedPacketType {
                expected: Self::PID,
                actual: header.pid(),
            });
        }

        let rest = &bytes[Header::SIZE..];
        if rest.len() < header.length() {
            return Err(ProtocolError::TruncatedPayload {
                expected: header.length(),
                actual: rest.len(),
            });
        }
        let payload = &rest[..header.length()];

        let opened;
        let payload = if header.flags().contains(Flags::ENCRYPT) {
            let key = key.ok_or(ProtocolError::MissingDecryptionKey)?;
            opened = crypto::decrypt(payload, key)?;
            opened.as_slice()
        } else {
            payload
        };

        if payload.len() < Self::payload_size() {
            return Err(ProtocolError::MalformedPayload {
                packet: Self::NAME,
                expected: Self::payload_size(),
                actual: payload.len(),
            });
        }

        let mut values = Vec::with_capacity(Self::SCHEMA.len());
        let mut offset = 0;
        for slot in Self::SCHEMA {
            values.push(FieldValue::decode(slot.kind, &payload[offset..])?);
            offset += slot.kind.size();
        }
        Self::from_fields(header.flags(), &values)
    }
}

/// Positive acknowledgement. No payload.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OkPacket {
    pub flags: Flags,
}

impl OkPacket {
    pub fn new() -> Self {
        Self {
            flags: Flags::empty(),
        }
    }

    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }
}

impl Default for OkPacket {
    fn default() -> Self {
        Self::new()
    }
}

impl Packet for OkPacket {
    const PID: u16 = 0x0001;
    const NAME: &'static str = "OkPacket";
    const SCHEMA: &'static [FieldSlot] = &[];

    fn flags(&self) -> Flags {
        self.flags
    }

    fn fields(&self) -> Vec<FieldValue> {
        Vec::new()
    }

    fn from_fields(flags: Flags, _fields: &[FieldValue]) -> Result<Self> {
        Ok(Self { flags })
    }
}

/// Negative acknowledgement. No payload.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DenyPacket {
    pub flags: Flags,
}

impl DenyPacket {
    pub fn new() -> Self {
        Self {
            flags: Flags::empty(),
        }
    }

    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }
}

impl Default for DenyPacket {
    fn default() -> Self {
        Self::new()
    }
}

impl Packet for DenyPacket {
    const PID: u16 = 0x0002;
    const NAME: &'static str = "DenyPacket";
    const SCHEMA: &'static [FieldSlot] = &[];

    fn flags(&self) -> Flags {
        self.flags
    }

    fn fields(&self) -> Vec<FieldValue> {
        Vec::new()
    }

    fn from_fields(flags: Flags, _fields: &[FieldValue]) -> Result<Self> {
        Ok(Self { flags })
    }
}

/// A relative movement step on the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MovePacket {
    pub dy: u8,
    pub dx: u8,
    pub flags: Flags,
}

impl MovePacket {
    pub fn new(dy: u8, dx: u8) -> Self {
        Self {
            dy,
            dx,
            flags: Flags::empty(),
        }
    }

    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }
}

impl Packet for MovePacket {
    const PID: u16 = 0x0003;
    const NAME: &'static str = "MovePacket";
    const SCHEMA: &'static [FieldSlot] = &[
        FieldSlot::new("dy", FieldKind::U8),
        FieldSlot::new("dx", FieldKind::U8),
    ];

    fn flags(&self) -> Flags {
        self.flags
    }

    fn fields(&self) -> Vec<FieldValue> {
        vec![FieldValue::U8(self.dy), FieldValue::U8(self.dx)]
    }

    fn from_fields(flags: Flags, fields: &[FieldValue]) -> Result<Self> {
        match fields {
            [FieldValue::U8(dy), FieldValue::U8(dx)] => Ok(Self {
                dy: *dy,
                dx: *dx,
                flags,
            }),
            _ => Err(ProtocolError::SchemaMismatch {
                packet: Self::NAME,
            }),
        }
    }
}

/// Credentials for an existing account.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoginPacket {
    pub username: FixedStr,
    pub password: FixedStr,
    pub flags: Flags,
}

impl LoginPacket {
    /// Fails when either credential exceeds the string field width or
    /// is not ASCII.
    pub fn new(username: &str, password: &str) -> Result<Self> {
        Ok(Self {
            username: FixedStr::new(username)?,
            password: FixedStr::new(password)?,
            flags: Flags::empty(),
        })
    }

    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }
}

impl Packet for LoginPacket {
    const PID: u16 = 0x0004;
    const NAME: &'static str = "LoginPacket";
    const SCHEMA: &'static [FieldSlot] = &[
        FieldSlot::new("username", FieldKind::Str),
        FieldSlot::new("password", FieldKind::Str),
    ];

    fn flags(&self) -> Flags {
        self.flags
    }

    fn fields(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Str(self.username.clone()),
            FieldValue::Str(self.password.clone()),
        ]
    }

    fn from_fields(flags: Flags, fields: &[FieldValue]) -> Result<Self> {
        match fields {
            [FieldValue::Str(username), FieldValue::Str(password)] => Ok(Self {
                username: username.clone(),
                password: password.clone(),
                flags,
            }),
            _ => Err(ProtocolError::SchemaMismatch {
                packet: Self::NAME,
            }),
        }
    }
}

/// Credentials for a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegisterPacket {
    pub username: FixedStr,
    pub password: FixedStr,
    pub flags: Flags,
}

impl RegisterPacket {
    pub fn new(username: &str, password: &str) -> Result<Self> {
        Ok(Self {
            username: FixedStr::new(username)?,
            password: FixedStr::new(password)?,
            flags: Flags::empty(),
        })
    }

    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }
}

impl Packet for RegisterPacket {
    const PID: u16 = 0x0005;
    const NAME: &'static str = "RegisterPacket";
    const SCHEMA: &'static [FieldSlot] = &[
        FieldSlot::new("username", FieldKind::Str),
        FieldSlot::new("password", FieldKind::Str),
    ];

    fn flags(&self) -> Flags {
        self.flags
    }

    fn fields(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Str(self.username.clone()),
            FieldValue::Str(self.password.clone()),
        ]
    }

    fn from_fields(flags: Flags, fields: &[FieldValue]) -> Result<Self> {
        match fields {
            [FieldValue::Str(username), FieldValue::Str(password)] => Ok(Self {
                username: username.clone(),
                password: password.clone(),
                flags,
            }),
            _ => Err(ProtocolError::SchemaMismatch {
                packet: Self::NAME,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::STR_FIELD_WIDTH;
    use crate::crypto::Keypair;

    #[test]
    fn move_packet_round_trips() {
        let packet = MovePacket::new(0xFF, 1);
        let bytes = packet.to_bytes(None).unwrap();
        assert_eq!(bytes.len(), Header::SIZE + 2);
        assert_eq!(MovePacket::from_bytes(&bytes, None).unwrap(), packet);
    }

    #[test]
    fn empty_packet_round_trips() {
        let packet = OkPacket::new();
        let bytes = packet.to_bytes(None).unwrap();
        assert_eq!(bytes.len(), Header::SIZE);
        assert_eq!(OkPacket::from_bytes(&bytes, None).unwrap(), packet);
    }

    #[test]
    fn login_packet_round_trips() {
        let packet = LoginPacket::new("stjohn", "hunter2").unwrap();
        let bytes = packet.to_bytes(None).unwrap();
        assert_eq!(bytes.len(), Header::SIZE + 2 * STR_FIELD_WIDTH);
        let decoded = LoginPacket::from_bytes(&bytes, None).unwrap();
        assert_eq!(decoded.username.as_str(), "stjohn");
        assert_eq!(decoded.password.as_str(), "hunter2");
    }

    #[test]
    fn header_reflects_packet() {
        let bytes = MovePacket::new(4, 2).to_bytes(None).unwrap();
        let header = Header::from_bytes(&bytes).unwrap();
        assert_eq!(header.pid(), MovePacket::PID);
        assert_eq!(header.length(), 2);
        assert_eq!(header.flags(), Flags::empty());
    }

    #[test]
    fn decode_rejects_wrong_pid() {
        let bytes = MovePacket::new(1, 1).to_bytes(None).unwrap();
        assert!(matches!(
            OkPacket::from_bytes(&bytes, None),
            Err(ProtocolError::UnexpectedPacketType {
                expected: 0x0001,
                actual: 0x0003
            })
        ));
    }

    #[test]
    fn decode_rejects_truncated_payload() {
        let mut bytes = MovePacket::new(1, 2).to_bytes(None).unwrap();
        bytes.pop();
        assert!(matches!(
            MovePacket::from_bytes(&bytes, None),
            Err(ProtocolError::TruncatedPayload {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn decode_rejects_payload_shorter_than_schema() {
        // Hand-built frame whose declared length is below the schema sum.
        let header = Header::new(MovePacket::PID, Flags::empty(), 1).unwrap();
        let mut bytes = header.to_bytes().to_vec();
        bytes.push(0xAA);
        assert!(matches!(
            MovePacket::from_bytes(&bytes, None),
            Err(ProtocolError::MalformedPayload {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn decode_ignores_bytes_past_declared_length() {
        let mut bytes = MovePacket::new(9, 8).to_bytes(None).unwrap();
        bytes.extend_from_slice(&[0xDE, 0xAD]);
        assert_eq!(
            MovePacket::from_bytes(&bytes, None).unwrap(),
            MovePacket::new(9, 8)
        );
    }

    #[test]
    fn encrypt_flag_without_key_fails() {
        let packet = OkPacket::new().with_flags(Flags::ENCRYPT);
        assert!(matches!(
            packet.to_bytes(None),
            Err(ProtocolError::MissingEncryptionKey)
        ));
    }

    #[test]
    fn encrypted_frame_without_key_fails_to_decode() {
        let keypair = Keypair::generate();
        let bytes = MovePacket::new(1, 0)
            .with_flags(Flags::ENCRYPT)
            .to_bytes(Some(&keypair.encrypt))
            .unwrap();
        assert!(matches!(
            MovePacket::from_bytes(&bytes, None),
            Err(ProtocolError::MissingDecryptionKey)
        ));
    }

    #[test]
    fn encrypted_round_trip() {
        let keypair = Keypair::generate();
        let packet = MovePacket::new(1, 0).with_flags(Flags::ENCRYPT);
        let bytes = packet.to_bytes(Some(&keypair.encrypt)).unwrap();

        // The header length covers the sealed payload, not the plaintext.
        let header = Header::from_bytes(&bytes).unwrap();
        assert_eq!(header.length(), 2 + crypto::SEAL_OVERHEAD);

        let decoded = MovePacket::from_bytes(&bytes, Some(&keypair.decrypt)).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn reserved_flag_bits_survive_the_frame() {
        let flags = Flags::from_bits_retain(0b0100_0000);
        let packet = MovePacket::new(0, 0).with_flags(flags);
        let decoded = MovePacket::from_bytes(&packet.to_bytes(None).unwrap(), None).unwrap();
        assert_eq!(decoded.flags, flags);
    }

    #[test]
    fn payload_size_follows_schema() {
        assert_eq!(MovePacket::payload_size(), 2);
        assert_eq!(OkPacket::payload_size(), 0);
        assert_eq!(LoginPacket::payload_size(), 2 * STR_FIELD_WIDTH);
    }
}
