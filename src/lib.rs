//! Moorgate wire protocol
//!
//! Shared codec for the Moorgate client and server: typed packets are
//! serialized field by field, optionally sealed, and framed with a
//! 4-byte header carrying flags, the packet id, and the payload length.
//!
//! ## Wire format
//!
//! ```text
//! offset 0: 4-byte header = flags(8 bits) | pid(13 bits) | length(11 bits)
//! offset 4: `length` payload bytes (schema fields in declared order,
//!           or their ciphertext when the ENCRYPT flag is set)
//! ```
//!
//! Encoding walks a packet's schema in declared order, seals the
//! concatenation when `ENCRYPT` is set, and prepends the header; the
//! header length is always that of the bytes actually on the wire.
//! Decoding reverses each step, and [`registry::dispatch`] routes an
//! arbitrary incoming frame to the right concrete type by its pid.

pub mod constants;
pub mod crypto;
pub mod error;
pub mod fields;
pub mod header;
pub mod packets;
pub mod registry;

pub use constants::{HEADER_SIZE, MAX_PACKET_SIZE, MAX_PAYLOAD_LEN, MAX_PID, STR_FIELD_WIDTH};
pub use crypto::{DecryptKey, EncryptKey, Keypair};
pub use error::{ProtocolError, Result};
pub use fields::{FieldKind, FieldSlot, FieldValue, FixedStr};
pub use header::{Flags, Header};
pub use packets::{DenyPacket, LoginPacket, MovePacket, OkPacket, Packet, RegisterPacket};
pub use registry::{AnyPacket, PacketDescriptor, Registry, dispatch};
