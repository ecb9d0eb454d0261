//! Wire-level constants shared by the header and field codecs

/// Size of the packed frame header in bytes.
pub const HEADER_SIZE: usize = 4;

/// Largest packet id the 13-bit header field can carry.
pub const MAX_PID: u16 = 0x1FFF;

/// Largest payload length the 11-bit header field can carry.
pub const MAX_PAYLOAD_LEN: usize = 0x7FF;

/// Maximum size of a complete frame on the wire.
pub const MAX_PACKET_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_LEN;

/// Declared width of the fixed-length string field.
pub const STR_FIELD_WIDTH: usize = 20;
