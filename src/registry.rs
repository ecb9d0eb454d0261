//! Packet type registry and dispatch.
//!
//! Maps the pid parsed out of an incoming frame header to the concrete
//! packet decoder, so a receiver can decode an arbitrary buffer without
//! knowing its type in advance. The builtin table is built once, before
//! any dispatch, and is read-only afterwards; concurrent dispatch needs
//! no locking.

use std::collections::HashMap;
use std::sync::LazyLock;

use tracing::{debug, trace};

use crate::crypto::DecryptKey;
use crate::error::{ProtocolError, Result};
use crate::header::{Flags, Header};
use crate::packets::{DenyPacket, LoginPacket, MovePacket, OkPacket, Packet, RegisterPacket};

type DecodeFn = fn(&[u8], Option<&DecryptKey>) -> Result<AnyPacket>;

/// A decoded packet of any registered type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AnyPacket {
    Ok(OkPacket),
    Deny(DenyPacket),
    Move(MovePacket),
    Login(LoginPacket),
    Register(RegisterPacket),
}

impl AnyPacket {
    /// The packet id of the contained type.
    pub fn pid(&self) -> u16 {
        match self {
            Self::Ok(_) => OkPacket::PID,
            Self::Deny(_) => DenyPacket::PID,
            Self::Move(_) => MovePacket::PID,
            Self::Login(_) => LoginPacket::PID,
            Self::Register(_) => RegisterPacket::PID,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ok(_) => OkPacket::NAME,
            Self::Deny(_) => DenyPacket::NAME,
            Self::Move(_) => MovePacket::NAME,
            Self::Login(_) => LoginPacket::NAME,
            Self::Register(_) => RegisterPacket::NAME,
        }
    }

    pub fn flags(&self) -> Flags {
        match self {
            Self::Ok(p) => p.flags,
            Self::Deny(p) => p.flags,
            Self::Move(p) => p.flags,
            Self::Login(p) => p.flags,
            Self::Register(p) => p.flags,
        }
    }
}

impl From<OkPacket> for AnyPacket {
    fn from(p: OkPacket) -> Self {
        Self::Ok(p)
    }
}

impl From<DenyPacket> for AnyPacket {
    fn from(p: DenyPacket) -> Self {
        Self::Deny(p)
    }
}

impl From<MovePacket> for AnyPacket {
    fn from(p: MovePacket) -> Self {
        Self::Move(p)
    }
}

impl From<LoginPacket> for AnyPacket {
    fn from(p: LoginPacket) -> Self {
        Self::Login(p)
    }
}

impl From<RegisterPacket> for AnyPacket {
    fn from(p: RegisterPacket) -> Self {
        Self::Register(p)
    }
}

/// Registration entry: how to decode one packet type.
pub struct PacketDescriptor {
    pid: u16,
    name: &'static str,
    decode: DecodeFn,
}

impl PacketDescriptor {
    /// Builds the descriptor for a packet type.
    pub fn of<P>() -> Self
    where
        P: Packet,
        AnyPacket: From<P>,
    {
        fn decode<P>(bytes: &[u8], key: Option<&DecryptKey>) -> Result<AnyPacket>
        where
            P: Packet,
            AnyPacket: From<P>,
        {
            P::from_bytes(bytes, key).map(AnyPacket::from)
        }
        Self {
            pid: P::PID,
            name: P::NAME,
            decode: decode::<P>,
        }
    }

    pub fn pid(&self) -> u16 {
        self.pid
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// The pid → decoder table.
pub struct Registry {
    entries: HashMap<u16, PacketDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// A registry preloaded with every packet type this crate defines.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(PacketDescriptor::of::<OkPacket>());
        registry.register(PacketDescriptor::of::<DenyPacket>());
        registry.register(PacketDescriptor::of::<MovePacket>());
        registry.register(PacketDescriptor::of::<LoginPacket>());
        registry.register(PacketDescriptor::of::<RegisterPacket>());
        registry
    }

    /// Adds a packet type to the table.
    ///
    /// # Panics
    ///
    /// Panics when the pid is already registered. Registration runs
    /// once at process startup; a duplicate pid is a programming error.
    pub fn register(&mut self, descriptor: PacketDescriptor) {
        if let Some(existing) = self.entries.get(&descriptor.pid) {
            panic!(
                "duplicate packet id {:#06x}: {} already registered, attempted {}",
                descriptor.pid, existing.name, descriptor.name
            );
        }
        trace!(
            pid = descriptor.pid,
            packet = descriptor.name,
            "registered packet type"
        );
        self.entries.insert(descriptor.pid, descriptor);
    }

    pub fn contains(&self, pid: u16) -> bool {
        self.entries.contains_key(&pid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decodes an incoming frame by its header pid.
    ///
    /// Only the header is parsed here; the registered decoder re-parses
    /// it as part of the full decode, which is idempotent.
    pub fn dispatch(&self, bytes: &[u8], key: Option<&DecryptKey>) -> Result<AnyPacket> {
        let header = Header::from_bytes(bytes)?;
        let Some(entry) = self.entries.get(&header.pid()) else {
            debug!(pid = header.pid(), "unknown packet id");
            return Err(ProtocolError::UnknownPacketType(header.pid()));
        };
        trace!(
            pid = entry.pid,
            packet = entry.name,
            length = header.length(),
            "dispatching packet"
        );
        (entry.decode)(bytes, key)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

static BUILTIN: LazyLock<Registry> = LazyLock::new(Registry::with_builtin);

/// The process-wide builtin registry, initialized on first use.
pub fn builtin() -> &'static Registry {
    &BUILTIN
}

/// Decodes a frame against the builtin registry.
pub fn dispatch(bytes: &[u8], key: Option<&DecryptKey>) -> Result<AnyPacket> {
    builtin().dispatch(bytes, key)
}
