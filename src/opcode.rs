//! Protocol operation codes.
//!
//! Every OMAPI message carries one of six opcodes identifying the requested
//! operation or the shape of a reply. The wire values are fixed by the
//! reference server and must not be renumbered.

use crate::error::OmapiError;

/// Operation carried by a [`Message`](crate::message::Message).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Opcode {
    /// Open an object on the server, optionally creating it.
    Open = 1,
    /// Refresh a previously opened object.
    Refresh = 2,
    /// Server-side object state, sent in reply to an open or create.
    Update = 3,
    /// Unsolicited notification about a watched object.
    Notify = 4,
    /// Result status for an operation that carries no object state.
    Status = 5,
    /// Delete the object identified by the message handle.
    Delete = 6,
}

impl Opcode {
    /// Return the signed 32-bit wire representation.
    #[must_use]
    pub fn as_wire(self) -> i32 { self as i32 }
}

impl TryFrom<i32> for Opcode {
    type Error = OmapiError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Open),
            2 => Ok(Self::Refresh),
            3 => Ok(Self::Update),
            4 => Ok(Self::Notify),
            5 => Ok(Self::Status),
            6 => Ok(Self::Delete),
            other => Err(OmapiError::UnknownOpcode(other)),
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::Refresh => "refresh",
            Self::Update => "update",
            Self::Notify => "notify",
            Self::Status => "status",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}
