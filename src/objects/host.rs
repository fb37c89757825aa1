//! Host records.

use std::net::Ipv4Addr;

use crate::{
    map::{MapValue, ObjectMap},
    message::Message,
};

/// Link-layer type of a host's hardware address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum HardwareType {
    /// IEEE 802.3 Ethernet.
    Ethernet = 1,
    /// IEEE 802.5 token ring.
    TokenRing = 6,
    /// Fibre distributed data interface.
    Fddi = 8,
}

impl HardwareType {
    /// Map a wire value onto a known hardware type.
    #[must_use]
    pub fn from_wire(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Ethernet),
            6 => Some(Self::TokenRing),
            8 => Some(Self::Fddi),
            _ => None,
        }
    }

    /// Return the signed 32-bit wire representation.
    #[must_use]
    pub fn as_wire(self) -> i32 { self as i32 }
}

impl std::fmt::Display for HardwareType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Ethernet => "Ethernet",
            Self::TokenRing => "Token ring",
            Self::Fddi => "FDDI",
        };
        f.write_str(name)
    }
}

/// A host object held by the server.
///
/// As a search template, populate only the fields to match on; unset fields
/// are omitted from the object map. The server does not return every field,
/// so a record decoded from a reply may be sparser than the one sent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Host {
    /// Host name, unique on the server.
    pub name: String,
    /// Raw hardware (MAC) address bytes; empty means unset.
    pub hardware_address: Vec<u8>,
    /// Link-layer type of the hardware address.
    pub hardware_type: Option<HardwareType>,
    /// DHCP client identifier bytes; empty means unset.
    pub dhcp_client_identifier: Vec<u8>,
    /// Fixed IPv4 address, if any.
    pub ip: Option<Ipv4Addr>,
    /// Configuration statements attached to the host; not returned by the
    /// server.
    pub statements: String,
    /// Server-assigned object handle; 0 until opened.
    pub handle: i32,
}

impl Host {
    /// Build the object map representation of this record.
    #[must_use]
    pub fn to_object(&self) -> ObjectMap {
        let mut object = ObjectMap::new();
        object.insert("name", MapValue::text_or_unset(&self.name));
        object.insert(
            "ip-address",
            match self.ip {
                Some(ip) => MapValue::Bytes(ip.octets().to_vec()),
                None => MapValue::Unset,
            },
        );
        object.insert(
            "hardware-address",
            MapValue::bytes_or_unset(&self.hardware_address),
        );
        object.insert(
            "hardware-type",
            match self.hardware_type {
                Some(hardware_type) => MapValue::from_i32(hardware_type.as_wire()),
                None => MapValue::Unset,
            },
        );
        object.insert("statements", MapValue::text_or_unset(&self.statements));
        object.insert(
            "dhcp-client-identifier",
            MapValue::bytes_or_unset(&self.dhcp_client_identifier),
        );
        object
    }

    /// Build a record from a server reply's object map and handle.
    #[must_use]
    pub fn from_reply(reply: &Message) -> Self {
        Self {
            name: reply.object.text("name"),
            hardware_address: reply
                .object
                .bytes("hardware-address")
                .map(<[u8]>::to_vec)
                .unwrap_or_default(),
            hardware_type: HardwareType::from_wire(reply.object.i32_or_zero("hardware-type")),
            dhcp_client_identifier: reply
                .object
                .bytes("dhcp-client-identifier")
                .map(<[u8]>::to_vec)
                .unwrap_or_default(),
            ip: ipv4_from_bytes(reply.object.bytes("ip-address")),
            statements: String::new(),
            handle: reply.handle,
        }
    }
}

pub(crate) fn ipv4_from_bytes(bytes: Option<&[u8]>) -> Option<Ipv4Addr> {
    match bytes {
        Some([a, b, c, d]) => Some(Ipv4Addr::new(*a, *b, *c, *d)),
        _ => None,
    }
}
