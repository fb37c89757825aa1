//! Lease records.

use std::net::Ipv4Addr;

use super::host::{HardwareType, ipv4_from_bytes};
use crate::{
    map::{MapValue, ObjectMap},
    message::Message,
};

/// Lifecycle state of a lease.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum LeaseState {
    /// Available for allocation.
    Free = 1,
    /// Currently bound to a client.
    Active = 2,
    /// Past its end time.
    Expired = 3,
    /// Released by the client.
    Released = 4,
    /// Abandoned after an address conflict.
    Abandoned = 5,
    /// Reset by the operator.
    Reset = 6,
    /// Held by the failover peer.
    Backup = 7,
    /// Reserved for a specific client.
    Reserved = 8,
    /// Allocated via BOOTP.
    Bootp = 9,
}

impl LeaseState {
    /// Map a wire value onto a known lease state.
    #[must_use]
    pub fn from_wire(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Free),
            2 => Some(Self::Active),
            3 => Some(Self::Expired),
            4 => Some(Self::Released),
            5 => Some(Self::Abandoned),
            6 => Some(Self::Reset),
            7 => Some(Self::Backup),
            8 => Some(Self::Reserved),
            9 => Some(Self::Bootp),
            _ => None,
        }
    }

    /// Return the signed 32-bit wire representation.
    #[must_use]
    pub fn as_wire(self) -> i32 { self as i32 }
}

impl std::fmt::Display for LeaseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Free => "free",
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Released => "released",
            Self::Abandoned => "abandoned",
            Self::Reset => "reset",
            Self::Backup => "backup",
            Self::Reserved => "reserved",
            Self::Bootp => "bootp",
        };
        f.write_str(name)
    }
}

/// A lease object held by the server.
///
/// Timestamps are seconds since the Unix epoch, as carried on the wire. As a
/// search template only the IP address and DHCP client identifier reliably
/// match on the reference server.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Lease {
    /// Lifecycle state of the lease.
    pub state: Option<LeaseState>,
    /// Leased IPv4 address.
    pub ip: Option<Ipv4Addr>,
    /// DHCP client identifier bytes; empty means unset.
    pub dhcp_client_identifier: Vec<u8>,
    /// Hostname reported by the client.
    pub client_hostname: String,
    /// Handle of the host record bound to this lease, if any.
    pub host: i32,
    /// Raw hardware (MAC) address bytes; empty means unset.
    pub hardware_address: Vec<u8>,
    /// Link-layer type of the hardware address.
    pub hardware_type: Option<HardwareType>,
    /// When the lease ends.
    pub ends: i64,
    /// When the peer was last told about the lease.
    pub tstp: i64,
    /// Actual time sent from the failover partner.
    pub atsfp: i64,
    /// The client's last transaction time.
    pub cltt: i64,
    /// Server-assigned object handle; 0 until opened.
    pub handle: i32,
}

impl Lease {
    /// Build the object map representation of this record.
    #[must_use]
    pub fn to_object(&self) -> ObjectMap {
        let mut object = ObjectMap::new();
        object.insert(
            "state",
            match self.state {
                Some(state) => MapValue::from_i32(state.as_wire()),
                None => MapValue::Unset,
            },
        );
        object.insert(
            "ip-address",
            match self.ip {
                Some(ip) => MapValue::Bytes(ip.octets().to_vec()),
                None => MapValue::Unset,
            },
        );
        object.insert(
            "dhcp-client-identifier",
            MapValue::bytes_or_unset(&self.dhcp_client_identifier),
        );
        object.insert(
            "client-hostname",
            MapValue::text_or_unset(&self.client_hostname),
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
        object
    }

    /// Build a record from a server reply's object map and handle.
    #[must_use]
    pub fn from_reply(reply: &Message) -> Self {
        let object = &reply.object;
        Self {
            state: LeaseState::from_wire(object.i32_or_zero("state")),
            ip: ipv4_from_bytes(object.bytes("ip-address")),
            dhcp_client_identifier: object
                .bytes("dhcp-client-identifier")
                .map(<[u8]>::to_vec)
                .unwrap_or_default(),
            client_hostname: object.text("client-hostname"),
            host: object.i32_or_zero("host"),
            hardware_address: object
                .bytes("hardware-address")
                .map(<[u8]>::to_vec)
                .unwrap_or_default(),
            hardware_type: HardwareType::from_wire(object.i32_or_zero("hardware-type")),
            ends: i64::from(object.i32_or_zero("ends")),
            tstp: i64::from(object.i32_or_zero("tstp")),
            atsfp: i64::from(object.i32_or_zero("atsfp")),
            cltt: i64::from(object.i32_or_zero("cltt")),
            handle: reply.handle,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Encode/decode tests for the lease mapper.

    use std::net::Ipv4Addr;

    use super::{Lease, LeaseState};
    use crate::{
        map::MapValue,
        message::Message,
        opcode::Opcode,
        txn::TransactionIds,
    };

    #[test]
    fn templates_omit_unset_fields() {
        let lease = Lease {
            ip: Some(Ipv4Addr::new(192, 168, 1, 50)),
            ..Lease::default()
        };
        let object = lease.to_object();
        assert_eq!(object.bytes("ip-address"), Some(&[192, 168, 1, 50][..]));
        assert!(object.get("state").is_none());
        assert!(object.get("client-hostname").is_none());
    }

    #[test]
    fn replies_decode_states_and_timestamps() {
        let ids = TransactionIds::seeded(1);
        let mut reply = Message::new(Opcode::Update, &ids);
        reply.handle = 12;
        reply.object.insert("state", MapValue::from_i32(2));
        reply
            .object
            .insert("ip-address", vec![192, 168, 1, 50]);
        reply.object.insert("client-hostname", "laptop");
        reply.object.insert("ends", MapValue::from_i32(1_700_000_000));

        let lease = Lease::from_reply(&reply);
        assert_eq!(lease.state, Some(LeaseState::Active));
        assert_eq!(lease.ip, Some(Ipv4Addr::new(192, 168, 1, 50)));
        assert_eq!(lease.client_hostname, "laptop");
        assert_eq!(lease.ends, 1_700_000_000);
        assert_eq!(lease.handle, 12);
        // Fields the server did not send read as their zero values.
        assert_eq!(lease.tstp, 0);
        assert_eq!(lease.host, 0);
    }

    #[test]
    fn unknown_states_map_to_none() {
        assert_eq!(LeaseState::from_wire(0), None);
        assert_eq!(LeaseState::from_wire(10), None);
        assert_eq!(LeaseState::from_wire(9), Some(LeaseState::Bootp));
    }
}
