//! Failover peer records.

use std::net::Ipv4Addr;

use super::host::ipv4_from_bytes;
use crate::message::Message;

/// State of one side of a failover relationship.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum FailoverState {
    /// Starting up.
    Startup = 1,
    /// Normal operation.
    Normal = 2,
    /// Lost contact with the partner.
    CommunicationsInterrupted = 3,
    /// Operating alone with the partner declared down.
    PartnerDown = 4,
    /// Both peers claim the same role.
    PotentialConflict = 5,
    /// Recovering state from the partner.
    Recover = 6,
    /// Paused by the operator.
    Paused = 7,
    /// Shutting down.
    Shutdown = 8,
    /// Recovery finished, awaiting the partner.
    RecoverDone = 9,
    /// Conflict resolution was interrupted.
    ResolutionInterrupted = 10,
    /// Conflict resolution finished.
    ConflictDone = 11,
    /// Waiting out the maximum client lead time before recovery.
    RecoverWait = 254,
}

impl FailoverState {
    /// Map a wire value onto a known failover state.
    #[must_use]
    pub fn from_wire(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Startup),
            2 => Some(Self::Normal),
            3 => Some(Self::CommunicationsInterrupted),
            4 => Some(Self::PartnerDown),
            5 => Some(Self::PotentialConflict),
            6 => Some(Self::Recover),
            7 => Some(Self::Paused),
            8 => Some(Self::Shutdown),
            9 => Some(Self::RecoverDone),
            10 => Some(Self::ResolutionInterrupted),
            11 => Some(Self::ConflictDone),
            254 => Some(Self::RecoverWait),
            _ => None,
        }
    }

    /// Return the signed 32-bit wire representation.
    #[must_use]
    pub fn as_wire(self) -> i32 { self as i32 }
}

impl std::fmt::Display for FailoverState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Startup => "startup",
            Self::Normal => "normal",
            Self::CommunicationsInterrupted => "communications interrupted",
            Self::PartnerDown => "partner down",
            Self::PotentialConflict => "potential conflict",
            Self::Recover => "recover",
            Self::Paused => "paused",
            Self::Shutdown => "shutdown",
            Self::RecoverDone => "recover done",
            Self::ResolutionInterrupted => "resolution interrupted",
            Self::ConflictDone => "conflict done",
            Self::RecoverWait => "recover wait",
        };
        f.write_str(name)
    }
}

/// Role of this peer in the failover pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum FailoverHierarchy {
    /// The primary peer.
    Primary = 0,
    /// The secondary peer.
    Secondary = 1,
}

impl FailoverHierarchy {
    /// Map a wire value onto a hierarchy role.
    #[must_use]
    pub fn from_wire(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Primary),
            1 => Some(Self::Secondary),
            _ => None,
        }
    }
}

impl std::fmt::Display for FailoverHierarchy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        };
        f.write_str(name)
    }
}

/// A failover-state object held by the server.
///
/// Read-only from the client's perspective; looked up by name. Timestamps
/// are seconds since the Unix epoch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Failover {
    /// Name of the failover relationship.
    pub name: String,
    /// Partner peer address.
    pub partner_address: Option<Ipv4Addr>,
    /// Local peer address.
    pub local_address: Option<Ipv4Addr>,
    /// Partner peer port.
    pub partner_port: i32,
    /// Local peer port.
    pub local_port: i32,
    /// Maximum unacknowledged binding updates in flight.
    pub max_outstanding_updates: i32,
    /// Maximum client lead time, in seconds.
    pub mclt: i32,
    /// Load balancing cutoff, in seconds.
    pub load_balance_max_secs: i32,
    /// Load balancing hash bucket assignments.
    pub load_balance_hba: Vec<u8>,
    /// State of the local peer.
    pub local_state: Option<FailoverState>,
    /// State of the partner peer.
    pub partner_state: Option<FailoverState>,
    /// When the local state took effect.
    pub local_stos: i64,
    /// When the partner state took effect.
    pub partner_stos: i64,
    /// Role of this peer in the pair.
    pub hierarchy: Option<FailoverHierarchy>,
    /// When the last packet was sent to the partner.
    pub last_packet_sent: i64,
    /// Last timestamp received from the partner.
    pub last_timestamp_received: i64,
    /// Observed clock skew between the peers, in seconds.
    pub skew: i32,
    /// Maximum silence tolerated before declaring the link down, in seconds.
    pub max_response_delay: i32,
    /// Binding updates currently awaiting acknowledgement.
    pub cur_unacked_updates: i32,
    /// Server-assigned object handle; 0 until opened.
    pub handle: i32,
}

impl Failover {
    /// Build a record from a server reply's object map and handle.
    #[must_use]
    pub fn from_reply(reply: &Message) -> Self {
        let object = &reply.object;
        Self {
            name: object.text("name"),
            partner_address: ipv4_from_bytes(object.bytes("partner-address")),
            local_address: ipv4_from_bytes(object.bytes("local-address")),
            partner_port: object.i32_or_zero("partner-port"),
            local_port: object.i32_or_zero("local-port"),
            max_outstanding_updates: object.i32_or_zero("max-outstanding-updates"),
            mclt: object.i32_or_zero("mclt"),
            load_balance_max_secs: object.i32_or_zero("load-balance-max-secs"),
            load_balance_hba: object
                .bytes("load-balance-hba")
                .map(<[u8]>::to_vec)
                .unwrap_or_default(),
            local_state: FailoverState::from_wire(object.i32_or_zero("local-state")),
            partner_state: FailoverState::from_wire(object.i32_or_zero("partner-state")),
            local_stos: i64::from(object.i32_or_zero("local-stos")),
            partner_stos: i64::from(object.i32_or_zero("partner-stos")),
            hierarchy: FailoverHierarchy::from_wire(object.i32_or_zero("hierarchy")),
            last_packet_sent: i64::from(object.i32_or_zero("last-packet-sent")),
            last_timestamp_received: i64::from(object.i32_or_zero("last-timestamp-received")),
            skew: object.i32_or_zero("skew"),
            max_response_delay: object.i32_or_zero("max-response-delay"),
            cur_unacked_updates: object.i32_or_zero("cur-unacked-updates"),
            handle: reply.handle,
        }
    }
}
