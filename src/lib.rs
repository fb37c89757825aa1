//! Async client engine for the OMAPI management protocol spoken by the ISC
//! DHCP server.
//!
//! The engine is layered bottom-up: deterministic serialization of key/value
//! object maps ([`map`]), message framing and signing ([`message`], [`auth`]),
//! stream reassembly over a fragmented transport ([`assembler`], [`codec`]),
//! and a connection type ([`connection`]) that drives the startup handshake,
//! binds an authenticator, and correlates each request with its reply. Typed
//! mappers for the server's host, lease, and failover-state objects sit on
//! top ([`objects`]).
//!
//! ```no_run
//! use omapi::{Connection, Credentials, Host};
//!
//! # async fn example() -> omapi::Result<()> {
//! let credentials = Credentials::new("omapi_key", "b3BlbiBzZXNhbWU=");
//! let mut connection =
//!     Connection::dial(("dhcp.example.net", omapi::DEFAULT_PORT), Some(credentials)).await?;
//!
//! let template = Host {
//!     name: "workstation".into(),
//!     ..Host::default()
//! };
//! let host = connection.find_host(&template).await?;
//! println!("{} has handle {}", host.name, host.handle);
//! # Ok(())
//! # }
//! ```
//!
//! All multi-byte quantities on the wire are big-endian, and both maps in a
//! message serialize with their keys in ascending order; signatures depend on
//! that determinism.

pub mod assembler;
pub mod auth;
pub mod byte_order;
pub mod codec;
pub mod connection;
pub mod error;
pub mod map;
pub mod message;
pub mod objects;
pub mod opcode;
pub mod preamble;
pub mod status;
pub mod txn;

pub use auth::Authenticator;
pub use codec::WireLimits;
pub use connection::{Connection, Credentials, DEFAULT_PORT};
pub use error::{OmapiError, Result};
pub use map::{MapValue, ObjectMap};
pub use message::Message;
pub use objects::{Failover, FailoverHierarchy, FailoverState, HardwareType, Host, Lease, LeaseState};
pub use opcode::Opcode;
pub use status::Status;
pub use txn::TransactionIds;
