//! Typed views over the generic object maps.
//!
//! These mappers translate between domain records and the key/value object
//! maps the engine ships on the wire. Encoding represents unset fields as an
//! absent map entry, never a zero-length one; decoding is tolerant, reading
//! missing or short integer values as zero the way the reference client
//! does.

mod failover;
mod host;
mod lease;

pub use failover::{Failover, FailoverHierarchy, FailoverState};
pub use host::{HardwareType, Host};
pub use lease::{Lease, LeaseState};
