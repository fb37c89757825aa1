//! Canonical error and result types for the crate.
//!
//! [`OmapiError`] covers the four failure categories of the protocol engine:
//! setup errors (handshake and authenticator binding), transport errors,
//! protocol violations, and application-level status errors. Only the last
//! category leaves the connection usable; every other variant is fatal to the
//! connection that produced it.

use std::io;

use crate::{opcode::Opcode, status::Status};

/// Canonical result alias used by `omapi` public APIs.
pub type Result<T> = std::result::Result<T, OmapiError>;

/// Errors emitted by the protocol engine.
#[derive(Debug, thiserror::Error)]
pub enum OmapiError {
    /// An error in the underlying transport.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
    /// The peer closed the connection.
    #[error("connection closed by peer")]
    Disconnected,
    /// Failed to encode the startup frame.
    #[error("failed to encode startup frame")]
    StartupEncode(#[source] bincode::error::EncodeError),
    /// Failed to decode the peer's startup frame.
    #[error("failed to decode startup frame")]
    StartupDecode(#[source] bincode::error::DecodeError),
    /// The peer announced a protocol version other than the required one.
    #[error("protocol version mismatch: expected {expected}, received {received}")]
    VersionMismatch {
        /// Version this client speaks.
        expected: u32,
        /// Version announced by the peer.
        received: u32,
    },
    /// The peer announced a header size other than the required one.
    #[error("header size mismatch: expected {expected}, received {received}")]
    HeaderSizeMismatch {
        /// Header size this client expects.
        expected: u32,
        /// Header size announced by the peer.
        received: u32,
    },
    /// The supplied secret key was not valid base64.
    #[error("secret key is not valid base64")]
    InvalidKey(#[source] base64::DecodeError),
    /// The authenticator binding exchange was answered with the wrong opcode.
    #[error("authenticator binding answered with {0}, expected an update")]
    AuthBindingRejected(Opcode),
    /// The server allocated a zero handle for the authenticator object.
    #[error("received invalid authid from server")]
    InvalidAuthId,
    /// A reply's response id did not match the in-flight request.
    #[error("response id {received} does not match transaction id {expected}")]
    CorrelationMismatch {
        /// Transaction id of the request just sent.
        expected: i32,
        /// Response id carried by the reply.
        received: i32,
    },
    /// The peer declared a length exceeding the configured sanity ceiling.
    #[error("declared length of {declared} bytes exceeds the limit of {limit}")]
    OversizedLength {
        /// Length declared on the wire.
        declared: usize,
        /// Configured ceiling that was exceeded.
        limit: usize,
    },
    /// An inbound message carried an opcode outside the protocol enumeration.
    #[error("unknown opcode {0}")]
    UnknownOpcode(i32),
    /// An inbound map key was not valid UTF-8.
    #[error("map key is not valid UTF-8")]
    InvalidMapKey,
    /// A previous fatal error left the connection unusable.
    #[error("connection is no longer usable after a fatal error")]
    ConnectionFailed,
    /// The server answered with an error status; the connection stays usable.
    #[error("server returned an error status: {0}")]
    Status(#[source] Status),
}

impl OmapiError {
    /// Return true if this error is fatal to the connection that produced it.
    ///
    /// Only [`OmapiError::Status`] is local to a single operation; every
    /// other variant means the connection must not be reused.
    #[must_use]
    pub fn is_fatal(&self) -> bool { !matches!(self, Self::Status(_)) }

    /// Return the embedded server status, if this is a status error.
    #[must_use]
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::Status(status) => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Display and classification tests for the error taxonomy.

    use super::OmapiError;
    use crate::status::Status;

    #[test]
    fn status_errors_are_not_fatal() {
        let err = OmapiError::Status(Status::from_code(23));
        assert!(!err.is_fatal());
        assert_eq!(err.status().map(|s| s.code()), Some(23));
    }

    #[test]
    fn protocol_violations_are_fatal() {
        let err = OmapiError::CorrelationMismatch {
            expected: 7,
            received: 9,
        };
        assert!(err.is_fatal());
        assert!(err.status().is_none());
    }

    #[test]
    fn display_names_the_mismatched_identifiers() {
        let err = OmapiError::CorrelationMismatch {
            expected: 7,
            received: 9,
        };
        assert_eq!(
            err.to_string(),
            "response id 9 does not match transaction id 7"
        );
    }
}
