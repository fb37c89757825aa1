//! Result statuses returned by the server.
//!
//! Status replies carry a numeric result code mapped through a fixed table
//! shared with the reference server. Code 0 is success; every other code in
//! the table describes a specific failure. Codes outside the table are
//! surfaced as an unknown status instead of being rejected, so a newer server
//! cannot crash an older client.

/// Human-readable messages for the fixed status codes 0 through 69.
const MESSAGES: [&str; 70] = [
    "success",
    "out of memory",
    "timed out",
    "no available threads",
    "address not available",
    "address in use",
    "permission denied",
    "no pending connections",
    "network unreachable",
    "host unreachable",
    "network down",
    "host down",
    "connection refused",
    "not enough free resources",
    "end of file",
    "socket already bound",
    "task is done",
    "lock busy",
    "already exists",
    "ran out of space",
    "operation canceled",
    "sending events is not allowed",
    "shutting down",
    "not found",
    "unexpected end of input",
    "failure",
    "I/O error",
    "not implemented",
    "unbalanced parentheses",
    "no more",
    "invalid file",
    "bad base64 encoding",
    "unexpected token",
    "quota reached",
    "unexpected error",
    "already running",
    "host unknown",
    "protocol version mismatch",
    "protocol error",
    "invalid argument",
    "not connected",
    "data not yet available",
    "object unchanged",
    "more than one object matches key",
    "key conflict",
    "parse error(s) occurred",
    "no key specified",
    "zone TSIG key not known",
    "invalid TSIG key",
    "operation in progress",
    "DNS format error",
    "DNS server failed",
    "no such domain",
    "not implemented",
    "refused",
    "domain already exists",
    "RRset already exists",
    "no such RRset",
    "not authorized",
    "not a zone",
    "bad DNS signature",
    "bad DNS key",
    "clock skew too great",
    "no root zone",
    "destination address required",
    "cross-zone update",
    "no TSIG signature",
    "not equal",
    "connection reset by peer",
    "unknown attribute",
];

/// Result status for a single protocol exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Status {
    code: i32,
}

impl Status {
    /// The success status, code 0.
    pub const SUCCESS: Self = Self { code: 0 };

    /// Wrap a numeric result code, including codes outside the fixed table.
    #[must_use]
    pub fn from_code(code: i32) -> Self { Self { code } }

    /// Return the numeric result code.
    #[must_use]
    pub fn code(&self) -> i32 { self.code }

    /// Return true if the status describes an error.
    #[must_use]
    pub fn is_error(&self) -> bool { self.code != 0 }

    /// Return the documented message for this code, or `"unknown status"`
    /// for codes outside the fixed table.
    #[must_use]
    pub fn message(&self) -> &'static str {
        usize::try_from(self.code)
            .ok()
            .and_then(|index| MESSAGES.get(index))
            .copied()
            .unwrap_or("unknown status")
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {})", self.message(), self.code)
    }
}

impl std::error::Error for Status {}
