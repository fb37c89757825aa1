//! Protocol messages and their deterministic serialization.
//!
//! A message is the unit of exchange: a fixed header (authenticator id,
//! signature length, opcode, handle, transaction id, response id), a control
//! map of protocol directives, an object map of domain data, and a trailing
//! signature. The signing serialization omits the authenticator id and the
//! signature bytes but keeps the signature length field, so [`Message::sign`]
//! fixes the signature length before computing the digest.

use crate::{
    auth::Authenticator,
    byte_order::{write_network_i32, write_network_u32},
    map::{MapValue, ObjectMap},
    opcode::Opcode,
    status::Status,
    txn::TransactionIds,
};

/// One protocol message, outbound or decoded from the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Identifier of the authenticator that signed this message; 0 for the
    /// null authenticator.
    pub auth_id: i32,
    /// Operation carried by this message.
    pub opcode: Opcode,
    /// Server-assigned object handle; 0 means none assigned.
    pub handle: i32,
    /// Client-generated identifier echoed by the matching reply.
    pub transaction_id: i32,
    /// On a reply, the transaction id of the request being answered.
    pub response_id: i32,
    /// Protocol-level directives such as the object type or create flags.
    pub control: ObjectMap,
    /// Domain object data, as search template or returned state.
    pub object: ObjectMap,
    /// Signature over the signing serialization; empty for the null
    /// authenticator.
    pub signature: Vec<u8>,
}

impl Message {
    /// Create a message with a fresh transaction identifier and empty maps.
    #[must_use]
    pub fn new(opcode: Opcode, ids: &TransactionIds) -> Self {
        Self {
            auth_id: 0,
            opcode,
            handle: 0,
            transaction_id: ids.next(),
            response_id: 0,
            control: ObjectMap::new(),
            object: ObjectMap::new(),
            signature: Vec::new(),
        }
    }

    /// Create an open request for the named object type.
    #[must_use]
    pub fn open(type_name: &str, ids: &TransactionIds) -> Self {
        let mut message = Self::new(Opcode::Open, ids);
        message.control.insert("type", type_name);
        message
    }

    /// Create an open request that also creates the object exclusively.
    #[must_use]
    pub fn create(type_name: &str, ids: &TransactionIds) -> Self {
        let mut message = Self::open(type_name, ids);
        message.control.insert("create", MapValue::from_bool(true));
        message.control.insert("exclusive", MapValue::from_bool(true));
        message
    }

    /// Create a delete request for the object behind `handle`.
    #[must_use]
    pub fn delete(handle: i32, ids: &TransactionIds) -> Self {
        let mut message = Self::new(Opcode::Delete, ids);
        message.handle = handle;
        message
    }

    fn encode(&self, for_signing: bool) -> Vec<u8> {
        let mut out = Vec::with_capacity(64);
        if !for_signing {
            out.extend_from_slice(&write_network_i32(self.auth_id));
        }
        let signature_len =
            u32::try_from(self.signature.len()).expect("signature length fits 32 bits");
        out.extend_from_slice(&write_network_u32(signature_len));
        out.extend_from_slice(&write_network_i32(self.opcode.as_wire()));
        out.extend_from_slice(&write_network_i32(self.handle));
        out.extend_from_slice(&write_network_i32(self.transaction_id));
        out.extend_from_slice(&write_network_i32(self.response_id));
        self.control.encode_into(&mut out);
        self.object.encode_into(&mut out);
        if !for_signing {
            out.extend_from_slice(&self.signature);
        }
        out
    }

    /// Serialize into the full on-wire form, including authenticator id and
    /// signature bytes.
    #[must_use]
    pub fn to_wire(&self) -> Vec<u8> { self.encode(false) }

    /// Serialize into the signing form: authenticator id and signature bytes
    /// omitted, signature length retained.
    ///
    /// The server computes the same omission to verify, so these bytes must
    /// match the wire form byte for byte everywhere else.
    #[must_use]
    pub fn signing_bytes(&self) -> Vec<u8> { self.encode(true) }

    /// Sign this message with `authenticator`.
    ///
    /// Sets the authenticator id and the signature. The signature length
    /// field is covered by the signing serialization, so the signature is
    /// first sized to the authenticator's digest width and then computed;
    /// signing the same unchanged message twice yields the same bytes.
    pub fn sign(&mut self, authenticator: &Authenticator) {
        self.auth_id = authenticator.auth_id();
        self.signature = vec![0; authenticator.signature_len()];
        self.signature = authenticator.sign(self);
    }

    /// Return true if `authenticator` reproduces this message's signature.
    #[must_use]
    pub fn verify(&self, authenticator: &Authenticator) -> bool {
        authenticator.sign(self) == self.signature
    }

    /// Return true if this message answers `request`.
    #[must_use]
    pub fn is_response_to(&self, request: &Message) -> bool {
        self.response_id == request.transaction_id
    }

    /// Derive the result status conveyed by this message.
    ///
    /// Only status replies carry an explicit result code; any other opcode
    /// conveys success through its shape and derives [`Status::SUCCESS`].
    #[must_use]
    pub fn status(&self) -> Status {
        if self.opcode == Opcode::Status {
            Status::from_code(self.control.i32_or_zero("result"))
        } else {
            Status::SUCCESS
        }
    }
}
