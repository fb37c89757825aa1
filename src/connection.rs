//! Connection lifecycle, handshake, and request/response correlation.
//!
//! A connection owns one transport, one authenticator, and one stream
//! assembler. Construction drives the startup handshake and, when
//! credentials were supplied, the authenticator binding exchange; only a
//! fully set-up connection is ever handed to the caller. Correlation is
//! strictly "the next reply read must answer the request just sent": a
//! connection is not safe for concurrent queries, and callers needing
//! parallelism use one connection per in-flight request.
//!
//! Failures other than server status replies are fatal: the stream can no
//! longer be trusted, so the connection poisons itself and refuses further
//! queries instead of attempting resynchronisation.

use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf, split},
    net::{TcpStream, ToSocketAddrs},
};
use tracing::debug;

use crate::{
    assembler::StreamAssembler,
    auth::{Authenticator, HmacMd5Authenticator},
    codec::{self, WireLimits},
    error::{OmapiError, Result},
    map::ObjectMap,
    message::Message,
    objects::{Failover, Host, Lease},
    opcode::Opcode,
    preamble::{self, STARTUP_FRAME_LEN, StartupFrame},
    status::Status,
    txn::TransactionIds,
};

/// Default port the server listens on for management connections.
pub const DEFAULT_PORT: u16 = 7911;

/// Username and base64 secret key identifying a server-side key.
#[derive(Clone, Debug)]
pub struct Credentials {
    username: String,
    base64_key: String,
}

impl Credentials {
    /// Bundle a username with its base64-encoded secret key.
    ///
    /// The key is decoded during connection setup; an invalid encoding
    /// surfaces there as a fatal [`OmapiError::InvalidKey`].
    pub fn new(username: impl Into<String>, base64_key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            base64_key: base64_key.into(),
        }
    }
}

/// A live, fully set-up connection to the management service.
#[derive(Debug)]
pub struct Connection<T> {
    writer: WriteHalf<T>,
    assembler: StreamAssembler<ReadHalf<T>>,
    authenticator: Authenticator,
    transaction_ids: TransactionIds,
    limits: WireLimits,
    failed: bool,
}

impl Connection<TcpStream> {
    /// Connect over TCP and perform the startup handshake.
    ///
    /// # Errors
    ///
    /// Returns connect, handshake, or binding errors; see
    /// [`Connection::open`].
    pub async fn dial(
        addr: impl ToSocketAddrs,
        credentials: Option<Credentials>,
    ) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Self::open(stream, credentials).await
    }
}

impl<T: AsyncRead + AsyncWrite + Unpin> Connection<T> {
    /// Take ownership of a transport and perform the startup handshake.
    ///
    /// With credentials, an HMAC-MD5 authenticator is bound during setup and
    /// signs all subsequent traffic; without, the connection stays on the
    /// null authenticator permanently.
    ///
    /// # Errors
    ///
    /// Returns [`OmapiError::InvalidKey`] for a malformed key,
    /// version/header-size mismatches for a disagreeing peer, binding errors
    /// for a rejected authenticator, and transport errors. All are fatal; no
    /// connection is returned.
    pub async fn open(transport: T, credentials: Option<Credentials>) -> Result<Self> {
        Self::open_with(
            transport,
            credentials,
            WireLimits::default(),
            TransactionIds::default(),
        )
        .await
    }

    /// [`Connection::open`] with explicit wire limits and transaction-id
    /// source, for callers that need deterministic identifiers or tighter
    /// ceilings.
    ///
    /// # Errors
    ///
    /// As for [`Connection::open`].
    pub async fn open_with(
        transport: T,
        credentials: Option<Credentials>,
        limits: WireLimits,
        transaction_ids: TransactionIds,
    ) -> Result<Self> {
        // Decode the key before any I/O; a malformed key is a configuration
        // error, not a peer failure.
        let pending = credentials
            .map(|c| HmacMd5Authenticator::new(c.username, &c.base64_key))
            .transpose()?;

        let (reader, writer) = split(transport);
        let mut connection = Self {
            writer,
            assembler: StreamAssembler::new(reader),
            authenticator: Authenticator::Null,
            transaction_ids,
            limits,
            failed: false,
        };
        connection.exchange_startup().await?;
        if let Some(authenticator) = pending {
            connection.bind_authenticator(authenticator).await?;
        }
        Ok(connection)
    }

    async fn exchange_startup(&mut self) -> Result<()> {
        let frame = preamble::encode_startup(&StartupFrame::expected())?;
        self.writer.write_all(&frame).await?;

        let received = self.assembler.read_bytes(STARTUP_FRAME_LEN).await?;
        let peer = preamble::decode_startup(&received)?;
        peer.verify()?;
        debug!(
            version = peer.version,
            header_size = peer.header_size,
            "startup frames exchanged"
        );
        Ok(())
    }

    /// Open the authenticator object on the server and adopt the allocated
    /// id. The binding request itself is signed with the null authenticator;
    /// no bound id exists yet.
    async fn bind_authenticator(&mut self, authenticator: HmacMd5Authenticator) -> Result<()> {
        let mut authenticator = Authenticator::HmacMd5(authenticator);
        let mut request = Message::open("authenticator", &self.transaction_ids);
        request.object = authenticator.auth_object();

        let (reply, _status) = self.query(request).await?;
        if reply.opcode != Opcode::Update {
            return Err(self.fail(OmapiError::AuthBindingRejected(reply.opcode)));
        }
        if reply.handle == 0 {
            return Err(self.fail(OmapiError::InvalidAuthId));
        }
        authenticator.set_auth_id(reply.handle);
        debug!(auth_id = reply.handle, "authenticator bound");
        self.authenticator = authenticator;
        Ok(())
    }

    /// Sign and send `request`, then decode and correlate the reply.
    ///
    /// Returns the reply together with its derived status: the mapped result
    /// code for status replies, success for every other opcode. An error
    /// status is returned as data here; the high-level operations decide
    /// whether it aborts them.
    ///
    /// # Errors
    ///
    /// Returns transport and protocol errors, including
    /// [`OmapiError::CorrelationMismatch`] when the reply does not answer
    /// this request. Any such error poisons the connection; subsequent
    /// queries fail with [`OmapiError::ConnectionFailed`].
    pub async fn query(&mut self, mut request: Message) -> Result<(Message, Status)> {
        if self.failed {
            return Err(OmapiError::ConnectionFailed);
        }
        request.sign(&self.authenticator);
        debug!(
            opcode = %request.opcode,
            transaction_id = request.transaction_id,
            "sending query"
        );
        if let Err(error) = self.writer.write_all(&request.to_wire()).await {
            return Err(self.fail(error.into()));
        }

        let reply = match codec::read_message(&mut self.assembler, &self.limits).await {
            Ok(reply) => reply,
            Err(error) => return Err(self.fail(error)),
        };
        if !reply.is_response_to(&request) {
            return Err(self.fail(OmapiError::CorrelationMismatch {
                expected: request.transaction_id,
                received: reply.response_id,
            }));
        }
        // The reply's authenticator id is deliberately left unverified,
        // matching the reference client's lenient behaviour.
        let status = reply.status();
        debug!(opcode = %reply.opcode, code = status.code(), "reply correlated");
        Ok((reply, status))
    }

    /// Open an object of `type_name` matching `template`.
    ///
    /// An update reply means found; the returned message carries the
    /// object's state and handle.
    ///
    /// # Errors
    ///
    /// Returns [`OmapiError::Status`] when the server answers with anything
    /// but an update, commonly "not found"; the connection stays usable.
    /// Transport and protocol errors are fatal as for [`Connection::query`].
    pub async fn open_by_template(
        &mut self,
        type_name: &str,
        template: ObjectMap,
    ) -> Result<Message> {
        let mut request = Message::open(type_name, &self.transaction_ids);
        request.object = template;
        let (reply, status) = self.query(request).await?;
        if reply.opcode == Opcode::Update {
            Ok(reply)
        } else {
            Err(OmapiError::Status(status))
        }
    }

    /// Create an object of `type_name` from `object`, failing if it already
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns [`OmapiError::Status`] when creation fails, commonly "already
    /// exists"; the connection stays usable. Transport and protocol errors
    /// are fatal as for [`Connection::query`].
    pub async fn create(&mut self, type_name: &str, object: ObjectMap) -> Result<Message> {
        let mut request = Message::create(type_name, &self.transaction_ids);
        request.object = object;
        let (reply, status) = self.query(request).await?;
        if status.is_error() {
            Err(OmapiError::Status(status))
        } else {
            Ok(reply)
        }
    }

    /// Delete the object behind `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`OmapiError::Status`] for any non-success result, including
    /// "not found" for a stale handle; the connection stays usable.
    /// Transport and protocol errors are fatal as for [`Connection::query`].
    pub async fn delete(&mut self, handle: i32) -> Result<()> {
        let request = Message::delete(handle, &self.transaction_ids);
        let (_reply, status) = self.query(request).await?;
        if status.is_error() {
            Err(OmapiError::Status(status))
        } else {
            Ok(())
        }
    }

    /// Look up a host matching the populated fields of `template`.
    ///
    /// # Errors
    ///
    /// As for [`Connection::open_by_template`].
    pub async fn find_host(&mut self, template: &Host) -> Result<Host> {
        let reply = self.open_by_template("host", template.to_object()).await?;
        Ok(Host::from_reply(&reply))
    }

    /// Create a host from the populated fields of `host`.
    ///
    /// The returned record is the server's representation of the new host,
    /// including its handle; it may be sparser than the input because the
    /// server does not echo every field.
    ///
    /// # Errors
    ///
    /// As for [`Connection::create`].
    pub async fn create_host(&mut self, host: &Host) -> Result<Host> {
        let reply = self.create("host", host.to_object()).await?;
        Ok(Host::from_reply(&reply))
    }

    /// Look up a lease matching the populated fields of `template`.
    ///
    /// On the reference server only the IP address and the DHCP client
    /// identifier reliably match, despite what its documentation claims.
    ///
    /// # Errors
    ///
    /// As for [`Connection::open_by_template`].
    pub async fn find_lease(&mut self, template: &Lease) -> Result<Lease> {
        let reply = self
            .open_by_template("lease", template.to_object())
            .await?;
        Ok(Lease::from_reply(&reply))
    }

    /// Look up a failover-state object by name.
    ///
    /// # Errors
    ///
    /// As for [`Connection::open_by_template`].
    pub async fn find_failover(&mut self, name: &str) -> Result<Failover> {
        let mut template = ObjectMap::new();
        template.insert("name", name);
        let reply = self.open_by_template("failover-state", template).await?;
        Ok(Failover::from_reply(&reply))
    }

    /// The transaction-id source used for requests on this connection.
    #[must_use]
    pub fn transaction_ids(&self) -> &TransactionIds { &self.transaction_ids }

    /// The authenticator currently signing outgoing messages.
    #[must_use]
    pub fn authenticator(&self) -> &Authenticator { &self.authenticator }

    fn fail(&mut self, error: OmapiError) -> OmapiError {
        self.failed = true;
        error
    }
}
