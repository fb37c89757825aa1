//! Shared scripted-peer harness for connection tests.
//!
//! [`ScriptedPeer`] plays the server side of an in-memory duplex transport,
//! reusing the crate's own assembler and decoder so the peer exercises the
//! exact wire forms a real server would see.

use omapi::{
    Message, Opcode,
    assembler::StreamAssembler,
    codec::{self, WireLimits},
    map::MapValue,
    preamble::{self, STARTUP_FRAME_LEN, StartupFrame},
    txn::TransactionIds,
};
use tokio::io::{AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf, split};

pub type TestResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// In-memory server endpoint driven explicitly by a test.
pub struct ScriptedPeer {
    writer: WriteHalf<DuplexStream>,
    assembler: StreamAssembler<ReadHalf<DuplexStream>>,
    ids: TransactionIds,
}

impl ScriptedPeer {
    /// Create a connected transport pair: the client half for the code under
    /// test and a scripted peer wrapping the server half.
    pub fn endpoints() -> (DuplexStream, Self) {
        let (client, server) = tokio::io::duplex(4096);
        let (reader, writer) = split(server);
        let peer = Self {
            writer,
            assembler: StreamAssembler::new(reader),
            ids: TransactionIds::seeded(9000),
        };
        (client, peer)
    }

    /// Answer the client's startup frame with the mandated constants.
    pub async fn exchange_startup(&mut self) -> TestResult {
        self.exchange_startup_with(StartupFrame::expected()).await
    }

    /// Answer the client's startup frame with an arbitrary frame.
    pub async fn exchange_startup_with(&mut self, frame: StartupFrame) -> TestResult {
        let received = self.assembler.read_bytes(STARTUP_FRAME_LEN).await?;
        preamble::decode_startup(&received)?.verify()?;
        self.writer.write_all(&preamble::encode_startup(&frame)?).await?;
        Ok(())
    }

    /// Decode the client's next message.
    pub async fn recv(&mut self) -> Result<Message, omapi::OmapiError> {
        codec::read_message(&mut self.assembler, &WireLimits::default()).await
    }

    /// Send a message verbatim.
    pub async fn send(&mut self, message: &Message) -> TestResult {
        self.writer.write_all(&message.to_wire()).await?;
        Ok(())
    }

    /// Build an update reply answering `request` with the given handle.
    pub fn update_reply(&self, request: &Message, handle: i32) -> Message {
        let mut reply = Message::new(Opcode::Update, &self.ids);
        reply.handle = handle;
        reply.response_id = request.transaction_id;
        reply
    }

    /// Build a status reply answering `request` with the given result code.
    pub fn status_reply(&self, request: &Message, code: i32) -> Message {
        let mut reply = Message::new(Opcode::Status, &self.ids);
        reply.handle = request.handle;
        reply.response_id = request.transaction_id;
        reply.control.insert("result", MapValue::from_i32(code));
        reply
    }
}
