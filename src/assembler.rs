//! Stream assembly over a fragmented transport.
//!
//! The transport delivers bytes at an arbitrary granularity; the decoder
//! needs discrete quantities. [`StreamAssembler`] sits between them,
//! accumulating reads into a buffer and exposing "block until at least N
//! bytes are available" and "consume exactly N bytes". Blocking suspends only
//! the calling task, never unrelated connections.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

use crate::{
    byte_order::{read_network_i32, read_network_u16, read_network_u32},
    error::{OmapiError, Result},
};

/// Capacity reserved per transport read.
const READ_CHUNK: usize = 2048;

/// Buffering reader masking the transport's delivery granularity.
#[derive(Debug)]
pub struct StreamAssembler<R> {
    reader: R,
    buffer: BytesMut,
}

impl<R: AsyncRead + Unpin> StreamAssembler<R> {
    /// Wrap a transport reader with an empty buffer.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: BytesMut::with_capacity(READ_CHUNK),
        }
    }

    /// Return the number of buffered, unconsumed bytes.
    #[must_use]
    pub fn available(&self) -> usize { self.buffer.len() }

    /// Suspend until at least `n` unread bytes are buffered.
    ///
    /// Issues transport reads of an implementation-chosen chunk size and
    /// appends everything read, which may leave more than `n` bytes buffered.
    ///
    /// # Errors
    ///
    /// Returns [`OmapiError::Io`] if a transport read fails and
    /// [`OmapiError::Disconnected`] if the transport closes before `n` bytes
    /// arrive. Both are fatal to the connection.
    pub async fn ensure_available(&mut self, n: usize) -> Result<()> {
        while self.buffer.len() < n {
            self.buffer.reserve(READ_CHUNK);
            let read = self.reader.read_buf(&mut self.buffer).await?;
            if read == 0 {
                return Err(OmapiError::Disconnected);
            }
            trace!(read, buffered = self.buffer.len(), "transport bytes assembled");
        }
        Ok(())
    }

    /// Remove and return exactly `n` bytes from the front of the buffer.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `n` bytes are buffered; callers must first
    /// [`ensure_available`](Self::ensure_available).
    #[must_use]
    pub fn take_exactly(&mut self, n: usize) -> Bytes {
        assert!(
            self.buffer.len() >= n,
            "take_exactly({n}) called with only {} bytes buffered",
            self.buffer.len()
        );
        self.buffer.split_to(n).freeze()
    }

    /// Read a big-endian `u16` from the stream.
    ///
    /// # Errors
    ///
    /// Propagates [`ensure_available`](Self::ensure_available) failures.
    pub async fn read_u16(&mut self) -> Result<u16> {
        self.ensure_available(2).await?;
        let bytes = self.take_exactly(2);
        Ok(read_network_u16([bytes[0], bytes[1]]))
    }

    /// Read a big-endian `u32` from the stream.
    ///
    /// # Errors
    ///
    /// Propagates [`ensure_available`](Self::ensure_available) failures.
    pub async fn read_u32(&mut self) -> Result<u32> {
        self.ensure_available(4).await?;
        let bytes = self.take_exactly(4);
        Ok(read_network_u32([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a big-endian `i32` from the stream.
    ///
    /// # Errors
    ///
    /// Propagates [`ensure_available`](Self::ensure_available) failures.
    pub async fn read_i32(&mut self) -> Result<i32> {
        self.ensure_available(4).await?;
        let bytes = self.take_exactly(4);
        Ok(read_network_i32([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read exactly `n` bytes from the stream.
    ///
    /// # Errors
    ///
    /// Propagates [`ensure_available`](Self::ensure_available) failures.
    pub async fn read_bytes(&mut self, n: usize) -> Result<Bytes> {
        self.ensure_available(n).await?;
        Ok(self.take_exactly(n))
    }
}
