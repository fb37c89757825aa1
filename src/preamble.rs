//! Connection startup frame exchange.
//!
//! Immediately after connect, each side sends exactly one fixed eight-byte
//! frame announcing the protocol version and header size. Both constants are
//! mandated by compatibility with the reference server; any mismatch is a
//! fatal, non-retryable setup error.

use bincode::{Decode, Encode, config};

use crate::error::{OmapiError, Result};

/// Protocol version announced and required in the startup frame.
pub const PROTOCOL_VERSION: u32 = 100;

/// Message header size announced and required in the startup frame.
pub const HEADER_SIZE: u32 = 24;

/// On-wire length of a startup frame in bytes.
pub const STARTUP_FRAME_LEN: usize = 8;

/// The fixed frame each side sends immediately after connect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub struct StartupFrame {
    /// Announced protocol version; must equal [`PROTOCOL_VERSION`].
    pub version: u32,
    /// Announced header size; must equal [`HEADER_SIZE`].
    pub header_size: u32,
}

impl StartupFrame {
    /// The frame this client sends and requires from the peer.
    #[must_use]
    pub const fn expected() -> Self {
        Self {
            version: PROTOCOL_VERSION,
            header_size: HEADER_SIZE,
        }
    }

    /// Verify that this frame matches the mandated constants.
    ///
    /// # Errors
    ///
    /// Returns [`OmapiError::VersionMismatch`] or
    /// [`OmapiError::HeaderSizeMismatch`] naming the offending field.
    pub fn verify(&self) -> Result<()> {
        if self.version != PROTOCOL_VERSION {
            return Err(OmapiError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                received: self.version,
            });
        }
        if self.header_size != HEADER_SIZE {
            return Err(OmapiError::HeaderSizeMismatch {
                expected: HEADER_SIZE,
                received: self.header_size,
            });
        }
        Ok(())
    }
}

impl Default for StartupFrame {
    fn default() -> Self { Self::expected() }
}

fn wire_config() -> config::Configuration<config::BigEndian, config::Fixint> {
    config::standard().with_big_endian().with_fixed_int_encoding()
}

/// Encode a startup frame into its eight-byte wire form.
///
/// # Errors
///
/// Returns [`OmapiError::StartupEncode`] if bincode serialization fails.
pub fn encode_startup(frame: &StartupFrame) -> Result<Vec<u8>> {
    bincode::encode_to_vec(frame, wire_config()).map_err(OmapiError::StartupEncode)
}

/// Decode a startup frame from its eight-byte wire form.
///
/// # Errors
///
/// Returns [`OmapiError::StartupDecode`] if the bytes do not form a frame.
pub fn decode_startup(bytes: &[u8]) -> Result<StartupFrame> {
    let (frame, _consumed) =
        bincode::decode_from_slice(bytes, wire_config()).map_err(OmapiError::StartupDecode)?;
    Ok(frame)
}

#[cfg(test)]
mod tests {
    //! Wire-layout and verification tests for the startup frame.

    use rstest::rstest;

    use super::{STARTUP_FRAME_LEN, StartupFrame, decode_startup, encode_startup};
    use crate::error::OmapiError;

    #[test]
    fn expected_frame_has_the_mandated_layout() {
        let bytes = encode_startup(&StartupFrame::expected()).expect("encode");
        assert_eq!(bytes, vec![0, 0, 0, 100, 0, 0, 0, 24]);
        assert_eq!(bytes.len(), STARTUP_FRAME_LEN);
    }

    #[test]
    fn frames_round_trip() {
        let frame = StartupFrame {
            version: 99,
            header_size: 16,
        };
        let bytes = encode_startup(&frame).expect("encode");
        assert_eq!(decode_startup(&bytes).expect("decode"), frame);
    }

    #[rstest]
    #[case::bad_version(99, 24)]
    #[case::bad_header_size(100, 16)]
    fn mismatched_frames_fail_verification(#[case] version: u32, #[case] header_size: u32) {
        let err = StartupFrame {
            version,
            header_size,
        }
        .verify()
        .expect_err("mismatch must fail");
        match err {
            OmapiError::VersionMismatch { received, .. } => assert_eq!(received, version),
            OmapiError::HeaderSizeMismatch { received, .. } => assert_eq!(received, header_size),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn the_expected_frame_verifies() {
        StartupFrame::expected().verify().expect("constants match");
    }
}
