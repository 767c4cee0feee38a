//! Framing of trapper protocol messages.
//!
//! Every message starts with a fixed 13 byte header: the magic `ZBXD`, the protocol version and
//! the length of the JSON body as an unsigned 64-bit little-endian integer. The byte order is
//! fixed by the protocol and independent of the platform.

use thiserror::Error;

use crate::Packet;

/// Magic bytes at the start of every frame.
pub const MAGIC: &[u8; 4] = b"ZBXD";

/// The only supported protocol version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Size of the frame header in bytes.
pub const HEADER_LENGTH: usize = 13;

/// Errors raised while framing messages.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Fewer bytes than a complete header were supplied.
    #[error(
        "incomplete frame header: expected {expected} bytes, got {received}",
        expected = HEADER_LENGTH
    )]
    Incomplete {
        /// The number of bytes available.
        received: usize,
    },

    /// The packet could not be serialized to JSON.
    #[error("failed to serialize packet")]
    Serialize(#[from] serde_json::Error),
}

/// The decoded header of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    /// The magic bytes, expected to be [`MAGIC`].
    pub magic: [u8; 4],
    /// The protocol version, expected to be [`PROTOCOL_VERSION`].
    pub version: u8,
    /// The declared length of the body following the header.
    pub body_length: u64,
}

impl FrameHeader {
    /// Decodes the header from the first [`HEADER_LENGTH`] bytes of `bytes`.
    ///
    /// Magic and version are not validated, see [`is_valid`](Self::is_valid).
    pub fn parse(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < HEADER_LENGTH {
            return Err(FrameError::Incomplete {
                received: bytes.len(),
            });
        }

        let mut magic = [0; 4];
        magic.copy_from_slice(&bytes[..4]);

        let mut length = [0; 8];
        length.copy_from_slice(&bytes[5..HEADER_LENGTH]);

        Ok(Self {
            magic,
            version: bytes[4],
            body_length: u64::from_le_bytes(length),
        })
    }

    /// Returns `true` if magic and version match what this client speaks.
    pub fn is_valid(&self) -> bool {
        &self.magic == MAGIC && self.version == PROTOCOL_VERSION
    }
}

/// Encodes a packet into a complete frame.
pub fn encode(packet: &Packet) -> Result<Vec<u8>, FrameError> {
    let body = packet.to_json()?;

    let mut frame = Vec::with_capacity(HEADER_LENGTH + body.len());
    frame.extend_from_slice(MAGIC);
    frame.push(PROTOCOL_VERSION);
    frame.extend_from_slice(&(body.len() as u64).to_le_bytes());
    frame.extend_from_slice(&body);

    Ok(frame)
}

/// Returns the body length declared in the header at the start of `bytes`.
pub fn decode_header_length(bytes: &[u8]) -> Result<u64, FrameError> {
    FrameHeader::parse(bytes).map(|header| header.body_length)
}
