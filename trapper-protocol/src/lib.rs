//! Data model and wire format of the trapper protocol.
//!
//! The trapper protocol is used to push unsolicited observations to a monitoring server. A client
//! bundles one or more [`Metric`]s into a [`Packet`], encodes it into a [frame](frame) and writes it
//! to a TCP connection. The server acknowledges with a frame of the same shape, whose JSON body is
//! interpreted by [`Response::parse`].
//!
//! # Wire Format
//!
//! ```text
//! ┌───────────────┬─────────────┬──────────────────────────┬─────────────────────┐
//! │ Magic (4)     │ Version (1) │ Body length (8)          │ Body (variable)     │
//! │ "ZBXD"        │ 0x01        │ u64, little-endian       │ UTF-8 JSON          │
//! └───────────────┴─────────────┴──────────────────────────┴─────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use trapper_protocol::{frame, Metric, Packet, UnixTimestamp};
//!
//! let metric = Metric::new("system.cpu.load", "0.75")
//!     .unwrap()
//!     .with_hostname("web-1")
//!     .with_timestamp(UnixTimestamp::from_secs(1_700_000_000));
//!
//! let mut packet = Packet::new();
//! packet.add_metric(metric);
//!
//! let bytes = frame::encode(&packet).unwrap();
//! assert_eq!(&bytes[..4], b"ZBXD");
//! assert_eq!(frame::decode_header_length(&bytes).unwrap() as usize, bytes.len() - 13);
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod frame;
mod metric;
mod packet;
mod response;
mod time;

pub use self::frame::{FrameError, FrameHeader};
pub use self::metric::*;
pub use self::packet::*;
pub use self::response::*;
pub use self::time::*;
