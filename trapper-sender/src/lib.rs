//! Blocking client for the trapper protocol.
//!
//! A [`Sender`] delivers a [`Packet`](trapper_protocol::Packet) to a server over a fresh TCP
//! connection and returns the server's acknowledgement. Each delivery performs exactly one
//! connect, one write loop and one read; there is no retry, buffering or connection reuse.
//!
//! Senders can be shared across threads directly or through a [`SenderRegistry`], which hands out
//! named instances:
//!
//! ```no_run
//! use trapper_protocol::{Metric, Packet};
//! use trapper_sender::{SendOutcome, SenderConfig, SenderRegistry};
//!
//! let registry = SenderRegistry::new(SenderConfig::new("zabbix.example.com"));
//!
//! let packet: Packet = [Metric::new("app.requests", "42").unwrap()].into_iter().collect();
//!
//! match registry.default_instance().send(&packet) {
//!     Ok(SendOutcome::Delivered(response)) => println!("processed {}", response.processed()),
//!     Ok(SendOutcome::Skipped) => println!("sender disabled"),
//!     Err(error) => eprintln!("{error}"),
//! }
//! ```
//!
//! No socket timeouts are set by default. Use [`SenderConfig`] to limit how long a delivery may
//! block.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod config;
mod registry;
mod sender;
mod transport;

pub use self::config::*;
pub use self::registry::*;
pub use self::sender::*;
pub use self::transport::*;
