//! Logging facade for the trapper sender.
//!
//! # Setup
//!
//! To enable logging, invoke the [`init`] function with a [`LogConfig`]. The configuration
//! implements `serde` traits, so it can be obtained from configuration files. This requires the
//! `init` feature.
//!
//! ```
//! # #[cfg(feature = "init")] {
//! use trapper_log::{Level, LogConfig};
//!
//! let log_config = LogConfig {
//!     level: Level::Debug,
//!     ..LogConfig::default()
//! };
//!
//! trapper_log::init(&log_config);
//! # }
//! ```
//!
//! # Logging
//!
//! Use the five logging macros [`error!`], [`warn!`], [`info!`], [`debug!`] and [`trace!`], where
//! `error!` represents the highest-priority log messages and `trace!` the lowest. The macros accept
//! format strings similarly to [`println!`] as well as structured fields.
//!
//! ## Conventions
//!
//! Log messages should start lowercase and end without punctuation. Prefer short and precise log
//! messages over verbose text. Choose the log level according to these rules:
//!
//! - [`error!`] for bugs and invalid behavior.
//! - [`warn!`] for undesirable behavior, such as a server rejecting items.
//! - [`info!`] for messages relevant to the average user.
//! - [`debug!`] for messages usually relevant to debugging, such as one line per delivery.
//! - [`trace!`] for full auxiliary information, such as individual socket operations.
//!
//! ## Logging Error Types
//!
//! To log errors with all their causes, use the [`LogError`] wrapper or pass the error as a
//! structured field:
//!
//! ```
//! use std::io::{Error, ErrorKind};
//! use trapper_log::LogError;
//!
//! let custom_error = Error::new(ErrorKind::Other, "oh no!");
//! trapper_log::error!("operation failed: {}", LogError(&custom_error));
//! trapper_log::error!(
//!     error = &custom_error as &dyn std::error::Error,
//!     "operation failed"
//! );
//! ```
//!
//! # Testing
//!
//! For unit testing, there is a separate initialization macro [`init_test!`] that should be called
//! at the beginning of test method. It enables test mode of the logger and customizes log levels
//! for the current crate. This requires the `test` feature.
//!
//! ```ignore
//! #[test]
//! fn test_something() {
//!     trapper_log::init_test!();
//! }
//! ```

#![warn(missing_docs)]

mod setup;
pub use setup::*;

#[cfg(feature = "test")]
pub use test::*;

mod utils;
pub use utils::*;

// Expose the minimal log facade.
#[doc(inline)]
pub use tracing::{debug, error, info, trace, warn};
