//! Command line sender for the trapper protocol.
//!
//! Sends a single metric or a batch file of metrics to a monitoring server and prints the
//! server's summary:
//!
//! ```text
//! $ trapper -z zabbix.example.com send --key app.ping --value 1
//! processed: 1; failed: 0; total: 1; seconds spent: 0.000042
//! ```
//!
//! # Workspace Crates
//!
//!  - `trapper`: Main entry point and command line interface.
//!  - [`trapper-config`]: Configuration file and overrides.
//!  - [`trapper-log`]: Logging facade.
//!  - [`trapper-protocol`]: Metrics, packets and the wire format.
//!  - [`trapper-sender`]: Blocking client and the named sender registry.
//!  - [`trapper-test`]: Helpers and a scripted mock server for tests.
//!
//! [`trapper-config`]: ../trapper_config/index.html
//! [`trapper-log`]: ../trapper_log/index.html
//! [`trapper-protocol`]: ../trapper_protocol/index.html
//! [`trapper-sender`]: ../trapper_sender/index.html
//! [`trapper-test`]: ../trapper_test/index.html

mod batch;
mod cli;
mod setup;

use std::process;

pub fn main() {
    let exit_code = match cli::execute() {
        Ok(()) => 0,
        Err(err) => {
            trapper_log::ensure_error(&*err);
            1
        }
    };

    process::exit(exit_code);
}
