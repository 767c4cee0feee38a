use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Timeouts;

/// The default port of the trapper listener.
pub const DEFAULT_PORT: u16 = 10051;

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn is_default_port(port: &u16) -> bool {
    *port == DEFAULT_PORT
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Converts a timeout in seconds, treating zero as unset.
fn seconds(value: Option<u64>) -> Option<Duration> {
    value.filter(|&secs| secs > 0).map(Duration::from_secs)
}

/// Connection settings of a [`Sender`](crate::Sender).
///
/// The default configuration has an empty server address and the [`DEFAULT_PORT`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SenderConfig {
    /// Host name or IP address of the server.
    #[serde(default)]
    pub server_address: String,

    /// TCP port of the server.
    #[serde(default = "default_port", skip_serializing_if = "is_default_port")]
    pub server_port: u16,

    /// Skips all deliveries without error when set.
    #[serde(default, skip_serializing_if = "is_false")]
    pub disable: bool,

    /// Connect timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<u64>,

    /// Read timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_timeout: Option<u64>,

    /// Write timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_timeout: Option<u64>,
}

impl SenderConfig {
    /// Creates a configuration for `server_address` on the default port.
    pub fn new(server_address: impl Into<String>) -> Self {
        Self::with_port(server_address, DEFAULT_PORT)
    }

    /// Creates a configuration for `server_address` on a custom port.
    pub fn with_port(server_address: impl Into<String>, server_port: u16) -> Self {
        Self {
            server_address: server_address.into(),
            server_port,
            disable: false,
            connect_timeout: None,
            read_timeout: None,
            write_timeout: None,
        }
    }

    /// Applies all options that are set.
    pub fn apply(&mut self, options: SenderOptions) {
        if let Some(server_address) = options.server_address {
            self.server_address = server_address;
        }
        if let Some(server_port) = options.server_port {
            self.server_port = server_port;
        }
        if let Some(disable) = options.disable {
            self.disable = disable;
        }
        if let Some(timeout) = options.connect_timeout {
            self.connect_timeout = Some(timeout);
        }
        if let Some(timeout) = options.read_timeout {
            self.read_timeout = Some(timeout);
        }
        if let Some(timeout) = options.write_timeout {
            self.write_timeout = Some(timeout);
        }
    }

    /// Returns the socket timeouts.
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            connect: seconds(self.connect_timeout),
            read: seconds(self.read_timeout),
            write: seconds(self.write_timeout),
        }
    }
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self::new(String::new())
    }
}

/// A partial update of a [`SenderConfig`].
///
/// ```
/// use trapper_sender::{SenderConfig, SenderOptions};
///
/// let mut config = SenderConfig::new("localhost");
/// config.apply(SenderOptions::new().server_port(10052).disable(true));
///
/// assert_eq!(config.server_port, 10052);
/// assert!(config.disable);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SenderOptions {
    server_address: Option<String>,
    server_port: Option<u16>,
    disable: Option<bool>,
    connect_timeout: Option<u64>,
    read_timeout: Option<u64>,
    write_timeout: Option<u64>,
}

impl SenderOptions {
    /// Creates options that change nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server address.
    pub fn server_address(mut self, server_address: impl Into<String>) -> Self {
        self.server_address = Some(server_address.into());
        self
    }

    /// Sets the server port.
    pub fn server_port(mut self, server_port: u16) -> Self {
        self.server_port = Some(server_port);
        self
    }

    /// Sets the disable flag.
    pub fn disable(mut self, disable: bool) -> Self {
        self.disable = Some(disable);
        self
    }

    /// Sets the connect timeout in seconds.
    pub fn connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout = Some(secs);
        self
    }

    /// Sets the read timeout in seconds.
    pub fn read_timeout(mut self, secs: u64) -> Self {
        self.read_timeout = Some(secs);
        self
    }

    /// Sets the write timeout in seconds.
    pub fn write_timeout(mut self, secs: u64) -> Self {
        self.write_timeout = Some(secs);
        self
    }
}
