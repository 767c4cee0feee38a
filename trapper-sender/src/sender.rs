use parking_lot::RwLock;
use thiserror::Error;
use trapper_protocol::{FrameError, Packet, Response, ResponseError, frame};

use crate::{Connection, NetworkError, SenderConfig, SenderOptions, Transport};

/// Maximum number of bytes read from the server in response to a packet.
pub const RESPONSE_BUFFER_SIZE: usize = 2048;

/// Error returned from [`Sender::send`].
#[derive(Debug, Error)]
pub enum SendError {
    /// The connection failed.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The server answered with an invalid or unsuccessful response.
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// The packet could not be framed.
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// The result of a [`Sender::send`] that did not fail.
#[derive(Clone, Debug, PartialEq)]
pub enum SendOutcome {
    /// The sender is disabled and did not contact the server.
    Skipped,
    /// The server acknowledged the packet.
    Delivered(Response),
}

impl SendOutcome {
    /// Returns the server's response, if the packet was delivered.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Skipped => None,
            Self::Delivered(response) => Some(response),
        }
    }
}

/// Delivers [`Packet`]s to a trapper server.
///
/// Every call to [`send`](Self::send) opens a new connection, so a sender can be shared between
/// threads. Configuration changes apply to sends started afterwards.
///
/// ```no_run
/// use trapper_protocol::{Metric, Packet};
/// use trapper_sender::Sender;
///
/// let sender = Sender::new("zabbix.example.com");
///
/// let mut packet = Packet::new();
/// packet.add_metric(Metric::new("app.requests", "42").unwrap());
///
/// let outcome = sender.send(&packet).unwrap();
/// ```
#[derive(Debug)]
pub struct Sender {
    config: RwLock<SenderConfig>,
}

impl Sender {
    /// Creates a sender for `server_address` on the default port.
    pub fn new(server_address: impl Into<String>) -> Self {
        Self::from_config(SenderConfig::new(server_address))
    }

    /// Creates a sender for `server_address` on a custom port.
    pub fn with_port(server_address: impl Into<String>, server_port: u16) -> Self {
        Self::from_config(SenderConfig::with_port(server_address, server_port))
    }

    /// Creates a sender from a full configuration.
    pub fn from_config(config: SenderConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    /// Returns a copy of the current configuration.
    pub fn config(&self) -> SenderConfig {
        self.config.read().clone()
    }

    /// Applies a partial configuration update.
    pub fn configure(&self, options: SenderOptions) -> &Self {
        self.config.write().apply(options);
        self
    }

    /// Resumes deliveries.
    pub fn enable(&self) -> &Self {
        self.config.write().disable = false;
        self
    }

    /// Skips all deliveries until [`enable`](Self::enable) is called.
    pub fn disable(&self) -> &Self {
        self.config.write().disable = true;
        self
    }

    /// Returns `true` if deliveries are skipped.
    pub fn is_disabled(&self) -> bool {
        self.config.read().disable
    }

    /// Delivers a packet and waits for the server's acknowledgement.
    ///
    /// A response with a status other than success is returned as [`SendError::Response`].
    pub fn send(&self, packet: &Packet) -> Result<SendOutcome, SendError> {
        let config = self.config();

        if config.disable {
            trapper_log::debug!("sender disabled, skipping packet");
            return Ok(SendOutcome::Skipped);
        }

        let frame = frame::encode(packet)?;

        trapper_log::debug!(
            "sending {} metrics to {}:{}",
            packet.len(),
            config.server_address,
            config.server_port,
        );

        let transport = Transport::connect(
            &config.server_address,
            config.server_port,
            config.timeouts(),
        )?;

        let response = exchange(transport, &frame)?;
        Ok(SendOutcome::Delivered(response))
    }
}

/// Runs one request and response over the transport and closes it.
pub(crate) fn exchange<S: Connection>(
    mut transport: Transport<S>,
    frame: &[u8],
) -> Result<Response, SendError> {
    transport.send_all(frame)?;
    let raw = transport.receive(RESPONSE_BUFFER_SIZE)?;
    transport.close();

    match frame::decode_header_length(&raw) {
        Ok(length) => trapper_log::trace!("server announced {length} bytes of response"),
        Err(error) => trapper_log::trace!("failed to decode response header: {error}"),
    }

    let response = Response::parse(&raw)?;

    if !response.is_success() {
        trapper_log::warn!(
            response = response.response(),
            info = response.info(),
            "server rejected packet",
        );
    } else if response.failed() > 0 {
        trapper_log::warn!(
            failed = response.failed(),
            total = response.total(),
            "server failed to process some metrics",
        );
    }

    response.into_result().map_err(SendError::from)
}
