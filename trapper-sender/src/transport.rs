use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use thiserror::Error;

/// Failures of the connection to the server.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The server address did not resolve.
    #[error("failed to resolve {address}")]
    Resolve {
        /// The `host:port` that was looked up.
        address: String,
        /// The lookup failure, if the lookup itself failed.
        #[source]
        source: Option<io::Error>,
    },

    /// None of the resolved addresses accepted the connection.
    #[error("failed to connect to {address}")]
    Connect {
        /// The `host:port` that was connected to.
        address: String,
        /// The error of the last connection attempt.
        #[source]
        source: io::Error,
    },

    /// Applying a socket timeout failed.
    #[error("failed to configure socket timeouts")]
    Configure(#[source] io::Error),

    /// The connection did not accept a single byte.
    #[error("no data was written to the connection")]
    NothingWritten,

    /// The connection stopped accepting data before the frame was complete.
    #[error("failed to write the full frame: wrote {written} of {expected} bytes")]
    ShortWrite {
        /// Number of bytes written.
        written: usize,
        /// Number of bytes in the frame.
        expected: usize,
    },

    /// Writing to the connection failed.
    #[error("failed to send data")]
    Send(#[source] io::Error),

    /// Reading from the connection failed.
    #[error("failed to receive data")]
    Receive(#[source] io::Error),

    /// The server closed the connection without answering.
    #[error("received empty response from server")]
    EmptyResponse,
}

/// Socket timeouts applied when connecting.
///
/// `None` blocks indefinitely.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timeouts {
    /// Limit for establishing the connection.
    pub connect: Option<Duration>,
    /// Limit for a single read.
    pub read: Option<Duration>,
    /// Limit for a single write.
    pub write: Option<Duration>,
}

/// A bidirectional byte stream a [`Transport`] can run over.
pub trait Connection: Read + Write {
    /// Shuts down both halves of the connection.
    fn shutdown(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Connection for TcpStream {
    fn shutdown(&mut self) -> io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }
}

/// A connection used for exactly one request and response.
///
/// The connection is released when the transport is dropped, regardless of how the exchange ended.
#[derive(Debug)]
pub struct Transport<S: Connection> {
    stream: S,
}

impl Transport<TcpStream> {
    /// Opens a TCP connection to `host:port`.
    ///
    /// All addresses the host resolves to are tried in order.
    pub fn connect(host: &str, port: u16, timeouts: Timeouts) -> Result<Self, NetworkError> {
        let address = format!("{host}:{port}");

        let resolved: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|e| NetworkError::Resolve {
                address: address.clone(),
                source: Some(e),
            })?
            .collect();

        let mut last_error = None;
        for addr in resolved {
            trapper_log::trace!("connecting to {addr}");

            let result = match timeouts.connect {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };

            match result {
                Ok(stream) => {
                    stream
                        .set_read_timeout(timeouts.read)
                        .map_err(NetworkError::Configure)?;
                    stream
                        .set_write_timeout(timeouts.write)
                        .map_err(NetworkError::Configure)?;
                    return Ok(Self::from_stream(stream));
                }
                Err(error) => last_error = Some(error),
            }
        }

        Err(match last_error {
            Some(source) => NetworkError::Connect { address, source },
            None => NetworkError::Resolve {
                address,
                source: None,
            },
        })
    }
}

impl<S: Connection> Transport<S> {
    /// Wraps an already connected stream.
    pub fn from_stream(stream: S) -> Self {
        Self { stream }
    }

    /// Writes the entire buffer, looping over partial writes.
    pub fn send_all(&mut self, bytes: &[u8]) -> Result<(), NetworkError> {
        let mut written = 0;

        while written < bytes.len() {
            match self.stream.write(&bytes[written..]) {
                Ok(0) if written == 0 => return Err(NetworkError::NothingWritten),
                Ok(0) => {
                    return Err(NetworkError::ShortWrite {
                        written,
                        expected: bytes.len(),
                    });
                }
                Ok(n) => {
                    written += n;
                    trapper_log::trace!("wrote {n} bytes, {written} of {}", bytes.len());
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(NetworkError::Send(e)),
            }
        }

        self.stream.flush().map_err(NetworkError::Send)
    }

    /// Performs a single read of up to `max_bytes`.
    ///
    /// Larger responses are truncated.
    pub fn receive(&mut self, max_bytes: usize) -> Result<Vec<u8>, NetworkError> {
        let mut buffer = vec![0; max_bytes];

        let read = loop {
            match self.stream.read(&mut buffer) {
                Ok(0) => return Err(NetworkError::EmptyResponse),
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(NetworkError::Receive(e)),
            }
        };

        trapper_log::trace!("received {read} bytes");
        buffer.truncate(read);
        Ok(buffer)
    }

    /// Shuts the connection down and releases it.
    pub fn close(mut self) {
        if let Err(error) = self.stream.shutdown() {
            trapper_log::trace!("failed to shut down connection: {error}");
        }
    }
}

impl<S: Connection> Drop for Transport<S> {
    fn drop(&mut self) {
        trapper_log::trace!("closing connection");
    }
}
