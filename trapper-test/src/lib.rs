//! Helpers for testing the trapper sender.
//!
//! When writing tests, keep the following points in mind:
//!
//!  - In every test, call [`setup`]. This will set up the logger so that all console output is
//!    captured by the test runner. All logs emitted with [`trapper_log`] will show up for test
//!    failures or when run with `--nocapture`.
//!
//!  - Use [`MockTrapper`] instead of a real server. It listens on a random local port, records
//!    every frame it receives and answers with a scripted [`Reply`].
//!
//! # Example
//!
//! ```no_run
//! #[test]
//! fn my_test() {
//!     trapper_test::setup();
//!
//!     let server = trapper_test::MockTrapper::start();
//!     trapper_log::debug!("listening on port {}", server.port());
//! }
//! ```

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::{Ipv4Addr, Shutdown, SocketAddr, SocketAddrV4, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use trapper_protocol::frame::{self, HEADER_LENGTH};
use trapper_protocol::FrameHeader;

/// Setup the test environment.
///
///  - Initializes logs: The logger only captures logs from this crate and mutes all other logs.
pub fn setup() {
    trapper_log::init_test!();
}

/// Returns a local port that was free at the time of the call.
pub fn random_port() -> u16 {
    let loopback = Ipv4Addr::new(127, 0, 0, 1);
    let socket = SocketAddrV4::new(loopback, 0);
    let listener = TcpListener::bind(socket).expect("Failed to bind to address");
    listener
        .local_addr()
        .expect("Failed to get local address")
        .port()
}

/// Builds a server frame around an arbitrary JSON body.
pub fn server_frame(body: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_LENGTH + body.len());
    bytes.extend_from_slice(frame::MAGIC);
    bytes.push(frame::PROTOCOL_VERSION);
    bytes.extend_from_slice(&(body.len() as u64).to_le_bytes());
    bytes.extend_from_slice(body.as_bytes());
    bytes
}

/// How the mock server answers a connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    /// Accepts every item of the received packet.
    Success,
    /// Answers with the given `response` value and counters taken from the received packet.
    Status(String),
    /// Writes the bytes verbatim.
    Raw(Vec<u8>),
    /// Closes the connection without writing anything.
    Close,
    /// Keeps the connection open without answering for the given duration.
    Stall(Duration),
}

impl Reply {
    fn render(&self, items: usize) -> Option<Vec<u8>> {
        let status = match self {
            Self::Success => "success",
            Self::Status(status) => status.as_str(),
            Self::Raw(bytes) => return Some(bytes.clone()),
            Self::Close | Self::Stall(_) => return None,
        };

        let (processed, failed) = match self {
            Self::Success => (items, 0),
            _ => (0, items),
        };

        let body = serde_json::json!({
            "response": status,
            "info": format!(
                "processed: {processed}; failed: {failed}; total: {items}; seconds spent: 0.000042"
            ),
        });

        Some(server_frame(&body.to_string()))
    }
}

/// A frame received by the [`MockTrapper`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedFrame {
    /// The decoded header.
    pub header: FrameHeader,
    /// The body bytes following the header.
    pub body: Vec<u8>,
}

impl CapturedFrame {
    /// Parses the body as JSON.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("frame body is not JSON")
    }

    /// Returns the number of entries in the `data` array of the body.
    pub fn items(&self) -> usize {
        self.json()
            .get("data")
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }
}

#[derive(Debug, Default)]
struct MockState {
    replies: VecDeque<Reply>,
    fallback: Option<Reply>,
    captured: Vec<CapturedFrame>,
    connections: usize,
}

impl MockState {
    fn next_reply(&mut self) -> Reply {
        self.replies
            .pop_front()
            .or_else(|| self.fallback.clone())
            .unwrap_or(Reply::Success)
    }
}

/// A trapper server running on a background thread.
///
/// Each accepted connection is served sequentially: one frame is read, recorded and answered with
/// the next scripted [`Reply`]. Once the script is exhausted, the fallback reply is used, which
/// defaults to [`Reply::Success`].
///
/// The server shuts down when dropped.
#[derive(Debug)]
pub struct MockTrapper {
    address: SocketAddr,
    state: Arc<Mutex<MockState>>,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl MockTrapper {
    /// Starts a server answering every connection with [`Reply::Success`].
    pub fn start() -> Self {
        Self::with_replies(std::iter::empty())
    }

    /// Starts a server answering every connection with the same reply.
    pub fn always(reply: Reply) -> Self {
        let server = Self::start();
        server.state.lock().fallback = Some(reply);
        server
    }

    /// Starts a server answering connections with `replies` in order.
    pub fn with_replies(replies: impl IntoIterator<Item = Reply>) -> Self {
        let listener =
            TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).expect("Failed to bind to address");
        let address = listener.local_addr().expect("Failed to get local address");

        let state = Arc::new(Mutex::new(MockState {
            replies: replies.into_iter().collect(),
            ..Default::default()
        }));
        let shutdown = Arc::new(AtomicBool::new(false));

        let handle = thread::Builder::new()
            .name("mock-trapper".to_owned())
            .spawn({
                let state = state.clone();
                let shutdown = shutdown.clone();
                move || serve(listener, state, shutdown)
            })
            .expect("Failed to spawn mock server");

        Self {
            address,
            state,
            shutdown,
            handle: Some(handle),
        }
    }

    /// The address the server listens on.
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// The host part of the listening address.
    pub fn host(&self) -> String {
        self.address.ip().to_string()
    }

    /// The port the server listens on.
    pub fn port(&self) -> u16 {
        self.address.port()
    }

    /// Appends a reply to the script.
    pub fn push_reply(&self, reply: Reply) {
        self.state.lock().replies.push_back(reply);
    }

    /// Returns all frames received so far.
    pub fn captured(&self) -> Vec<CapturedFrame> {
        self.state.lock().captured.clone()
    }

    /// Returns the number of accepted connections.
    pub fn connections(&self) -> usize {
        self.state.lock().connections
    }
}

impl Drop for MockTrapper {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        // Wake up the blocking accept.
        TcpStream::connect(self.address).ok();

        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}

fn serve(listener: TcpListener, state: Arc<Mutex<MockState>>, shutdown: Arc<AtomicBool>) {
    for stream in listener.incoming() {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        let Ok(stream) = stream else {
            continue;
        };

        if let Err(error) = handle_connection(stream, &state) {
            trapper_log::debug!("mock trapper connection failed: {error}");
        }
    }
}

fn handle_connection(mut stream: TcpStream, state: &Mutex<MockState>) -> io::Result<()> {
    let reply = {
        let mut state = state.lock();
        state.connections += 1;
        state.next_reply()
    };

    let captured = read_frame(&mut stream);
    let items = captured.as_ref().map_or(0, CapturedFrame::items);
    if let Some(frame) = captured {
        state.lock().captured.push(frame);
    }

    if let Reply::Stall(duration) = reply {
        thread::sleep(duration);
    }

    if let Some(bytes) = reply.render(items) {
        stream.write_all(&bytes)?;
        stream.flush()?;
    }

    stream.shutdown(Shutdown::Both).ok();
    Ok(())
}

fn read_frame(stream: &mut TcpStream) -> Option<CapturedFrame> {
    let mut header = [0; HEADER_LENGTH];
    stream.read_exact(&mut header).ok()?;
    let header = FrameHeader::parse(&header).ok()?;

    let mut body = vec![0; usize::try_from(header.body_length).ok()?];
    stream.read_exact(&mut body).ok()?;

    Some(CapturedFrame { header, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(server: &MockTrapper, body: &str) -> Vec<u8> {
        let mut stream = TcpStream::connect(server.address()).unwrap();
        stream.write_all(&server_frame(body)).unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).unwrap();
        response
    }

    #[test]
    fn test_records_frames_and_replies() {
        setup();
        let server = MockTrapper::start();

        let response = exchange(&server, r#"{"request":"sender data","data":[{},{}]}"#);
        let body: Value = serde_json::from_slice(&response[HEADER_LENGTH..]).unwrap();

        assert_eq!(body["response"], "success");
        assert_eq!(
            body["info"],
            "processed: 2; failed: 0; total: 2; seconds spent: 0.000042"
        );

        let captured = server.captured();
        assert_eq!(captured.len(), 1);
        assert!(captured[0].header.is_valid());
        assert_eq!(captured[0].items(), 2);
    }

    #[test]
    fn test_scripted_replies() {
        setup();
        let server = MockTrapper::with_replies([Reply::Close, Reply::Raw(b"nope".to_vec())]);

        assert!(exchange(&server, "{}").is_empty());
        assert_eq!(exchange(&server, "{}"), b"nope");
        assert_eq!(server.connections(), 2);
    }
}
