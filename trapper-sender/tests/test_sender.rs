use std::sync::Arc;
use std::thread;
use std::time::Duration;

use similar_asserts::assert_eq;
use trapper_protocol::{Metric, Packet, ResponseError, UnixTimestamp};
use trapper_sender::{
    NetworkError, SendError, SendOutcome, Sender, SenderConfig, SenderOptions, SenderRegistry,
};
use trapper_test::{MockTrapper, Reply};

fn packet() -> Packet {
    ["net.if.in", "net.if.out"]
        .into_iter()
        .map(|key| {
            Metric::new(key, "1024")
                .unwrap()
                .with_hostname("router")
                .with_timestamp(UnixTimestamp::from_secs(1_700_000_000))
        })
        .collect()
}

fn sender(server: &MockTrapper) -> Sender {
    Sender::with_port(server.host(), server.port())
}

#[test]
fn test_send_success() {
    trapper_test::setup();
    let server = MockTrapper::start();

    let outcome = sender(&server).send(&packet()).unwrap();
    let response = outcome.response().unwrap();

    assert!(response.is_success());
    assert_eq!(response.processed(), 2);
    assert_eq!(response.failed(), 0);
    assert_eq!(response.total(), 2);

    let captured = server.captured();
    assert_eq!(captured.len(), 1);
    assert!(captured[0].header.is_valid());
    assert_eq!(captured[0].header.body_length as usize, captured[0].body.len());
    insta::assert_json_snapshot!(captured[0].json(), @r#"
    {
      "data": [
        {
          "clock": 1700000000,
          "host": "router",
          "key": "net.if.in",
          "value": "1024"
        },
        {
          "clock": 1700000000,
          "host": "router",
          "key": "net.if.out",
          "value": "1024"
        }
      ],
      "request": "sender data"
    }
    "#);
}

#[test]
fn test_send_failed_status() {
    trapper_test::setup();
    let server = MockTrapper::always(Reply::Status("failed".to_owned()));

    let error = sender(&server).send(&packet()).unwrap_err();
    assert_eq!(
        error.to_string(),
        "server returned non-successful response 'failed' \
         (processed: 0; failed: 2; total: 2; seconds spent: 0.000042)"
    );

    let SendError::Response(ResponseError::Unsuccessful { response, info }) = error else {
        panic!("expected unsuccessful response, got {error:?}");
    };

    assert_eq!(response, "failed");
    assert_eq!(
        info,
        "processed: 0; failed: 2; total: 2; seconds spent: 0.000042"
    );
}

#[test]
fn test_send_malformed_response() {
    trapper_test::setup();
    let server = MockTrapper::always(Reply::Raw(trapper_test::server_frame(
        r#"{"response":"success","info":"bad data"}"#,
    )));

    let error = sender(&server).send(&packet()).unwrap_err();
    assert!(error.to_string().ends_with("didn't match info 'bad data'"));
    assert!(matches!(
        error,
        SendError::Response(ResponseError::InvalidInfo { .. })
    ));
}

#[test]
fn test_send_does_not_retry() {
    trapper_test::setup();
    let server = MockTrapper::start();
    server.push_reply(Reply::Status("failed".to_owned()));

    let sender = sender(&server);
    assert!(matches!(
        sender.send(&packet()),
        Err(SendError::Response(ResponseError::Unsuccessful { .. }))
    ));
    assert_eq!(server.connections(), 1);

    // The script is exhausted, so the next send is accepted.
    let outcome = sender.send(&packet()).unwrap();
    assert_eq!(outcome.response().map(|r| r.processed()), Some(2));
    assert_eq!(server.connections(), 2);
    assert_eq!(server.captured().len(), 2);
}

#[test]
fn test_send_closed_without_reply() {
    trapper_test::setup();
    let server = MockTrapper::always(Reply::Close);

    assert!(matches!(
        sender(&server).send(&packet()),
        Err(SendError::Network(
            NetworkError::EmptyResponse | NetworkError::Receive(_)
        ))
    ));
}

#[test]
fn test_send_connection_refused() {
    trapper_test::setup();
    let sender = Sender::with_port("127.0.0.1", trapper_test::random_port());

    assert!(matches!(
        sender.send(&packet()),
        Err(SendError::Network(NetworkError::Connect { .. }))
    ));
}

#[test]
fn test_send_read_timeout() {
    trapper_test::setup();
    let server = MockTrapper::always(Reply::Stall(Duration::from_secs(3)));

    let sender = sender(&server);
    sender.configure(SenderOptions::new().read_timeout(1));

    assert!(matches!(
        sender.send(&packet()),
        Err(SendError::Network(NetworkError::Receive(_)))
    ));
}

#[test]
fn test_disabled_sender_does_not_connect() {
    trapper_test::setup();
    let server = MockTrapper::start();

    let sender = sender(&server);
    sender.disable();
    assert_eq!(sender.send(&packet()).unwrap(), SendOutcome::Skipped);

    sender.enable();
    assert!(matches!(
        sender.send(&packet()).unwrap(),
        SendOutcome::Delivered(_)
    ));

    assert_eq!(server.connections(), 1);
}

#[test]
fn test_registry_concurrent_instance() {
    trapper_test::setup();
    let server = MockTrapper::start();
    let registry = Arc::new(SenderRegistry::new(SenderConfig::with_port(
        server.host(),
        server.port(),
    )));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = registry.clone();
            thread::spawn(move || registry.instance("shared"))
        })
        .collect();

    let senders: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(senders.iter().all(|s| Arc::ptr_eq(s, &senders[0])));
    assert_eq!(registry.names(), ["shared"]);

    let outcome = senders[0].send(&packet()).unwrap();
    assert_eq!(outcome.response().map(|r| r.processed()), Some(2));
}
