use similar_asserts::assert_eq;
use trapper_protocol::frame::{self, HEADER_LENGTH};
use trapper_protocol::{FrameHeader, Metric, Packet, Response, ResponseStatus, UnixTimestamp};

fn packet() -> Packet {
    let mut packet = Packet::new();
    for (key, value) in [("system.cpu.load", "0.75"), ("system.uptime", "86400")] {
        packet.add_metric(
            Metric::new(key, value)
                .unwrap()
                .with_hostname("web-1")
                .with_timestamp(UnixTimestamp::from_secs(1_700_000_000)),
        );
    }
    packet
}

#[test]
fn test_frame_layout() {
    let bytes = frame::encode(&packet()).unwrap();
    let header = FrameHeader::parse(&bytes).unwrap();

    assert!(header.is_valid());
    assert_eq!(header.body_length as usize, bytes.len() - HEADER_LENGTH);

    let body = std::str::from_utf8(&bytes[HEADER_LENGTH..]).unwrap();
    insta::assert_snapshot!(body, @r#"{"request":"sender data","data":[{"host":"web-1","key":"system.cpu.load","value":"0.75","clock":1700000000},{"host":"web-1","key":"system.uptime","value":"86400","clock":1700000000}]}"#);
}

#[test]
fn test_server_frame_parses() {
    // A server answers with a frame of the same shape as the request.
    let body = br#"{"response":"success","info":"processed: 2; failed: 0; total: 2; seconds spent: 0.000059"}"#;

    let mut raw = frame::MAGIC.to_vec();
    raw.push(frame::PROTOCOL_VERSION);
    raw.extend_from_slice(&(body.len() as u64).to_le_bytes());
    raw.extend_from_slice(body);

    assert_eq!(
        frame::decode_header_length(&raw).unwrap(),
        body.len() as u64
    );

    let response = Response::parse(&raw).unwrap();
    assert_eq!(response.status(), ResponseStatus::Success);
    assert_eq!(
        (response.processed(), response.failed(), response.total()),
        (2, 0, 2)
    );
    assert_eq!(response.info(), "processed: 2; failed: 0; total: 2; seconds spent: 0.000059");
}
