use std::io::Write;
use std::process::{Command, Output};

use similar_asserts::assert_eq;
use trapper_test::{MockTrapper, Reply};

fn trapper(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_trapper"))
        .args(args)
        .env_remove("TRAPPER_CONFIG")
        .env_remove("TRAPPER_SERVER")
        .env_remove("TRAPPER_PORT")
        .env_remove("TRAPPER_DISABLE")
        .env_remove("TRAPPER_LOG_LEVEL")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run trapper")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_send_single_metric() {
    trapper_test::setup();
    let server = MockTrapper::start();
    let port = server.port().to_string();

    let output = trapper(&[
        "-z", "127.0.0.1", "-p", &port, "send", "--key", "app.ping", "--value", "1", "--host",
        "web-1", "--clock", "1700000000",
    ]);

    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "processed: 1; failed: 0; total: 1; seconds spent: 0.000042\n"
    );

    let captured = server.captured();
    assert_eq!(
        captured[0].json(),
        serde_json::json!({
            "request": "sender data",
            "data": [{"host": "web-1", "key": "app.ping", "value": "1", "clock": 1_700_000_000}]
        })
    );
}

#[test]
fn test_send_batch_file() {
    trapper_test::setup();
    let server = MockTrapper::start();
    let port = server.port().to_string();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "# edge routers").unwrap();
    writeln!(file, "router-1 net.if.in 1024 1700000000").unwrap();
    writeln!(file, "- agent.ping 1").unwrap();

    let path = file.path().to_string_lossy().into_owned();
    let output = trapper(&["-z", "127.0.0.1", "-p", &port, "batch", &path]);

    assert!(output.status.success());
    assert_eq!(server.captured()[0].items(), 2);
}

#[test]
fn test_unsuccessful_response_exits_with_error() {
    trapper_test::setup();
    let server = MockTrapper::always(Reply::Status("failed".to_owned()));
    let port = server.port().to_string();

    let output = trapper(&[
        "-z", "127.0.0.1", "-p", &port, "send", "--key", "app.ping", "--value", "1",
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to send 1 metrics"));
    assert!(stderr.contains("server returned non-successful response 'failed'"));
}

#[test]
fn test_invalid_port_override() {
    let output = trapper(&["-z", "127.0.0.1", "-p", "http", "config", "show"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid config value (field port)"));
}

#[test]
fn test_config_show() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "sender:\n  server_address: zabbix.example.com").unwrap();

    let path = file.path().to_string_lossy().into_owned();
    let output = trapper(&["--config", &path, "-p", "10052", "config", "show"]);

    assert!(output.status.success());
    insta::assert_snapshot!(stdout(&output), @r"
    sender:
      server_address: zabbix.example.com
      server_port: 10052
    logging:
      level: info
      format: auto
    ");
}
