//! Startup registration against a stub orchestrator.
//!
//! The stub is a one-shot HTTP server on a loopback port. A refused or failed
//! registration must end the process non-zero before the agent listens.

#![allow(clippy::expect_used)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

use predicates::prelude::*;

use crate::cli_tests::agent;

/// Serve exactly one request with `status` and `body`, handing back the
/// request body the agent sent.
fn stub_orchestrator(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub");
    let url = format!("http://{}/rpc", listener.local_addr().expect("addr"));
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let request = read_request_body(&stream);
        let mut stream = stream;
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).expect("write");
        request
    });
    (url, handle)
}

fn read_request_body(stream: &TcpStream) -> String {
    let mut reader = BufReader::new(stream);
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("header line");
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().expect("content length");
            }
        }
    }
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).expect("body");
    String::from_utf8(body).expect("utf8 body")
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("bind")
        .local_addr()
        .expect("addr")
        .port()
}

fn agent_args(master: &str, port: u16) -> Vec<String> {
    [
        "--master",
        master,
        "--id",
        "5",
        "--port",
        &port.to_string(),
        "--docker-user",
        "user",
        "--docker-pass",
        "secret",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

#[test]
fn test_http_500_from_orchestrator_is_fatal() {
    let (master, stub) = stub_orchestrator("500 Internal Server Error", "oops");
    let port = free_port();

    agent()
        .args(agent_args(&master, port))
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Failed to register client due to HTTP error (status 500)",
        ))
        .stderr(predicate::str::contains("Listening on").not());

    let sent = stub.join().expect("stub thread");
    let request: serde_json::Value = serde_json::from_str(&sent).expect("json-rpc request");
    assert_eq!(request["jsonrpc"], "2.0");
    assert_eq!(request["method"], "Ranch.Register");
    let id = request["params"]["id"]
        .as_u64()
        .or_else(|| request["params"][0]["id"].as_u64());
    assert_eq!(id, Some(5));

    assert!(
        TcpStream::connect(("127.0.0.1", port)).is_err(),
        "agent must not have opened its port"
    );
}

#[test]
fn test_rpc_error_from_orchestrator_is_fatal() {
    let (master, stub) = stub_orchestrator(
        "200 OK",
        r#"{"jsonrpc":"2.0","error":{"code":-32000,"message":"client 5 already registered"},"id":1}"#,
    );

    agent()
        .args(agent_args(&master, free_port()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("client 5 already registered"));

    stub.join().expect("stub thread");
}

#[test]
fn test_unreachable_orchestrator_is_fatal() {
    // Bound then dropped: nothing listens there any more.
    let dead = format!("http://127.0.0.1:{}/rpc", free_port());

    agent()
        .args(agent_args(&dead, free_port()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("transport error"));
}
