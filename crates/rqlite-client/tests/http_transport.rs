//! The reqwest transport against a local stub server.

use std::io::{BufRead, BufReader, Read, Write};
use std::io::ErrorKind;
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use rqlite_client::prelude::*;

/// A request captured by the stub server.
struct Captured {
    request_line: String,
    content_type: Option<String>,
    body: String,
}

/// Serves exactly one request with the given status and body.
fn serve_once(status: u16, body: &'static str) -> (u16, thread::JoinHandle<Captured>) {
    serve_once_with(status, String::new(), body)
}

/// Like [`serve_once`], with extra raw header lines (each ending in CRLF).
fn serve_once_with(
    status: u16,
    extra_headers: String,
    body: &'static str,
) -> (u16, thread::JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        handle_one(stream, status, &extra_headers, body)
    });
    (port, handle)
}

fn handle_one(mut stream: TcpStream, status: u16, extra_headers: &str, body: &str) -> Captured {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut request_line = String::new();
    reader.read_line(&mut request_line).unwrap();

    let mut content_length = 0;
    let mut content_type = None;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.parse().unwrap();
            } else if name.eq_ignore_ascii_case("content-type") {
                content_type = Some(value.to_string());
            }
        }
    }

    let mut request_body = vec![0; content_length];
    reader.read_exact(&mut request_body).unwrap();

    let response = format!(
        "HTTP/1.1 {status} Status\r\n\
         Content-Type: application/json\r\n\
         X-Rqlite-Version: v8.36.0\r\n\
         {extra_headers}\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).unwrap();
    stream.flush().unwrap();

    Captured {
        request_line: request_line.trim_end().to_string(),
        content_type,
        body: String::from_utf8(request_body).unwrap(),
    }
}

/// A port nothing listens on.
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn http_client(ports: &[u16]) -> Client {
    let registry =
        NodeRegistry::new(ports.iter().map(|p| Node::http("127.0.0.1", *p)).collect()).unwrap();
    Client::connect(
        ClientConfig::new(registry)
            .timeout(Duration::from_secs(5))
            .connect_timeout(Duration::from_secs(2)),
    )
    .unwrap()
}

#[test]
fn test_execute_over_http() {
    let (port, server) = serve_once(200, r#"{"results":[{"last_insert_id":7,"rows_affected":1}]}"#);
    let client = http_client(&[port]);

    let results = client
        .execute(
            &ExecuteRequest::new()
                .statement(Statement::new("INSERT INTO agents(id) VALUES(?)").bind(7))
                .transaction(true),
        )
        .unwrap();
    assert_eq!(results.results[0].last_insert_id, 7);

    let captured = server.join().unwrap();
    assert_eq!(
        captured.request_line,
        "POST /db/execute?transaction=true HTTP/1.1"
    );
    assert_eq!(captured.content_type.as_deref(), Some("application/json"));
    assert_eq!(captured.body, r#"[["INSERT INTO agents(id) VALUES(?)",7]]"#);
}

#[test]
fn test_refused_node_then_live_node() {
    let down = closed_port();
    let (up, server) = serve_once(200, r#"{"results":[]}"#);
    let client = http_client(&[down, up]);

    client.query_one("SELECT 1", None).unwrap();
    let captured = server.join().unwrap();
    assert_eq!(captured.request_line, "POST /db/query?level=weak HTTP/1.1");
}

#[test]
fn test_error_status_over_http() {
    let (port, server) = serve_once(500, "database is locked");
    let client = http_client(&[port]);

    let err = client.execute_one("DELETE FROM foo").unwrap_err();
    server.join().unwrap();

    match err.node_errors() {
        Some([NodeError::Database { status, body, .. }]) => {
            assert_eq!(*status, 500);
            assert_eq!(body, "database is locked");
        }
        other => panic!("expected one database error, got {other:?}"),
    }
}

#[test]
fn test_all_refused_over_http() {
    let client = http_client(&[closed_port(), closed_port()]);

    let err = client.ping().unwrap_err();
    let errors = err.node_errors().expect("aggregate error");
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(NodeError::is_transport));
}

#[test]
fn test_ping_over_http() {
    let (port, server) = serve_once(200, r#"{"store":{"ready":true}}"#);
    let client = http_client(&[port]);

    let pong = client.ping().unwrap();
    assert_eq!(pong.version.as_deref(), Some("v8.36.0"));
    assert_eq!(pong.status["store"]["ready"], true);

    let captured = server.join().unwrap();
    assert_eq!(captured.request_line, "GET /status HTTP/1.1");
}

#[test]
fn test_redirect_is_a_node_failure() {
    let leader = TcpListener::bind("127.0.0.1:0").unwrap();
    leader.set_nonblocking(true).unwrap();
    let leader_port = leader.local_addr().unwrap().port();
    let (follower, server) = serve_once_with(
        301,
        format!("Location: http://127.0.0.1:{leader_port}/db/execute?transaction=true\r\n"),
        "",
    );
    let client = http_client(&[follower]);

    let err = client
        .execute(
            &ExecuteRequest::new()
                .statement("INSERT INTO t VALUES(1)")
                .transaction(true),
        )
        .unwrap_err();
    let captured = server.join().unwrap();
    assert_eq!(captured.body, r#"["INSERT INTO t VALUES(1)"]"#);

    match err.node_errors() {
        Some([NodeError::Database { node, status, .. }]) => {
            assert_eq!(node.port, follower);
            assert_eq!(*status, 301);
        }
        other => panic!("expected one database error, got {other:?}"),
    }
    let accepted = leader.accept().map(|_| ()).map_err(|e| e.kind());
    assert_eq!(accepted, Err(ErrorKind::WouldBlock));
}

#[test]
fn test_redirect_fails_over_to_next_registered_node() {
    let (follower, redirecting) = serve_once_with(
        302,
        "Location: http://127.0.0.1:1/db/execute\r\n".to_string(),
        "",
    );
    let (next, server) = serve_once(200, r#"{"results":[{"last_insert_id":1,"rows_affected":1}]}"#);
    let client = http_client(&[follower, next]);

    let results = client.execute_one("INSERT INTO t VALUES(1)").unwrap();
    assert_eq!(results.results[0].rows_affected, 1);

    redirecting.join().unwrap();
    let captured = server.join().unwrap();
    assert_eq!(captured.request_line, "POST /db/execute?timings=true HTTP/1.1");
    assert_eq!(captured.body, r#"["INSERT INTO t VALUES(1)"]"#);
}
