//! ConsulSnapshotStore against a scripted local HTTP server.

use std::time::Duration;

use consul_s3_snapshot::config::{ClientOptions, ConsulOptions};
use consul_s3_snapshot::consul::ConsulSnapshotStore;
use snapshot_core::SnapshotStore;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug)]
struct Request {
    head: String,
    body: Vec<u8>,
}

impl Request {
    fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }

    fn has_header(&self, name: &str, value: &str) -> bool {
        let wanted = format!("{}: {}", name.to_ascii_lowercase(), value);
        self.head
            .lines()
            .any(|line| line.to_ascii_lowercase() == wanted.to_ascii_lowercase())
    }
}

fn response(status: &str, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut out = format!("HTTP/1.1 {}\r\n", status);
    for (name, value) in headers {
        out.push_str(&format!("{}: {}\r\n", name, value));
    }
    out.push_str(&format!("Content-Length: {}\r\nConnection: close\r\n\r\n", body.len()));
    let mut out = out.into_bytes();
    out.extend_from_slice(body);
    out
}

async fn read_request(stream: &mut TcpStream) -> Request {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed mid-request");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8(buf[..header_end].to_vec()).unwrap();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .map(|(_, value)| value.trim().parse::<usize>().unwrap())
        .unwrap_or(0);
    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed mid-body");
        body.extend_from_slice(&chunk[..n]);
    }
    Request { head, body }
}

/// Answer one connection per scripted response, then stop accepting.
async fn serve(responses: Vec<Vec<u8>>) -> (String, JoinHandle<Vec<Request>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let handle = tokio::spawn(async move {
        let mut seen = Vec::new();
        for reply in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            seen.push(read_request(&mut stream).await);
            stream.write_all(&reply).await.unwrap();
            stream.shutdown().await.unwrap();
        }
        seen
    });
    (address, handle)
}

fn store(address: String, max_attempts: u32, customize: impl FnOnce(&mut ConsulOptions)) -> ConsulSnapshotStore {
    let mut consul = ConsulOptions {
        address,
        ..ConsulOptions::default()
    };
    customize(&mut consul);
    let client = ClientOptions {
        request_timeout: Duration::from_secs(5),
        max_attempts,
    };
    ConsulSnapshotStore::new(&consul, &client).unwrap()
}

#[tokio::test]
async fn save_returns_archive_and_index() {
    let (address, server) = serve(vec![response(
        "200 OK",
        &[("X-Consul-Index", "42"), ("Content-Type", "application/x-gzip")],
        b"archive-bytes",
    )])
    .await;
    let store = store(address, 1, |_| {});

    let snapshot = store.save().await.unwrap();
    assert_eq!(snapshot.index, 42);
    assert_eq!(snapshot.data, b"archive-bytes");

    let requests = server.await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].request_line().starts_with("GET /v1/snapshot "));
}

#[tokio::test]
async fn save_sends_token_datacenter_and_stale() {
    let (address, server) = serve(vec![response(
        "200 OK",
        &[("X-Consul-Index", "7")],
        b"x",
    )])
    .await;
    let store = store(address, 1, |consul| {
        consul.token = Some("secret-token".to_string());
        consul.datacenter = Some("dc2".to_string());
        consul.stale = true;
    });

    store.save().await.unwrap();

    let requests = server.await.unwrap();
    let line = requests[0].request_line();
    assert!(line.starts_with("GET /v1/snapshot?"), "{}", line);
    assert!(line.contains("dc=dc2"), "{}", line);
    assert!(line.contains("stale"), "{}", line);
    assert!(requests[0].has_header("X-Consul-Token", "secret-token"));
}

#[tokio::test]
async fn save_retries_transient_failure() {
    let (address, server) = serve(vec![
        response("500 Internal Server Error", &[], b"No cluster leader"),
        response("200 OK", &[("X-Consul-Index", "9")], b"ok"),
    ])
    .await;
    let store = store(address, 3, |_| {});

    let snapshot = store.save().await.unwrap();
    assert_eq!(snapshot.index, 9);
    assert_eq!(server.await.unwrap().len(), 2);
}

#[tokio::test]
async fn save_gives_up_after_max_attempts() {
    let (address, server) = serve(vec![
        response("500 Internal Server Error", &[], b"No cluster leader"),
        response("500 Internal Server Error", &[], b"No cluster leader"),
    ])
    .await;
    let store = store(address, 2, |_| {});

    let err = store.save().await.unwrap_err();
    assert!(err.message.contains("500"), "{}", err);
    assert!(err.message.contains("No cluster leader"), "{}", err);
    assert_eq!(server.await.unwrap().len(), 2);
}

#[tokio::test]
async fn save_without_index_header_fails_without_retry() {
    let (address, server) = serve(vec![response("200 OK", &[], b"archive")]).await;
    let store = store(address, 3, |_| {});

    let err = store.save().await.unwrap_err();
    assert!(err.message.contains("X-Consul-Index"), "{}", err);
    assert_eq!(server.await.unwrap().len(), 1);
}

#[tokio::test]
async fn save_acl_denial_is_not_retried() {
    let (address, server) = serve(vec![response(
        "403 Forbidden",
        &[],
        b"Permission denied",
    )])
    .await;
    let store = store(address, 3, |_| {});

    let err = store.save().await.unwrap_err();
    assert!(err.message.contains("403"), "{}", err);
    assert!(err.message.contains("Permission denied"), "{}", err);
    assert_eq!(server.await.unwrap().len(), 1);
}

#[tokio::test]
async fn restore_puts_archive() {
    let (address, server) = serve(vec![response("200 OK", &[], b"")]).await;
    let store = store(address, 3, |consul| {
        consul.token = Some("secret-token".to_string());
    });

    store.restore(b"archive-bytes".to_vec()).await.unwrap();

    let requests = server.await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].request_line().starts_with("PUT /v1/snapshot "));
    assert_eq!(requests[0].body, b"archive-bytes");
    assert!(requests[0].has_header("X-Consul-Token", "secret-token"));
}

#[tokio::test]
async fn restore_failure_is_not_retried() {
    let (address, server) = serve(vec![response(
        "403 Forbidden",
        &[],
        b"Permission denied",
    )])
    .await;
    let store = store(address, 3, |_| {});

    let err = store.restore(b"archive".to_vec()).await.unwrap_err();
    assert!(err.message.contains("403"), "{}", err);
    assert_eq!(server.await.unwrap().len(), 1);
}
