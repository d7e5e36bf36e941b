// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use codepack::resolver::{FetchError, Fetcher};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// CIDv0 that classifies as addressable
pub const CID: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";

/// Fetcher that answers from a URL table and records every request.
///
/// URLs missing from the table fail with HTTP 404.
pub struct RecordingFetcher {
    replies: HashMap<String, Result<Vec<u8>, FetchError>>,
    log: Arc<Mutex<Vec<String>>>,
}

impl RecordingFetcher {
    pub fn new() -> Self {
        Self {
            replies: HashMap::new(),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn reply(mut self, url: &str, body: &[u8]) -> Self {
        self.replies.insert(url.to_string(), Ok(body.to_vec()));
        self
    }

    pub fn fail(mut self, url: &str, error: FetchError) -> Self {
        self.replies.insert(url.to_string(), Err(error));
        self
    }

    /// Handle to the request log that survives boxing the fetcher
    pub fn log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.log)
    }
}

impl Fetcher for RecordingFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.log.lock().unwrap().push(url.to_string());
        self.replies
            .get(url)
            .cloned()
            .unwrap_or(Err(FetchError::Status(404)))
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Serve exactly one HTTP response on a random local port.
///
/// Returns the base URL and a handle yielding the raw request text.
pub fn serve_once(status: u16, body: Vec<u8>) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream);

        let head = format!(
            "HTTP/1.1 {} Test\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            body.len()
        );
        stream.write_all(head.as_bytes()).unwrap();
        stream.write_all(&body).unwrap();
        stream.flush().unwrap();

        request
    });

    (format!("http://{}", addr), handle)
}

fn read_request(stream: &mut impl Read) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];

    // Headers
    let header_end = loop {
        let n = stream.read(&mut buf).unwrap();
        if n == 0 {
            return String::from_utf8_lossy(&data).into_owned();
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = find(&data, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_ascii_lowercase();
    let content_length = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok());
    let chunked = head.contains("transfer-encoding: chunked");

    // Body
    loop {
        let body = &data[header_end..];
        let done = match content_length {
            Some(len) => body.len() >= len,
            None if chunked => find(body, b"0\r\n\r\n").is_some(),
            None => true,
        };
        if done {
            break;
        }
        let n = stream.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
    }

    String::from_utf8_lossy(&data).into_owned()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
