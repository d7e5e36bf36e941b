// tests/publish.rs

//! Publish and transport tests against a local one-shot HTTP server.

mod common;

use codepack::container::decode;
use codepack::publish::{HttpUploader, Publisher, UploadChain, Uploader};
use codepack::resolver::{ContentResolver, EndpointList, FetchError, Fetcher, HttpFetcher};
use codepack::{DeployStatus, ResolutionOutcome};
use common::{serve_once, CID};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

fn write_container(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("contract.wasm");
    std::fs::write(&path, codepack::encode("def f(): return 1", &["f"])).unwrap();
    path
}

#[test]
fn test_web3_storage_upload() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_container(dir.path());
    let (base, server) = serve_once(200, br#"{"cid": "bafyweb3"}"#.to_vec());

    let uploader = HttpUploader::web3_storage("secret-token", TIMEOUT)
        .unwrap()
        .with_url(format!("{}/upload", base));
    assert_eq!(uploader.upload(&path).unwrap(), "bafyweb3");

    let request = server.join().unwrap();
    assert!(request.starts_with("POST /upload "));
    assert!(request.to_ascii_lowercase().contains("authorization: bearer secret-token"));
    assert!(request.contains("name=\"file\""));
    assert!(request.contains("python_code"));
}

#[test]
fn test_pinata_upload_headers() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_container(dir.path());
    let (base, server) = serve_once(200, br#"{"IpfsHash": "QmPinned"}"#.to_vec());

    let uploader = HttpUploader::pinata("key-1", "secret-2", TIMEOUT)
        .unwrap()
        .with_url(format!("{}/pinning/pinFileToIPFS", base));
    assert_eq!(uploader.upload(&path).unwrap(), "QmPinned");

    let request = server.join().unwrap().to_ascii_lowercase();
    assert!(request.contains("pinata_api_key: key-1"));
    assert!(request.contains("pinata_secret_api_key: secret-2"));
}

#[test]
fn test_publish_falls_through_to_working_backend() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("main.py");
    let output = dir.path().join("contract.wasm");
    std::fs::write(&source, "def add(a, b):\n    return a + b\n").unwrap();

    let (bad, bad_server) = serve_once(403, br#"{"error": {"reason": "NO_SCOPES_FOUND"}}"#.to_vec());
    let (good, good_server) = serve_once(200, br#"{"ok": true, "value": {"cid": "bafynft"}}"#.to_vec());

    let chain = UploadChain::new()
        .with(Box::new(HttpUploader::pinata("k", "s", TIMEOUT).unwrap().with_url(bad)))
        .with(Box::new(HttpUploader::nft_storage("t", TIMEOUT).unwrap().with_url(good)));

    let mut status = DeployStatus::new();
    let report = Publisher::new(chain)
        .publish(&source, &["add"], &output, &mut status)
        .unwrap();

    assert_eq!(report.identifier, "bafynft");
    assert_eq!(report.backend.as_deref(), Some("NFT.Storage"));
    assert!(!report.placeholder);
    assert_eq!(status.label(), "success");

    let decoded = decode(&std::fs::read(&output).unwrap()).unwrap();
    assert_eq!(decoded.functions.names(), &["add".to_string()]);

    bad_server.join().unwrap();
    good_server.join().unwrap();
}

#[test]
fn test_http_fetcher_success_and_status() {
    let (base, server) = serve_once(200, b"\0asm\x01\0\0\0".to_vec());
    let fetcher = HttpFetcher::with_timeout(TIMEOUT).unwrap();
    let body = fetcher.fetch(&format!("{}/ipfs/{}", base, CID)).unwrap();
    assert_eq!(body, b"\0asm\x01\0\0\0");
    assert!(server.join().unwrap().starts_with(&format!("GET /ipfs/{} ", CID)));

    let (base, server) = serve_once(504, b"gateway timeout".to_vec());
    let err = fetcher.fetch(&format!("{}/ipfs/{}", base, CID)).unwrap_err();
    assert_eq!(err, FetchError::Status(504));
    server.join().unwrap();
}

#[test]
fn test_resolver_over_http() {
    let package = codepack::encode("def h(): return 3", &["h"]);
    let (failing, failing_server) = serve_once(502, b"bad gateway".to_vec());
    let (working, working_server) = serve_once(200, package.clone());

    let endpoints = EndpointList::from_templates([
        format!("{}/ipfs/{{id}}", failing),
        format!("{}/ipfs/", working),
    ])
    .unwrap();

    let resolver = ContentResolver::new(Box::new(HttpFetcher::with_timeout(TIMEOUT).unwrap()));
    let outcome = resolver.resolve(CID, None, &endpoints).unwrap();
    assert_eq!(outcome, ResolutionOutcome::Package(package));

    failing_server.join().unwrap();
    working_server.join().unwrap();
}
