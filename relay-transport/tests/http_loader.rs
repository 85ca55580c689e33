//! HttpLoader against a throwaway in-process HTTP server.

use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

use relay_core::{checksum, HttpConfig, Manifest, ManifestEntry};
use relay_transport::{HttpLoader, Loader, Reporter, TransportError};
use tempfile::TempDir;

/// Serve `files` (path → body) forever; unknown paths get 404.
/// Returns the base address and a log of requested paths.
fn serve(files: HashMap<String, Vec<u8>>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let requests = Arc::new(Mutex::new(Vec::new()));
    let log = requests.clone();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut reader = BufReader::new(stream.try_clone().expect("clone"));
            let mut request_line = String::new();
            if reader.read_line(&mut request_line).is_err() {
                continue;
            }
            loop {
                let mut header = String::new();
                match reader.read_line(&mut header) {
                    Ok(0) => break,
                    Ok(_) if header == "\r\n" => break,
                    Ok(_) => {}
                    Err(_) => break,
                }
            }

            let path = request_line
                .split_whitespace()
                .nth(1)
                .unwrap_or("/")
                .trim_start_matches('/')
                .to_string();
            log.lock().unwrap().push(path.clone());

            let response = match files.get(&path) {
                Some(body) => {
                    let mut out = format!(
                        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        body.len()
                    )
                    .into_bytes();
                    out.extend_from_slice(body);
                    out
                }
                None => b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                    .to_vec(),
            };
            let _ = stream.write_all(&response);
        }
    });

    (format!("127.0.0.1:{}", addr.port()), requests)
}

fn published() -> (Manifest, HashMap<String, Vec<u8>>) {
    let manifest = Manifest::new(vec![
        ManifestEntry::new("a.txt", checksum::hash_bytes(b"hello")),
        ManifestEntry::new("sub/b.txt", checksum::hash_bytes(b"world")),
        ManifestEntry::new("LICENSE", checksum::hash_bytes(b"MIT")),
    ]);
    let mut files = HashMap::new();
    files.insert(
        "manifest.json".to_string(),
        manifest.to_json().unwrap().into_bytes(),
    );
    files.insert("a.txt".to_string(), b"hello".to_vec());
    files.insert("sub/b.txt".to_string(), b"world".to_vec());
    (manifest, files)
}

#[test]
fn downloads_manifest_and_files() {
    let (manifest, mut files) = published();
    files.insert("LICENSE".to_string(), b"MIT".to_vec());
    let (base, _) = serve(files);
    let local = TempDir::new().unwrap();

    let mut config = HttpConfig::new(base);
    config.concurrent_downloads = 2;
    let loader = HttpLoader::new(config).unwrap();

    let loaded = loader
        .load_manifest("manifest.json", &Reporter::silent())
        .expect("manifest");
    assert_eq!(loaded, manifest);

    let summary = loader
        .load_files(&loaded, local.path(), &Reporter::silent())
        .expect("files");
    assert!(summary.is_clean(), "failures: {:?}", summary.failed);
    assert_eq!(fs::read_to_string(local.path().join("sub/b.txt")).unwrap(), "world");
    assert_eq!(fs::read_to_string(local.path().join("LICENSE")).unwrap(), "MIT");
}

#[test]
fn extensionless_files_use_temporal_extension_remotely() {
    let (manifest, mut files) = published();
    files.insert("LICENSE.bin".to_string(), b"MIT".to_vec());
    let (base, requests) = serve(files);
    let local = TempDir::new().unwrap();

    let mut config = HttpConfig::new(base);
    config.extensions.allow_files_without_extensions = false;
    config.extensions.temporal_file_extension = Some("bin".to_string());
    let loader = HttpLoader::new(config).unwrap();

    let summary = loader
        .load_files(&manifest, local.path(), &Reporter::silent())
        .expect("files");

    assert!(summary.is_clean(), "failures: {:?}", summary.failed);
    assert_eq!(fs::read_to_string(local.path().join("LICENSE")).unwrap(), "MIT");
    assert!(!local.path().join("LICENSE.bin").exists());
    assert!(requests.lock().unwrap().contains(&"LICENSE.bin".to_string()));
}

#[test]
fn missing_file_is_reported_and_other_files_still_arrive() {
    let (manifest, files) = published();
    let (base, _) = serve(files);
    let local = TempDir::new().unwrap();
    let loader = HttpLoader::new(HttpConfig::new(base)).unwrap();

    let summary = loader
        .load_files(&manifest, local.path(), &Reporter::silent())
        .expect("best effort");

    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].relative_path, "LICENSE");
    assert!(local.path().join("a.txt").exists());
}

#[test]
fn missing_manifest_is_manifest_not_found() {
    let (base, _) = serve(HashMap::new());
    let loader = HttpLoader::new(HttpConfig::new(base)).unwrap();
    let err = loader
        .load_manifest("manifest.json", &Reporter::silent())
        .unwrap_err();
    assert!(matches!(err, TransportError::ManifestNotFound { .. }), "got: {err}");
}
