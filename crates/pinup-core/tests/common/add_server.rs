//! Minimal HTTP/1.1 server mimicking a pinning gateway's `/api/v0/add`.
//!
//! Accepts one multipart `file` part per request and answers with the
//! NDJSON line the real gateway sends. The returned hash is derived from
//! the uploaded bytes so tests can check the file was streamed intact.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct AddServerOptions {
    /// If set, requests whose `Authorization` header differs get 401.
    pub expected_auth: Option<String>,
    /// Uploads with these file names get a 500 error body.
    pub fail_names: Vec<String>,
    /// Sleep this long before answering (simulates a slow gateway).
    pub delay: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub target: String,
    pub authorization: Option<String>,
    pub file_name: Option<String>,
    pub content: Vec<u8>,
}

pub struct AddServer {
    /// Base URL, e.g. "http://127.0.0.1:12345".
    pub url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl AddServer {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Fake CID for `content`: FNV-1a, hex encoded, with a CIDv0-looking prefix.
pub fn fake_cid(content: &[u8]) -> String {
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in content {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    format!("Qm{:016x}", hash)
}

/// Starts the server on a background thread. Runs until the process exits.
pub fn start(opts: AddServerOptions) -> AddServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let opts = opts.clone();
            let log = Arc::clone(&log);
            thread::spawn(move || handle(stream, &opts, &log));
        }
    });
    AddServer {
        url: format!("http://127.0.0.1:{}", port),
        requests,
    }
}

fn handle(mut stream: TcpStream, opts: &AddServerOptions, log: &Mutex<Vec<RecordedRequest>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let Some((head, body)) = read_request(&mut stream) else {
        return;
    };

    let mut lines = head.lines();
    let request_line = lines.next().unwrap_or("");
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let target = parts.next().unwrap_or("").to_string();

    let mut authorization = None;
    let mut boundary = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("authorization") {
                authorization = Some(value.to_string());
            }
            if name.eq_ignore_ascii_case("content-type") {
                boundary = value
                    .split(';')
                    .filter_map(|p| p.trim().strip_prefix("boundary="))
                    .next()
                    .map(|b| b.trim_matches('"').to_string());
            }
        }
    }

    let (file_name, content) = boundary
        .as_deref()
        .and_then(|b| parse_file_part(&body, b))
        .unwrap_or((None, Vec::new()));

    log.lock().unwrap().push(RecordedRequest {
        method: method.clone(),
        target: target.clone(),
        authorization: authorization.clone(),
        file_name: file_name.clone(),
        content: content.clone(),
    });

    if let Some(delay) = opts.delay {
        thread::sleep(delay);
    }

    if !method.eq_ignore_ascii_case("POST") || !target.starts_with("/api/v0/add") {
        respond(&mut stream, "404 Not Found", "404 page not found\n");
        return;
    }
    if let Some(expected) = &opts.expected_auth {
        if authorization.as_deref() != Some(expected.as_str()) {
            respond(
                &mut stream,
                "401 Unauthorized",
                "{\"Message\":\"invalid project id or project secret\",\"Code\":0,\"Type\":\"error\"}\n",
            );
            return;
        }
    }
    let name = file_name.unwrap_or_default();
    if opts.fail_names.iter().any(|n| *n == name) {
        respond(
            &mut stream,
            "500 Internal Server Error",
            "{\"Message\":\"pin failed\",\"Code\":0,\"Type\":\"error\"}\n",
        );
        return;
    }

    let body = format!(
        "{{\"Name\":\"{}\",\"Hash\":\"{}\",\"Size\":\"{}\"}}\n",
        name,
        fake_cid(&content),
        content.len()
    );
    respond(&mut stream, "200 OK", &body);
}

fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
}

/// Reads headers and a Content-Length body. Returns (header text, body bytes).
fn read_request(stream: &mut TcpStream) -> Option<(String, Vec<u8>)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    let header_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    Some((head, body))
}

/// Extracts (filename, content) of the first part in a multipart body.
fn parse_file_part(body: &[u8], boundary: &str) -> Option<(Option<String>, Vec<u8>)> {
    let part_headers_end = find(body, b"\r\n\r\n")?;
    let headers = String::from_utf8_lossy(&body[..part_headers_end]);
    let file_name = headers.split("filename=\"").nth(1).and_then(|rest| {
        rest.split('"').next().map(str::to_string)
    });
    let content_start = part_headers_end + 4;
    let closing = format!("\r\n--{}", boundary);
    let content_len = find(&body[content_start..], closing.as_bytes())?;
    Some((file_name, body[content_start..content_start + content_len].to_vec()))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
