//! Minimal blocking HTTP/1.1 client used by the remote tracker.
//!
//! One connection per request, closed by the server (`Connection: close`).
//! The whole exchange, connect included, is bounded by a single deadline.

use log::debug;
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use crate::error::SyncError;

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn parse(raw: &[u8]) -> Result<Self, SyncError> {
        let split = find(raw, b"\r\n\r\n")
            .map(|i| (i, i + 4))
            .or_else(|| find(raw, b"\n\n").map(|i| (i, i + 2)));
        let (head_end, body_start) = match split {
            Some(split) => split,
            None => return Err(cut_short("no end of headers")),
        };

        let head = String::from_utf8_lossy(&raw[..head_end]);
        let mut lines = head.lines();
        let status = parse_status_line(lines.next().unwrap_or(""))?;

        let chunked = lines.any(|line| {
            line.split_once(':').is_some_and(|(name, value)| {
                name.trim().eq_ignore_ascii_case("transfer-encoding")
                    && value.trim().eq_ignore_ascii_case("chunked")
            })
        });

        let body = &raw[body_start..];
        let body = if chunked {
            dechunk(body)?
        } else {
            body.to_vec()
        };

        Ok(Response {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

fn malformed(reason: &str) -> SyncError {
    SyncError::MalformedResponse(reason.to_string())
}

/// The server closed before a complete reply arrived.
fn cut_short(reason: &str) -> SyncError {
    SyncError::Transport(io::Error::new(io::ErrorKind::UnexpectedEof, reason))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn parse_status_line(line: &str) -> Result<u16, SyncError> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(version), Some(code)) if version.starts_with("HTTP/") => code
            .parse()
            .map_err(|_| malformed("status code is not a number")),
        _ => Err(malformed("bad status line")),
    }
}

fn dechunk(mut data: &[u8]) -> Result<Vec<u8>, SyncError> {
    let mut out = Vec::new();
    loop {
        let line_end = find(data, b"\r\n").ok_or_else(|| cut_short("truncated chunk size"))?;
        let size_line = String::from_utf8_lossy(&data[..line_end]);
        let size_hex = size_line.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_hex, 16).map_err(|_| malformed("bad chunk size"))?;
        data = &data[line_end + 2..];
        if size == 0 {
            return Ok(out);
        }
        if data.len() < size {
            return Err(cut_short("truncated chunk"));
        }
        out.extend_from_slice(&data[..size]);
        data = data.get(size + 2..).unwrap_or(&[]);
    }
}

/// Percent-encodes a query value. Unreserved characters pass through, so
/// plain project names go on the wire exactly as configured.
pub fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn remaining(deadline: Instant) -> Result<Duration, SyncError> {
    let left = deadline.saturating_duration_since(Instant::now());
    if left.is_zero() {
        Err(SyncError::Timeout)
    } else {
        Ok(left)
    }
}

fn classify(e: io::Error) -> SyncError {
    match e.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => SyncError::Timeout,
        _ => SyncError::Transport(e),
    }
}

/// Sends `GET path` and reads until the server closes the connection.
pub fn get(host: &str, port: u16, path: &str, timeout: Duration) -> Result<Response, SyncError> {
    let deadline = Instant::now() + timeout;

    let mut stream = connect(host, port, deadline)?;
    debug!("GET {}:{}{}", host, port, path);

    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}:{}\r\nConnection: close\r\n\r\n",
        path, host, port
    );
    stream.set_write_timeout(Some(remaining(deadline)?)).map_err(classify)?;
    stream.write_all(request.as_bytes()).map_err(classify)?;

    let mut raw = Vec::new();
    let mut buf = [0u8; 512];
    loop {
        stream.set_read_timeout(Some(remaining(deadline)?)).map_err(classify)?;
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => raw.extend_from_slice(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(classify(e)),
        }
    }

    if raw.is_empty() {
        return Err(cut_short("connection closed without a reply"));
    }
    Response::parse(&raw)
}

fn connect(host: &str, port: u16, deadline: Instant) -> Result<TcpStream, SyncError> {
    let addrs = (host, port).to_socket_addrs().map_err(classify)?;

    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, remaining(deadline)?) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(e),
        }
    }

    Err(match last_error {
        Some(e) => classify(e),
        None => SyncError::Transport(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} did not resolve", host),
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_status_and_body() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n[\"KraftBank\"]";
        let response = Response::parse(raw).unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "[\"KraftBank\"]");
        assert!(response.is_success());
    }

    #[test]
    fn non_2xx_is_not_success() {
        let response = Response::parse(b"HTTP/1.0 404 Not Found\r\n\r\n").unwrap();
        assert_eq!(response.status, 404);
        assert!(!response.is_success());
        assert!(response.body.is_empty());
    }

    #[test]
    fn decodes_chunked_body() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\n[\"Mi\r\n8;ext=1\r\nndFit\"]\n\r\n0\r\n\r\n";
        let response = Response::parse(raw).unwrap();
        assert_eq!(response.body, "[\"MindFit\"]\n");
    }

    #[test]
    fn cut_off_reply_is_a_transport_failure() {
        let eof = |r: Result<Response, SyncError>| {
            matches!(r, Err(SyncError::Transport(e)) if e.kind() == io::ErrorKind::UnexpectedEof)
        };

        assert!(eof(Response::parse(b"")));
        assert!(eof(Response::parse(b"HTTP/1.1 200 OK\r\nContent-Length: 4")));
        assert!(eof(Response::parse(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n10\r\n[\"Mind")));
        assert!(eof(Response::parse(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\n[\"Mi")));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            Response::parse(b"hello there\r\n\r\nbody"),
            Err(SyncError::MalformedResponse(_))
        ));
        assert!(matches!(
            Response::parse(b"HTTP/1.1 abc OK\r\n\r\n"),
            Err(SyncError::MalformedResponse(_))
        ));
    }

    #[test]
    fn query_encoding_keeps_plain_names() {
        assert_eq!(encode_query_value("KraftBank"), "KraftBank");
        assert_eq!(encode_query_value("Deep Work&Co"), "Deep%20Work%26Co");
        assert_eq!(encode_query_value("Büro"), "B%C3%BCro");
    }

    #[test]
    fn unreachable_server_is_a_transport_failure() {
        // bind then drop to get a port nothing listens on
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let result = get("127.0.0.1", port, "/running", Duration::from_secs(1));
        assert!(matches!(result, Err(SyncError::Transport(_)) | Err(SyncError::Timeout)));
    }
}
