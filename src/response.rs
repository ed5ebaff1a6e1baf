/*
 * response.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of httpwire, a wire-level HTTP client engine.
 *
 * httpwire is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * httpwire is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with httpwire.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Response accumulator: one HTTP response built up incrementally from raw
//! lines, chunks or frames read off the wire.
//!
//! Decode failures poison the accumulator (kind = Invalid) instead of raising;
//! callers check `has_errors()` / `kind()` before trusting any field.

use std::collections::HashMap;
use std::fmt;

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};

use crate::transport::frame::WsFrame;

/// How the response body is framed on the wire. Starts at `Unset`; decoding
/// the status line assumes `Identity` until headers say otherwise. `Invalid`
/// is a poison value: once set, every decode operation is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseKind {
    #[default]
    Unset,
    Invalid,
    Identity,
    Chunked,
    WebSocket,
}

/// One timestamped diagnostic record: which operation failed, and why.
#[derive(Debug, Clone)]
pub struct ResponseError {
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub message: String,
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}(): {}",
            self.timestamp.format("%Y%m%d-%H:%M:%S"),
            self.operation,
            self.message
        )
    }
}

/// Mutable record of one response from the remote HTTP server.
///
/// Owned by the caller that issued the request; mutated only by the transport
/// engine during the read phase. If `has_errors()` is true, nothing beyond the
/// fields set before the first error can be trusted.
#[derive(Debug, Default)]
pub struct HttpResponse {
    kind: ResponseKind,
    /// HTTP version the server speaks, e.g. "1.0" or "1.1".
    pub http_version: String,
    pub status_code: Option<u16>,
    pub status_message: String,
    /// Header names are stored case-sensitive as received; a repeated name
    /// overwrites the earlier value.
    pub headers: HashMap<String, String>,
    /// Body content, identity framing only.
    pub body: Bytes,
    /// Decoded payload segments: chunk payloads (chunked framing) or frame
    /// application data (websocket framing), in arrival order.
    pub chunks: Vec<Bytes>,
    /// Decoded websocket frames, websocket framing only.
    pub frames: Vec<WsFrame>,
    /// Raw bytes consumed from the wire while building this response.
    pub bytes_read: u64,
    /// Full raw accumulation, for diagnostics.
    pub raw_response: BytesMut,
    /// How many read cycles this accumulator has been used for.
    pub usage_count: u32,
    pub errors: Vec<ResponseError>,
    /// Set when the connection has to close regardless of what headers say.
    pub must_close: bool,
}

impl HttpResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(&self) -> ResponseKind {
        self.kind
    }

    /// Transports may change the kind once they know better (e.g. after the
    /// upgrade handshake has been validated).
    pub fn set_kind(&mut self, kind: ResponseKind) {
        self.kind = kind;
    }

    /// Parse a status line with the trailing line ending already stripped.
    ///
    /// On success the version, code and reason are extracted and the kind is
    /// set to `Identity` as the default assumption. A line that does not start
    /// with "HTTP" poisons the accumulator and leaves every other field alone.
    pub fn decode_status_line(&mut self, status_line: &str) -> bool {
        if self.kind == ResponseKind::Invalid {
            return false;
        }
        if !status_line.starts_with("HTTP") {
            self.add_error(
                "decode_status_line",
                "server response does not start with 'HTTP'",
            );
            self.kind = ResponseKind::Invalid;
            return false;
        }

        let mut tokens = status_line.split_whitespace();
        // first token is "HTTP/<version>"
        self.http_version = tokens
            .next()
            .and_then(|t| t.get(5..))
            .unwrap_or("")
            .to_string();
        self.status_code = tokens.next().and_then(|t| t.parse::<u16>().ok());
        // the reason phrase may be several words; rejoin with single spaces
        self.status_message = tokens.collect::<Vec<&str>>().join(" ");

        self.kind = ResponseKind::Identity;
        true
    }

    /// Parse one "Name: value" header line (line ending already stripped).
    /// The value is everything after the colon and exactly one following
    /// space. A line without a colon poisons the accumulator.
    pub fn decode_header(&mut self, header_line: &str) -> bool {
        if self.kind == ResponseKind::Invalid {
            return false;
        }
        let colon = match header_line.find(':') {
            Some(i) => i,
            None => {
                self.add_error(
                    "decode_header",
                    &format!("header line invalid; line was: {}", header_line),
                );
                self.kind = ResponseKind::Invalid;
                return false;
            }
        };
        let name = &header_line[..colon];
        let value = header_line.get(colon + 2..).unwrap_or("");
        self.headers.insert(name.to_string(), value.to_string());
        true
    }

    /// True iff the Transfer-Encoding header says exactly "chunked"; upgrades
    /// the kind to `Chunked` as a side effect. Any other value, or absence,
    /// leaves the kind unchanged.
    pub fn transfer_is_chunked(&mut self) -> bool {
        if self.kind == ResponseKind::Invalid {
            return false;
        }
        if self.headers.get("Transfer-Encoding").map(String::as_str) == Some("chunked") {
            self.kind = ResponseKind::Chunked;
            return true;
        }
        false
    }

    /// Does the connection have to close after this response?
    pub fn connection_must_close(&self) -> bool {
        self.must_close || self.headers.get("Connection").map(String::as_str) == Some("close")
    }

    /// Store the identity-framed body content.
    pub fn decode_body(&mut self, body: &[u8]) {
        if self.kind == ResponseKind::Invalid {
            return;
        }
        self.body = Bytes::copy_from_slice(body);
    }

    /// Append one decoded chunk, with any trailing line ending stripped.
    pub fn decode_chunk(&mut self, chunk: &[u8]) {
        if self.kind == ResponseKind::Invalid {
            return;
        }
        let mut end = chunk.len();
        while end > 0 && (chunk[end - 1] == b'\r' || chunk[end - 1] == b'\n') {
            end -= 1;
        }
        self.chunks.push(Bytes::copy_from_slice(&chunk[..end]));
        log::debug!("chunk: {} bytes", end);
    }

    /// Append one decoded websocket frame. Its application data also lands in
    /// `chunks`, so `chunks` is the unified decoded-payload view regardless of
    /// framing kind.
    pub fn decode_frame(&mut self, frame: WsFrame) {
        if self.kind == ResponseKind::Invalid {
            return;
        }
        self.chunks.push(frame.payload.clone());
        self.frames.push(frame);
    }

    /// Append to the diagnostic raw buffer.
    pub fn add_raw_data(&mut self, data: &[u8]) {
        self.raw_response.extend_from_slice(data);
    }

    /// Record a problem. Never raises; callers decide whether to abort based
    /// on `has_errors()`.
    pub fn add_error(&mut self, operation: &str, message: &str) {
        self.errors.push(ResponseError {
            timestamp: Utc::now(),
            operation: operation.to_string(),
            message: message.to_string(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Count one more read cycle against this accumulator.
    pub fn inc_used(&mut self) {
        self.usage_count += 1;
    }

    /// Prepare for the next response on a keep-alive connection.
    ///
    /// Clears the transient per-response fields. Headers and status survive
    /// unless the previous response was identity-framed: chunked and websocket
    /// responses are not expected to be reset mid-stream, so their headers are
    /// deliberately left intact.
    pub fn reset_for_next_response(&mut self) {
        if self.kind == ResponseKind::Identity {
            self.reset_headers();
        }
        self.chunks.clear();
        self.frames.clear();
        self.errors.clear();
        self.body = Bytes::new();
        self.bytes_read = 0;
    }

    fn reset_headers(&mut self) {
        self.status_code = None;
        self.status_message.clear();
        self.headers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_parsed() {
        let mut r = HttpResponse::new();
        assert!(r.decode_status_line("HTTP/1.1 404 Not Found"));
        assert_eq!(r.http_version, "1.1");
        assert_eq!(r.status_code, Some(404));
        assert_eq!(r.status_message, "Not Found");
        assert_eq!(r.kind(), ResponseKind::Identity);
        assert!(!r.has_errors());
    }

    #[test]
    fn status_line_reason_rejoined_with_single_spaces() {
        let mut r = HttpResponse::new();
        assert!(r.decode_status_line("HTTP/1.0 500 Internal  Server   Error"));
        assert_eq!(r.http_version, "1.0");
        assert_eq!(r.status_code, Some(500));
        assert_eq!(r.status_message, "Internal Server Error");
    }

    #[test]
    fn bad_status_line_poisons() {
        let mut r = HttpResponse::new();
        assert!(!r.decode_status_line("ICY 200 OK"));
        assert_eq!(r.kind(), ResponseKind::Invalid);
        assert!(r.has_errors());
        assert_eq!(r.status_code, None);
        assert_eq!(r.http_version, "");
    }

    #[test]
    fn header_stored_and_overwritten() {
        let mut r = HttpResponse::new();
        r.decode_status_line("HTTP/1.1 200 OK");
        assert!(r.decode_header("Content-Type: text/plain"));
        assert_eq!(r.headers.get("Content-Type").unwrap(), "text/plain");
        assert!(r.decode_header("Content-Type: text/html"));
        assert_eq!(r.headers.get("Content-Type").unwrap(), "text/html");
        assert_eq!(r.headers.len(), 1);
    }

    #[test]
    fn header_without_colon_poisons() {
        let mut r = HttpResponse::new();
        r.decode_status_line("HTTP/1.1 200 OK");
        assert!(!r.decode_header("garbage line"));
        assert_eq!(r.kind(), ResponseKind::Invalid);
        assert!(r.has_errors());
    }

    #[test]
    fn chunked_transfer_detected_exactly() {
        let mut r = HttpResponse::new();
        r.decode_status_line("HTTP/1.1 200 OK");
        r.decode_header("Content-Type: text/plain");
        r.decode_header("Transfer-Encoding: chunked");
        assert_eq!(r.headers.len(), 2);
        assert!(r.transfer_is_chunked());
        assert_eq!(r.kind(), ResponseKind::Chunked);
    }

    #[test]
    fn other_transfer_encoding_leaves_kind_alone() {
        let mut r = HttpResponse::new();
        r.decode_status_line("HTTP/1.1 200 OK");
        r.decode_header("Transfer-Encoding: gzip");
        assert!(!r.transfer_is_chunked());
        assert_eq!(r.kind(), ResponseKind::Identity);

        let mut r2 = HttpResponse::new();
        r2.decode_status_line("HTTP/1.1 200 OK");
        assert!(!r2.transfer_is_chunked());
        assert_eq!(r2.kind(), ResponseKind::Identity);
    }

    #[test]
    fn connection_must_close_from_header_or_flag() {
        let mut r = HttpResponse::new();
        r.decode_status_line("HTTP/1.1 200 OK");
        assert!(!r.connection_must_close());
        r.decode_header("Connection: close");
        assert!(r.connection_must_close());

        let mut r2 = HttpResponse::new();
        r2.must_close = true;
        assert!(r2.connection_must_close());
    }

    #[test]
    fn chunk_line_endings_stripped() {
        let mut r = HttpResponse::new();
        r.decode_status_line("HTTP/1.1 200 OK");
        r.decode_chunk(b"abc\r\n");
        r.decode_chunk(b"de\r\n");
        assert_eq!(r.chunks.len(), 2);
        assert_eq!(&r.chunks[0][..], b"abc");
        assert_eq!(&r.chunks[1][..], b"de");
    }

    #[test]
    fn frame_payload_feeds_chunks() {
        let mut r = HttpResponse::new();
        r.set_kind(ResponseKind::WebSocket);
        let frame = WsFrame {
            fin: true,
            opcode: crate::transport::frame::OP_TEXT,
            payload: Bytes::from_static(b"hi"),
        };
        r.decode_frame(frame);
        assert_eq!(r.frames.len(), 1);
        assert_eq!(&r.chunks[0][..], b"hi");
    }

    #[test]
    fn poisoned_accumulator_ignores_decodes() {
        let mut r = HttpResponse::new();
        assert!(!r.decode_status_line("garbage"));
        assert_eq!(r.kind(), ResponseKind::Invalid);
        r.decode_chunk(b"abc\r\n");
        r.decode_body(b"body");
        assert!(!r.decode_header("Name: value"));
        assert!(!r.decode_status_line("HTTP/1.1 200 OK"));
        assert!(r.chunks.is_empty());
        assert!(r.body.is_empty());
        assert!(r.headers.is_empty());
        assert_eq!(r.kind(), ResponseKind::Invalid);
    }

    #[test]
    fn reset_is_idempotent_for_identity() {
        let mut r = HttpResponse::new();
        r.decode_status_line("HTTP/1.1 200 OK");
        r.decode_header("Content-Length: 5");
        r.decode_body(b"hello");
        r.bytes_read = 42;
        r.inc_used();

        r.reset_for_next_response();
        assert_eq!(r.status_code, None);
        assert!(r.headers.is_empty());
        assert!(r.body.is_empty());
        assert_eq!(r.bytes_read, 0);
        assert_eq!(r.usage_count, 1);
        assert_eq!(r.kind(), ResponseKind::Identity);

        r.reset_for_next_response();
        assert_eq!(r.status_code, None);
        assert!(r.headers.is_empty());
        assert!(r.body.is_empty());
        assert_eq!(r.bytes_read, 0);
    }

    #[test]
    fn reset_keeps_headers_for_chunked() {
        let mut r = HttpResponse::new();
        r.decode_status_line("HTTP/1.1 200 OK");
        r.decode_header("Transfer-Encoding: chunked");
        assert!(r.transfer_is_chunked());
        r.decode_chunk(b"abc\r\n");
        r.reset_for_next_response();
        assert!(r.chunks.is_empty());
        assert_eq!(r.status_code, Some(200));
        assert_eq!(r.headers.len(), 1);
    }

    #[test]
    fn error_record_carries_operation() {
        let mut r = HttpResponse::new();
        r.add_error("read_content", "premature end of stream");
        assert!(r.has_errors());
        let text = r.errors[0].to_string();
        assert!(text.contains("read_content(): premature end of stream"));
    }
}
