/*
 * mod.rs
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

//! Transport engine: drives one request/response exchange over a connection.
//!
//! Phases run strictly in order: send request line + headers, optionally send
//! the body, read the status line, read headers, then hand over to the
//! framing-specific content reader. Protocol failures are recorded on the
//! response accumulator rather than raised; only connectivity failures on the
//! send path are fatal `io::Error`s.

use std::io;
use std::time::Duration;

use crate::connection::Connection;
use crate::request::HttpRequest;
use crate::response::HttpResponse;

pub mod chunked;
pub mod frame;
pub mod identity;
pub mod websocket;

pub use chunked::ChunkedFraming;
pub use identity::IdentityFraming;
pub use websocket::WebSocketFraming;

/// Line terminator for the HTTP dialect.
pub const CRLF: &[u8] = b"\r\n";

const DEFAULT_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Remove one trailing line ending ("\r\n" or bare "\n") if present.
pub(crate) fn strip_line_ending(line: &[u8]) -> &[u8] {
    if let Some(stripped) = line.strip_suffix(b"\r\n") {
        stripped
    } else if let Some(stripped) = line.strip_suffix(b"\n") {
        stripped
    } else {
        line
    }
}

/// Framing strategy for the response body (and any framed upload content),
/// selected per connection at setup time.
///
/// `send_content` writes already-terminated content segments; never use it
/// for the header block. `read_content` reads from the connection into the
/// accumulator (body, chunks or frames depending on kind) and returns the
/// byte count read, or None after recording an error on the accumulator.
#[allow(async_fn_in_trait)]
pub trait Framing {
    /// Headers unique to this framing (e.g. the websocket handshake set).
    fn add_request_headers(&self, _request: &mut HttpRequest) {}

    /// Inspect status and headers before any content is read. Framings that
    /// need a handshake validate it here and poison the response on failure.
    fn evaluate_response(&mut self, _request: &HttpRequest, _response: &mut HttpResponse) {}

    async fn send_content(&mut self, conn: &mut Connection, payload: &[u8]) -> io::Result<()>;

    async fn read_content(
        &mut self,
        conn: &mut Connection,
        response: &mut HttpResponse,
    ) -> Option<u64>;

    /// Tell the server we have finished sending content (e.g. the zero-length
    /// chunk terminator).
    async fn done_sending_content(&mut self, conn: &mut Connection) -> io::Result<()>;

    /// Orderly shutdown, where the framing has one (e.g. a close frame).
    async fn close(&mut self, conn: &mut Connection) -> io::Result<()>;
}

/// The engine proper: orchestrates the exchange phases around a framing.
pub struct HttpTransport<F: Framing> {
    framing: F,
}

impl<F: Framing> HttpTransport<F> {
    pub fn new(framing: F) -> Self {
        Self { framing }
    }

    pub fn framing_mut(&mut self) -> &mut F {
        &mut self.framing
    }

    /// Write the request line and header block. For uploads, a Content-Type
    /// is defaulted if the caller set none, and Content-Length is computed
    /// from the payload unless the payload is streamed. Fatal if the
    /// connection is down; nothing here is retried.
    pub async fn send_request(
        &mut self,
        conn: &mut Connection,
        request: &mut HttpRequest,
    ) -> io::Result<()> {
        if !conn.is_connected() {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "no HTTP connection",
            ));
        }

        conn.send(format!("{}\r\n", request.request_line()).as_bytes())
            .await?;

        if request.is_upload() {
            if !request.has_header("Content-Type") {
                request.with_extra_header("Content-Type", DEFAULT_CONTENT_TYPE);
            }
            if !request.is_stream() {
                // streamed payloads omit Content-Length
                let body_len = request.get_body().map(|b| b.len());
                if let Some(len) = body_len {
                    request.with_extra_header("Content-Length", len.to_string());
                }
            }
        }

        self.framing.add_request_headers(request);

        if let Some(headers) = request.headers_string() {
            conn.send(headers.as_bytes()).await?;
        }

        // blank line ends the header block
        conn.send(CRLF).await
    }

    /// Send the upload payload, if there is one. Callers invoke this when
    /// appropriate for the transport in use; it is not part of send_request.
    pub async fn send_body(
        &mut self,
        conn: &mut Connection,
        request: &HttpRequest,
    ) -> io::Result<()> {
        match request.get_body() {
            Some(body) => conn.send(body).await,
            None => Ok(()),
        }
    }

    /// Read status line and headers into a fresh accumulator, then let the
    /// framing evaluate the response. Returns the accumulator regardless of
    /// outcome; check `has_errors()` and `kind()` before trusting it.
    pub async fn read_response(
        &mut self,
        conn: &mut Connection,
        request: &HttpRequest,
        timeout: Option<Duration>,
    ) -> HttpResponse {
        let mut response = HttpResponse::new();
        self.read_response_into(conn, request, &mut response, timeout)
            .await;
        response
    }

    /// Like `read_response`, but reuses an accumulator across the sequential
    /// responses of a keep-alive connection. Callers reset the accumulator
    /// between responses.
    pub async fn read_response_into(
        &mut self,
        conn: &mut Connection,
        request: &HttpRequest,
        response: &mut HttpResponse,
        timeout: Option<Duration>,
    ) {
        response.inc_used();
        self.read_response_line(conn, response, timeout).await;
        if !response.has_errors() {
            self.read_headers(conn, response).await;
        }
        self.framing.evaluate_response(request, response);
    }

    /// Read and decode the status line. The timeout, when given, bounds how
    /// long we wait for an expected early response (e.g. 100 Continue);
    /// expiry is recorded on the accumulator, not raised.
    async fn read_response_line(
        &mut self,
        conn: &mut Connection,
        response: &mut HttpResponse,
        timeout: Option<Duration>,
    ) -> Option<u16> {
        if !conn.is_connected() {
            response.add_error("read_response_line", "not connected");
            return None;
        }

        let line = match timeout {
            None => conn.read_line().await,
            Some(duration) => conn.read_line_with_timeout(duration).await,
        };
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                response.add_error("read_response_line", &e.to_string());
                return None;
            }
        };

        response.bytes_read += line.len() as u64;
        response.add_raw_data(&line);
        let status_line = String::from_utf8_lossy(strip_line_ending(&line)).into_owned();
        log::trace!("<< {}", status_line);
        response.decode_status_line(&status_line);
        response.status_code
    }

    /// Read header lines until the blank terminator. End-of-stream before the
    /// terminator ends the block without an error here; callers judge an
    /// unterminated header block when validating the response.
    async fn read_headers(&mut self, conn: &mut Connection, response: &mut HttpResponse) {
        if !conn.is_connected() {
            response.add_error("read_headers", "not connected");
            return;
        }

        loop {
            let line = match conn.read_line().await {
                Ok(line) => line,
                Err(e) => {
                    response.add_error("read_headers", &e.to_string());
                    return;
                }
            };
            response.bytes_read += line.len() as u64;
            response.add_raw_data(&line);
            let header_line = String::from_utf8_lossy(strip_line_ending(&line)).into_owned();
            if header_line.is_empty() {
                return;
            }
            log::trace!("<< {}", header_line);
            response.decode_header(&header_line);
            if conn.is_eof() {
                return;
            }
        }
    }

    pub async fn send_content(&mut self, conn: &mut Connection, payload: &[u8]) -> io::Result<()> {
        self.framing.send_content(conn, payload).await
    }

    pub async fn read_content(
        &mut self,
        conn: &mut Connection,
        response: &mut HttpResponse,
    ) -> Option<u64> {
        self.framing.read_content(conn, response).await
    }

    pub async fn done_sending_content(&mut self, conn: &mut Connection) -> io::Result<()> {
        self.framing.done_sending_content(conn).await
    }

    pub async fn close(&mut self, conn: &mut Connection) -> io::Result<()> {
        self.framing.close(conn).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_ending_stripped_once() {
        assert_eq!(strip_line_ending(b"abc\r\n"), b"abc");
        assert_eq!(strip_line_ending(b"abc\n"), b"abc");
        assert_eq!(strip_line_ending(b"abc"), b"abc");
        assert_eq!(strip_line_ending(b"abc\r\n\r\n"), b"abc\r\n");
        assert_eq!(strip_line_ending(b""), b"");
    }
}
