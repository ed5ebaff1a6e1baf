/*
 * websocket.rs
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

//! WebSocket framing: opening handshake (RFC 6455 §4) validated before any
//! frame reading, then opcode-framed messages via the frame codec.

use std::io;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::BytesMut;
use sha1::{Digest, Sha1};

use crate::connection::Connection;
use crate::request::HttpRequest;
use crate::response::{HttpResponse, ResponseKind};
use crate::transport::frame::{self, OP_CLOSE, OP_TEXT};
use crate::transport::Framing;

/// Magic string for Sec-WebSocket-Accept (RFC 6455 §4.2.2).
const WS_ACCEPT_MAGIC: &[u8] = b"258EAFA5-E914-47DA-95CA-C5AB0DC85B11";
const WS_VERSION: &str = "13";

/// Upgrade-based framing. The handshake key is fixed at construction so that
/// the Sec-WebSocket-Accept check matches what was actually sent.
pub struct WebSocketFraming {
    key: String,
}

impl WebSocketFraming {
    /// Fresh framing with a random 16-byte key, base64-encoded.
    pub fn new() -> io::Result<Self> {
        let mut raw = [0u8; 16];
        getrandom::getrandom(&mut raw)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        Ok(Self {
            key: BASE64.encode(raw),
        })
    }

    /// Framing with a caller-supplied key (deterministic handshakes in tests).
    pub fn with_key(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// SHA-1(key + magic GUID), base64-encoded: the Sec-WebSocket-Accept
    /// value the server must echo back.
    pub fn expected_accept(&self) -> String {
        let mut hasher = Sha1::new();
        hasher.update(self.key.as_bytes());
        hasher.update(WS_ACCEPT_MAGIC);
        BASE64.encode(hasher.finalize())
    }

    fn fail_handshake(&self, response: &mut HttpResponse, message: &str) {
        response.add_error("evaluate_response", message);
        response.set_kind(ResponseKind::Invalid);
    }

    async fn send_frame(
        &mut self,
        conn: &mut Connection,
        opcode: u8,
        payload: &[u8],
    ) -> io::Result<()> {
        let mut mask_key = [0u8; 4];
        getrandom::getrandom(&mut mask_key)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        let mut out = BytesMut::with_capacity(14 + payload.len());
        frame::encode_frame(opcode, payload, &mask_key, &mut out)?;
        conn.send(&out).await
    }
}

impl Framing for WebSocketFraming {
    fn add_request_headers(&self, request: &mut HttpRequest) {
        request.with_extra_header("Upgrade", "websocket");
        request.with_extra_header("Connection", "Upgrade");
        request.with_extra_header("Sec-WebSocket-Key", self.key.clone());
        request.with_extra_header("Sec-WebSocket-Version", WS_VERSION);
    }

    /// Validate the upgrade handshake. On any failure the response is
    /// poisoned so nobody attempts frame decoding on a non-upgraded
    /// connection.
    fn evaluate_response(&mut self, _request: &HttpRequest, response: &mut HttpResponse) {
        if response.status_code != Some(101) {
            let message = format!(
                "expected 101 Switching Protocols, got {:?}",
                response.status_code
            );
            self.fail_handshake(response, &message);
            return;
        }
        let upgrade_ok = response
            .headers
            .get("Upgrade")
            .map(|v| v.eq_ignore_ascii_case("websocket"))
            .unwrap_or(false);
        if !upgrade_ok {
            self.fail_handshake(response, "missing or wrong Upgrade header");
            return;
        }
        let connection_ok = response
            .headers
            .get("Connection")
            .map(|v| v.eq_ignore_ascii_case("upgrade"))
            .unwrap_or(false);
        if !connection_ok {
            self.fail_handshake(response, "missing or wrong Connection header");
            return;
        }
        let accept_ok = response
            .headers
            .get("Sec-WebSocket-Accept")
            .map(|v| v.trim() == self.expected_accept())
            .unwrap_or(false);
        if !accept_ok {
            self.fail_handshake(response, "Sec-WebSocket-Accept mismatch");
            return;
        }
        log::debug!("websocket handshake accepted");
        response.set_kind(ResponseKind::WebSocket);
    }

    /// Send one text frame of content.
    async fn send_content(&mut self, conn: &mut Connection, payload: &[u8]) -> io::Result<()> {
        self.send_frame(conn, OP_TEXT, payload).await
    }

    /// Read one frame and fold it into the accumulator. A Close frame marks
    /// the connection as finished.
    async fn read_content(
        &mut self,
        conn: &mut Connection,
        response: &mut HttpResponse,
    ) -> Option<u64> {
        if response.kind() != ResponseKind::WebSocket {
            response.add_error("read_content", "connection was not upgraded to websocket");
            return None;
        }
        match frame::read_frame(conn).await {
            Ok((ws_frame, wire_len)) => {
                response.bytes_read += wire_len;
                let payload_len = ws_frame.payload.len() as u64;
                if ws_frame.opcode == OP_CLOSE {
                    response.must_close = true;
                }
                response.decode_frame(ws_frame);
                Some(payload_len)
            }
            Err(e) => {
                response.add_error("read_content", &e.to_string());
                response.set_kind(ResponseKind::Invalid);
                None
            }
        }
    }

    async fn done_sending_content(&mut self, _conn: &mut Connection) -> io::Result<()> {
        Ok(())
    }

    /// Orderly shutdown: send a Close frame (1000, normal closure).
    async fn close(&mut self, conn: &mut Connection) -> io::Result<()> {
        let payload = 1000u16.to_be_bytes();
        self.send_frame(conn, OP_CLOSE, &payload).await
    }
}
