/*
 * chunked.rs
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

//! Chunked transfer encoding: hex size line, payload + CRLF, repeated until a
//! zero-size chunk. Trailer headers after the terminator fold into the same
//! header map.

use std::io;

use bytes::BytesMut;

use crate::connection::Connection;
use crate::response::{HttpResponse, ResponseKind};
use crate::transport::{strip_line_ending, Framing};

/// Chunk-framed HTTP content.
#[derive(Default)]
pub struct ChunkedFraming;

impl ChunkedFraming {
    pub fn new() -> Self {
        Self
    }

    /// Fold trailer headers into the response's header map. The trailer block
    /// ends at a blank line or end-of-stream.
    async fn read_trailers(&mut self, conn: &mut Connection, response: &mut HttpResponse) {
        loop {
            let line = match conn.read_line().await {
                Ok(line) => line,
                Err(e) => {
                    response.add_error("read_content", &e.to_string());
                    return;
                }
            };
            response.bytes_read += line.len() as u64;
            response.add_raw_data(&line);
            let trailer = String::from_utf8_lossy(strip_line_ending(&line)).into_owned();
            if trailer.is_empty() {
                return;
            }
            response.decode_header(&trailer);
            if conn.is_eof() {
                return;
            }
        }
    }
}

impl Framing for ChunkedFraming {
    async fn send_content(&mut self, conn: &mut Connection, payload: &[u8]) -> io::Result<()> {
        let mut out = BytesMut::with_capacity(payload.len() + 16);
        out.extend_from_slice(format!("{:x}\r\n", payload.len()).as_bytes());
        out.extend_from_slice(payload);
        out.extend_from_slice(b"\r\n");
        conn.send(&out).await
    }

    async fn read_content(
        &mut self,
        conn: &mut Connection,
        response: &mut HttpResponse,
    ) -> Option<u64> {
        if !conn.is_connected() {
            response.add_error("read_content", "not connected");
            return None;
        }

        // the header check upgrades the kind before the first chunk decodes
        response.transfer_is_chunked();

        let mut total: u64 = 0;
        loop {
            let line = match conn.read_line().await {
                Ok(line) => line,
                Err(e) => {
                    response.add_error("read_content", &e.to_string());
                    return None;
                }
            };
            if line.is_empty() {
                response.add_error("read_content", "premature end of stream reading chunk size");
                response.must_close = true;
                return None;
            }
            response.bytes_read += line.len() as u64;
            response.add_raw_data(&line);

            let size_line = String::from_utf8_lossy(strip_line_ending(&line)).into_owned();
            // chunk extensions after ';' are ignored
            let hex = size_line.split(';').next().unwrap_or("").trim();
            let size = match u64::from_str_radix(hex, 16) {
                Ok(size) => size,
                Err(_) => {
                    response.add_error(
                        "read_content",
                        &format!("invalid chunk size line: {}", size_line),
                    );
                    response.set_kind(ResponseKind::Invalid);
                    return None;
                }
            };

            if size == 0 {
                self.read_trailers(conn, response).await;
                break;
            }

            // payload plus its trailing CRLF; reject sizes that don't fit
            let want = match usize::try_from(size).ok().and_then(|s| s.checked_add(2)) {
                Some(want) => want,
                None => {
                    response.add_error(
                        "read_content",
                        &format!("chunk size out of range: {}", size_line),
                    );
                    response.set_kind(ResponseKind::Invalid);
                    return None;
                }
            };
            let block = match conn.read_block(want).await {
                Ok(block) => block,
                Err(e) => {
                    response.add_error("read_content", &e.to_string());
                    return None;
                }
            };
            response.bytes_read += block.len() as u64;
            response.add_raw_data(&block);
            if block.len() < want {
                response.add_error("read_content", "premature end of stream reading chunk");
                response.must_close = true;
                return None;
            }
            response.decode_chunk(&block);
            total += size;
        }

        Some(total)
    }

    /// The zero-length chunk that ends an outgoing chunked stream.
    async fn done_sending_content(&mut self, conn: &mut Connection) -> io::Result<()> {
        conn.send(b"0\r\n\r\n").await
    }

    async fn close(&mut self, _conn: &mut Connection) -> io::Result<()> {
        Ok(())
    }
}
