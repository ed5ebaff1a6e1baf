/*
 * identity.rs
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

//! Identity framing: the body is exactly Content-Length bytes, or runs to
//! end-of-stream when no length was advertised and the server said the
//! connection will close.

use std::io;

use crate::connection::Connection;
use crate::response::HttpResponse;
use crate::transport::Framing;

/// Plain HTTP content, no transfer encoding.
#[derive(Default)]
pub struct IdentityFraming;

impl IdentityFraming {
    pub fn new() -> Self {
        Self
    }
}

impl Framing for IdentityFraming {
    async fn send_content(&mut self, conn: &mut Connection, payload: &[u8]) -> io::Result<()> {
        conn.send(payload).await
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

        let advertised = response.headers.get("Content-Length").cloned();
        let content_length = match advertised {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(length) => Some(length),
                Err(_) => {
                    response.add_error(
                        "read_content",
                        &format!("invalid Content-Length header: {}", value),
                    );
                    return None;
                }
            },
            None => None,
        };

        match content_length {
            Some(length) => {
                let block = match conn.read_block(length as usize).await {
                    Ok(block) => block,
                    Err(e) => {
                        response.add_error("read_content", &e.to_string());
                        return None;
                    }
                };
                response.bytes_read += block.len() as u64;
                response.add_raw_data(&block);
                if (block.len() as u64) < length {
                    response.add_error("read_content", "premature end of stream reading body");
                    response.must_close = true;
                }
                response.decode_body(&block);
                Some(block.len() as u64)
            }
            None => {
                // length unknown: there is only a body to read when the
                // server told us the connection will close afterwards
                if !response.connection_must_close() {
                    response.decode_body(&[]);
                    return Some(0);
                }
                let block = match conn.read_until_eof().await {
                    Ok(block) => block,
                    Err(e) => {
                        response.add_error("read_content", &e.to_string());
                        return None;
                    }
                };
                response.bytes_read += block.len() as u64;
                response.add_raw_data(&block);
                response.decode_body(&block);
                response.must_close = true;
                Some(block.len() as u64)
            }
        }
    }

    async fn done_sending_content(&mut self, _conn: &mut Connection) -> io::Result<()> {
        Ok(())
    }

    async fn close(&mut self, _conn: &mut Connection) -> io::Result<()> {
        Ok(())
    }
}
