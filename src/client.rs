/*
 * client.rs
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

//! Thin orchestrating layer: owns a connection and composes one full
//! request/response exchange, picking identity or chunked content reading
//! from the response headers and tearing the connection down when the
//! response says it must close.

use std::io;
use std::time::Duration;

use crate::connection::{Connection, Stream};
use crate::request::HttpRequest;
use crate::response::HttpResponse;
use crate::transport::{ChunkedFraming, HttpTransport, IdentityFraming};

pub struct HttpClient {
    connection: Connection,
}

impl HttpClient {
    /// Plain TCP connect.
    pub async fn connect(host: &str, port: u16) -> io::Result<Self> {
        Ok(Self {
            connection: Connection::connect(host, port).await?,
        })
    }

    /// Wrap an already-open stream (TLS set up elsewhere, or a test pipe).
    pub fn from_stream(stream: impl Stream + 'static) -> Self {
        Self {
            connection: Connection::from_stream(stream),
        }
    }

    pub fn connection(&mut self) -> &mut Connection {
        &mut self.connection
    }

    pub fn disconnect(&mut self) {
        self.connection.disconnect();
    }

    /// One full exchange: send the request (and its payload, when not
    /// streamed), read the response, read its content with the framing the
    /// headers call for, and disconnect if the response demands it.
    ///
    /// The optional timeout bounds the wait for the status line only.
    pub async fn exchange(
        &mut self,
        request: &mut HttpRequest,
        timeout: Option<Duration>,
    ) -> io::Result<HttpResponse> {
        let mut transport = HttpTransport::new(IdentityFraming::new());
        transport.send_request(&mut self.connection, request).await?;
        if request.is_upload() && !request.is_stream() {
            transport.send_body(&mut self.connection, request).await?;
        }

        let mut response = transport
            .read_response(&mut self.connection, request, timeout)
            .await;

        if !response.has_errors() {
            let read = if response.transfer_is_chunked() {
                let mut chunked = HttpTransport::new(ChunkedFraming::new());
                chunked
                    .read_content(&mut self.connection, &mut response)
                    .await
            } else {
                transport
                    .read_content(&mut self.connection, &mut response)
                    .await
            };
            if read.is_none() {
                log::debug!("content read failed; response carries the errors");
            }
        }

        if response.connection_must_close() {
            self.connection.disconnect();
        }
        Ok(response)
    }
}
