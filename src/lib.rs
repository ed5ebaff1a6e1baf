/*
 * lib.rs
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

//! Wire-level HTTP/1.x client protocol engine.
//!
//! Turns a byte-oriented connection into a structured request/response
//! exchange: write the request line and headers (plus an optional payload),
//! read the status line and headers into a response accumulator, then read
//! the body with whichever framing the response calls for — identity
//! (Content-Length or read-to-close), chunked transfer encoding, or
//! websocket frames after a protocol upgrade.
//!
//! Decode failures poison the accumulator instead of unwinding the caller;
//! inspect `HttpResponse::has_errors()` and `kind()` before trusting a
//! response, and `connection_must_close()` before reusing the connection.

pub mod client;
pub mod connection;
pub mod request;
pub mod response;
pub mod transport;

pub use client::HttpClient;
pub use connection::Connection;
pub use request::{HttpRequest, Method};
pub use response::{HttpResponse, ResponseError, ResponseKind};
pub use transport::frame::WsFrame;
pub use transport::{ChunkedFraming, Framing, HttpTransport, IdentityFraming, WebSocketFraming};
