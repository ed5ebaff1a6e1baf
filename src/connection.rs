/*
 * connection.rs
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

//! Line-buffered connection to the remote server: send raw bytes, read one
//! line (with or without a timeout), read fixed-size blocks, report
//! end-of-stream.
//!
//! Wraps any stream (TCP, TLS, in-memory for tests); the engine uses it
//! strictly sequentially, one request/response cycle at a time.

use std::io;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const READ_CHUNK: usize = 8192;

/// Any byte stream the connection can run over.
pub trait Stream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Stream for T {}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "not connected")
}

/// A connection to one HTTP server. All reads go through an internal buffer;
/// `read_line` returns lines including their terminator, matching what the
/// transport engine strips and counts.
pub struct Connection {
    stream: Option<Box<dyn Stream>>,
    read_buf: BytesMut,
    eof: bool,
}

impl Connection {
    /// Plain TCP connect with a bounded connect timeout.
    pub async fn connect(host: &str, port: u16) -> io::Result<Self> {
        let addr = format!("{}:{}", host, port);
        let tcp = timeout(CONNECT_TIMEOUT, TcpStream::connect(&addr))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "TCP connect timed out"))??;
        Ok(Self::from_stream(tcp))
    }

    /// Wrap an already-open stream (TLS, or a duplex pipe in tests).
    pub fn from_stream(stream: impl Stream + 'static) -> Self {
        Self {
            stream: Some(Box::new(stream)),
            read_buf: BytesMut::with_capacity(READ_CHUNK),
            eof: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// True once the peer has shut down and the buffer is drained.
    pub fn is_eof(&self) -> bool {
        self.eof && self.read_buf.is_empty()
    }

    /// Drop the stream. Subsequent sends and reads fail with NotConnected.
    pub fn disconnect(&mut self) {
        self.stream = None;
    }

    /// Write all bytes and flush.
    pub async fn send(&mut self, data: &[u8]) -> io::Result<()> {
        match self.stream.as_mut() {
            Some(s) => {
                s.write_all(data).await?;
                s.flush().await
            }
            None => Err(not_connected()),
        }
    }

    async fn fill(&mut self) -> io::Result<usize> {
        let stream = self.stream.as_mut().ok_or_else(not_connected)?;
        let mut tmp = [0u8; READ_CHUNK];
        let n = stream.read(&mut tmp).await?;
        if n == 0 {
            self.eof = true;
        } else {
            self.read_buf.extend_from_slice(&tmp[..n]);
        }
        Ok(n)
    }

    /// Read one line including its terminator. At end-of-stream returns
    /// whatever partial line remains buffered, possibly empty.
    pub async fn read_line(&mut self) -> io::Result<Bytes> {
        loop {
            if let Some(pos) = self.read_buf.iter().position(|&b| b == b'\n') {
                return Ok(self.read_buf.split_to(pos + 1).freeze());
            }
            if self.eof {
                let rest = self.read_buf.split_to(self.read_buf.len());
                return Ok(rest.freeze());
            }
            self.fill().await?;
        }
    }

    /// `read_line` bounded by a timeout; expiry yields ErrorKind::TimedOut.
    pub async fn read_line_with_timeout(&mut self, duration: Duration) -> io::Result<Bytes> {
        match timeout(duration, self.read_line()).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "timed out waiting for line",
            )),
        }
    }

    /// Read exactly `len` bytes, short only when end-of-stream intervenes.
    pub async fn read_block(&mut self, len: usize) -> io::Result<Bytes> {
        while self.read_buf.len() < len && !self.eof {
            self.fill().await?;
        }
        let take = len.min(self.read_buf.len());
        Ok(self.read_buf.split_to(take).freeze())
    }

    /// Drain the stream until the peer shuts down.
    pub async fn read_until_eof(&mut self) -> io::Result<Bytes> {
        while !self.eof {
            self.fill().await?;
        }
        let rest = self.read_buf.split_to(self.read_buf.len());
        Ok(rest.freeze())
    }
}
