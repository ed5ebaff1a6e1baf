/*
 * frame.rs
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

//! WebSocket frame format (RFC 6455 §5): reader for the receive path,
//! encoder with masking for the send path.

use std::io;

use bytes::{BufMut, Bytes, BytesMut};

use crate::connection::Connection;

// Opcodes
pub const OP_CONTINUATION: u8 = 0;
pub const OP_TEXT: u8 = 1;
pub const OP_BINARY: u8 = 2;
pub const OP_CLOSE: u8 = 8;
pub const OP_PING: u8 = 9;
pub const OP_PONG: u8 = 10;

/// Max payload length we accept for data frames (64 KiB). Control frames are ≤125.
pub const MAX_FRAME_PAYLOAD: usize = 65536;

/// One decoded frame from the server.
#[derive(Debug, Clone)]
pub struct WsFrame {
    pub fin: bool,
    pub opcode: u8,
    pub payload: Bytes,
}

impl WsFrame {
    pub fn application_data(&self) -> &[u8] {
        &self.payload
    }

    pub fn is_control(&self) -> bool {
        matches!(self.opcode, OP_CLOSE | OP_PING | OP_PONG)
    }
}

fn eof_error(what: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("end of stream reading frame {}", what),
    )
}

/// Read one frame off the connection (server → client: must not be masked).
/// Returns the frame and the number of wire bytes consumed.
pub async fn read_frame(conn: &mut Connection) -> io::Result<(WsFrame, u64)> {
    let header = conn.read_block(2).await?;
    if header.len() < 2 {
        return Err(eof_error("header"));
    }
    let b0 = header[0];
    let b1 = header[1];
    let fin = (b0 & 0x80) != 0;
    let opcode = b0 & 0x0f;
    if (b1 & 0x80) != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "server frame must not be masked",
        ));
    }

    let len7 = b1 & 0x7f;
    let mut wire_len: u64 = 2;
    let payload_len: u64 = if len7 == 126 {
        let ext = conn.read_block(2).await?;
        if ext.len() < 2 {
            return Err(eof_error("length"));
        }
        wire_len += 2;
        u16::from_be_bytes([ext[0], ext[1]]) as u64
    } else if len7 == 127 {
        let ext = conn.read_block(8).await?;
        if ext.len() < 8 {
            return Err(eof_error("length"));
        }
        wire_len += 8;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&ext[..8]);
        u64::from_be_bytes(raw)
    } else {
        len7 as u64
    };

    let is_control = matches!(opcode, OP_CLOSE | OP_PING | OP_PONG);
    if is_control && payload_len > 125 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "control frame payload too long",
        ));
    }
    if !is_control && payload_len > MAX_FRAME_PAYLOAD as u64 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "data frame payload too long",
        ));
    }

    let payload = if payload_len > 0 {
        let payload = conn.read_block(payload_len as usize).await?;
        if (payload.len() as u64) < payload_len {
            return Err(eof_error("payload"));
        }
        wire_len += payload.len() as u64;
        payload
    } else {
        Bytes::new()
    };

    Ok((
        WsFrame {
            fin,
            opcode,
            payload,
        },
        wire_len,
    ))
}

/// Encode one frame (client → server: must mask). The payload is XORed with
/// the 4-byte `mask_key`.
pub fn encode_frame(
    opcode: u8,
    payload: &[u8],
    mask_key: &[u8; 4],
    out: &mut BytesMut,
) -> io::Result<()> {
    let len = payload.len();
    if len > MAX_FRAME_PAYLOAD {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "payload too long",
        ));
    }
    let fin: u8 = 0x80;
    out.put_u8(fin | (opcode & 0x0f));
    if len < 126 {
        out.put_u8(0x80 | (len as u8));
    } else if len < 65536 {
        out.put_u8(0x80 | 126);
        out.put_u16(len as u16);
    } else {
        out.put_u8(0x80 | 127);
        out.put_u64(len as u64);
    }
    out.put_slice(mask_key);
    for (i, &b) in payload.iter().enumerate() {
        out.put_u8(b ^ mask_key[i % 4]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncWriteExt};

    #[tokio::test]
    async fn short_text_frame_decoded() {
        let (a, mut b) = duplex(1024);
        let mut conn = Connection::from_stream(a);
        b.write_all(&[0x81, 0x05]).await.unwrap();
        b.write_all(b"hello").await.unwrap();
        let (frame, wire_len) = read_frame(&mut conn).await.unwrap();
        assert!(frame.fin);
        assert_eq!(frame.opcode, OP_TEXT);
        assert_eq!(frame.application_data(), b"hello");
        assert_eq!(wire_len, 7);
    }

    #[tokio::test]
    async fn extended_length_decoded() {
        let (a, mut b) = duplex(4096);
        let mut conn = Connection::from_stream(a);
        let payload = vec![0x42u8; 300];
        b.write_all(&[0x82, 126]).await.unwrap();
        b.write_all(&(300u16).to_be_bytes()).await.unwrap();
        b.write_all(&payload).await.unwrap();
        let (frame, wire_len) = read_frame(&mut conn).await.unwrap();
        assert_eq!(frame.opcode, OP_BINARY);
        assert_eq!(frame.payload.len(), 300);
        assert_eq!(wire_len, 304);
    }

    #[tokio::test]
    async fn masked_server_frame_rejected() {
        let (a, mut b) = duplex(64);
        let mut conn = Connection::from_stream(a);
        b.write_all(&[0x81, 0x85]).await.unwrap();
        let err = read_frame(&mut conn).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn oversized_control_frame_rejected() {
        let (a, mut b) = duplex(64);
        let mut conn = Connection::from_stream(a);
        b.write_all(&[0x88, 126]).await.unwrap();
        b.write_all(&(200u16).to_be_bytes()).await.unwrap();
        let err = read_frame(&mut conn).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn encode_masks_payload() {
        let mut out = BytesMut::new();
        encode_frame(OP_TEXT, b"hi", &[1, 2, 3, 4], &mut out).unwrap();
        assert_eq!(out[0], 0x81);
        assert_eq!(out[1], 0x80 | 2); // mask bit + length
        assert_eq!(&out[2..6], &[1, 2, 3, 4]);
        assert_eq!(out[6], b'h' ^ 1);
        assert_eq!(out[7], b'i' ^ 2);
    }
}
