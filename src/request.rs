/*
 * request.rs
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

//! HTTP request: method, path, headers, optional upload payload.
//!
//! The transport engine only needs the contract exposed here: the request
//! line, the header block as a string, and the upload/stream flags that
//! decide how (and whether) a body goes out on the wire.

use std::collections::HashMap;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
    Other(&'static str),
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
            Method::Other(s) => s,
        }
    }
}

/// One HTTP request to send. Header names are stored as given.
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    /// HTTP version for the request line, normally "1.1".
    pub version: String,
    headers: HashMap<String, String>,
    body: Option<Vec<u8>>,
    is_stream: bool,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            version: "1.1".to_string(),
            headers: HashMap::new(),
            body: None,
            is_stream: false,
        }
    }

    /// The first line of the request, without its terminator.
    pub fn request_line(&self) -> String {
        format!("{} {} HTTP/{}", self.method.as_str(), self.path, self.version)
    }

    /// Builder-style header. Overwrites any prior value for that name.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add or replace a header on an existing request. Used by the engine and
    /// by framings that need protocol-specific headers.
    pub fn with_extra_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    /// Exact-name header lookup.
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Set the upload payload. The request becomes an upload; the engine
    /// computes Content-Length from this unless the request is streamed.
    pub fn body(mut self, data: Vec<u8>) -> Self {
        self.body = Some(data);
        self
    }

    /// Mark the payload as streamed: content goes out via the framing's
    /// `send_content` and no Content-Length is advertised.
    pub fn set_stream(&mut self, is_stream: bool) {
        self.is_stream = is_stream;
    }

    pub fn is_stream(&self) -> bool {
        self.is_stream
    }

    /// Does this request carry an upload payload?
    pub fn is_upload(&self) -> bool {
        self.body.is_some() || self.is_stream
    }

    pub fn get_body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// The full header block, one `Name: value\r\n` per header, or None when
    /// there are no headers to send.
    pub fn headers_string(&self) -> Option<String> {
        if self.headers.is_empty() {
            return None;
        }
        let mut out = String::new();
        for (name, value) in &self.headers {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push_str("\r\n");
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_line_format() {
        let req = HttpRequest::new(Method::Get, "/index.html");
        assert_eq!(req.request_line(), "GET /index.html HTTP/1.1");
    }

    #[test]
    fn headers_string_lines() {
        let req = HttpRequest::new(Method::Post, "/submit").with_header("Host", "example.com");
        let headers = req.headers_string().unwrap();
        assert_eq!(headers, "Host: example.com\r\n");
        assert!(req.has_header("Host"));
        assert!(!req.has_header("host"));
    }

    #[test]
    fn empty_header_block_is_none() {
        let req = HttpRequest::new(Method::Get, "/");
        assert!(req.headers_string().is_none());
    }

    #[test]
    fn body_marks_upload() {
        let req = HttpRequest::new(Method::Post, "/submit").body(b"a=b".to_vec());
        assert!(req.is_upload());
        assert!(!req.is_stream());
        assert_eq!(req.get_body().unwrap(), b"a=b");

        let mut streamed = HttpRequest::new(Method::Post, "/stream");
        streamed.set_stream(true);
        assert!(streamed.is_upload());
        assert!(streamed.get_body().is_none());
    }
}
