// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Recorded request/response pair that plugins operate on.

use hyper::header::{HeaderName, HeaderValue};
use hyper::HeaderMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordEntry {
    pub request_method: String,
    pub request_uri: String,
    pub request_headers: HeaderMap,
    pub request_body: Option<String>,
    pub status_code: u16,
    pub response_headers: HeaderMap,
    pub response_body: Option<String>,
}

impl RecordEntry {
    pub fn new(method: &str, uri: &str) -> Self {
        Self {
            request_method: method.to_string(),
            request_uri: uri.to_string(),
            status_code: 200,
            ..Default::default()
        }
    }

    pub fn with_request_header(mut self, name: &str, value: &str) -> Self {
        insert_header(&mut self.request_headers, name, value);
        self
    }

    pub fn with_response_header(mut self, name: &str, value: &str) -> Self {
        insert_header(&mut self.response_headers, name, value);
        self
    }

    pub fn with_request_body(mut self, body: &str) -> Self {
        self.request_body = Some(body.to_string());
        self
    }

    pub fn with_response_body(mut self, body: &str) -> Self {
        self.response_body = Some(body.to_string());
        self
    }
}

/// Insert a header, silently skipping names or values that are not valid.
pub(crate) fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) {
    if let (Ok(n), Ok(v)) = (
        name.parse::<HeaderName>(),
        HeaderValue::from_str(value),
    ) {
        headers.insert(n, v);
    }
}
