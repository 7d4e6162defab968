//! HTTP request/response types and the `Session` capability.
//!
//! # Design
//! Requests and responses are plain data. Services build `HttpRequest`
//! values with relative paths (`projects/1/app-users`); a `Session` turns
//! them into network round-trips. Keeping the two apart lets callers run
//! their own I/O with the `build_*` methods and lets tests script responses
//! without a server.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `path` is relative to the API root of the session executing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Attach a raw body together with its content type.
    pub fn with_body(self, content_type: &str, body: Vec<u8>) -> Self {
        let mut req = self.with_header("content-type", content_type);
        req.body = Some(body);
        req
    }

    pub fn with_json<T: Serialize>(self, payload: &T) -> Result<Self, ApiError> {
        let body = serde_json::to_vec(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(self.with_body("application/json", body))
    }

    /// Value of the first header matching `key`, compared case-insensitively.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// Body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Executes requests against the remote service.
///
/// Implementors only provide `execute`, which must return any response the
/// server produced (including 4xx/5xx) and reserve `Err` for transport
/// failures. `response_or_error` is what the services call.
pub trait Session {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;

    /// Execute `request` and turn any non-2xx status into `ApiError::Http`.
    fn response_or_error(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        tracing::debug!(method = %request.method, path = %request.path, "sending request");
        let response = self.execute(request)?;
        if response.is_success() {
            return Ok(response);
        }
        tracing::error!(
            method = %request.method,
            path = %request.path,
            status = response.status,
            "request rejected by server"
        );
        Err(ApiError::Http {
            status: response.status,
            url: request.path.clone(),
            body: response.text(),
        })
    }
}

impl<S: Session + ?Sized> Session for &S {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}
