//! Error types for the Central API client.
//!
//! # Design
//! One enum covers every failure a caller can see. `Validation` is raised
//! before any network call and names the offending field. `Http` and
//! `Transport` come from the session and are propagated unchanged. `Workflow`
//! is reserved for compound submission operations where a later step cannot
//! proceed after earlier steps already changed server state.

use std::path::PathBuf;

use thiserror::Error;

/// What kind of input a validator rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    /// A project, form, entity list, instance or table identifier.
    InvalidIdentifier,
    /// Any other scalar parameter (display name, comment text, device id).
    InvalidParameter,
    /// A file path that does not name a readable file.
    InvalidPath,
}

/// Errors returned by services, sessions and config loading.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A caller-supplied identifier or parameter was missing or malformed.
    #[error("{field}: {reason}")]
    Validation {
        field: &'static str,
        kind: ValidationKind,
        reason: String,
    },

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} from {url}: {body}")]
    Http { status: u16, url: String, body: String },

    /// The request never produced a response.
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// A compound operation stopped part way through.
    #[error("{0}")]
    Workflow(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Text could not be represented in the requested encoding.
    #[error("cannot encode text as {encoding}: {reason}")]
    Encoding { encoding: &'static str, reason: String },

    /// A local file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The client configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    pub(crate) fn invalid(
        field: &'static str,
        kind: ValidationKind,
        reason: impl Into<String>,
    ) -> Self {
        ApiError::Validation {
            field,
            kind,
            reason: reason.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation { .. })
    }

    /// HTTP status of a server rejection, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
