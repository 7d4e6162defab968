//! One service per REST resource family.
//!
//! Every operation runs the same pipeline: resolve and validate inputs
//! (`checked`), fill a URL template, execute through the session
//! (`fetch`), map the JSON. Each service exposes the request-building half
//! as public `build_*` methods so callers can run their own I/O.

pub mod comments;
pub mod entity_list_properties;
pub mod project_app_users;
pub mod submission_attachments;
pub mod submissions;

use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::http::{HttpRequest, Session};

/// Log validation failures of `operation` before handing them back.
pub(crate) fn checked<T>(
    operation: &'static str,
    result: Result<T, ApiError>,
) -> Result<T, ApiError> {
    result.inspect_err(|err| {
        tracing::error!(operation, error = %err, "invalid request parameters")
    })
}

/// Execute `request` and decode the JSON body as `T`.
pub(crate) fn fetch<T, S>(session: &S, request: &HttpRequest) -> Result<T, ApiError>
where
    T: DeserializeOwned,
    S: Session + ?Sized,
{
    session.response_or_error(request)?.json()
}
