//! Identifier and parameter validation.
//!
//! Every identifier validator follows the same rule: an explicit value wins
//! over the default, and the resolved value must be present and well formed.
//! An explicit empty string is rejected rather than replaced by the default.

use std::path::{Path, PathBuf};

use crate::error::{ApiError, ValidationKind};

pub fn validate_project_id(value: Option<u64>, default: Option<u64>) -> Result<u64, ApiError> {
    match value.or(default) {
        Some(0) => Err(ApiError::invalid(
            "project_id",
            ValidationKind::InvalidIdentifier,
            "must be a positive integer",
        )),
        Some(id) => Ok(id),
        None => Err(ApiError::invalid(
            "project_id",
            ValidationKind::InvalidIdentifier,
            "no value given and no default set",
        )),
    }
}

pub fn validate_form_id(value: Option<&str>, default: Option<&str>) -> Result<String, ApiError> {
    resolve_identifier("form_id", value, default)
}

pub fn validate_entity_list_name(
    value: Option<&str>,
    default: Option<&str>,
) -> Result<String, ApiError> {
    resolve_identifier("entity_list_name", value, default)
}

pub fn validate_table_name(value: Option<&str>, default: Option<&str>) -> Result<String, ApiError> {
    resolve_identifier("table_name", value, default)
}

/// Instance ids have no default; the caller always names the submission.
pub fn validate_instance_id(value: &str) -> Result<String, ApiError> {
    resolve_identifier("instance_id", Some(value), None)
}

/// Generic non-empty string check; errors are reported against `key`.
pub fn validate_str(value: &str, key: &'static str) -> Result<String, ApiError> {
    if value.is_empty() {
        return Err(ApiError::invalid(key, ValidationKind::InvalidParameter, "must not be empty"));
    }
    Ok(value.to_string())
}

/// The path must name an existing regular file with a file-name component.
pub fn validate_file_path(path: &Path) -> Result<PathBuf, ApiError> {
    if path.file_name().is_none() {
        return Err(ApiError::invalid(
            "file_path",
            ValidationKind::InvalidPath,
            format!("{} has no file name", path.display()),
        ));
    }
    if !path.is_file() {
        return Err(ApiError::invalid(
            "file_path",
            ValidationKind::InvalidPath,
            format!("{} is not an existing file", path.display()),
        ));
    }
    Ok(path.to_path_buf())
}

fn resolve_identifier(
    field: &'static str,
    value: Option<&str>,
    default: Option<&str>,
) -> Result<String, ApiError> {
    match value.or(default) {
        Some("") => Err(ApiError::invalid(
            field,
            ValidationKind::InvalidIdentifier,
            "must not be empty",
        )),
        Some(v) => Ok(v.to_string()),
        None => Err(ApiError::invalid(
            field,
            ValidationKind::InvalidIdentifier,
            "no value given and no default set",
        )),
    }
}
