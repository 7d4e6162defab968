//! URL templates with named `{placeholder}` segments.
//!
//! Form-scoped templates are assembled with `concat!` from the single
//! `form_path!` fragment, so every submission, comment and attachment route
//! changes together when the prefix does.

use std::fmt;

/// Path of a form within a project. The only place this prefix is spelled.
macro_rules! form_path {
    () => {
        "projects/{project_id}/forms/{form_id}"
    };
}

/// Path of one submission within a form.
macro_rules! submission_path {
    () => {
        concat!(crate::url::form_path!(), "/submissions/{instance_id}")
    };
}

pub(crate) use form_path;
pub(crate) use submission_path;

/// Fill the `{name}` placeholders of `template` from `values`.
///
/// Each value is percent-encoded as a single path segment.
///
/// # Panics
/// Panics if the template names a placeholder with no value, or the value
/// renders empty. Services validate identifiers before building URLs, so
/// either case is a bug in the caller.
pub fn urlformat(template: &str, values: &[(&str, &dyn fmt::Display)]) -> String {
    let mut out = String::with_capacity(template.len() + 32);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .unwrap_or_else(|| panic!("unterminated placeholder in url template {template:?}"));
        let name = &after[..close];
        let value = values
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
            .unwrap_or_else(|| panic!("url template {template:?} has no value for {{{name}}}"));
        assert!(!value.is_empty(), "url template {template:?} got an empty value for {{{name}}}");
        out.push_str(&urlencoding::encode(&value));
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}
