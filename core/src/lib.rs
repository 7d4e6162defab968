//! Typed, blocking client for the ODK Central REST API.
//!
//! # Overview
//! Each endpoint service wraps one resource family (submissions, comments,
//! submission attachments, project app users, entity list properties). A
//! call validates identifiers, fills a URL template, runs the request
//! through a `Session`, and maps the JSON into a typed record.
//!
//! # Design
//! - Requests and responses are plain data (`HttpRequest`, `HttpResponse`).
//!   Any `Session` can execute them; `UreqSession` is the bundled one.
//! - Default project, form and entity list ids live in an immutable
//!   `Defaults` owned by `CentralClient`. An explicit argument always wins
//!   over the default.
//! - Submission create/edit/review chain several calls without rollback;
//!   see `endpoints::submissions`.

pub mod client;
pub mod config;
pub mod context;
pub mod encoding;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod session;
pub mod types;
pub mod url;
pub mod validators;

#[cfg(test)]
pub(crate) mod testing;

pub use client::CentralClient;
pub use config::CentralConfig;
pub use context::{Defaults, FormScope, ResolvedForm};
pub use encoding::XmlEncoding;
pub use endpoints::comments::CommentService;
pub use endpoints::entity_list_properties::EntityListPropertyService;
pub use endpoints::project_app_users::ProjectAppUserService;
pub use endpoints::submission_attachments::SubmissionAttachmentService;
pub use endpoints::submissions::{NewSubmission, SubmissionService, TableQuery};
pub use error::{ApiError, ValidationKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Session};
pub use session::UreqSession;
pub use types::{Comment, EntityListProperty, ProjectAppUser, Submission, SubmissionAttachment};
