//! Files attached to a submission.
//!
//! Attachment names must match file names referenced in the submission XML;
//! the server rejects uploads it does not expect. Only the file-name part of
//! a local path is sent.

use std::path::Path;

use crate::context::{Defaults, FormScope, ResolvedForm};
use crate::endpoints::{checked, fetch};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, Session};
use crate::types::{SubmissionAttachment, Success};
use crate::url::{submission_path, urlformat};
use crate::validators;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionAttachmentUrls {
    pub list: &'static str,
    pub get: &'static str,
    pub post: &'static str,
}

impl Default for SubmissionAttachmentUrls {
    fn default() -> Self {
        Self {
            list: concat!(submission_path!(), "/attachments"),
            get: concat!(submission_path!(), "/attachments/{file_name}"),
            post: concat!(submission_path!(), "/attachments/{file_name}"),
        }
    }
}

pub struct SubmissionAttachmentService<'a, S: Session + ?Sized> {
    session: &'a S,
    defaults: &'a Defaults,
    urls: SubmissionAttachmentUrls,
}

impl<'a, S: Session + ?Sized> SubmissionAttachmentService<'a, S> {
    pub fn new(session: &'a S, defaults: &'a Defaults) -> Self {
        Self {
            session,
            defaults,
            urls: SubmissionAttachmentUrls::default(),
        }
    }

    pub fn with_urls(mut self, urls: SubmissionAttachmentUrls) -> Self {
        self.urls = urls;
        self
    }

    /// Expected attachments of a submission and whether each was uploaded.
    pub fn list(
        &self,
        instance_id: &str,
        scope: FormScope<'_>,
    ) -> Result<Vec<SubmissionAttachment>, ApiError> {
        let form = checked("submission_attachments.list", self.defaults.form(scope))?;
        self.list_for(&form, instance_id)
    }

    pub(crate) fn list_for(
        &self,
        form: &ResolvedForm,
        instance_id: &str,
    ) -> Result<Vec<SubmissionAttachment>, ApiError> {
        let iid = validators::validate_instance_id(instance_id);
        let iid = checked("submission_attachments.list", iid)?;
        let path = urlformat(
            self.urls.list,
            &[
                ("project_id", &form.project_id),
                ("form_id", &form.form_id),
                ("instance_id", &iid),
            ],
        );
        fetch(self.session, &HttpRequest::new(HttpMethod::Get, path))
    }

    /// Download the raw bytes of one attachment.
    pub fn get(
        &self,
        file_name: &str,
        instance_id: &str,
        scope: FormScope<'_>,
    ) -> Result<Vec<u8>, ApiError> {
        const OP: &str = "submission_attachments.get";
        let form = checked(OP, self.defaults.form(scope))?;
        let iid = checked(OP, validators::validate_instance_id(instance_id))?;
        let file_name = checked(OP, validators::validate_str(file_name, "file_name"))?;
        let path = self.file_path(self.urls.get, &form, &iid, &file_name);
        let response = self.session.response_or_error(&HttpRequest::new(HttpMethod::Get, path))?;
        Ok(response.body)
    }

    /// Upload a local file as an attachment, named by its file-name component.
    ///
    /// The whole file is read into memory and sent as a single request body,
    /// so peak memory grows with the file size. Large media (video, audio)
    /// should be checked against available memory before calling this.
    ///
    /// Returns the server's `success` flag.
    pub fn upload(
        &self,
        file_path: &Path,
        instance_id: &str,
        scope: FormScope<'_>,
    ) -> Result<bool, ApiError> {
        let form = checked("submission_attachments.upload", self.defaults.form(scope))?;
        self.upload_to(&form, instance_id, file_path)
    }

    pub(crate) fn upload_to(
        &self,
        form: &ResolvedForm,
        instance_id: &str,
        file_path: &Path,
    ) -> Result<bool, ApiError> {
        const OP: &str = "submission_attachments.upload";
        let iid = checked(OP, validators::validate_instance_id(instance_id))?;
        let file_path = checked(OP, validators::validate_file_path(file_path))?;
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = std::fs::read(&file_path).map_err(|source| ApiError::Io {
            path: file_path.clone(),
            source,
        })?;
        tracing::debug!(
            file = %file_name,
            size = bytes.len(),
            instance_id = %iid,
            "uploading attachment"
        );
        let path = self.file_path(self.urls.post, form, &iid, &file_name);
        let request =
            HttpRequest::new(HttpMethod::Post, path).with_body("application/octet-stream", bytes);
        let ack: Success = fetch(self.session, &request)?;
        Ok(ack.success)
    }

    fn file_path(
        &self,
        template: &str,
        form: &ResolvedForm,
        instance_id: &str,
        file_name: &str,
    ) -> String {
        urlformat(
            template,
            &[
                ("project_id", &form.project_id),
                ("form_id", &form.form_id),
                ("instance_id", &instance_id),
                ("file_name", &file_name),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedSession;
    use serde_json::json;

    fn defaults() -> Defaults {
        Defaults::new().with_project_id(1).with_form_id("birds")
    }

    #[test]
    fn list_maps_attachments() {
        let session = ScriptedSession::new().respond(
            200,
            json!([{"name": "pigeon.jpg", "exists": true}, {"name": "song.mp3", "exists": false}]),
        );
        let defaults = defaults();
        let svc = SubmissionAttachmentService::new(&session, &defaults);

        let list = svc.list("uuid:1", FormScope::new()).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list[0].exists);
        assert!(!list[1].exists);
        assert_eq!(
            session.requests()[0].path,
            "projects/1/forms/birds/submissions/uuid%3A1/attachments"
        );
    }

    #[test]
    fn upload_sends_file_name_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pigeon.jpg");
        std::fs::write(&file, b"\xFF\xD8jpeg").unwrap();

        let session = ScriptedSession::new().respond(200, json!({"success": true}));
        let defaults = defaults();
        let svc = SubmissionAttachmentService::new(&session, &defaults);

        assert!(svc.upload(&file, "uuid:1", FormScope::new()).unwrap());
        let req = &session.requests()[0];
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(
            req.path,
            "projects/1/forms/birds/submissions/uuid%3A1/attachments/pigeon.jpg"
        );
        assert_eq!(req.header("content-type"), Some("application/octet-stream"));
        assert_eq!(req.body.as_deref(), Some(&b"\xFF\xD8jpeg"[..]));
    }

    #[test]
    fn upload_sends_large_file_as_one_body() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("clip.mp4");
        let content: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&file, &content).unwrap();

        let session = ScriptedSession::new().respond(200, json!({"success": true}));
        let defaults = defaults();
        let svc = SubmissionAttachmentService::new(&session, &defaults);

        assert!(svc.upload(&file, "uuid:1", FormScope::new()).unwrap());
        let requests = session.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].body.as_deref(), Some(content.as_slice()));
    }

    #[test]
    fn upload_missing_file_is_validation_error() {
        let session = ScriptedSession::new();
        let defaults = defaults();
        let svc = SubmissionAttachmentService::new(&session, &defaults);

        let err = svc
            .upload(Path::new("/definitely/not/here.jpg"), "uuid:1", FormScope::new())
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { field: "file_path", .. }));
        assert!(session.requests().is_empty());
    }

    #[test]
    fn get_returns_raw_bytes() {
        let session = ScriptedSession::new().respond(200, json!("raw"));
        let defaults = defaults();
        let svc = SubmissionAttachmentService::new(&session, &defaults);

        let bytes = svc.get("pigeon.jpg", "uuid:1", FormScope::new()).unwrap();
        assert_eq!(bytes, b"\"raw\"".to_vec());
    }
}
