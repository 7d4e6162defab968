//! Comments on a submission.

use crate::context::{Defaults, FormScope, ResolvedForm};
use crate::endpoints::{checked, fetch};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, Session};
use crate::types::{Comment, NewComment};
use crate::url::{submission_path, urlformat};
use crate::validators;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentUrls {
    pub list: &'static str,
    pub post: &'static str,
}

impl Default for CommentUrls {
    fn default() -> Self {
        Self {
            list: concat!(submission_path!(), "/comments"),
            post: concat!(submission_path!(), "/comments"),
        }
    }
}

pub struct CommentService<'a, S: Session + ?Sized> {
    session: &'a S,
    defaults: &'a Defaults,
    urls: CommentUrls,
}

impl<'a, S: Session + ?Sized> CommentService<'a, S> {
    pub fn new(session: &'a S, defaults: &'a Defaults) -> Self {
        Self {
            session,
            defaults,
            urls: CommentUrls::default(),
        }
    }

    pub fn with_urls(mut self, urls: CommentUrls) -> Self {
        self.urls = urls;
        self
    }

    /// All comments on a submission, oldest first.
    pub fn list(&self, instance_id: &str, scope: FormScope<'_>) -> Result<Vec<Comment>, ApiError> {
        const OP: &str = "comments.list";
        let form = checked(OP, self.defaults.form(scope))?;
        let iid = checked(OP, validators::validate_instance_id(instance_id))?;
        let request = HttpRequest::new(HttpMethod::Get, self.path(self.urls.list, &form, &iid));
        fetch(self.session, &request)
    }

    pub fn post(
        &self,
        comment: &str,
        instance_id: &str,
        scope: FormScope<'_>,
    ) -> Result<Comment, ApiError> {
        let form = checked("comments.post", self.defaults.form(scope))?;
        self.post_to(&form, instance_id, comment)
    }

    /// Post against an already-resolved form. Used by compound submission
    /// operations that resolved the form for an earlier step.
    pub(crate) fn post_to(
        &self,
        form: &ResolvedForm,
        instance_id: &str,
        comment: &str,
    ) -> Result<Comment, ApiError> {
        const OP: &str = "comments.post";
        let iid = checked(OP, validators::validate_instance_id(instance_id))?;
        let body = checked(OP, validators::validate_str(comment, "comment"))?;
        let request = HttpRequest::new(HttpMethod::Post, self.path(self.urls.post, form, &iid))
            .with_json(&NewComment { body: &body })?;
        fetch(self.session, &request)
    }

    fn path(&self, template: &str, form: &ResolvedForm, instance_id: &str) -> String {
        urlformat(
            template,
            &[
                ("project_id", &form.project_id),
                ("form_id", &form.form_id),
                ("instance_id", &instance_id),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedSession;
    use serde_json::json;

    #[test]
    fn list_maps_comments() {
        let session = ScriptedSession::new().respond(
            200,
            json!([{"body": "Looks good", "actorId": 42, "createdAt": "2024-01-01T00:00:00Z"}]),
        );
        let defaults = Defaults::new().with_project_id(1).with_form_id("household");
        let svc = CommentService::new(&session, &defaults);

        let comments = svc.list("uuid:1", FormScope::new()).unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].actor_id, 42);
        assert_eq!(
            session.requests()[0].path,
            "projects/1/forms/household/submissions/uuid%3A1/comments"
        );
    }

    #[test]
    fn post_sends_body() {
        let session = ScriptedSession::new().respond(
            200,
            json!({"body": "Check GPS", "actorId": 1, "createdAt": "2024-01-01T00:00:00Z"}),
        );
        let defaults = Defaults::new();
        let svc = CommentService::new(&session, &defaults);

        let comment = svc
            .post("Check GPS", "uuid:1", FormScope::new().project(3).form("visit"))
            .unwrap();
        assert_eq!(comment.body, "Check GPS");
        let req = &session.requests()[0];
        assert_eq!(req.method, HttpMethod::Post);
        let body: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"body": "Check GPS"}));
    }

    #[test]
    fn empty_comment_rejected() {
        let session = ScriptedSession::new();
        let defaults = Defaults::new().with_project_id(1).with_form_id("f");
        let svc = CommentService::new(&session, &defaults);
        let err = svc.post("", "uuid:1", FormScope::new()).unwrap_err();
        assert!(matches!(err, ApiError::Validation { field: "comment", .. }));
        assert!(session.requests().is_empty());
    }
}
