//! App Users assigned to a project.

use crate::context::Defaults;
use crate::endpoints::{checked, fetch};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, Session};
use crate::types::{NewAppUser, ProjectAppUser};
use crate::url::urlformat;
use crate::validators;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectAppUserUrls {
    pub list: &'static str,
    pub post: &'static str,
}

impl Default for ProjectAppUserUrls {
    fn default() -> Self {
        Self {
            list: "projects/{project_id}/app-users",
            post: "projects/{project_id}/app-users",
        }
    }
}

pub struct ProjectAppUserService<'a, S: Session + ?Sized> {
    session: &'a S,
    defaults: &'a Defaults,
    urls: ProjectAppUserUrls,
}

impl<'a, S: Session + ?Sized> ProjectAppUserService<'a, S> {
    pub fn new(session: &'a S, defaults: &'a Defaults) -> Self {
        Self {
            session,
            defaults,
            urls: ProjectAppUserUrls::default(),
        }
    }

    pub fn with_urls(mut self, urls: ProjectAppUserUrls) -> Self {
        self.urls = urls;
        self
    }

    pub fn build_list(&self, project_id: Option<u64>) -> Result<HttpRequest, ApiError> {
        let pid = checked("project_app_users.list", self.defaults.project_id(project_id))?;
        Ok(HttpRequest::new(
            HttpMethod::Get,
            urlformat(self.urls.list, &[("project_id", &pid)]),
        ))
    }

    /// All App Users of the project, in server order.
    pub fn list(&self, project_id: Option<u64>) -> Result<Vec<ProjectAppUser>, ApiError> {
        fetch(self.session, &self.build_list(project_id)?)
    }

    pub fn build_create(
        &self,
        display_name: &str,
        project_id: Option<u64>,
    ) -> Result<HttpRequest, ApiError> {
        const OP: &str = "project_app_users.create";
        let pid = checked(OP, self.defaults.project_id(project_id))?;
        let display_name = checked(OP, validators::validate_str(display_name, "display_name"))?;
        let path = urlformat(self.urls.post, &[("project_id", &pid)]);
        HttpRequest::new(HttpMethod::Post, path).with_json(&NewAppUser {
            display_name: &display_name,
        })
    }

    /// Create an App User. The server assigns its id, token and creation time.
    pub fn create(
        &self,
        display_name: &str,
        project_id: Option<u64>,
    ) -> Result<ProjectAppUser, ApiError> {
        fetch(self.session, &self.build_create(display_name, project_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedSession;
    use serde_json::json;

    fn user(id: u64, name: &str) -> serde_json::Value {
        json!({
            "projectId": 1,
            "id": id,
            "displayName": name,
            "createdAt": "2024-03-02T08:00:00.000Z",
            "type": "field_key",
            "token": "abc",
            "updatedAt": null,
            "deletedAt": null
        })
    }

    #[test]
    fn list_preserves_server_order() {
        let session = ScriptedSession::new().respond(200, json!([user(9, "Zed"), user(3, "Amy")]));
        let defaults = Defaults::new().with_project_id(1);
        let svc = ProjectAppUserService::new(&session, &defaults);

        let users = svc.list(None).unwrap();
        assert_eq!(users.iter().map(|u| u.id).collect::<Vec<_>>(), vec![9, 3]);
        assert_eq!(session.requests()[0].path, "projects/1/app-users");
        assert_eq!(session.requests()[0].method, HttpMethod::Get);
    }

    #[test]
    fn create_sends_display_name() {
        let session = ScriptedSession::new().respond(200, user(115, "Surveyor"));
        let defaults = Defaults::new();
        let svc = ProjectAppUserService::new(&session, &defaults);

        let created = svc.create("Surveyor", Some(1)).unwrap();
        assert_eq!(created.id, 115);
        assert_eq!(created.display_name, "Surveyor");

        let req = &session.requests()[0];
        assert_eq!(req.method, HttpMethod::Post);
        let body: serde_json::Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"displayName": "Surveyor"}));
    }

    #[test]
    fn explicit_project_overrides_default() {
        let session = ScriptedSession::new().respond(200, json!([]));
        let defaults = Defaults::new().with_project_id(1);
        let svc = ProjectAppUserService::new(&session, &defaults);
        assert!(svc.list(Some(4)).unwrap().is_empty());
        assert_eq!(session.requests()[0].path, "projects/4/app-users");
    }

    #[test]
    fn custom_urls_are_used() {
        let defaults = Defaults::new().with_project_id(1);
        let session = ScriptedSession::new();
        let svc = ProjectAppUserService::new(&session, &defaults).with_urls(ProjectAppUserUrls {
            list: "proxy/projects/{project_id}/app-users",
            ..ProjectAppUserUrls::default()
        });
        assert_eq!(svc.build_list(None).unwrap().path, "proxy/projects/1/app-users");
    }

    #[test]
    fn create_without_name_never_calls_server() {
        let session = ScriptedSession::new();
        let defaults = Defaults::new().with_project_id(1);
        let svc = ProjectAppUserService::new(&session, &defaults);
        assert!(svc.create("", None).unwrap_err().is_validation());
        assert!(session.requests().is_empty());
    }
}
