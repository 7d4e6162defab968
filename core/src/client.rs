//! Entry point tying one session to one set of default identifiers.
//!
//! # Design
//! `CentralClient` owns the session and the `Defaults`; each accessor hands
//! out a lightweight service borrowing both. Defaults cannot change after
//! construction, so every call made through a client sees the same ones.

use std::time::Duration;

use crate::config::CentralConfig;
use crate::context::Defaults;
use crate::endpoints::comments::CommentService;
use crate::endpoints::entity_list_properties::EntityListPropertyService;
use crate::endpoints::project_app_users::ProjectAppUserService;
use crate::endpoints::submission_attachments::SubmissionAttachmentService;
use crate::endpoints::submissions::SubmissionService;
use crate::error::ApiError;
use crate::http::Session;
use crate::session::UreqSession;

pub struct CentralClient<S: Session> {
    session: S,
    defaults: Defaults,
}

impl<S: Session> CentralClient<S> {
    pub fn new(session: S, defaults: Defaults) -> Self {
        Self { session, defaults }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    pub fn submissions(&self) -> SubmissionService<'_, S> {
        SubmissionService::new(&self.session, &self.defaults)
    }

    pub fn submission_attachments(&self) -> SubmissionAttachmentService<'_, S> {
        SubmissionAttachmentService::new(&self.session, &self.defaults)
    }

    pub fn comments(&self) -> CommentService<'_, S> {
        CommentService::new(&self.session, &self.defaults)
    }

    pub fn project_app_users(&self) -> ProjectAppUserService<'_, S> {
        ProjectAppUserService::new(&self.session, &self.defaults)
    }

    pub fn entity_list_properties(&self) -> EntityListPropertyService<'_, S> {
        EntityListPropertyService::new(&self.session, &self.defaults)
    }
}

impl CentralClient<UreqSession> {
    /// Build a ureq-backed client from a loaded config.
    pub fn from_config(config: &CentralConfig) -> Result<Self, ApiError> {
        if config.base_url.trim().is_empty() {
            return Err(ApiError::Config("base_url must not be empty".to_string()));
        }
        let mut session = UreqSession::new(&config.base_url);
        if let Some(token) = &config.token {
            session = session.with_token(token.clone());
        }
        if let Some(secs) = config.timeout_secs {
            session = session.with_timeout(Duration::from_secs(secs));
        }
        tracing::info!(base_url = %config.base_url, "central client ready");
        Ok(Self::new(session, config.defaults()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FormScope;
    use crate::testing::ScriptedSession;
    use serde_json::json;

    #[test]
    fn services_share_client_defaults() {
        let session = ScriptedSession::new()
            .respond(200, json!([]))
            .respond(200, json!([]));
        let defaults = Defaults::new().with_project_id(4).with_form_id("visit");
        let client = CentralClient::new(session, defaults);

        client.project_app_users().list(None).unwrap();
        client.submissions().list(FormScope::new()).unwrap();

        let paths: Vec<_> = client.session().requests().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["projects/4/app-users", "projects/4/forms/visit/submissions"]);
    }

    #[test]
    fn from_config_copies_defaults() {
        let config = CentralConfig::from_toml_str(
            "[central]\n\
             base_url = \"http://localhost:8383\"\n\
             default_project_id = 2\n\
             timeout_secs = 5\n",
        )
        .unwrap();
        let client = CentralClient::from_config(&config).unwrap();
        assert_eq!(client.defaults().project_id, Some(2));
        assert_eq!(
            client.session().url_for("projects/2"),
            "http://localhost:8383/v1/projects/2"
        );
    }
}
