//! Entity List (dataset) properties.

use crate::context::Defaults;
use crate::endpoints::{checked, fetch};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, Session};
use crate::types::{NewProperty, Success};
use crate::url::urlformat;
use crate::validators;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityListPropertyUrls {
    pub post: &'static str,
}

impl Default for EntityListPropertyUrls {
    fn default() -> Self {
        Self {
            post: "projects/{project_id}/datasets/{entity_list_name}/properties",
        }
    }
}

pub struct EntityListPropertyService<'a, S: Session + ?Sized> {
    session: &'a S,
    defaults: &'a Defaults,
    urls: EntityListPropertyUrls,
}

impl<'a, S: Session + ?Sized> EntityListPropertyService<'a, S> {
    pub fn new(session: &'a S, defaults: &'a Defaults) -> Self {
        Self {
            session,
            defaults,
            urls: EntityListPropertyUrls::default(),
        }
    }

    pub fn with_urls(mut self, urls: EntityListPropertyUrls) -> Self {
        self.urls = urls;
        self
    }

    pub fn build_create(
        &self,
        name: &str,
        entity_list_name: Option<&str>,
        project_id: Option<u64>,
    ) -> Result<HttpRequest, ApiError> {
        const OP: &str = "entity_list_properties.create";
        let pid = checked(OP, self.defaults.project_id(project_id))?;
        let eln = checked(OP, self.defaults.entity_list_name(entity_list_name))?;
        let name = checked(OP, validators::validate_str(name, "name"))?;
        let path = urlformat(self.urls.post, &[("project_id", &pid), ("entity_list_name", &eln)]);
        HttpRequest::new(HttpMethod::Post, path).with_json(&NewProperty { name: &name })
    }

    /// Create a property on an Entity List and report the server's `success` flag.
    ///
    /// Property names follow form field naming rules; the server rejects
    /// `name`, `label` and names starting with `__`.
    pub fn create(
        &self,
        name: &str,
        entity_list_name: Option<&str>,
        project_id: Option<u64>,
    ) -> Result<bool, ApiError> {
        let request = self.build_create(name, entity_list_name, project_id)?;
        let ack: Success = fetch(self.session, &request)?;
        Ok(ack.success)
    }
}
