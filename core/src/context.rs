//! Default identifiers and per-call form scope.
//!
//! # Design
//! `Defaults` is built once per client and never mutated afterwards; services
//! borrow it. A call names the form it targets with a `FormScope`, whose
//! unset fields fall back to the defaults when resolved into a
//! `ResolvedForm`. Compound operations resolve once and hand the
//! `ResolvedForm` to every step, so all steps hit the same project and form.

use crate::error::ApiError;
use crate::validators;

/// Identifiers used when a call does not name its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Defaults {
    pub project_id: Option<u64>,
    pub form_id: Option<String>,
    pub entity_list_name: Option<String>,
}

impl Defaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project_id(mut self, project_id: u64) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_form_id(mut self, form_id: impl Into<String>) -> Self {
        self.form_id = Some(form_id.into());
        self
    }

    pub fn with_entity_list_name(mut self, name: impl Into<String>) -> Self {
        self.entity_list_name = Some(name.into());
        self
    }

    pub fn project_id(&self, explicit: Option<u64>) -> Result<u64, ApiError> {
        validators::validate_project_id(explicit, self.project_id)
    }

    pub fn entity_list_name(&self, explicit: Option<&str>) -> Result<String, ApiError> {
        validators::validate_entity_list_name(explicit, self.entity_list_name.as_deref())
    }

    /// Resolve a form scope against these defaults, project first.
    pub fn form(&self, scope: FormScope<'_>) -> Result<ResolvedForm, ApiError> {
        Ok(ResolvedForm {
            project_id: self.project_id(scope.project_id)?,
            form_id: validators::validate_form_id(scope.form_id, self.form_id.as_deref())?,
        })
    }
}

/// Project and form named by a single call. Unset fields use the defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormScope<'a> {
    pub project_id: Option<u64>,
    pub form_id: Option<&'a str>,
}

impl<'a> FormScope<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(mut self, project_id: u64) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn form(mut self, form_id: &'a str) -> Self {
        self.form_id = Some(form_id);
        self
    }
}

/// A validated project/form pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedForm {
    pub project_id: u64,
    pub form_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_overrides_defaults_field_by_field() {
        let defaults = Defaults::new().with_project_id(1).with_form_id("household");
        let form = defaults.form(FormScope::new().form("visit")).unwrap();
        assert_eq!(
            form,
            ResolvedForm {
                project_id: 1,
                form_id: "visit".to_string()
            }
        );
        let form = defaults.form(FormScope::new().project(9)).unwrap();
        assert_eq!(form.project_id, 9);
        assert_eq!(form.form_id, "household");
    }

    #[test]
    fn missing_project_reported_before_form() {
        let err = Defaults::new().form(FormScope::new()).unwrap_err();
        assert!(matches!(err, ApiError::Validation { field: "project_id", .. }));
    }

    #[test]
    fn entity_list_name_uses_default() {
        let defaults = Defaults::new().with_entity_list_name("trees");
        assert_eq!(defaults.entity_list_name(None).unwrap(), "trees");
        assert_eq!(defaults.entity_list_name(Some("birds")).unwrap(), "birds");
        assert!(Defaults::new().entity_list_name(None).is_err());
    }
}
