//! Resource records returned by the API, plus the small request payloads.
//!
//! # Design
//! Field names follow Rust conventions and map to the service's camelCase
//! JSON through serde. Timestamps parse into `DateTime<Utc>`. Optional
//! fields default to `None` when the server omits them, and unknown fields
//! are ignored so newer servers stay readable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A property of an Entity List (dataset).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EntityListProperty {
    pub name: String,
    pub odata_name: String,
    pub published_at: DateTime<Utc>,
    pub forms: Vec<String>,
}

/// An App User assigned to a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAppUser {
    pub project_id: u64,
    pub id: u64,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    /// One of `user`, `field_key`, `public_link`, `singleUse`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Metadata of one submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub instance_id: String,
    pub submitter_id: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub device_id: Option<String>,
    /// `None`, or one of `edited`, `hasIssues`, `rejected`, `approved`.
    #[serde(default)]
    pub review_state: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub instance_name: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attachments: Option<Vec<SubmissionAttachment>>,
}

/// A file a submission expects, and whether it has been uploaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionAttachment {
    pub name: String,
    pub exists: bool,
}

/// A comment left on a submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub body: String,
    pub actor_id: u64,
    pub created_at: DateTime<Utc>,
}

/// `{"success": bool}` acknowledgement returned by several endpoints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Success {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct NewProperty<'a> {
    pub name: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewAppUser<'a> {
    pub display_name: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReviewUpdate<'a> {
    pub review_state: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct NewComment<'a> {
    pub body: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn submission_optional_fields_default_to_none() {
        let sub: Submission = serde_json::from_str(
            r#"{"instanceId":"uuid:1","submitterId":23,"createdAt":"2018-01-19T23:58:03.395Z"}"#,
        )
        .unwrap();
        assert_eq!(sub.instance_id, "uuid:1");
        assert_eq!(sub.submitter_id, 23);
        assert_eq!(
            sub.created_at,
            Utc.with_ymd_and_hms(2018, 1, 19, 23, 58, 3).unwrap()
                + chrono::Duration::milliseconds(395)
        );
        assert!(sub.review_state.is_none());
        assert!(sub.updated_at.is_none());
        assert!(sub.attachments.is_none());
    }

    #[test]
    fn submission_ignores_unknown_fields() {
        let sub: Submission = serde_json::from_str(
            r#"{"instanceId":"uuid:1","submitterId":1,"createdAt":"2024-05-01T10:00:00Z",
                "reviewState":"hasIssues","currentVersion":{"instanceName":"x"}}"#,
        )
        .unwrap();
        assert_eq!(sub.review_state.as_deref(), Some("hasIssues"));
    }

    #[test]
    fn app_user_type_field_maps_to_kind() {
        let user: ProjectAppUser = serde_json::from_str(
            r#"{"projectId":1,"id":115,"displayName":"Surveyor","createdAt":"2024-05-01T10:00:00Z",
                "type":"field_key",
                "token":"d1!E2GVHgpr4h9bpxxtqUJ7EVJ1Q$Dusm2RBXg8XyVJMCBCbvyE8cGacxUx3bcUT",
                "updatedAt":null,"deletedAt":null}"#,
        )
        .unwrap();
        assert_eq!(user.kind.as_deref(), Some("field_key"));
        assert!(user.token.is_some());
        assert!(user.deleted_at.is_none());
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["type"], "field_key");
    }

    #[test]
    fn entity_list_property_requires_published_at() {
        let result: Result<EntityListProperty, _> =
            serde_json::from_str(r#"{"name":"height","odataName":"height","forms":[]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn review_update_serializes_camel_case() {
        let json = serde_json::to_value(ReviewUpdate {
            review_state: "approved",
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"reviewState": "approved"}));
    }
}
