//! In-memory stand-in for the Central REST API, used by integration tests.
//!
//! Covers app users, entity list properties, submissions (create, edit,
//! review), submission attachments and comments, and the OData submissions
//! table. Expected attachments are the leaf values of the submission XML
//! that look like media file names; uploading any other name is a 404, as
//! on the real server.

use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use quick_xml::{events::Event, Reader};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Actor id recorded for every submission and comment.
pub const ACTOR_ID: u64 = 1;

const NO_INSTANCE_ID: &str = "submission has no instanceID";

const MEDIA_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "mp3", "mp4", "wav", "m4a", "pdf", "txt", "csv",
];

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppUser {
    pub project_id: u64,
    pub id: u64,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    pub token: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub name: String,
    pub odata_name: String,
    pub published_at: DateTime<Utc>,
    pub forms: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionMeta {
    pub instance_id: String,
    pub submitter_id: u64,
    pub device_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub review_state: Option<String>,
    pub user_agent: Option<String>,
    pub instance_name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub exists: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub body: String,
    pub actor_id: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
struct StoredSubmission {
    project_id: u64,
    form_id: String,
    meta: SubmissionMeta,
    /// Every version's XML, oldest first.
    versions: Vec<String>,
    expected_files: Vec<String>,
    files: HashMap<String, Vec<u8>>,
    comments: Vec<Comment>,
}

impl StoredSubmission {
    fn is(&self, project_id: u64, form_id: &str, instance_id: &str) -> bool {
        self.project_id == project_id
            && self.form_id == form_id
            && self.meta.instance_id == instance_id
    }

    fn attachments(&self) -> Vec<Attachment> {
        self.expected_files
            .iter()
            .map(|name| Attachment {
                name: name.clone(),
                exists: self.files.contains_key(name),
            })
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct Store {
    app_users: Vec<AppUser>,
    properties: HashMap<(u64, String), Vec<Property>>,
    submissions: Vec<StoredSubmission>,
}

impl Store {
    fn submission(
        &self,
        project_id: u64,
        form_id: &str,
        instance_id: &str,
    ) -> Option<&StoredSubmission> {
        self.submissions
            .iter()
            .find(|s| s.is(project_id, form_id, instance_id))
    }

    fn submission_mut(
        &mut self,
        project_id: u64,
        form_id: &str,
        instance_id: &str,
    ) -> Option<&mut StoredSubmission> {
        self.submissions
            .iter_mut()
            .find(|s| s.is(project_id, form_id, instance_id))
    }
}

pub type Db = Arc<RwLock<Store>>;

type Problem = (StatusCode, Json<Value>);

fn problem(status: StatusCode, message: &str) -> Problem {
    (status, Json(json!({ "message": message })))
}

fn not_found() -> Problem {
    problem(StatusCode::NOT_FOUND, "Could not find the resource you were looking for.")
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    let submission = "/v1/projects/{project_id}/forms/{form_id}/submissions/{instance_id}";
    Router::new()
        .route(
            "/v1/projects/{project_id}/app-users",
            get(list_app_users).post(create_app_user),
        )
        .route(
            "/v1/projects/{project_id}/datasets/{name}/properties",
            post(create_property),
        )
        .route(
            "/v1/projects/{project_id}/forms/{form_id}/submissions",
            get(list_submissions).post(create_submission),
        )
        .route(
            "/v1/projects/{project_id}/forms/{form_id}/{table}",
            get(get_table),
        )
        .route(
            submission,
            get(get_submission).put(put_submission).patch(patch_submission),
        )
        .route(&format!("{submission}/attachments"), get(list_attachments))
        .route(
            &format!("{submission}/attachments/{{name}}"),
            get(get_attachment).post(upload_attachment),
        )
        .route(
            &format!("{submission}/comments"),
            get(list_comments).post(create_comment),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// --- app users ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewAppUser {
    display_name: String,
}

async fn list_app_users(State(db): State<Db>, Path(project_id): Path<u64>) -> Json<Vec<AppUser>> {
    let store = db.read().await;
    Json(
        store
            .app_users
            .iter()
            .filter(|u| u.project_id == project_id)
            .cloned()
            .collect(),
    )
}

async fn create_app_user(
    State(db): State<Db>,
    Path(project_id): Path<u64>,
    Json(input): Json<NewAppUser>,
) -> Result<Json<AppUser>, Problem> {
    if input.display_name.is_empty() {
        return Err(problem(StatusCode::BAD_REQUEST, "displayName is required"));
    }
    let mut store = db.write().await;
    let user = AppUser {
        project_id,
        id: store.app_users.len() as u64 + 1,
        display_name: input.display_name,
        created_at: Utc::now(),
        kind: "field_key".to_string(),
        token: Uuid::new_v4().to_string(),
        updated_at: None,
        deleted_at: None,
    };
    tracing::info!(project_id, id = user.id, "app user created");
    store.app_users.push(user.clone());
    Ok(Json(user))
}

// --- entity list properties ---

#[derive(Deserialize)]
struct NewProperty {
    name: String,
}

async fn create_property(
    State(db): State<Db>,
    Path((project_id, name)): Path<(u64, String)>,
    Json(input): Json<NewProperty>,
) -> Result<Json<Value>, Problem> {
    let reserved = matches!(input.name.as_str(), "" | "name" | "label");
    if reserved || input.name.starts_with("__") {
        return Err(problem(StatusCode::BAD_REQUEST, "invalid property name"));
    }
    let mut store = db.write().await;
    let properties = store.properties.entry((project_id, name)).or_default();
    if properties.iter().any(|p| p.name == input.name) {
        return Err(problem(StatusCode::CONFLICT, "property already exists"));
    }
    properties.push(Property {
        odata_name: input.name.replace('-', "_"),
        name: input.name,
        published_at: Utc::now(),
        forms: Vec::new(),
    });
    Ok(Json(json!({ "success": true })))
}

// --- submissions ---

/// Visit every non-empty text node of `xml` together with the local name of
/// its enclosing element. Comments and processing instructions are skipped.
fn for_each_text(xml: &str, mut visit: impl FnMut(&[u8], &str)) -> Result<(), quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut open: Vec<Vec<u8>> = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => open.push(e.local_name().as_ref().to_vec()),
            Event::End(_) => {
                open.pop();
            }
            Event::Text(t) => {
                let text = t.unescape()?;
                let text = text.trim();
                if !text.is_empty() {
                    visit(open.last().map_or(&[][..], Vec::as_slice), text);
                }
            }
            Event::Eof => return Ok(()),
            _ => {}
        }
    }
}

/// Text of the first `instanceID` element, in any namespace.
fn instance_id_of(xml: &str) -> Option<String> {
    let mut found = None;
    for_each_text(xml, |element, text| {
        if found.is_none() && element == b"instanceID" {
            found = Some(text.to_string());
        }
    })
    .ok()?;
    found
}

fn is_media_name(text: &str) -> bool {
    !text.contains(char::is_whitespace)
        && text.rsplit_once('.').is_some_and(|(stem, ext)| {
            !stem.is_empty() && MEDIA_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        })
}

/// Unescaped leaf values of the XML that name a media file.
fn media_references(xml: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let parsed = for_each_text(xml, |_, text| {
        if is_media_name(text) && !names.iter().any(|n| n == text) {
            names.push(text.to_string());
        }
    });
    if let Err(err) = parsed {
        tracing::warn!(error = %err, "could not read submission XML");
    }
    names
}

async fn list_submissions(
    State(db): State<Db>,
    Path((project_id, form_id)): Path<(u64, String)>,
) -> Json<Vec<SubmissionMeta>> {
    let store = db.read().await;
    Json(
        store
            .submissions
            .iter()
            .filter(|s| s.project_id == project_id && s.form_id == form_id)
            .map(|s| s.meta.clone())
            .collect(),
    )
}

async fn create_submission(
    State(db): State<Db>,
    Path((project_id, form_id)): Path<(u64, String)>,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<SubmissionMeta>, Problem> {
    let xml = String::from_utf8_lossy(&body).into_owned();
    let instance_id =
        instance_id_of(&xml).ok_or_else(|| problem(StatusCode::BAD_REQUEST, NO_INSTANCE_ID))?;
    let mut store = db.write().await;
    if store.submission(project_id, &form_id, &instance_id).is_some() {
        let message = "a submission with this instanceID already exists";
        return Err(problem(StatusCode::CONFLICT, message));
    }
    let meta = SubmissionMeta {
        instance_id,
        submitter_id: ACTOR_ID,
        device_id: params.get("deviceID").cloned(),
        created_at: Utc::now(),
        updated_at: None,
        review_state: None,
        user_agent: None,
        instance_name: None,
    };
    tracing::info!(
        project_id,
        form_id = %form_id,
        instance_id = %meta.instance_id,
        "submission created"
    );
    store.submissions.push(StoredSubmission {
        project_id,
        form_id,
        meta: meta.clone(),
        expected_files: media_references(&xml),
        versions: vec![xml],
        files: HashMap::new(),
        comments: Vec::new(),
    });
    Ok(Json(meta))
}

async fn get_submission(
    State(db): State<Db>,
    Path((project_id, form_id, instance_id)): Path<(u64, String, String)>,
) -> Result<Json<SubmissionMeta>, Problem> {
    let store = db.read().await;
    store
        .submission(project_id, &form_id, &instance_id)
        .map(|s| Json(s.meta.clone()))
        .ok_or_else(not_found)
}

async fn put_submission(
    State(db): State<Db>,
    Path((project_id, form_id, instance_id)): Path<(u64, String, String)>,
    body: Bytes,
) -> Result<Json<SubmissionMeta>, Problem> {
    let xml = String::from_utf8_lossy(&body).into_owned();
    let mut store = db.write().await;
    let sub = store
        .submission_mut(project_id, &form_id, &instance_id)
        .ok_or_else(not_found)?;
    // The new version names itself; the governing instance id stays put.
    if instance_id_of(&xml).is_none() {
        return Err(problem(StatusCode::BAD_REQUEST, NO_INSTANCE_ID));
    }
    sub.expected_files = media_references(&xml);
    sub.versions.push(xml);
    sub.meta.review_state = Some("edited".to_string());
    sub.meta.updated_at = Some(Utc::now());
    Ok(Json(sub.meta.clone()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewUpdate {
    review_state: Option<String>,
}

async fn patch_submission(
    State(db): State<Db>,
    Path((project_id, form_id, instance_id)): Path<(u64, String, String)>,
    Json(input): Json<ReviewUpdate>,
) -> Result<Json<SubmissionMeta>, Problem> {
    const STATES: &[&str] = &["edited", "hasIssues", "rejected", "approved"];
    if let Some(state) = &input.review_state {
        if !STATES.contains(&state.as_str()) {
            return Err(problem(StatusCode::BAD_REQUEST, "unknown reviewState"));
        }
    }
    let mut store = db.write().await;
    let sub = store
        .submission_mut(project_id, &form_id, &instance_id)
        .ok_or_else(not_found)?;
    sub.meta.review_state = input.review_state;
    sub.meta.updated_at = Some(Utc::now());
    Ok(Json(sub.meta.clone()))
}

/// OData read of the `Submissions` table. Honors `$top`, `$skip`,
/// `$count` and `$select`; other options are accepted and ignored.
async fn get_table(
    State(db): State<Db>,
    Path((project_id, form_svc, table)): Path<(u64, String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, Problem> {
    let form_id = form_svc.strip_suffix(".svc").ok_or_else(not_found)?;
    if table != "Submissions" {
        return Err(not_found());
    }
    let number = |key: &str| -> Result<Option<usize>, Problem> {
        params
            .get(key)
            .map(|v| v.parse().map_err(|_| problem(StatusCode::BAD_REQUEST, "expected a number")))
            .transpose()
    };
    let skip = number("$skip")?.unwrap_or(0);
    let top = number("$top")?;
    let select: Option<Vec<&str>> =
        params.get("$select").map(|s| s.split(',').map(str::trim).collect());

    let store = db.read().await;
    let rows: Vec<Value> = store
        .submissions
        .iter()
        .filter(|s| s.project_id == project_id && s.form_id == form_id)
        .map(|s| {
            json!({
                "__id": s.meta.instance_id,
                "__system": {
                    "submitterId": s.meta.submitter_id.to_string(),
                    "submissionDate": s.meta.created_at,
                    "updatedAt": s.meta.updated_at,
                    "reviewState": s.meta.review_state,
                    "deviceId": s.meta.device_id,
                },
                "meta": { "instanceID": s.versions.last().and_then(|xml| instance_id_of(xml)) },
            })
        })
        .collect();
    let total = rows.len();
    let page: Vec<Value> = rows
        .into_iter()
        .skip(skip)
        .take(top.unwrap_or(usize::MAX))
        .map(|row| match (&select, row) {
            (Some(fields), Value::Object(map)) => {
                let kept = map.into_iter().filter(|(k, _)| fields.contains(&k.as_str()));
                Value::Object(kept.collect())
            }
            (_, row) => row,
        })
        .collect();

    let mut doc = json!({
        "@odata.context":
            format!("/v1/projects/{project_id}/forms/{form_id}.svc/$metadata#Submissions"),
        "value": page,
    });
    if params.get("$count").is_some_and(|v| v == "true") {
        doc["@odata.count"] = json!(total);
    }
    Ok(Json(doc))
}

// --- attachments ---

async fn list_attachments(
    State(db): State<Db>,
    Path((project_id, form_id, instance_id)): Path<(u64, String, String)>,
) -> Result<Json<Vec<Attachment>>, Problem> {
    let store = db.read().await;
    store
        .submission(project_id, &form_id, &instance_id)
        .map(|s| Json(s.attachments()))
        .ok_or_else(not_found)
}

async fn get_attachment(
    State(db): State<Db>,
    Path((project_id, form_id, instance_id, name)): Path<(u64, String, String, String)>,
) -> Result<Vec<u8>, Problem> {
    let store = db.read().await;
    store
        .submission(project_id, &form_id, &instance_id)
        .and_then(|s| s.files.get(&name).cloned())
        .ok_or_else(not_found)
}

async fn upload_attachment(
    State(db): State<Db>,
    Path((project_id, form_id, instance_id, name)): Path<(u64, String, String, String)>,
    body: Bytes,
) -> Result<Json<Value>, Problem> {
    let mut store = db.write().await;
    let sub = store
        .submission_mut(project_id, &form_id, &instance_id)
        .ok_or_else(not_found)?;
    if !sub.expected_files.contains(&name) {
        return Err(not_found());
    }
    sub.files.insert(name, body.to_vec());
    Ok(Json(json!({ "success": true })))
}

// --- comments ---

#[derive(Deserialize)]
struct NewComment {
    body: String,
}

async fn list_comments(
    State(db): State<Db>,
    Path((project_id, form_id, instance_id)): Path<(u64, String, String)>,
) -> Result<Json<Vec<Comment>>, Problem> {
    let store = db.read().await;
    store
        .submission(project_id, &form_id, &instance_id)
        .map(|s| Json(s.comments.clone()))
        .ok_or_else(not_found)
}

async fn create_comment(
    State(db): State<Db>,
    Path((project_id, form_id, instance_id)): Path<(u64, String, String)>,
    Json(input): Json<NewComment>,
) -> Result<Json<Comment>, Problem> {
    if input.body.is_empty() {
        return Err(problem(StatusCode::BAD_REQUEST, "body is required"));
    }
    let mut store = db.write().await;
    let sub = store
        .submission_mut(project_id, &form_id, &instance_id)
        .ok_or_else(not_found)?;
    let comment = Comment {
        body: input.body,
        actor_id: ACTOR_ID,
        created_at: Utc::now(),
    };
    sub.comments.push(comment.clone());
    Ok(Json(comment))
}
