//! Submissions of a form: metadata reads, OData table reads, and the
//! create/edit/review workflows.
//!
//! # Design
//! The compound operations are sequences of single-resource calls with no
//! rollback. The server offers no transactions, so a failure part way
//! through leaves earlier steps in place and is reported as an error:
//!
//! - `create`: POST XML, upload each attachment (stop at the first failed
//!   upload), then re-list attachments.
//! - `edit`: PUT XML, then post the comment if one was given.
//! - `review`: PATCH review state, then post the comment if one was given.
//!
//! Each resolves project and form once and reuses the result for every step.

use std::path::{Path, PathBuf};

use crate::context::{Defaults, FormScope, ResolvedForm};
use crate::encoding::XmlEncoding;
use crate::endpoints::comments::CommentService;
use crate::endpoints::submission_attachments::SubmissionAttachmentService;
use crate::endpoints::{checked, fetch};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, Session};
use crate::types::{Comment, ReviewUpdate, Submission};
use crate::url::{form_path, submission_path, urlformat};
use crate::validators;

const XML: &str = "application/xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionUrls {
    pub list: &'static str,
    pub get: &'static str,
    pub get_table: &'static str,
    pub post: &'static str,
    pub patch: &'static str,
    pub put: &'static str,
}

impl Default for SubmissionUrls {
    fn default() -> Self {
        Self {
            list: concat!(form_path!(), "/submissions"),
            get: submission_path!(),
            get_table: concat!(form_path!(), ".svc/{table_name}"),
            post: concat!(form_path!(), "/submissions"),
            patch: submission_path!(),
            put: submission_path!(),
        }
    }
}

/// OData options for `get_table`. Unset options are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableQuery {
    /// Omit the first n rows.
    pub skip: Option<u64>,
    /// Return at most n rows.
    pub top: Option<u64>,
    /// Add `@odata.count` with the total row count, ignoring paging.
    pub count: Option<bool>,
    /// Geospatial values as Well-Known Text instead of GeoJSON.
    pub wkt: Option<bool>,
    /// Filter on `__system` fields (submitterId, createdAt, updatedAt,
    /// reviewState) with OData operators and date functions.
    pub filter: Option<String>,
    /// Repeats to expand; the server only implements `*`.
    pub expand: Option<String>,
    pub select: Option<String>,
}

impl TableQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip(mut self, n: u64) -> Self {
        self.skip = Some(n);
        self
    }

    pub fn top(mut self, n: u64) -> Self {
        self.top = Some(n);
        self
    }

    pub fn count(mut self, count: bool) -> Self {
        self.count = Some(count);
        self
    }

    pub fn wkt(mut self, wkt: bool) -> Self {
        self.wkt = Some(wkt);
        self
    }

    pub fn filter(mut self, expr: impl Into<String>) -> Self {
        self.filter = Some(expr.into());
        self
    }

    pub fn expand(mut self, expr: impl Into<String>) -> Self {
        self.expand = Some(expr.into());
        self
    }

    pub fn select(mut self, fields: impl Into<String>) -> Self {
        self.select = Some(fields.into());
        self
    }

    /// Query pairs under their `$`-prefixed OData names, supplied options only.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        [
            ("$skip", self.skip.map(|v| v.to_string())),
            ("$top", self.top.map(|v| v.to_string())),
            ("$count", self.count.map(|v| v.to_string())),
            ("$wkt", self.wkt.map(|v| v.to_string())),
            ("$filter", self.filter.clone()),
            ("$expand", self.expand.clone()),
            ("$select", self.select.clone()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }
}

/// Inputs to `SubmissionService::create` beyond the XML itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSubmission {
    /// Sent as the `deviceID` query parameter.
    pub device_id: Option<String>,
    pub encoding: XmlEncoding,
    /// Local files to upload after the XML is accepted.
    pub attachments: Vec<PathBuf>,
}

impl NewSubmission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn encoding(mut self, encoding: XmlEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn attachment(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachments.push(path.into());
        self
    }
}

/// Submission access for forms.
///
/// ```no_run
/// use central_core::{CentralClient, CentralConfig, FormScope, TableQuery};
///
/// let config = CentralConfig::load_default()?;
/// let client = CentralClient::from_config(&config)?;
/// let table = client
///     .submissions()
///     .get_table(FormScope::new().form("my-form"), None, &TableQuery::new())?;
/// println!("{}", table["value"]);
/// # Ok::<(), central_core::ApiError>(())
/// ```
pub struct SubmissionService<'a, S: Session + ?Sized> {
    session: &'a S,
    defaults: &'a Defaults,
    urls: SubmissionUrls,
}

impl<'a, S: Session + ?Sized> SubmissionService<'a, S> {
    pub fn new(session: &'a S, defaults: &'a Defaults) -> Self {
        Self {
            session,
            defaults,
            urls: SubmissionUrls::default(),
        }
    }

    pub fn with_urls(mut self, urls: SubmissionUrls) -> Self {
        self.urls = urls;
        self
    }

    fn attachments(&self) -> SubmissionAttachmentService<'a, S> {
        SubmissionAttachmentService::new(self.session, self.defaults)
    }

    fn comments(&self) -> CommentService<'a, S> {
        CommentService::new(self.session, self.defaults)
    }

    fn instance_path(&self, template: &str, form: &ResolvedForm, instance_id: &str) -> String {
        urlformat(
            template,
            &[
                ("project_id", &form.project_id),
                ("form_id", &form.form_id),
                ("instance_id", &instance_id),
            ],
        )
    }

    pub fn build_list(&self, scope: FormScope<'_>) -> Result<HttpRequest, ApiError> {
        let form = checked("submissions.list", self.defaults.form(scope))?;
        let path = urlformat(
            self.urls.list,
            &[("project_id", &form.project_id), ("form_id", &form.form_id)],
        );
        Ok(HttpRequest::new(HttpMethod::Get, path))
    }

    /// Metadata of every submission of the form, in server order.
    pub fn list(&self, scope: FormScope<'_>) -> Result<Vec<Submission>, ApiError> {
        fetch(self.session, &self.build_list(scope)?)
    }

    pub fn build_get(
        &self,
        instance_id: &str,
        scope: FormScope<'_>,
    ) -> Result<HttpRequest, ApiError> {
        const OP: &str = "submissions.get";
        let form = checked(OP, self.defaults.form(scope))?;
        let iid = checked(OP, validators::validate_instance_id(instance_id))?;
        Ok(HttpRequest::new(
            HttpMethod::Get,
            self.instance_path(self.urls.get, &form, &iid),
        ))
    }

    pub fn get(&self, instance_id: &str, scope: FormScope<'_>) -> Result<Submission, ApiError> {
        fetch(self.session, &self.build_get(instance_id, scope)?)
    }

    /// `table_name` defaults to `Submissions`; repeat groups live in tables
    /// such as `Submissions.people`.
    pub fn build_get_table(
        &self,
        scope: FormScope<'_>,
        table_name: Option<&str>,
        query: &TableQuery,
    ) -> Result<HttpRequest, ApiError> {
        const OP: &str = "submissions.get_table";
        let form = checked(OP, self.defaults.form(scope))?;
        let table = checked(OP, validators::validate_table_name(table_name, Some("Submissions")))?;
        let path = urlformat(
            self.urls.get_table,
            &[
                ("project_id", &form.project_id),
                ("form_id", &form.form_id),
                ("table_name", &table),
            ],
        );
        Ok(query
            .to_params()
            .into_iter()
            .fold(HttpRequest::new(HttpMethod::Get, path), |req, (key, value)| {
                req.with_query(key, value)
            }))
    }

    /// Read submission data as an OData document. Rows are under `value`.
    pub fn get_table(
        &self,
        scope: FormScope<'_>,
        table_name: Option<&str>,
        query: &TableQuery,
    ) -> Result<serde_json::Value, ApiError> {
        fetch(self.session, &self.build_get_table(scope, table_name, query)?)
    }

    pub fn build_create(
        &self,
        xml: &str,
        scope: FormScope<'_>,
        device_id: Option<&str>,
        encoding: XmlEncoding,
    ) -> Result<HttpRequest, ApiError> {
        let form = checked("submissions.create", self.defaults.form(scope))?;
        self.create_request(&form, xml, device_id, encoding)
    }

    fn create_request(
        &self,
        form: &ResolvedForm,
        xml: &str,
        device_id: Option<&str>,
        encoding: XmlEncoding,
    ) -> Result<HttpRequest, ApiError> {
        let device_id = device_id
            .map(|d| checked("submissions.create", validators::validate_str(d, "device_id")))
            .transpose()?;
        let path = urlformat(
            self.urls.post,
            &[("project_id", &form.project_id), ("form_id", &form.form_id)],
        );
        let mut request = HttpRequest::new(HttpMethod::Post, path);
        if let Some(device_id) = device_id {
            request = request.with_query("deviceID", device_id);
        }
        Ok(request.with_body(XML, encoding.encode(xml)?))
    }

    /// Create a submission from XML and upload its attachments.
    ///
    /// Each attachment's file name must match a file name referenced in the
    /// XML (just the name, not a directory). The server keeps one file per
    /// name per submission.
    ///
    /// Not atomic: if an upload fails the submission and any earlier uploads
    /// remain on the server and the error names the failed file. The returned
    /// metadata is the creation response with `attachments` replaced by a
    /// fresh listing (`None` when the form expects no files), since uploads
    /// do not bump `updatedAt`.
    pub fn create(
        &self,
        xml: &str,
        scope: FormScope<'_>,
        options: &NewSubmission,
    ) -> Result<Submission, ApiError> {
        const OP: &str = "submissions.create";
        let form = checked(OP, self.defaults.form(scope))?;
        for path in &options.attachments {
            checked(OP, validators::validate_file_path(path))?;
        }
        let device_id = options.device_id.as_deref();
        let request = self.create_request(&form, xml, device_id, options.encoding)?;
        let mut created: Submission = fetch(self.session, &request)?;
        let iid = created.instance_id.clone();

        let attachments = self.attachments();
        for path in &options.attachments {
            if !attachments.upload_to(&form, &iid, path)? {
                return Err(upload_failed(&iid, path));
            }
        }

        let listed = attachments.list_for(&form, &iid)?;
        created.attachments = if listed.is_empty() { None } else { Some(listed) };
        Ok(created)
    }

    fn put_to(
        &self,
        form: &ResolvedForm,
        instance_id: &str,
        xml: &str,
        encoding: XmlEncoding,
    ) -> Result<Submission, ApiError> {
        let iid = checked("submissions.put", validators::validate_instance_id(instance_id))?;
        let path = self.instance_path(self.urls.put, form, &iid);
        let request = HttpRequest::new(HttpMethod::Put, path).with_body(XML, encoding.encode(xml)?);
        fetch(self.session, &request)
    }

    fn patch_to(
        &self,
        form: &ResolvedForm,
        instance_id: &str,
        review_state: &str,
    ) -> Result<Submission, ApiError> {
        const OP: &str = "submissions.patch";
        let iid = checked(OP, validators::validate_instance_id(instance_id))?;
        let review_state = checked(OP, validators::validate_str(review_state, "review_state"))?;
        let path = self.instance_path(self.urls.patch, form, &iid);
        let request = HttpRequest::new(HttpMethod::Patch, path).with_json(&ReviewUpdate {
                review_state: &review_state,
            })?;
        fetch(self.session, &request)
    }

    /// Replace the submission XML, then post `comment` if given.
    ///
    /// `instance_id` is the id the submission was first created with. Edited
    /// XML carries its own `instanceID` and a `deprecatedID` pointing at the
    /// previous version, so those elements will not match `instance_id`.
    /// A failed comment does not undo the edit.
    pub fn edit(
        &self,
        instance_id: &str,
        xml: &str,
        scope: FormScope<'_>,
        comment: Option<&str>,
        encoding: XmlEncoding,
    ) -> Result<(), ApiError> {
        const OP: &str = "submissions.edit";
        let form = checked(OP, self.defaults.form(scope))?;
        if let Some(comment) = comment {
            checked(OP, validators::validate_str(comment, "comment"))?;
        }
        self.put_to(&form, instance_id, xml, encoding)?;
        if let Some(comment) = comment {
            self.comments().post_to(&form, instance_id, comment)?;
        }
        Ok(())
    }

    /// Set the review state, then post `comment` if given.
    pub fn review(
        &self,
        instance_id: &str,
        review_state: &str,
        scope: FormScope<'_>,
        comment: Option<&str>,
    ) -> Result<(), ApiError> {
        const OP: &str = "submissions.review";
        let form = checked(OP, self.defaults.form(scope))?;
        if let Some(comment) = comment {
            checked(OP, validators::validate_str(comment, "comment"))?;
        }
        self.patch_to(&form, instance_id, review_state)?;
        if let Some(comment) = comment {
            self.comments().post_to(&form, instance_id, comment)?;
        }
        Ok(())
    }

    pub fn list_comments(
        &self,
        instance_id: &str,
        scope: FormScope<'_>,
    ) -> Result<Vec<Comment>, ApiError> {
        self.comments().list(instance_id, scope)
    }

    pub fn add_comment(
        &self,
        instance_id: &str,
        comment: &str,
        scope: FormScope<'_>,
    ) -> Result<Comment, ApiError> {
        self.comments().post(comment, instance_id, scope)
    }
}

fn upload_failed(instance_id: &str, path: &Path) -> ApiError {
    tracing::warn!(instance_id, file = %path.display(), "attachment upload failed, stopping");
    ApiError::Workflow(format!("attachment upload failed: {}", path.display()))
}
