//! Typed client for the desk REST API.
//!
//! Every endpoint the two front ends consume lives here. Admin endpoints take
//! the secret explicitly; the client never stores it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::models::{
    decode_attachments, decode_issues, Attachment, CreatedIssue, Issue, IssueStatus, NewIssue,
    StatusFilter, StatusLabels, UploadResult, UploadedFile,
};
use crate::transport::{FilePart, Request, Response, Transport};

/// Body of `POST /admin/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub token: String,
    pub issue_id: i64,
    pub status: String,
    pub comment: Option<String>,
    pub admin_tg: Option<i64>,
}

/// Body of `POST /admin/comment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminComment {
    pub token: String,
    pub issue_id: i64,
    pub text: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

pub struct ApiClient<T: Transport> {
    transport: T,
    labels: StatusLabels,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        ApiClient {
            transport,
            labels: StatusLabels::default(),
        }
    }

    pub fn with_labels(mut self, labels: StatusLabels) -> Self {
        self.labels = labels;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn labels(&self) -> StatusLabels {
        self.labels
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    // Admin

    pub fn ping(&self, token: &str) -> Result<(), ApiError> {
        let req = Request::get("/admin/ping").query("token", token);
        self.execute(&req).map(|_| ())
    }

    pub fn list_issues(&self, token: &str, filter: StatusFilter) -> Result<Vec<Issue>, ApiError> {
        let mut req = Request::get("/admin/issues").query("token", token);
        if let Some(status) = filter.query_value(self.labels) {
            req = req.query("status", status);
        }
        let resp = self.execute(&req)?;
        decode_issues(&resp.body)
    }

    pub fn list_attachments(&self, token: &str, issue_id: i64) -> Result<Vec<Attachment>, ApiError> {
        let req = Request::get(format!("/admin/issues/{}/attachments", issue_id)).query("token", token);
        let resp = self.execute(&req)?;
        decode_attachments(&resp.body)
    }

    /// An empty comment is sent as `null`; anything else goes through as typed.
    pub fn set_status(
        &self,
        token: &str,
        issue_id: i64,
        status: IssueStatus,
        comment: Option<&str>,
    ) -> Result<(), ApiError> {
        let body = StatusChange {
            token: token.to_string(),
            issue_id,
            status: status.label(self.labels).to_string(),
            comment: comment.filter(|c| !c.is_empty()).map(str::to_string),
            admin_tg: None,
        };
        let req = Request::post_json("/admin/status", to_json(&body)?);
        self.execute(&req).map(|_| ())
    }

    pub fn add_comment(&self, token: &str, issue_id: i64, text: &str) -> Result<(), ApiError> {
        let body = AdminComment {
            token: token.to_string(),
            issue_id,
            text: text.to_string(),
        };
        let req = Request::post_json("/admin/comment", to_json(&body)?);
        self.execute(&req).map(|_| ())
    }

    /// Absolute URL of the export download. Nothing is fetched; what the
    /// server sends back is up to the browser.
    pub fn export_url(&self, token: &str, from: NaiveDate, to: NaiveDate) -> String {
        let req = Request::get("/export")
            .query("token", token)
            .query("from", from.format("%Y-%m-%d").to_string())
            .query("to", to.format("%Y-%m-%d").to_string());
        self.transport.url_for(&req)
    }

    // Public

    pub fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue, ApiError> {
        let req = Request::post_json("/api/issues", to_json(issue)?);
        let resp = self.transport.send(&req)?;
        if !resp.is_success() {
            let message = resp
                .json::<ErrorBody>()
                .ok()
                .and_then(|b| b.error)
                .or_else(|| non_empty(&resp.body))
                .unwrap_or_else(|| format!("failed to create issue ({})", resp.status));
            return Err(ApiError::Server {
                status: resp.status,
                message,
            });
        }
        resp.json()
    }

    pub fn upload_attachments(&self, issue_id: i64, files: &[FilePart]) -> Result<Vec<UploadedFile>, ApiError> {
        let req = Request::post_multipart(format!("/api/issues/{}/attachments", issue_id), files.to_vec());
        let resp = self.execute(&req)?;
        // The upload summary is informational; a bare "ok" is fine too.
        let result: UploadResult = resp.json().unwrap_or_default();
        Ok(result.uploaded)
    }

    pub fn districts(&self) -> Result<Vec<String>, ApiError> {
        self.execute(&Request::get("/api/districts"))?.json()
    }

    pub fn categories(&self) -> Result<Vec<String>, ApiError> {
        self.execute(&Request::get("/api/categories"))?.json()
    }

    pub fn health(&self) -> Result<(), ApiError> {
        self.execute(&Request::get("/healthz")).map(|_| ())
    }

    fn execute(&self, req: &Request) -> Result<Response, ApiError> {
        let resp = self.transport.send(req)?;
        check_response(resp)
    }
}

/// Map a response onto the error taxonomy: 401 is always
/// [`ApiError::AuthInvalid`], any other non-2xx becomes
/// [`ApiError::Server`] carrying the body or, failing that, the status code.
pub fn check_response(resp: Response) -> Result<Response, ApiError> {
    if resp.status == 401 {
        return Err(ApiError::AuthInvalid);
    }
    if !resp.is_success() {
        let message = non_empty(&resp.body).unwrap_or_else(|| resp.status.to_string());
        return Err(ApiError::Server {
            status: resp.status,
            message,
        });
    }
    Ok(resp)
}

fn non_empty(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn to_json<S: Serialize>(value: &S) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::validation(format!("failed to encode request: {}", e)))
}
