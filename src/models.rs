use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

/// The four statuses an administrator can move an issue to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueStatus {
    New,
    InProgress,
    Done,
    Rejected,
}

/// Which spelling of the status labels the server speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLabels {
    #[default]
    English,
    Russian,
}

impl IssueStatus {
    pub const ALL: [IssueStatus; 4] = [
        IssueStatus::New,
        IssueStatus::InProgress,
        IssueStatus::Done,
        IssueStatus::Rejected,
    ];

    pub fn label(self, labels: StatusLabels) -> &'static str {
        match (labels, self) {
            (StatusLabels::English, IssueStatus::New) => "New",
            (StatusLabels::English, IssueStatus::InProgress) => "In-Progress",
            (StatusLabels::English, IssueStatus::Done) => "Done",
            (StatusLabels::English, IssueStatus::Rejected) => "Rejected",
            (StatusLabels::Russian, IssueStatus::New) => "Новая",
            (StatusLabels::Russian, IssueStatus::InProgress) => "В обработке",
            (StatusLabels::Russian, IssueStatus::Done) => "Завершено",
            (StatusLabels::Russian, IssueStatus::Rejected) => "Отклонено",
        }
    }

    /// Accepts either label vocabulary, case-insensitively, with `_`, `-`
    /// or a space between words.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '_' || c == ' ' { '-' } else { c })
            .collect();
        match normalized.as_str() {
            "new" | "новая" => Some(IssueStatus::New),
            "in-progress" | "inprogress" | "в-обработке" => Some(IssueStatus::InProgress),
            "done" | "завершено" => Some(IssueStatus::Done),
            "rejected" | "отклонено" => Some(IssueStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label(StatusLabels::English))
    }
}

impl FromStr for IssueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IssueStatus::parse(s).ok_or_else(|| {
            format!(
                "Invalid status '{}'. Must be one of: new, in-progress, done, rejected",
                s
            )
        })
    }
}

/// Status filter for the issue list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(IssueStatus),
}

impl StatusFilter {
    /// Value for the `status` query parameter; `None` means send nothing.
    pub fn query_value(self, labels: StatusLabels) -> Option<&'static str> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Only(status) => Some(status.label(labels)),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        trimmed.parse().map(StatusFilter::Only)
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Only(status) => write!(f, "{}", status),
        }
    }
}

/// Canonical issue record.
///
/// The server is inconsistent about field casing (`created_at`, `CreatedAt`,
/// `createdAt`), so every spelling is folded in here and nowhere else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(alias = "ID", alias = "Id")]
    pub id: i64,
    #[serde(default, alias = "Status", deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, alias = "District")]
    pub district: Option<String>,
    #[serde(default, alias = "Category")]
    pub category: Option<String>,
    #[serde(
        default,
        alias = "Description",
        alias = "text",
        alias = "Text",
        deserialize_with = "null_as_default"
    )]
    pub description: String,
    #[serde(default, alias = "Latitude")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "Longitude")]
    pub longitude: Option<f64>,
    #[serde(default, alias = "CreatedAt", alias = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, alias = "UpdatedAt", alias = "updatedAt")]
    pub updated_at: Option<String>,
}

impl Issue {
    /// Recognised status, if the label is one of the known ones.
    pub fn status_kind(&self) -> Option<IssueStatus> {
        IssueStatus::parse(&self.status)
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Video,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default, alias = "ID", alias = "Id")]
    pub id: Option<i64>,
    #[serde(default, alias = "IssueID", alias = "IssueId")]
    pub issue_id: Option<i64>,
    #[serde(default, alias = "LocalPath", deserialize_with = "null_as_default")]
    pub local_path: String,
    #[serde(default, alias = "FileType", deserialize_with = "null_as_default")]
    pub file_type: String,
    #[serde(default, alias = "CreatedAt", alias = "createdAt")]
    pub created_at: Option<String>,
}

impl Attachment {
    /// Server-relative URL; stored paths may lack the leading slash.
    pub fn url(&self) -> String {
        if self.local_path.starts_with('/') {
            self.local_path.clone()
        } else {
            format!("/{}", self.local_path)
        }
    }

    pub fn kind(&self) -> AttachmentKind {
        if self.file_type.starts_with("image/") {
            AttachmentKind::Image
        } else if self.file_type.starts_with("video/") {
            AttachmentKind::Video
        } else {
            AttachmentKind::File
        }
    }
}

/// Body of `POST /api/issues`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIssue {
    pub name: String,
    pub contact: String,
    pub district: String,
    pub category: String,
    pub description: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location: Option<String>,
}

/// Answer to `POST /api/issues`; only `id` is guaranteed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedIssue {
    #[serde(alias = "ID")]
    pub id: i64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    #[serde(default, rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct UploadResult {
    #[serde(default)]
    pub uploaded: Vec<UploadedFile>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode an issue list response.
///
/// Anything but a JSON array is rejected. Individual entries that cannot be
/// decoded are skipped with a warning rather than failing the whole list.
pub fn decode_issues(body: &str) -> Result<Vec<Issue>, ApiError> {
    decode_array(body, "issue")
}

pub fn decode_attachments(body: &str) -> Result<Vec<Attachment>, ApiError> {
    decode_array(body, "attachment")
}

fn decode_array<T: for<'de> Deserialize<'de>>(body: &str, what: &str) -> Result<Vec<T>, ApiError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    let serde_json::Value::Array(items) = value else {
        return Err(ApiError::Decode(format!("expected a JSON array of {}s", what)));
    };

    let mut decoded = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value(item) {
            Ok(entry) => decoded.push(entry),
            Err(error) => tracing::warn!(index, %error, "skipping undecodable {}", what),
        }
    }
    Ok(decoded)
}
