//! Public issue submission: a form that is sent in two calls, the issue
//! first and its files second.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::geo::{Coordinates, GeoCapture, GeoError, GeoOptions, Locator};
use crate::models::{NewIssue, UploadedFile};
use crate::transport::{FilePart, Transport};

const DEFAULT_NAME: &str = "Citizen";
const ATTACHMENT_FIELD: &str = "attachments";

#[derive(Debug, Clone, Default)]
pub struct IssueForm {
    pub name: String,
    pub contact: String,
    pub district: String,
    pub category: String,
    pub description: String,
    /// Free-text address or landmark.
    pub location: String,
    geo: GeoCapture,
    files: Vec<FilePart>,
}

impl IssueForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `path` into the form. Files are read up front so an unreadable
    /// path fails before anything is sent.
    pub fn attach_file(&mut self, path: &Path) -> Result<(), ApiError> {
        let bytes = fs::read(path)
            .map_err(|e| ApiError::validation(format!("cannot read {}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        tracing::debug!(file = %file_name, size = bytes.len(), "file attached");
        self.files.push(FilePart {
            field: ATTACHMENT_FIELD.to_string(),
            content_type: mime_for(path).to_string(),
            file_name,
            bytes,
        });
        Ok(())
    }

    pub fn files(&self) -> &[FilePart] {
        &self.files
    }

    pub fn geo(&self) -> GeoCapture {
        self.geo
    }

    pub fn capture_location(&mut self, locator: &dyn Locator, options: &GeoOptions) -> Result<Coordinates, GeoError> {
        self.geo.capture(locator, options)
    }

    /// Use coordinates the reporter typed in instead of a captured fix.
    pub fn set_coordinates(&mut self, coords: Coordinates) {
        self.geo = GeoCapture::Captured(coords);
    }

    /// JSON body for the create call, with the form's fields normalised.
    pub fn payload(&self) -> NewIssue {
        let name = self.name.trim();
        let location = self.location.trim();
        let coords = self.geo.coordinates();
        NewIssue {
            // Whitespace-only names count as blank and get the default too.
            name: if name.is_empty() { DEFAULT_NAME.to_string() } else { name.to_string() },
            contact: self.contact.trim().to_string(),
            district: self.district.clone(),
            category: self.category.clone(),
            description: self.description.trim().to_string(),
            latitude: coords.map(|c| c.latitude),
            longitude: coords.map(|c| c.longitude),
            location: if location.is_empty() { None } else { Some(location.to_string()) },
        }
    }

    pub fn reset(&mut self) {
        *self = IssueForm::default();
    }
}

/// What the reporter sees after a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    pub id: i64,
    pub name: String,
    pub district: String,
    pub category: String,
    pub file_count: usize,
    pub uploaded: Vec<UploadedFile>,
    /// Set when the issue was created but its files were not stored.
    pub upload_error: Option<String>,
}

impl fmt::Display for SubmissionReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Thank you, {}! Your report has been registered.", self.name)?;
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "District: {}", or_unspecified(&self.district))?;
        writeln!(f, "Category: {}", or_unspecified(&self.category))?;
        if self.file_count > 0 {
            writeln!(f, "Attached files: {}", self.file_count)?;
        }
        if let Some(err) = &self.upload_error {
            writeln!(f, "Files were not uploaded: {}", err)?;
        }
        Ok(())
    }
}

/// Create the issue, then upload its files.
///
/// Only a failed create is an error, and it leaves the form as it was. A
/// failed upload is logged and noted on the receipt; the issue stands.
pub fn submit<T: Transport>(client: &ApiClient<T>, form: &mut IssueForm) -> Result<SubmissionReceipt, ApiError> {
    let payload = form.payload();
    let created = client.create_issue(&payload)?;
    tracing::info!(id = created.id, files = form.files.len(), "issue created");

    let mut receipt = SubmissionReceipt {
        id: created.id,
        name: payload.name,
        district: payload.district,
        category: payload.category,
        file_count: form.files.len(),
        uploaded: Vec::new(),
        upload_error: None,
    };

    if !form.files.is_empty() && created.id > 0 {
        match client.upload_attachments(created.id, &form.files) {
            Ok(uploaded) => receipt.uploaded = uploaded,
            Err(err) => {
                tracing::error!(id = created.id, error = %err, "attachment upload failed");
                receipt.upload_error = Some(err.to_string());
            }
        }
    }

    form.reset();
    Ok(receipt)
}

fn or_unspecified(value: &str) -> &str {
    if value.trim().is_empty() {
        "not specified"
    } else {
        value
    }
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
