//! Plain-text views of the dashboard: issue table, detail pane, gallery.

use chrono::DateTime;

use crate::dashboard::AttachmentsPane;
use crate::gate::{Notice, NoticeKind};
use crate::models::{AttachmentKind, Issue};

const DASH: &str = "—";
const TEXT_COLUMN_WIDTH: usize = 80;

pub fn issue_table(issues: &[Issue]) -> String {
    if issues.is_empty() {
        return "No issues found.\n".to_string();
    }

    let mut out = format!("Issues: {}\n", issues.len());
    for issue in issues {
        let created = issue
            .created_at
            .as_deref()
            .map(format_timestamp)
            .unwrap_or_default();
        out.push_str(&format!(
            "#{:<5} {:15} {:<14} {:<16} {:<80} {}\n",
            issue.id,
            status_pill(&issue.status),
            or_dash(issue.district.as_deref()),
            or_dash(issue.category.as_deref()),
            truncate(&issue.description, TEXT_COLUMN_WIDTH),
            created
        ));
    }
    out
}

pub fn issue_detail(issue: &Issue) -> String {
    let mut out = format!("Issue #{} {}\n", issue.id, status_pill(&issue.status));

    out.push_str(&format!(
        "District: {} · Category: {}\n",
        issue.district.as_deref().filter(|d| !d.is_empty()).unwrap_or("not specified"),
        issue.category.as_deref().filter(|c| !c.is_empty()).unwrap_or("not specified"),
    ));

    let created = issue.created_at.as_deref().map(format_timestamp).unwrap_or_default();
    match issue.updated_at.as_deref().map(format_timestamp) {
        Some(updated) if !updated.is_empty() => {
            out.push_str(&format!("Created: {} · Updated: {}\n", created, updated));
        }
        _ => out.push_str(&format!("Created: {}\n", created)),
    }

    out.push_str("\nDescription:\n");
    if issue.description.trim().is_empty() {
        out.push_str("  (no description)\n");
    } else {
        for line in issue.description.lines() {
            out.push_str(&format!("  {}\n", line));
        }
    }

    if let Some((lat, lon)) = issue.coordinates() {
        let (yandex, google) = map_links(lat, lon);
        out.push_str("\nLocation:\n");
        out.push_str(&format!("  Latitude: {}\n", lat));
        out.push_str(&format!("  Longitude: {}\n", lon));
        out.push_str(&format!("  Yandex Maps: {}\n", yandex));
        out.push_str(&format!("  Google Maps: {}\n", google));
    }

    out
}

pub fn attachment_gallery(pane: &AttachmentsPane, base_url: &str) -> String {
    let mut out = String::from("\nAttachments:\n");
    match pane {
        AttachmentsPane::Loading => out.push_str("  loading attachments...\n"),
        AttachmentsPane::Message(notice) => out.push_str(&format!("  {}\n", notice.message)),
        AttachmentsPane::Loaded(items) if items.is_empty() => out.push_str("  no attachments\n"),
        AttachmentsPane::Loaded(items) => {
            for att in items {
                let url = format!("{}{}", base_url.trim_end_matches('/'), att.url());
                let line = match att.kind() {
                    AttachmentKind::Image => format!("  [image] {}\n", url),
                    AttachmentKind::Video => format!("  [video] {}\n", url),
                    AttachmentKind::File => {
                        let label = if att.file_type.is_empty() { "file" } else { att.file_type.as_str() };
                        format!("  [download {}] {}\n", label, url)
                    }
                };
                out.push_str(&line);
            }
        }
    }
    out
}

pub fn notice_line(notice: &Notice) -> String {
    let prefix = match notice.kind {
        NoticeKind::Info => "info",
        NoticeKind::Success => "ok",
        NoticeKind::Warning => "warning",
        NoticeKind::Error => "error",
    };
    format!("{}: {}", prefix, notice.message)
}

pub fn status_pill(status: &str) -> String {
    if status.is_empty() {
        format!("[{}]", DASH)
    } else {
        format!("[{}]", status)
    }
}

/// Yandex Maps and Google Maps links for a point.
pub fn map_links(lat: f64, lon: f64) -> (String, String) {
    (
        format!("https://yandex.ru/maps/?pt={},{}&z=18&l=map", lon, lat),
        format!("https://www.google.com/maps?q={},{}", lat, lon),
    )
}

/// `YYYY-MM-DD HH:MM` in the timestamp's own offset; unparseable input is
/// returned unchanged.
pub fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Trim, then cut to `max_chars` characters ending in an ellipsis.
pub fn truncate(s: &str, max_chars: usize) -> String {
    let trimmed = s.trim();
    if trimmed.chars().count() <= max_chars {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

fn or_dash(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => DASH,
    }
}
