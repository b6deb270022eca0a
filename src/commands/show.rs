use anyhow::{bail, Result};
use std::io::Write;

use crate::client::ApiClient;
use crate::credential::CredentialStore;
use crate::dashboard::Dashboard;
use crate::render;
use crate::transport::Transport;

use super::failure;

/// Print the detail view and attachment gallery of the selected issue.
pub fn print_selection<S: CredentialStore>(dash: &Dashboard<S>, base_url: &str, out: &mut impl Write) -> Result<()> {
    let (Some(issue), Some(selection)) = (dash.selected_issue(), dash.selection()) else {
        bail!("No issue selected");
    };
    write!(out, "{}", render::issue_detail(issue))?;
    write!(out, "{}", render::attachment_gallery(&selection.attachments, base_url))?;
    if let Some(notice) = &selection.notice {
        writeln!(out, "\n{}", render::notice_line(notice))?;
    }
    Ok(())
}

pub fn run<T: Transport, S: CredentialStore>(
    dash: &mut Dashboard<S>,
    client: &ApiClient<T>,
    id: i64,
    out: &mut impl Write,
) -> Result<()> {
    if let Err(err) = dash.refresh(client) {
        return Err(failure(dash, err));
    }
    if !dash.issues().iter().any(|i| i.id == id) {
        bail!("Issue #{} not found", id);
    }
    if let Err(err) = dash.select(id, client) {
        return Err(failure(dash, err));
    }
    // A 401 on the attachment fetch locks the gate without failing select.
    if !dash.gate().is_unlocked() {
        return Err(failure(dash, crate::ApiError::AuthInvalid));
    }
    print_selection(dash, client.base_url(), out)
}
