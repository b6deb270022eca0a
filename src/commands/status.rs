use anyhow::{bail, Result};
use std::io::Write;

use crate::client::ApiClient;
use crate::credential::CredentialStore;
use crate::dashboard::Dashboard;
use crate::models::IssueStatus;
use crate::transport::Transport;

use super::failure;

/// Load the list and make `id` the selection without fetching attachments.
pub fn select_quietly<T: Transport, S: CredentialStore>(
    dash: &mut Dashboard<S>,
    client: &ApiClient<T>,
    id: i64,
) -> Result<()> {
    if let Err(err) = dash.refresh(client) {
        return Err(failure(dash, err));
    }
    if !dash.issues().iter().any(|i| i.id == id) {
        bail!("Issue #{} not found", id);
    }
    dash.begin_select(id).map_err(|err| failure(dash, err))?;
    Ok(())
}

pub fn run<T: Transport, S: CredentialStore>(
    dash: &mut Dashboard<S>,
    client: &ApiClient<T>,
    id: i64,
    status: IssueStatus,
    comment: Option<&str>,
    out: &mut impl Write,
) -> Result<()> {
    select_quietly(dash, client, id)?;
    if let Err(err) = dash.change_status(status, comment, client) {
        return Err(failure(dash, err));
    }
    writeln!(out, "Issue #{} is now {}", id, status.label(client.labels()))?;
    Ok(())
}
