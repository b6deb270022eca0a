use anyhow::Result;
use std::io::Write;

use crate::client::ApiClient;
use crate::credential::CredentialStore;
use crate::dashboard::Dashboard;
use crate::models::StatusFilter;
use crate::render;
use crate::transport::Transport;

use super::failure;

pub fn run<T: Transport, S: CredentialStore>(
    dash: &mut Dashboard<S>,
    client: &ApiClient<T>,
    filter: StatusFilter,
    out: &mut impl Write,
) -> Result<()> {
    if let Err(err) = dash.set_filter(filter, client) {
        return Err(failure(dash, err));
    }
    write!(out, "{}", render::issue_table(dash.issues()))?;
    Ok(())
}
