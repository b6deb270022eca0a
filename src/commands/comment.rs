use anyhow::Result;
use std::io::Write;

use crate::client::ApiClient;
use crate::credential::CredentialStore;
use crate::dashboard::Dashboard;
use crate::transport::Transport;

use super::failure;
use super::status::select_quietly;

pub fn run<T: Transport, S: CredentialStore>(
    dash: &mut Dashboard<S>,
    client: &ApiClient<T>,
    id: i64,
    text: &str,
    out: &mut impl Write,
) -> Result<()> {
    if text.trim().is_empty() {
        anyhow::bail!("Comment text is empty");
    }
    select_quietly(dash, client, id)?;
    if let Err(err) = dash.send_comment(text, client) {
        return Err(failure(dash, err));
    }
    writeln!(out, "Added comment to issue #{}", id)?;
    Ok(())
}
