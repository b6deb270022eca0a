use anyhow::{bail, Result};
use std::io::{BufRead, Write};

use crate::client::ApiClient;
use crate::credential::CredentialStore;
use crate::dashboard::Dashboard;
use crate::transport::Transport;

/// Check the admin secret against the server and remember it on success.
/// Without `secret`, one line is read from `input` after a prompt.
pub fn run<T: Transport, S: CredentialStore>(
    dash: &mut Dashboard<S>,
    client: &ApiClient<T>,
    secret: Option<&str>,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    let secret = match secret {
        Some(s) => s.to_string(),
        None => {
            write!(out, "Admin secret: ")?;
            out.flush()?;
            let mut line = String::new();
            input.read_line(&mut line)?;
            line
        }
    };

    if dash.unlock(&secret, client)? {
        writeln!(out, "Access granted. {} issue(s) loaded.", dash.issues().len())?;
        return Ok(());
    }

    match dash.gate().notice() {
        Some(notice) => bail!("{}", notice.message),
        None => bail!("Access denied"),
    }
}
