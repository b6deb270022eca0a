use anyhow::{Context, Result};
use std::io::Write;

use crate::credential::CredentialStore;
use crate::dashboard::Dashboard;

pub fn run<S: CredentialStore>(dash: &mut Dashboard<S>, out: &mut impl Write) -> Result<()> {
    dash.change_secret().context("Failed to clear the stored admin secret")?;
    writeln!(out, "Admin secret cleared.")?;
    Ok(())
}
