use anyhow::{Context, Result};
use std::io::Write;

use crate::client::ApiClient;
use crate::transport::Transport;

pub fn run<T: Transport>(client: &ApiClient<T>, out: &mut impl Write) -> Result<()> {
    client
        .health()
        .with_context(|| format!("Desk server at {} is not healthy", client.base_url()))?;
    writeln!(out, "Desk server at {} is up", client.base_url())?;
    Ok(())
}
