use anyhow::{Context, Result};
use std::io::Write;

use crate::client::ApiClient;
use crate::transport::Transport;

/// Print the districts and categories the submission form offers.
pub fn run<T: Transport>(client: &ApiClient<T>, out: &mut impl Write) -> Result<()> {
    let districts = client.districts().context("Failed to load districts")?;
    let categories = client.categories().context("Failed to load categories")?;

    writeln!(out, "Districts:")?;
    print_names(&districts, out)?;
    writeln!(out, "\nCategories:")?;
    print_names(&categories, out)?;
    Ok(())
}

fn print_names(names: &[String], out: &mut impl Write) -> Result<()> {
    if names.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for name in names {
        writeln!(out, "  {}", name)?;
    }
    Ok(())
}
