use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;

use crate::client::ApiClient;
use crate::geo::{Coordinates, GeoOptions, Locator};
use crate::submission::{self, IssueForm};
use crate::transport::Transport;

/// Everything the reporter supplied on the command line.
#[derive(Debug, Default)]
pub struct SubmitArgs {
    pub name: String,
    pub contact: String,
    pub district: String,
    pub category: String,
    pub description: String,
    pub location: String,
    pub coordinates: Option<Coordinates>,
    pub use_my_location: bool,
    pub files: Vec<PathBuf>,
}

pub fn run<T: Transport>(
    client: &ApiClient<T>,
    args: SubmitArgs,
    locator: Option<&dyn Locator>,
    geo: &GeoOptions,
    out: &mut impl Write,
) -> Result<()> {
    let mut form = IssueForm::new();
    form.name = args.name;
    form.contact = args.contact;
    form.district = args.district;
    form.category = args.category;
    form.description = args.description;
    form.location = args.location;

    for path in &args.files {
        form.attach_file(path)?;
    }

    if let Some(coords) = args.coordinates {
        form.set_coordinates(coords);
    } else if args.use_my_location {
        match locator {
            Some(locator) => match form.capture_location(locator, geo) {
                Ok(coords) => writeln!(out, "Location: {}", coords)?,
                // A missing fix never blocks the report.
                Err(e) => writeln!(out, "Location not captured: {}", e)?,
            },
            None => writeln!(out, "Location not captured: geolocation unavailable")?,
        }
    }

    let receipt = submission::submit(client, &mut form).context("Failed to submit issue")?;
    write!(out, "{}", receipt)?;
    Ok(())
}
