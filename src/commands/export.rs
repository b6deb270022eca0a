use anyhow::{Context, Result};
use std::io::Write;

use crate::client::ApiClient;
use crate::credential::CredentialStore;
use crate::dashboard::Dashboard;
use crate::transport::Transport;

use super::failure;

/// Build the export URL for `from`..`to` and hand it to the system browser,
/// or just print it when `print_only` is set.
pub fn run<T: Transport, S: CredentialStore>(
    dash: &mut Dashboard<S>,
    client: &ApiClient<T>,
    from: &str,
    to: &str,
    print_only: bool,
    out: &mut impl Write,
) -> Result<()> {
    let url = dash.export_url(from, to, client).map_err(|err| failure(dash, err))?;

    if print_only {
        writeln!(out, "{}", url)?;
        return Ok(());
    }

    open::that(&url).context("Failed to open the export in a browser")?;
    writeln!(out, "Opened export for {} to {}", from.trim(), to.trim())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeTransport;
    use crate::credential::MemoryCredentialStore;

    #[test]
    fn test_export_prints_url() {
        let client = ApiClient::new(FakeTransport::with_routes(&[]));
        let mut dash = Dashboard::restore(MemoryCredentialStore::with_secret("s3cret"));
        let mut out = Vec::new();

        run(&mut dash, &client, "2024-03-01", "2024-03-31", true, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "http://desk.test/export?token=s3cret&from=2024-03-01&to=2024-03-31\n"
        );
    }

    #[test]
    fn test_export_needs_period() {
        let client = ApiClient::new(FakeTransport::with_routes(&[]));
        let mut dash = Dashboard::restore(MemoryCredentialStore::with_secret("s3cret"));
        let err = run(&mut dash, &client, "", "2024-03-31", true, &mut Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "choose an export period");
    }

    #[test]
    fn test_export_rejects_bad_date() {
        let client = ApiClient::new(FakeTransport::with_routes(&[]));
        let mut dash = Dashboard::restore(MemoryCredentialStore::with_secret("s3cret"));
        let err = run(&mut dash, &client, "31.03.2024", "2024-03-31", true, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_export_without_secret() {
        let client = ApiClient::new(FakeTransport::with_routes(&[]));
        let mut dash = Dashboard::restore(MemoryCredentialStore::new());
        let err = run(&mut dash, &client, "2024-03-01", "2024-03-31", true, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("sign in first"));
    }
}
