pub mod catalog;
pub mod comment;
pub mod export;
pub mod health;
pub mod list;
pub mod login;
pub mod logout;
pub mod shell;
pub mod show;
pub mod status;
pub mod submit;

use anyhow::anyhow;

use crate::credential::CredentialStore;
use crate::dashboard::{Dashboard, MSG_SESSION_REJECTED};
use crate::error::ApiError;

const LOGIN_HINT: &str = "Run 'civic-desk admin login'";

/// Turn a failed dashboard action into a CLI error, pointing at `login`
/// whenever the gate is what stopped it.
pub fn failure<S: CredentialStore>(dash: &Dashboard<S>, err: ApiError) -> anyhow::Error {
    match err {
        ApiError::AuthInvalid => anyhow!("{}. {}", MSG_SESSION_REJECTED, LOGIN_HINT),
        ApiError::Validation(msg) if !dash.gate().is_unlocked() => anyhow!("{}. {}", msg, LOGIN_HINT),
        other => anyhow!(other),
    }
}
