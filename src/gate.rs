//! Admin authentication gate.
//!
//! ```text
//!            submit(secret)            ping 2xx
//!  Locked ─────────────────> Checking ─────────> Unlocked
//!    ^  ^                        │                  │
//!    │  └────────────────────────┘                  │
//!    │     ping 401 / other status / network        │
//!    └──────────────────────────────────────────────┘
//!         change_secret(), or any admin call -> 401
//! ```

use crate::client::ApiClient;
use crate::credential::{CredentialError, CredentialStore};
use crate::error::ApiError;
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Locked,
    Checking,
    Unlocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

/// A one-line status message shown next to the control that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

pub const PROMPT_ENTER_SECRET: &str = "enter the admin secret";
pub const MSG_INVALID_SECRET: &str = "invalid admin secret";
pub const MSG_CHECK_NETWORK: &str = "network error while checking access";
pub const MSG_ACCESS_GRANTED: &str = "access granted";
pub const MSG_ENTER_NEW_SECRET: &str = "enter a new admin secret";
pub const MSG_SAVE_FAILED: &str = "could not save the admin secret";

pub struct AuthGate<S: CredentialStore> {
    store: S,
    state: GateState,
    token: Option<String>,
    notice: Option<Notice>,
}

impl<S: CredentialStore> AuthGate<S> {
    /// Start from whatever the store holds. A stored secret unlocks the gate
    /// optimistically; the first admin call will lock it again if the server
    /// no longer accepts it.
    pub fn restore(store: S) -> Self {
        match store.load() {
            Some(secret) => {
                tracing::debug!("restored admin secret from store");
                AuthGate {
                    store,
                    state: GateState::Unlocked,
                    token: Some(secret),
                    notice: None,
                }
            }
            None => AuthGate {
                store,
                state: GateState::Locked,
                token: None,
                notice: Some(Notice::info(PROMPT_ENTER_SECRET)),
            },
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == GateState::Unlocked
    }

    /// The secret to send, only while unlocked.
    pub fn token(&self) -> Option<&str> {
        match self.state {
            GateState::Unlocked => self.token.as_deref(),
            _ => None,
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate `secret` against the ping endpoint.
    ///
    /// Returns `Ok(true)` when the gate ends up unlocked. A rejected secret is
    /// `Ok(false)` with the reason in [`notice`](Self::notice); only a failure
    /// to persist an accepted secret is an error.
    pub fn submit<T: Transport>(&mut self, secret: &str, client: &ApiClient<T>) -> Result<bool, CredentialError> {
        let secret = secret.trim();
        if secret.is_empty() {
            self.state = GateState::Locked;
            self.notice = Some(Notice::warning(PROMPT_ENTER_SECRET));
            return Ok(false);
        }

        self.state = GateState::Checking;
        self.notice = Some(Notice::info("checking..."));

        match client.ping(secret) {
            Ok(()) => {
                if let Err(err) = self.store.store(secret) {
                    tracing::error!(error = %err, "failed to persist admin secret");
                    self.state = GateState::Locked;
                    self.token = None;
                    self.notice = Some(Notice::error(MSG_SAVE_FAILED));
                    return Err(err);
                }
                self.token = Some(secret.to_string());
                self.state = GateState::Unlocked;
                self.notice = Some(Notice::success(MSG_ACCESS_GRANTED));
                tracing::info!("admin gate unlocked");
                Ok(true)
            }
            Err(err) => {
                let message = match &err {
                    ApiError::AuthInvalid => MSG_INVALID_SECRET.to_string(),
                    ApiError::Network(_) => MSG_CHECK_NETWORK.to_string(),
                    ApiError::Server { status, .. } => format!("access check failed: {}", status),
                    other => format!("access check failed: {}", other),
                };
                tracing::warn!(error = %err, "admin secret rejected");
                self.state = GateState::Locked;
                self.notice = Some(Notice::error(message));
                Ok(false)
            }
        }
    }

    /// Forget the secret entirely, in memory and in the store. The gate is
    /// locked even when the stored copy cannot be removed.
    pub fn change_secret(&mut self) -> Result<(), CredentialError> {
        self.token = None;
        self.state = GateState::Locked;
        self.notice = Some(Notice::info(MSG_ENTER_NEW_SECRET));
        self.store.clear()
    }

    /// Force the gate shut. The stored secret is kept but unused until a
    /// secret is entered again.
    pub fn lock(&mut self, notice: Notice) {
        if self.state != GateState::Locked {
            tracing::info!(reason = %notice.message, "admin gate locked");
        }
        self.state = GateState::Locked;
        self.token = None;
        self.notice = Some(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::{FileCredentialStore, MemoryCredentialStore};
    use crate::test_support::FakeTransport;
    use crate::transport::Method;
    use proptest::prelude::*;
    use tempfile::tempdir;

    /// A store whose disk is read-only.
    struct ReadOnlyStore(Option<String>);

    impl CredentialStore for ReadOnlyStore {
        fn load(&self) -> Option<String> {
            self.0.clone()
        }

        fn store(&self, _secret: &str) -> Result<(), CredentialError> {
            Err(CredentialError::Write {
                path: "admin_secret".into(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            })
        }

        fn clear(&self) -> Result<(), CredentialError> {
            Err(CredentialError::Remove {
                path: "admin_secret".into(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            })
        }
    }

    fn ping_client(status: u16) -> ApiClient<FakeTransport> {
        ApiClient::new(FakeTransport::new().on(Method::Get, "/admin/ping", status, ""))
    }

    #[test]
    fn test_restore_without_secret_is_locked() {
        let gate = AuthGate::restore(MemoryCredentialStore::new());
        assert_eq!(gate.state(), GateState::Locked);
        assert_eq!(gate.token(), None);
        assert_eq!(gate.notice().unwrap().message, PROMPT_ENTER_SECRET);
    }

    #[test]
    fn test_restore_with_secret_is_unlocked() {
        let gate = AuthGate::restore(MemoryCredentialStore::with_secret("abc"));
        assert_eq!(gate.state(), GateState::Unlocked);
        assert_eq!(gate.token(), Some("abc"));
    }

    #[test]
    fn test_submit_accepted_persists() {
        let dir = tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("admin_secret"));
        let mut gate = AuthGate::restore(store);
        let client = ping_client(200);

        assert!(gate.submit(" abc ", &client).unwrap());
        assert_eq!(gate.state(), GateState::Unlocked);
        assert_eq!(gate.token(), Some("abc"));
        assert_eq!(gate.store().load().as_deref(), Some("abc"));
        assert_eq!(client.transport().calls()[0].query_value("token"), Some("abc"));
    }

    #[test]
    fn test_submit_rejected_persists_nothing() {
        let mut gate = AuthGate::restore(MemoryCredentialStore::new());
        assert!(!gate.submit("wrong", &ping_client(401)).unwrap());
        assert_eq!(gate.state(), GateState::Locked);
        assert_eq!(gate.store().load(), None);
        assert_eq!(gate.notice().unwrap().message, MSG_INVALID_SECRET);
    }

    #[test]
    fn test_submit_other_status_has_distinct_message() {
        let mut gate = AuthGate::restore(MemoryCredentialStore::new());
        assert!(!gate.submit("abc", &ping_client(500)).unwrap());
        assert_eq!(gate.notice().unwrap().message, "access check failed: 500");
        assert_eq!(gate.notice().unwrap().kind, NoticeKind::Error);
    }

    #[test]
    fn test_submit_network_failure() {
        let mut gate = AuthGate::restore(MemoryCredentialStore::new());
        let client = ApiClient::new(FakeTransport::new().offline());
        assert!(!gate.submit("abc", &client).unwrap());
        assert_eq!(gate.state(), GateState::Locked);
        assert_eq!(gate.notice().unwrap().message, MSG_CHECK_NETWORK);
    }

    #[test]
    fn test_submit_blank_makes_no_call() {
        let mut gate = AuthGate::restore(MemoryCredentialStore::new());
        let client = ping_client(200);
        assert!(!gate.submit("   ", &client).unwrap());
        assert!(client.transport().calls().is_empty());
        assert_eq!(gate.notice().unwrap().kind, NoticeKind::Warning);
    }

    #[test]
    fn test_rejected_secret_replaces_nothing_stored() {
        let mut gate = AuthGate::restore(MemoryCredentialStore::with_secret("old"));
        assert!(!gate.submit("new", &ping_client(401)).unwrap());
        assert_eq!(gate.state(), GateState::Locked);
        assert_eq!(gate.token(), None);
        assert_eq!(gate.store().load().as_deref(), Some("old"));
    }

    #[test]
    fn test_change_secret_clears_store() {
        let mut gate = AuthGate::restore(MemoryCredentialStore::with_secret("abc"));
        gate.change_secret().unwrap();
        assert_eq!(gate.state(), GateState::Locked);
        assert_eq!(gate.token(), None);
        assert_eq!(gate.store().load(), None);
    }

    #[test]
    fn test_unsaved_secret_leaves_gate_locked() {
        let mut gate = AuthGate::restore(ReadOnlyStore(None));
        let err = gate.submit("abc", &ping_client(200)).unwrap_err();
        assert!(matches!(err, CredentialError::Write { .. }));
        assert_eq!(gate.state(), GateState::Locked);
        assert_eq!(gate.token(), None);
        assert_eq!(gate.notice().unwrap().message, MSG_SAVE_FAILED);
        assert_eq!(gate.notice().unwrap().kind, NoticeKind::Error);
    }

    #[test]
    fn test_change_secret_locks_when_removal_fails() {
        let mut gate = AuthGate::restore(ReadOnlyStore(Some("old".into())));
        assert_eq!(gate.token(), Some("old"));

        assert!(gate.change_secret().is_err());
        assert_eq!(gate.state(), GateState::Locked);
        assert_eq!(gate.token(), None);
        assert_eq!(gate.notice().unwrap().message, MSG_ENTER_NEW_SECRET);
    }

    #[test]
    fn test_lock_hides_token_but_keeps_store() {
        let mut gate = AuthGate::restore(MemoryCredentialStore::with_secret("abc"));
        gate.lock(Notice::error("invalid admin secret, sign in again"));
        assert_eq!(gate.state(), GateState::Locked);
        assert_eq!(gate.token(), None);
        assert_eq!(gate.store().load().as_deref(), Some("abc"));
    }

    proptest! {
        #[test]
        fn prop_accepted_secret_unlocks_and_persists(secret in "[a-zA-Z0-9]{1,32}") {
            let mut gate = AuthGate::restore(MemoryCredentialStore::new());
            prop_assert!(gate.submit(&secret, &ping_client(200)).unwrap());
            prop_assert_eq!(gate.state(), GateState::Unlocked);
            prop_assert_eq!(gate.store().load(), Some(secret));
        }

        #[test]
        fn prop_rejected_secret_stays_locked(secret in "[a-zA-Z0-9]{1,32}") {
            let mut gate = AuthGate::restore(MemoryCredentialStore::new());
            prop_assert!(!gate.submit(&secret, &ping_client(401)).unwrap());
            prop_assert_eq!(gate.state(), GateState::Locked);
            prop_assert_eq!(gate.store().load(), None);
        }
    }
}
