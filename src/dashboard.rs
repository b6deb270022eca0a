//! Admin dashboard state.
//!
//! One [`Dashboard`] value owns everything the admin view shows: the gate,
//! the loaded list, the current selection and its attachment pane. Every
//! action takes it by `&mut` and runs one blocking call at a time.

use chrono::NaiveDate;

use crate::client::ApiClient;
use crate::credential::{CredentialError, CredentialStore};
use crate::error::ApiError;
use crate::gate::{AuthGate, Notice};
use crate::models::{Attachment, Issue, IssueStatus, StatusFilter};
use crate::transport::Transport;

pub const MSG_LOAD_NEEDS_SECRET: &str = "enter the admin secret to load issues";
pub const MSG_SESSION_REJECTED: &str = "invalid admin secret, sign in again";
pub const MSG_ISSUES_LOADED: &str = "issues loaded";
pub const MSG_LIST_NETWORK: &str = "network error while loading issues";
pub const MSG_NO_SECRET: &str = "admin secret not set";
pub const MSG_ATTACHMENTS_FAILED: &str = "failed to load attachments";
pub const MSG_SIGN_IN_FIRST: &str = "sign in first";
pub const MSG_EXPORT_PERIOD: &str = "choose an export period";

#[derive(Debug, Clone, PartialEq)]
pub enum AttachmentsPane {
    Loading,
    Message(Notice),
    Loaded(Vec<Attachment>),
}

/// Identifies one attachment fetch. Only the fetch whose ticket matches the
/// current selection may fill the pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub issue_id: i64,
    generation: u64,
}

/// Outcome of an attachment fetch, still tagged with the ticket it was
/// issued for.
#[derive(Debug)]
pub struct AttachmentFetch {
    pub ticket: FetchTicket,
    pub result: Result<Vec<Attachment>, ApiError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub issue_id: i64,
    pub attachments: AttachmentsPane,
    /// Result of the last status or comment action on this issue.
    pub notice: Option<Notice>,
    pub comment_draft: String,
}

pub struct Dashboard<S: CredentialStore> {
    gate: AuthGate<S>,
    filter: StatusFilter,
    issues: Vec<Issue>,
    selection: Option<Selection>,
    generation: u64,
    notice: Option<Notice>,
}

impl<S: CredentialStore> Dashboard<S> {
    pub fn new(gate: AuthGate<S>) -> Self {
        Dashboard {
            gate,
            filter: StatusFilter::All,
            issues: Vec::new(),
            selection: None,
            generation: 0,
            notice: None,
        }
    }

    pub fn restore(store: S) -> Self {
        Dashboard::new(AuthGate::restore(store))
    }

    pub fn gate(&self) -> &AuthGate<S> {
        &self.gate
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn selected_issue(&self) -> Option<&Issue> {
        let id = self.selection.as_ref()?.issue_id;
        self.issues.iter().find(|i| i.id == id)
    }

    /// Latest dashboard-level notice, falling back to the gate's own.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref().or_else(|| self.gate.notice())
    }

    /// Check `secret` and, when accepted, load the list straight away.
    pub fn unlock<T: Transport>(&mut self, secret: &str, client: &ApiClient<T>) -> Result<bool, CredentialError> {
        self.notice = None;
        let unlocked = self.gate.submit(secret, client)?;
        if unlocked {
            // A failed load leaves its own notice; the gate result stands.
            let _ = self.refresh(client);
        }
        Ok(unlocked)
    }

    pub fn change_secret(&mut self) -> Result<(), CredentialError> {
        let cleared = self.gate.change_secret();
        self.issues.clear();
        self.clear_selection();
        self.notice = None;
        cleared
    }

    /// Reload the list with the current filter. Returns the number of issues
    /// loaded.
    pub fn refresh<T: Transport>(&mut self, client: &ApiClient<T>) -> Result<usize, ApiError> {
        self.clear_selection();

        let Some(token) = self.gate.token().map(str::to_string) else {
            self.issues.clear();
            self.notice = Some(Notice::warning(MSG_LOAD_NEEDS_SECRET));
            return Err(ApiError::validation(MSG_LOAD_NEEDS_SECRET));
        };

        match client.list_issues(&token, self.filter) {
            Ok(issues) => {
                tracing::debug!(count = issues.len(), filter = %self.filter, "issues loaded");
                self.issues = issues;
                self.notice = Some(Notice::success(MSG_ISSUES_LOADED));
                Ok(self.issues.len())
            }
            Err(ApiError::AuthInvalid) => {
                self.reject_session();
                Err(ApiError::AuthInvalid)
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load issues");
                self.issues.clear();
                let message = match &err {
                    ApiError::Network(_) => MSG_LIST_NETWORK.to_string(),
                    other => other.to_string(),
                };
                self.notice = Some(Notice::error(message));
                Err(err)
            }
        }
    }

    pub fn set_filter<T: Transport>(&mut self, filter: StatusFilter, client: &ApiClient<T>) -> Result<usize, ApiError> {
        self.filter = filter;
        self.refresh(client)
    }

    /// Select an issue from the loaded list and fetch its attachments.
    pub fn select<T: Transport>(&mut self, issue_id: i64, client: &ApiClient<T>) -> Result<(), ApiError> {
        let ticket = self.begin_select(issue_id)?;
        let fetch = self.load_attachments(ticket, client);
        self.apply_attachments(fetch);
        Ok(())
    }

    /// Make `issue_id` the current selection with an empty, loading
    /// attachment pane. Any fetch issued for an earlier selection becomes
    /// stale.
    pub fn begin_select(&mut self, issue_id: i64) -> Result<FetchTicket, ApiError> {
        if !self.issues.iter().any(|i| i.id == issue_id) {
            return Err(ApiError::validation(format!("Issue #{} is not in the loaded list", issue_id)));
        }
        self.generation += 1;
        self.selection = Some(Selection {
            issue_id,
            attachments: AttachmentsPane::Loading,
            notice: None,
            comment_draft: String::new(),
        });
        Ok(FetchTicket {
            issue_id,
            generation: self.generation,
        })
    }

    /// Fetch attachments for `ticket`. Never touches the pane; hand the
    /// result to [`apply_attachments`](Self::apply_attachments).
    pub fn load_attachments<T: Transport>(&self, ticket: FetchTicket, client: &ApiClient<T>) -> AttachmentFetch {
        let result = match self.gate.token() {
            Some(token) => client.list_attachments(token, ticket.issue_id),
            None => Err(ApiError::validation(MSG_NO_SECRET)),
        };
        AttachmentFetch { ticket, result }
    }

    /// Fill the attachment pane from a finished fetch. Returns `false` when
    /// the fetch was for a selection that is no longer current; its items are
    /// dropped. A 401 locks the gate either way.
    pub fn apply_attachments(&mut self, fetch: AttachmentFetch) -> bool {
        if matches!(fetch.result, Err(ApiError::AuthInvalid)) {
            self.reject_session();
            return false;
        }

        let current = self.generation;
        let Some(selection) = self.selection.as_mut() else {
            return false;
        };
        if fetch.ticket.generation != current || fetch.ticket.issue_id != selection.issue_id {
            tracing::debug!(issue_id = fetch.ticket.issue_id, "discarding stale attachment result");
            return false;
        }

        selection.attachments = match fetch.result {
            Ok(items) => AttachmentsPane::Loaded(items),
            Err(ApiError::Validation(message)) => AttachmentsPane::Message(Notice::warning(message)),
            Err(err) => {
                tracing::warn!(issue_id = fetch.ticket.issue_id, error = %err, "failed to load attachments");
                AttachmentsPane::Message(Notice::error(MSG_ATTACHMENTS_FAILED))
            }
        };
        true
    }

    pub fn set_comment_draft(&mut self, text: &str) {
        if let Some(selection) = self.selection.as_mut() {
            selection.comment_draft = text.to_string();
        }
    }

    /// Move the selected issue to `status`, sending `comment` or, when that
    /// is `None`, the selection's comment draft. A blank comment goes out as
    /// null.
    ///
    /// On success the loaded list is patched in place rather than reloaded,
    /// and the issue is selected afresh: the draft is cleared and its
    /// attachments are fetched again.
    pub fn change_status<T: Transport>(
        &mut self,
        status: IssueStatus,
        comment: Option<&str>,
        client: &ApiClient<T>,
    ) -> Result<(), ApiError> {
        let issue_id = self.selected_id()?;
        let token = self.require_token()?;
        let comment = match comment {
            Some(text) => text.trim().to_string(),
            None => self
                .selection
                .as_ref()
                .map(|s| s.comment_draft.trim().to_string())
                .unwrap_or_default(),
        };
        let comment = Some(comment.as_str()).filter(|c| !c.is_empty());

        match client.set_status(&token, issue_id, status, comment) {
            Ok(()) => {
                let label = status.label(client.labels());
                if let Some(issue) = self.issues.iter_mut().find(|i| i.id == issue_id) {
                    issue.status = label.to_string();
                }
                tracing::info!(issue_id, status = label, "status updated");

                let ticket = self.begin_select(issue_id)?;
                let fetch = self.load_attachments(ticket, client);
                self.apply_attachments(fetch);
                self.set_selection_notice(Notice::success(format!("status set to {}", label)));
                Ok(())
            }
            Err(err) => Err(self.action_failed(err)),
        }
    }

    /// Post a comment on the selected issue. Blank text is rejected without
    /// touching the network.
    pub fn send_comment<T: Transport>(&mut self, text: &str, client: &ApiClient<T>) -> Result<(), ApiError> {
        let text = text.trim();
        if text.is_empty() {
            let err = ApiError::validation("comment is empty");
            self.set_selection_notice(Notice::warning(err.to_string()));
            return Err(err);
        }
        let issue_id = self.selected_id()?;
        let token = self.require_token()?;

        match client.add_comment(&token, issue_id, text) {
            Ok(()) => {
                tracing::info!(issue_id, "comment sent");
                if let Some(selection) = self.selection.as_mut() {
                    selection.comment_draft.clear();
                }
                self.set_selection_notice(Notice::success("comment sent"));
                Ok(())
            }
            Err(err) => Err(self.action_failed(err)),
        }
    }

    /// Export download URL for the inclusive `from`..`to` period, both given
    /// as `YYYY-MM-DD`.
    pub fn export_url<T: Transport>(&mut self, from: &str, to: &str, client: &ApiClient<T>) -> Result<String, ApiError> {
        let token = self.require_token()?;
        let (from, to) = (from.trim(), to.trim());
        if from.is_empty() || to.is_empty() {
            self.notice = Some(Notice::warning(MSG_EXPORT_PERIOD));
            return Err(ApiError::validation(MSG_EXPORT_PERIOD));
        }
        let from = parse_date(from)?;
        let to = parse_date(to)?;
        Ok(client.export_url(&token, from, to))
    }

    fn selected_id(&self) -> Result<i64, ApiError> {
        self.selection
            .as_ref()
            .map(|s| s.issue_id)
            .ok_or_else(|| ApiError::validation("no issue selected"))
    }

    fn require_token(&mut self) -> Result<String, ApiError> {
        match self.gate.token() {
            Some(token) => Ok(token.to_string()),
            None => {
                self.gate.lock(Notice::warning(MSG_SIGN_IN_FIRST));
                self.notice = Some(Notice::warning(MSG_SIGN_IN_FIRST));
                Err(ApiError::validation(MSG_SIGN_IN_FIRST))
            }
        }
    }

    /// Shared failure path for status and comment actions: 401 locks,
    /// anything else is shown next to the action.
    fn action_failed(&mut self, err: ApiError) -> ApiError {
        if err.is_auth() {
            self.reject_session();
        } else {
            tracing::warn!(error = %err, "admin action failed");
            self.set_selection_notice(Notice::error(err.to_string()));
        }
        err
    }

    fn set_selection_notice(&mut self, notice: Notice) {
        if let Some(selection) = self.selection.as_mut() {
            selection.notice = Some(notice);
        }
    }

    fn reject_session(&mut self) {
        self.gate.lock(Notice::error(MSG_SESSION_REJECTED));
        self.notice = Some(Notice::error(MSG_SESSION_REJECTED));
        self.issues.clear();
        self.clear_selection();
    }

    fn clear_selection(&mut self) {
        if self.selection.take().is_some() {
            self.generation += 1;
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| ApiError::validation(format!("Invalid date '{}'. Expected YYYY-MM-DD", s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::MemoryCredentialStore;
    use crate::gate::{GateState, NoticeKind};
    use crate::test_support::FakeTransport;
    use crate::transport::{Body, Method};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    const TWO_ISSUES: &str = r#"[
        {"id": 1, "status": "New", "district": "North", "description": "pothole"},
        {"ID": 2, "Status": "In-Progress", "District": "South", "Text": "broken lamp"}
    ]"#;

    fn unlocked() -> Dashboard<MemoryCredentialStore> {
        Dashboard::restore(MemoryCredentialStore::with_secret("s3cret"))
    }

    fn loaded(fake: FakeTransport) -> (Dashboard<MemoryCredentialStore>, ApiClient<FakeTransport>) {
        let client = ApiClient::new(fake.on(Method::Get, "/admin/issues", 200, TWO_ISSUES));
        let mut dash = unlocked();
        dash.refresh(&client).unwrap();
        (dash, client)
    }

    // ==================== List ====================

    #[test]
    fn test_refresh_without_secret_makes_no_call() {
        let client = ApiClient::new(FakeTransport::new());
        let mut dash = Dashboard::restore(MemoryCredentialStore::new());
        assert!(dash.refresh(&client).is_err());
        assert!(client.transport().calls().is_empty());
        assert!(dash.issues().is_empty());
        assert_eq!(dash.notice().unwrap().message, MSG_LOAD_NEEDS_SECRET);
    }

    #[test]
    fn test_refresh_loads_list() {
        let (dash, client) = loaded(FakeTransport::new());
        assert_eq!(dash.issues().len(), 2);
        assert_eq!(dash.issues()[1].description, "broken lamp");
        assert_eq!(dash.notice().unwrap().message, MSG_ISSUES_LOADED);
        assert_eq!(client.transport().calls()[0].query_value("token"), Some("s3cret"));
    }

    #[test]
    fn test_filter_sends_status_and_clears_selection() {
        let (mut dash, client) = loaded(FakeTransport::new());
        dash.begin_select(1).unwrap();
        dash.set_filter(StatusFilter::Only(IssueStatus::Done), &client).unwrap();
        assert!(dash.selection().is_none());
        let calls = client.transport().calls_to("/admin/issues");
        assert_eq!(calls.last().unwrap().query_value("status"), Some("Done"));
    }

    #[test]
    fn test_refresh_server_error_clears_list() {
        let client = ApiClient::new(
            FakeTransport::new()
                .on(Method::Get, "/admin/issues", 200, TWO_ISSUES)
                .on(Method::Get, "/admin/issues", 500, "db down"),
        );
        let mut dash = unlocked();
        dash.refresh(&client).unwrap();
        assert!(dash.refresh(&client).is_err());
        assert!(dash.issues().is_empty());
        assert_eq!(dash.notice().unwrap().message, "db down");
        assert!(dash.gate().is_unlocked());
    }

    #[test]
    fn test_refresh_network_error_message() {
        let client = ApiClient::new(FakeTransport::new().offline());
        let mut dash = unlocked();
        assert!(dash.refresh(&client).is_err());
        assert_eq!(dash.notice().unwrap().message, MSG_LIST_NETWORK);
    }

    #[test]
    fn test_refresh_unauthorized_locks() {
        let client = ApiClient::new(FakeTransport::new().on(Method::Get, "/admin/issues", 401, ""));
        let mut dash = unlocked();
        assert_eq!(dash.refresh(&client), Err(ApiError::AuthInvalid));
        assert_eq!(dash.gate().state(), GateState::Locked);
        assert_eq!(dash.gate().token(), None);
        assert_eq!(dash.notice().unwrap().message, MSG_SESSION_REJECTED);
    }

    #[test]
    fn test_unlock_then_loads() {
        let client = ApiClient::new(
            FakeTransport::new()
                .on(Method::Get, "/admin/ping", 200, "ok")
                .on(Method::Get, "/admin/issues", 200, TWO_ISSUES),
        );
        let mut dash = Dashboard::restore(MemoryCredentialStore::new());
        assert!(dash.unlock("s3cret", &client).unwrap());
        assert_eq!(dash.issues().len(), 2);
    }

    #[test]
    fn test_change_secret_clears_everything() {
        let (mut dash, _client) = loaded(FakeTransport::new());
        dash.begin_select(2).unwrap();
        dash.change_secret().unwrap();
        assert!(dash.issues().is_empty());
        assert!(dash.selection().is_none());
        assert_eq!(dash.gate().store().load(), None);
    }

    // ==================== Selection & attachments ====================

    #[test]
    fn test_select_fetches_attachments_once() {
        let (mut dash, client) = loaded(FakeTransport::new().on(
            Method::Get,
            "/admin/issues/1/attachments",
            200,
            r#"[{"local_path": "uploads/a.jpg", "file_type": "image/jpeg"}]"#,
        ));
        dash.select(1, &client).unwrap();

        let calls = client.transport().calls_to("/admin/issues/1/attachments");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].query_value("token"), Some("s3cret"));
        match &dash.selection().unwrap().attachments {
            AttachmentsPane::Loaded(items) => assert_eq!(items[0].url(), "/uploads/a.jpg"),
            other => panic!("unexpected pane: {:?}", other),
        }
        assert_eq!(dash.selected_issue().unwrap().id, 1);
    }

    #[test]
    fn test_select_unknown_issue() {
        let (mut dash, client) = loaded(FakeTransport::new());
        assert!(dash.select(99, &client).is_err());
        assert!(client.transport().calls_to("/admin/issues/99/attachments").is_empty());
    }

    #[test]
    fn test_stale_attachments_are_discarded() {
        let (mut dash, client) = loaded(
            FakeTransport::new()
                .on(Method::Get, "/admin/issues/1/attachments", 200, r#"[{"local_path": "uploads/x.jpg", "file_type": "image/jpeg"}]"#)
                .on(Method::Get, "/admin/issues/2/attachments", 200, "[]"),
        );

        let first = dash.begin_select(1).unwrap();
        let slow = dash.load_attachments(first, &client);
        let second = dash.begin_select(2).unwrap();
        let fast = dash.load_attachments(second, &client);

        assert!(dash.apply_attachments(fast));
        assert!(!dash.apply_attachments(slow));
        assert_eq!(dash.selection().unwrap().issue_id, 2);
        assert_eq!(dash.selection().unwrap().attachments, AttachmentsPane::Loaded(vec![]));
    }

    #[test]
    fn test_reselecting_same_issue_fences_old_fetch() {
        let (mut dash, client) = loaded(FakeTransport::new().on(Method::Get, "/admin/issues/1/attachments", 200, "[]"));
        let old = dash.begin_select(1).unwrap();
        let old_fetch = dash.load_attachments(old, &client);
        dash.begin_select(1).unwrap();
        assert!(!dash.apply_attachments(old_fetch));
        assert_eq!(dash.selection().unwrap().attachments, AttachmentsPane::Loading);
    }

    #[test]
    fn test_stale_unauthorized_still_locks() {
        let (mut dash, client) = loaded(FakeTransport::new().on(Method::Get, "/admin/issues/1/attachments", 401, ""));
        let first = dash.begin_select(1).unwrap();
        let fetch = dash.load_attachments(first, &client);
        dash.begin_select(2).unwrap();
        assert!(!dash.apply_attachments(fetch));
        assert_eq!(dash.gate().state(), GateState::Locked);
    }

    #[test]
    fn test_attachment_error_message() {
        let (mut dash, client) = loaded(FakeTransport::new().on(Method::Get, "/admin/issues/1/attachments", 500, "boom"));
        dash.select(1, &client).unwrap();
        assert_eq!(
            dash.selection().unwrap().attachments,
            AttachmentsPane::Message(Notice::error(MSG_ATTACHMENTS_FAILED))
        );
    }

    // ==================== Actions ====================

    #[test]
    fn test_change_status_done_body_and_local_update() {
        let (mut dash, client) = loaded(
            FakeTransport::new()
                .on(Method::Get, "/admin/issues/1/attachments", 200, "[]")
                .on(Method::Post, "/admin/status", 200, "ok"),
        );
        dash.select(1, &client).unwrap();
        dash.change_status(IssueStatus::Done, Some("fixed"), &client).unwrap();

        let posts = client.transport().calls_to("/admin/status");
        assert_eq!(
            posts[0].body,
            Body::Json(json!({"token": "s3cret", "issue_id": 1, "status": "Done", "comment": "fixed", "admin_tg": null}))
        );
        assert_eq!(dash.selected_issue().unwrap().status, "Done");
        // No list reload.
        assert_eq!(client.transport().calls_to("/admin/issues").len(), 1);
        assert_eq!(dash.selection().unwrap().notice.as_ref().unwrap().kind, NoticeKind::Success);
    }

    #[test]
    fn test_change_status_sends_draft_and_reselects() {
        let (mut dash, client) = loaded(
            FakeTransport::new()
                .on(Method::Get, "/admin/issues/1/attachments", 200, "[]")
                .on(Method::Get, "/admin/issues/1/attachments", 200, r#"[{"local_path": "uploads/after.jpg", "file_type": "image/jpeg"}]"#)
                .on(Method::Post, "/admin/status", 200, "ok"),
        );
        dash.select(1, &client).unwrap();
        dash.set_comment_draft("  crew sent ");

        dash.change_status(IssueStatus::Done, None, &client).unwrap();

        let posts = client.transport().calls_to("/admin/status");
        assert_eq!(
            posts[0].body,
            Body::Json(json!({"token": "s3cret", "issue_id": 1, "status": "Done", "comment": "crew sent", "admin_tg": null}))
        );
        let selection = dash.selection().unwrap();
        assert_eq!(selection.issue_id, 1);
        assert_eq!(selection.comment_draft, "");
        assert_eq!(client.transport().calls_to("/admin/issues/1/attachments").len(), 2);
        match &selection.attachments {
            AttachmentsPane::Loaded(items) => assert_eq!(items.len(), 1),
            other => panic!("unexpected pane: {:?}", other),
        }
        assert_eq!(selection.notice, Some(Notice::success("status set to Done")));
    }

    #[test]
    fn test_change_status_blank_draft_is_null() {
        let (mut dash, client) = loaded(FakeTransport::new().on(Method::Post, "/admin/status", 200, "ok"));
        dash.begin_select(2).unwrap();
        dash.set_comment_draft("   ");

        dash.change_status(IssueStatus::Rejected, None, &client).unwrap();

        let posts = client.transport().calls_to("/admin/status");
        assert_eq!(
            posts[0].body,
            Body::Json(json!({"token": "s3cret", "issue_id": 2, "status": "Rejected", "comment": null, "admin_tg": null}))
        );
    }

    #[test]
    fn test_change_status_failure_keeps_draft() {
        let (mut dash, client) = loaded(FakeTransport::new().on(Method::Post, "/admin/status", 500, "db down"));
        dash.begin_select(1).unwrap();
        dash.set_comment_draft("crew sent");

        assert!(dash.change_status(IssueStatus::Done, None, &client).is_err());
        assert_eq!(dash.selection().unwrap().comment_draft, "crew sent");
        assert!(client.transport().calls_to("/admin/issues/1/attachments").is_empty());
    }

    #[test]
    fn test_change_status_error_stays_unlocked() {
        let (mut dash, client) = loaded(FakeTransport::new().on(Method::Post, "/admin/status", 400, "unknown status"));
        dash.begin_select(1).unwrap();
        assert!(dash.change_status(IssueStatus::Rejected, None, &client).is_err());
        assert!(dash.gate().is_unlocked());
        assert_eq!(dash.selection().unwrap().notice, Some(Notice::error("unknown status")));
        assert_eq!(dash.selected_issue().unwrap().status, "New");
    }

    #[test]
    fn test_change_status_unauthorized_locks() {
        let (mut dash, client) = loaded(FakeTransport::new().on(Method::Post, "/admin/status", 401, ""));
        dash.begin_select(1).unwrap();
        assert_eq!(dash.change_status(IssueStatus::Done, None, &client), Err(ApiError::AuthInvalid));
        assert_eq!(dash.gate().token(), None);
    }

    #[test]
    fn test_comment_blank_is_rejected_locally() {
        let (mut dash, client) = loaded(FakeTransport::new());
        dash.begin_select(1).unwrap();
        assert!(dash.send_comment("   ", &client).is_err());
        assert!(client.transport().calls_to("/admin/comment").is_empty());
    }

    #[test]
    fn test_comment_clears_draft_and_keeps_status() {
        let (mut dash, client) = loaded(FakeTransport::new().on(Method::Post, "/admin/comment", 200, "ok"));
        dash.begin_select(2).unwrap();
        dash.set_comment_draft("  on our way ");
        dash.send_comment("  on our way ", &client).unwrap();

        let posts = client.transport().calls_to("/admin/comment");
        assert_eq!(posts[0].body, Body::Json(json!({"token": "s3cret", "issue_id": 2, "text": "on our way"})));
        assert_eq!(dash.selection().unwrap().comment_draft, "");
        assert_eq!(dash.selected_issue().unwrap().status, "In-Progress");
    }

    #[test]
    fn test_action_without_token_locks() {
        let (mut dash, client) = loaded(FakeTransport::new());
        dash.begin_select(1).unwrap();
        dash.gate.lock(Notice::info("locked"));
        assert!(dash.send_comment("hello", &client).is_err());
        assert_eq!(dash.notice().unwrap().message, MSG_SIGN_IN_FIRST);
        assert!(client.transport().calls_to("/admin/comment").is_empty());
    }

    // ==================== Export ====================

    #[test]
    fn test_export_url() {
        let client = ApiClient::new(FakeTransport::new());
        let mut dash = unlocked();
        let url = dash.export_url("2024-01-01", "2024-01-31", &client).unwrap();
        assert_eq!(url, "http://desk.test/export?token=s3cret&from=2024-01-01&to=2024-01-31");
        assert!(client.transport().calls().is_empty());
    }

    #[test]
    fn test_export_requires_period() {
        let client = ApiClient::new(FakeTransport::new());
        let mut dash = unlocked();
        assert_eq!(
            dash.export_url("2024-01-01", "", &client),
            Err(ApiError::validation(MSG_EXPORT_PERIOD))
        );
        assert!(dash.export_url("01/02/2024", "2024-01-31", &client).is_err());
    }

    #[test]
    fn test_export_requires_token() {
        let client = ApiClient::new(FakeTransport::new());
        let mut dash = Dashboard::restore(MemoryCredentialStore::new());
        assert!(dash.export_url("2024-01-01", "2024-01-31", &client).is_err());
        assert_eq!(dash.notice().unwrap().message, MSG_SIGN_IN_FIRST);
    }

    proptest! {
        #[test]
        fn prop_only_latest_selection_applies(order in proptest::collection::vec(1i64..=2, 1..8)) {
            let fake = FakeTransport::new()
                .on(Method::Get, "/admin/issues", 200, TWO_ISSUES)
                .on(Method::Get, "/admin/issues/1/attachments", 200, "[]")
                .on(Method::Get, "/admin/issues/2/attachments", 200, "[]");
            let client = ApiClient::new(fake);
            let mut dash = unlocked();
            dash.refresh(&client).unwrap();

            let mut fetches = Vec::new();
            for id in &order {
                let ticket = dash.begin_select(*id).unwrap();
                fetches.push(dash.load_attachments(ticket, &client));
            }
            let applied: Vec<bool> = fetches.into_iter().map(|f| dash.apply_attachments(f)).collect();
            let last = applied.len() - 1;
            for (i, ok) in applied.iter().enumerate() {
                prop_assert_eq!(*ok, i == last);
            }
        }
    }
}
