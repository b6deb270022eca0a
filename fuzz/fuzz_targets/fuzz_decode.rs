#![no_main]

//! Fuzz target for response decoding.
//!
//! Issue and attachment lists come straight from the server with
//! inconsistent field casing. Decoding must reject or skip bad input,
//! never panic.

use libfuzzer_sys::fuzz_target;

use civic_desk::models::{decode_attachments, decode_issues, IssueStatus};

fuzz_target!(|data: &[u8]| {
    let Ok(body) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(issues) = decode_issues(body) {
        for issue in &issues {
            let _ = issue.status_kind();
            let _ = issue.coordinates();
        }
    }

    if let Ok(attachments) = decode_attachments(body) {
        for attachment in &attachments {
            assert!(attachment.url().starts_with('/'));
            let _ = attachment.kind();
        }
    }

    let _ = IssueStatus::parse(body);
});
