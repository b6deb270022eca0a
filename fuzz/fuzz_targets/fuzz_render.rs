#![no_main]

//! Fuzz target for the text views.
//!
//! The table truncates descriptions by character and the detail view
//! parses timestamps; any Unicode in any field must render without
//! panicking.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use civic_desk::dashboard::AttachmentsPane;
use civic_desk::models::{Attachment, Issue};
use civic_desk::render;

#[derive(Arbitrary, Debug)]
struct RenderInput {
    status: String,
    district: Option<String>,
    category: Option<String>,
    description: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    created_at: Option<String>,
    local_path: String,
    file_type: String,
    width: u8,
}

fuzz_target!(|input: RenderInput| {
    let issue = Issue {
        id: 1,
        status: input.status,
        district: input.district,
        category: input.category,
        description: input.description,
        latitude: input.latitude,
        longitude: input.longitude,
        created_at: input.created_at.clone(),
        updated_at: input.created_at,
    };

    let _ = render::issue_table(std::slice::from_ref(&issue));
    let _ = render::issue_detail(&issue);

    let truncated = render::truncate(&issue.description, input.width as usize + 1);
    assert!(truncated.chars().count() <= input.width as usize + 1);

    let pane = AttachmentsPane::Loaded(vec![Attachment {
        id: None,
        issue_id: Some(1),
        local_path: input.local_path,
        file_type: input.file_type,
        created_at: None,
    }]);
    let _ = render::attachment_gallery(&pane, "http://localhost:8080");
});
