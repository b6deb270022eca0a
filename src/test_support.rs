//! In-memory transport for unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use crate::error::ApiError;
use crate::transport::{Method, Request, Response, Transport};

/// Routes requests by method and path to canned responses and records every
/// request it sees.
///
/// A route registered several times answers in registration order; the last
/// answer repeats once the queue is drained. Unrouted requests get a 404.
pub struct FakeTransport {
    routes: RefCell<HashMap<(Method, String), VecDeque<Response>>>,
    calls: RefCell<Vec<Request>>,
    offline: bool,
}

impl FakeTransport {
    pub fn new() -> Self {
        FakeTransport {
            routes: RefCell::new(HashMap::new()),
            calls: RefCell::new(Vec::new()),
            offline: false,
        }
    }

    pub fn on(self, method: Method, path: &str, status: u16, body: &str) -> Self {
        self.routes
            .borrow_mut()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(Response::new(status, body));
        self
    }

    /// Build from a route table of `(method, path, status, body)`.
    pub fn with_routes(routes: &[(Method, &str, u16, &str)]) -> Self {
        routes
            .iter()
            .fold(FakeTransport::new(), |fake, (method, path, status, body)| {
                fake.on(*method, path, *status, body)
            })
    }

    /// Every request fails as if the network were down.
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    pub fn calls(&self) -> Vec<Request> {
        self.calls.borrow().clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<Request> {
        self.calls
            .borrow()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }
}

impl Transport for FakeTransport {
    fn base_url(&self) -> &str {
        "http://desk.test"
    }

    fn send(&self, request: &Request) -> Result<Response, ApiError> {
        self.calls.borrow_mut().push(request.clone());
        if self.offline {
            return Err(ApiError::Network("connection refused".into()));
        }

        let mut routes = self.routes.borrow_mut();
        let Some(queue) = routes.get_mut(&(request.method, request.path.clone())) else {
            return Ok(Response::new(404, "404 page not found"));
        };
        let resp = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        Ok(resp.unwrap_or_else(|| Response::new(404, "404 page not found")))
    }
}

/// Two issues in the list endpoint's shape: #1 is new with a location, #2 is
/// done.
pub const TWO_ISSUES: &str = r#"[
    {"id": 1, "status": "New", "district": "North", "category": "Roads", "description": "pothole",
     "latitude": 55.1, "longitude": 37.2, "created_at": "2024-05-01T10:05:00Z"},
    {"id": 2, "status": "Done", "district": "South", "description": "broken lamp"}
]"#;
