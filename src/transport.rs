//! Request/response plumbing between the client and the desk server.
//!
//! [`ApiClient`](crate::client::ApiClient) only ever talks to a [`Transport`],
//! so the HTTP stack can be swapped for an in-memory fake in tests.

use reqwest::blocking::multipart::{Form, Part};
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

/// One uploaded file inside a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<FilePart>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Body,
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        Request {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: Body::Empty,
        }
    }

    pub fn post_json(path: impl Into<String>, body: serde_json::Value) -> Self {
        Request {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            body: Body::Json(body),
        }
    }

    pub fn post_multipart(path: impl Into<String>, parts: Vec<FilePart>) -> Self {
        Request {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            body: Body::Multipart(parts),
        }
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// Query parameter lookup, first match wins.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let pairs: Vec<String> = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        format!("{}?{}", self.path, pairs.join("&"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Response {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

pub trait Transport {
    /// Root every request path is resolved against, without a trailing slash.
    fn base_url(&self) -> &str;

    /// Perform one request. Only failures to obtain a response are errors;
    /// every HTTP status comes back as a [`Response`].
    fn send(&self, request: &Request) -> Result<Response, ApiError>;

    fn url_for(&self, request: &Request) -> String {
        format!("{}{}", self.base_url(), request.path_and_query())
    }
}

/// [`Transport`] backed by a blocking `reqwest` client.
///
/// No request timeout is configured; admin calls wait as long as the server
/// takes.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("civic-desk/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpTransport {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl Transport for HttpTransport {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn send(&self, request: &Request) -> Result<Response, ApiError> {
        let url = self.url_for(request);
        // The query carries the admin secret, so only the path is logged.
        tracing::debug!(method = ?request.method, path = %request.path, "sending request");

        let builder = match request.method {
            Method::Get => self.client.get(&url).header(CACHE_CONTROL, "no-store"),
            Method::Post => self.client.post(&url),
        };

        let builder = match &request.body {
            Body::Empty => builder,
            Body::Json(value) => {
                let bytes = serde_json::to_vec(value)
                    .map_err(|e| ApiError::validation(format!("failed to encode request: {}", e)))?;
                builder.header(CONTENT_TYPE, "application/json").body(bytes)
            }
            Body::Multipart(parts) => {
                let mut form = Form::new();
                for part in parts {
                    let file = Part::bytes(part.bytes.clone())
                        .file_name(part.file_name.clone())
                        .mime_str(&part.content_type)?;
                    form = form.part(part.field.clone(), file);
                }
                builder.multipart(form)
            }
        };

        let resp = builder.send()?;
        let status = resp.status().as_u16();
        let body = resp.text()?;
        tracing::debug!(path = %request.path, status, "received response");
        Ok(Response { status, body })
    }
}
