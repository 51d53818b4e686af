//! Client configuration: base URL and default headers.
//!
//! Built once at startup and never mutated afterwards. `ApiClient` clones
//! share it behind an `Arc`.

use crate::http::{merge_headers, APPLICATION_JSON, CONTENT_TYPE};

/// Environment variable holding the backend base URL.
pub const BASE_URL_ENV: &str = "PORTAL_API_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    default_headers: Vec<(String, String)>,
}

impl ClientConfig {
    /// Trailing slashes on `base_url` are stripped. An empty base means
    /// every request path is used as-is.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            default_headers: vec![(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())],
        }
    }

    /// Read the base URL from `PORTAL_API_URL`, defaulting to empty.
    pub fn from_env() -> Self {
        let base_url = std::env::var(BASE_URL_ENV).unwrap_or_default();
        Self::new(&base_url)
    }

    /// Add or replace a default header. Names match case-insensitively, so
    /// `content-type` replaces the built-in JSON content type.
    pub fn with_default_header(mut self, name: &str, value: &str) -> Self {
        self.default_headers = merge_headers(
            &self.default_headers,
            &[(name.to_string(), value.to_string())],
        );
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_headers(&self) -> &[(String, String)] {
        &self.default_headers
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("")
    }
}
