//! Typed request/response client for the portal REST API.
//!
//! # Design
//! `ApiClient` holds an immutable `ClientConfig` and a `Transport`, and keeps
//! no other state between calls. Every verb method goes through the same
//! three steps:
//!
//! - `build_request` joins the URL, merges headers and encodes the body,
//! - the transport performs the round-trip,
//! - `parse_response` decodes a 2xx body or normalizes the failure.
//!
//! The build and parse halves are public so a host that does its own I/O
//! gets exactly the same semantics as the async verb methods.

use std::sync::Arc;

use reqwest::header::{HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{join_url, merge_headers, HttpMethod, HttpRequest, HttpResponse};
use crate::normalize::normalize;
use crate::transport::{ReqwestTransport, Transport};

/// Header overrides applied on top of the configured defaults.
pub type Headers = [(String, String)];

#[derive(Debug, Clone)]
pub struct ApiClient<T = ReqwestTransport> {
    config: Arc<ClientConfig>,
    transport: T,
}

impl ApiClient<ReqwestTransport> {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, ReqwestTransport::new())
    }

    /// Client configured from `PORTAL_API_URL`.
    pub fn from_env() -> Self {
        Self::new(ClientConfig::from_env())
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Describe a request without sending it. Bodies passed with GET or
    /// DELETE are dropped. Header names and values must be valid HTTP, so a
    /// bad override fails here instead of at the transport.
    pub fn build_request<B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        headers: &Headers,
    ) -> Result<HttpRequest, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let body = match body {
            Some(body) if method.allows_body() => {
                Some(serde_json::to_string(body).map_err(ApiError::encode)?)
            }
            _ => None,
        };
        let headers = merge_headers(self.config.default_headers(), headers);
        if let Some((name, _)) = headers.iter().find(|(name, value)| {
            HeaderName::from_bytes(name.as_bytes()).is_err() || HeaderValue::from_str(value).is_err()
        }) {
            return Err(ApiError::invalid_header(name));
        }
        Ok(HttpRequest {
            method,
            url: join_url(self.config.base_url(), path),
            headers,
            body,
        })
    }

    /// Decode a 2xx body into `R`, or turn anything else into an `ApiError`.
    ///
    /// An empty success body decodes as JSON `null`, so `()` and `Option<_>`
    /// work for endpoints that answer 204.
    pub fn parse_response<R>(&self, response: HttpResponse) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
    {
        if !response.is_success() {
            return Err(normalize(&response));
        }
        let text = match response.body.trim() {
            "" => "null",
            text => text,
        };
        serde_json::from_str(text).map_err(|e| ApiError::decode(response.status, e))
    }

    pub async fn get<R>(&self, path: &str, headers: &Headers) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
    {
        self.request::<R, ()>(HttpMethod::Get, path, None, headers).await
    }

    pub async fn post<R, B>(
        &self,
        path: &str,
        body: Option<&B>,
        headers: &Headers,
    ) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        self.request(HttpMethod::Post, path, body, headers).await
    }

    pub async fn put<R, B>(
        &self,
        path: &str,
        body: Option<&B>,
        headers: &Headers,
    ) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        self.request(HttpMethod::Put, path, body, headers).await
    }

    pub async fn patch<R, B>(
        &self,
        path: &str,
        body: Option<&B>,
        headers: &Headers,
    ) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        self.request(HttpMethod::Patch, path, body, headers).await
    }

    pub async fn delete<R>(&self, path: &str, headers: &Headers) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
    {
        self.request::<R, ()>(HttpMethod::Delete, path, None, headers).await
    }

    async fn request<R, B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        headers: &Headers,
    ) -> Result<R, ApiError>
    where
        R: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let request = self.build_request(method, path, body, headers)?;
        let url = request.url.clone();
        debug!(%method, %url, "sending request");

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(%method, %url, error = %err, "no response received");
                return Err(ApiError::transport(err));
            }
        };

        let status = response.status;
        let result = self.parse_response(response);
        match &result {
            Ok(_) => debug!(%method, %url, status, "request succeeded"),
            Err(err) => warn!(%method, %url, status, message = err.message(), "request failed"),
        }
        result
    }
}
