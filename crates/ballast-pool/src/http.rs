//! HTTP pooled client
//!
//! [`HttpConnector`] implements [`ClientFactory`] over `reqwest`: one
//! connector holds the base URL for every configured service and builds
//! [`HttpClient`]s with the service's connect and read timeouts. The health
//! probe is a HEAD request against the service root.

use crate::client::{ClientFactory, PooledClient};
use crate::config::PoolConfig;
use crate::error::{PoolError, PoolResult};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;

/// Builds [`HttpClient`]s from per-service base URLs.
#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    endpoints: HashMap<String, String>,
}

impl HttpConnector {
    /// Create a connector with no endpoints configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `base_url` as the endpoint for `service`.
    #[must_use]
    pub fn with_endpoint(mut self, service: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        self.endpoints.insert(service.into(), base_url);
        self
    }

    /// The endpoint registered for `service`, if any.
    pub fn endpoint(&self, service: &str) -> Option<&str> {
        self.endpoints.get(service).map(String::as_str)
    }
}

#[async_trait]
impl ClientFactory for HttpConnector {
    type Client = HttpClient;

    async fn connect(&self, config: &PoolConfig) -> PoolResult<HttpClient> {
        let base_url = self
            .endpoints
            .get(&config.service)
            .ok_or_else(|| PoolError::connect(&config.service, "no endpoint configured"))?;

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.read_timeout())
            .build()
            .map_err(|err| PoolError::connect(&config.service, err.to_string()))?;

        Ok(HttpClient {
            http,
            base_url: base_url.clone(),
            service: config.service.clone(),
        })
    }
}

/// A pooled HTTP client bound to one service's base URL.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    service: String,
}

impl HttpClient {
    /// Absolute URL for a path under this service's base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Service this client talks to.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a GET request to a path under the base URL.
    ///
    /// # Errors
    ///
    /// Returns the transport error from `reqwest`.
    pub async fn get(&self, path: &str) -> Result<reqwest::Response, reqwest::Error> {
        self.http.get(self.url(path)).send().await
    }

    /// Send a POST request with a JSON body to a path under the base URL.
    ///
    /// # Errors
    ///
    /// Returns the transport error from `reqwest`.
    pub async fn post_json<B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, reqwest::Error> {
        self.http.post(self.url(path)).json(body).send().await
    }

    /// The underlying `reqwest` client for requests this wrapper does not
    /// cover.
    pub fn inner(&self) -> &reqwest::Client {
        &self.http
    }
}

#[async_trait]
impl PooledClient for HttpClient {
    async fn is_healthy(&self) -> bool {
        match self.http.head(&self.base_url).send().await {
            Ok(response) => !response.status().is_server_error(),
            Err(_) => false,
        }
    }
}
