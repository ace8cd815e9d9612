//! HTTP transport seam between the API client and the network

use async_trait::async_trait;
use comet_common::{CometError, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// HTTP method of an [`ApiRequest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST with a form body
    Post,
}

/// Authorization attached to an [`ApiRequest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestAuth {
    /// No authorization header
    None,
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// HTTP basic auth
    Basic {
        /// User name (consumer key)
        username: String,
        /// Password (consumer secret)
        password: String,
    },
}

/// A single request handed to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// Method
    pub method: HttpMethod,
    /// Fully built URL, query included
    pub url: Url,
    /// Authorization
    pub auth: RequestAuth,
    /// Form fields sent with POST requests
    pub form: Vec<(String, String)>,
}

impl ApiRequest {
    /// GET request without authorization
    pub fn get(url: Url) -> Self {
        Self {
            method: HttpMethod::Get,
            url,
            auth: RequestAuth::None,
            form: Vec::new(),
        }
    }

    /// POST request with a form body
    pub fn post_form(url: Url, form: Vec<(String, String)>) -> Self {
        Self {
            method: HttpMethod::Post,
            url,
            auth: RequestAuth::None,
            form,
        }
    }

    /// Attach authorization
    pub fn with_auth(mut self, auth: RequestAuth) -> Self {
        self.auth = auth;
        self
    }
}

/// Status and raw body of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl ApiResponse {
    /// Response with the given status and body
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes HTTP requests for the API client.
///
/// Non-2xx statuses are returned as responses, not errors; only transport
/// failures (connect, timeout, body read) are errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Send `request` and collect the full response body
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// [`ApiTransport`] backed by a pooled `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport with a request timeout and an optional proxy URL
    pub fn new(timeout: Duration, proxy: Option<&str>) -> Result<Self> {
        let mut builder = Client::builder().timeout(timeout);

        if let Some(proxy) = proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| CometError::config_with_source("Invalid proxy URL", e))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| CometError::network_with_source("Failed to create HTTP client", e))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ApiTransport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(request.url.clone()),
            HttpMethod::Post => self.client.post(request.url.clone()).form(&request.form),
        };

        builder = match request.auth {
            RequestAuth::None => builder,
            RequestAuth::Bearer(token) => builder.bearer_auth(token),
            RequestAuth::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(url = %request.url, status, bytes = body.len(), "Request completed");
        Ok(ApiResponse { status, body })
    }
}
