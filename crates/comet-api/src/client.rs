//! Rate-limited, cached client for the lookup API

use crate::{
    budget::CallBudget,
    cache::PostCache,
    diagnostics::DiagnosticWriter,
    models::{ApiErrorBody, Post, Profile, TokenResponse},
    retry::execute_with_retry,
    transport::{ApiRequest, ApiTransport, RequestAuth, ReqwestTransport},
};
use comet_common::{CometError, Result};
use comet_config::TwitterConfig;
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use std::{sync::Arc, time::Instant};
use tracing::{debug, info, instrument, warn};
use url::Url;

const SERVICE_NAME: &str = "twitter";
const TOO_MANY_REQUESTS: u16 = 429;

/// Client for account profiles and latest posts.
///
/// Every remote lookup first reserves a call from the shared [`CallBudget`];
/// once it is spent, lookups fail immediately with
/// [`CometError::RateLimitExceeded`] until the window rolls over.
pub struct TwitterClient {
    transport: Arc<dyn ApiTransport>,
    config: TwitterConfig,
    budget: CallBudget,
    cache: PostCache,
    diagnostics: DiagnosticWriter,
    token: RwLock<Option<String>>,
}

impl TwitterClient {
    /// Create a client that talks HTTP through `reqwest`, honouring the configured proxy
    pub fn new(config: TwitterConfig) -> Result<Self> {
        let proxy = config.proxy();
        let transport = ReqwestTransport::new(config.timeout(), proxy.as_deref())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client over any transport
    pub fn with_transport(config: TwitterConfig, transport: Arc<dyn ApiTransport>) -> Self {
        Self {
            budget: CallBudget::new(config.call_limit, config.window()),
            cache: PostCache::new(config.cache_capacity, config.cache_ttl()),
            diagnostics: DiagnosticWriter::new(&config.diagnostics_dir, SERVICE_NAME),
            token: RwLock::new(None),
            transport,
            config,
        }
    }

    /// Exchange the consumer credentials for a bearer token.
    ///
    /// Returns whether a new token was stored. Failures are logged and leave
    /// any previous token in place.
    #[instrument(skip(self))]
    pub async fn authenticate(&self) -> bool {
        if !self.config.has_credentials() {
            warn!("No API credentials configured, skipping token exchange");
            return false;
        }

        match self.request_token().await {
            Ok(token) => {
                *self.token.write() = Some(token);
                info!("Obtained bearer token");
                true
            }
            Err(e) => {
                warn!(error = %e, "Token exchange failed");
                false
            }
        }
    }

    async fn request_token(&self) -> Result<String> {
        let url = Url::parse(&self.config.token_url)
            .map_err(|e| CometError::config_with_source("Invalid token URL", e))?;
        let request = ApiRequest::post_form(
            url,
            vec![("grant_type".to_string(), "client_credentials".to_string())],
        )
        .with_auth(RequestAuth::Basic {
            username: self.config.consumer_key.clone(),
            password: self.config.consumer_secret.clone(),
        });

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(self.decode_failure(self.config.token_url.as_str(), &response.body, None));
        }

        let token: TokenResponse = serde_json::from_str(&response.body)
            .map_err(|e| CometError::parse_failure_with_source("Malformed token response", e))?;
        Ok(token.access_token)
    }

    /// Whether a bearer token is held
    pub fn has_token(&self) -> bool {
        self.token.read().is_some()
    }

    /// Fetch an account profile by handle
    #[instrument(skip(self), fields(key = %screen_name))]
    pub async fn fetch_profile(&self, screen_name: &str) -> Result<Profile> {
        let started = Instant::now();
        let profile = self
            .get_json(
                "users/show.json",
                &[("screen_name", screen_name), ("tweet_mode", "extended")],
            )
            .await?;

        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Fetched profile");
        Ok(profile)
    }

    /// Fetch the latest post of an account and refresh the cache with it
    #[instrument(skip(self), fields(key = %screen_name))]
    pub async fn fetch_latest_post(&self, screen_name: &str) -> Result<Post> {
        let started = Instant::now();
        let posts: Vec<Post> = self
            .get_json(
                "statuses/user_timeline.json",
                &[
                    ("screen_name", screen_name),
                    ("count", "2"),
                    ("tweet_mode", "extended"),
                ],
            )
            .await?;

        let post = posts
            .into_iter()
            .next()
            .ok_or_else(|| CometError::empty_result(format!("@{screen_name} has no posts")))?;
        self.cache.insert(screen_name, post.clone()).await;

        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Fetched latest post");
        Ok(post)
    }

    /// Latest post of an account, served from cache while fresh
    #[instrument(skip(self), fields(key = %screen_name))]
    pub async fn fetch_latest_post_cached(&self, screen_name: &str) -> Result<Post> {
        if let Some(post) = self.cache.get_fresh(screen_name).await {
            debug!("Cache hit");
            return Ok(post);
        }

        debug!("Cache miss");
        self.fetch_latest_post(screen_name).await
    }

    /// Calls used in the current tracking window
    pub fn usage(&self) -> u32 {
        self.budget.used()
    }

    /// Start a fresh tracking window
    pub fn reset_usage(&self) {
        self.budget.reset();
        info!("API usage counter reset");
    }

    /// Snapshot of client settings and state for diagnostics
    pub fn client_metrics(&self) -> ClientMetrics {
        ClientMetrics {
            api_base_url: self.config.api_base_url.clone(),
            timeout_secs: self.config.timeout_secs,
            calls_used: self.budget.used(),
            call_limit: self.budget.limit(),
            window_secs: self.budget.window().as_secs(),
            cached_entries: self.cache.entry_count(),
            max_retries: self.config.max_retries,
            proxy_configured: self.config.proxy().is_some(),
            has_token: self.has_token(),
        }
    }

    fn endpoint_url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let base = self.config.api_base_url.trim_end_matches('/');
        Url::parse_with_params(&format!("{base}/{path}"), params)
            .map_err(|e| CometError::config_with_source("Invalid API URL", e))
    }

    fn auth(&self) -> RequestAuth {
        self.token
            .read()
            .clone()
            .map_or(RequestAuth::None, RequestAuth::Bearer)
    }

    async fn get_json<T>(&self, path: &str, params: &[(&str, &str)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint_url(path, params)?;
        let auth = self.auth();

        let response = execute_with_retry(self.config.max_retries, || {
            let request = ApiRequest::get(url.clone()).with_auth(auth.clone());
            async move {
                let used = self.budget.try_acquire()?;
                debug!(used, "Reserved API call");
                self.transport.execute(request).await
            }
        })
        .await?;

        if response.status == TOO_MANY_REQUESTS {
            warn!("Remote side reported rate limiting");
            return Err(CometError::RateLimitExceeded {
                used: self.budget.used(),
                limit: self.budget.limit(),
            });
        }

        self.decode(url.as_str(), &response.body)
    }

    /// Decode `body` as `T`, falling back to the error schema, then to a diagnostic report
    fn decode<T>(&self, url: &str, body: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        match serde_json::from_str::<T>(body) {
            Ok(value) => Ok(value),
            Err(e) => Err(self.decode_failure(url, body, Some(e))),
        }
    }

    fn decode_failure(
        &self,
        url: &str,
        body: &str,
        cause: Option<serde_json::Error>,
    ) -> CometError {
        if let Ok(error_body) = serde_json::from_str::<ApiErrorBody>(body) {
            if let Some(primary) = error_body.primary() {
                warn!(code = primary.code, reason = %error_body.reason(), "API returned an error");
                return CometError::api_protocol(primary.code, primary.message.clone());
            }
        }

        let cause = match cause {
            Some(cause) => cause,
            None => match serde_json::from_str::<serde_json::Value>(body) {
                Err(e) => e,
                Ok(_) => {
                    warn!(url, "Response matched no known schema");
                    self.diagnostics.capture(url, "unexpected response schema", body);
                    return CometError::ParseFailure {
                        message: "unexpected response schema".to_string(),
                        source: None,
                    };
                }
            },
        };

        warn!(url, error = %cause, "Failed to parse API response");
        self.diagnostics.capture(url, &cause, body);
        CometError::parse_failure_with_source("unsupported response", cause)
    }
}

/// Client settings and state for monitoring; never includes credentials or tokens
#[derive(Debug, Clone, Serialize)]
pub struct ClientMetrics {
    /// Base URL of the REST API
    pub api_base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Calls used in the current window
    pub calls_used: u32,
    /// Calls allowed per window
    pub call_limit: u32,
    /// Window length in seconds
    pub window_secs: u64,
    /// Accounts with a cached post
    pub cached_entries: u64,
    /// Attempts made by the retry helper
    pub max_retries: usize,
    /// Whether requests go through a proxy
    pub proxy_configured: bool,
    /// Whether a bearer token is held
    pub has_token: bool,
}
