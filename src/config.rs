//! Client configuration loaded from the environment
//!
//! Every setting can be supplied under an upper-case name or a dotted alias,
//! e.g. `DGCONTENT_API_KEY` or `dgcontent.api.key`. The first non-empty value wins.

use std::time::Duration;

use url::Url;

use crate::error::{ContentError, Result};

/// Default base URL of the content API
pub const DEFAULT_API_BASE_URL: &str = "https://dgtteam-content.vercel.app/api";

/// Default lifetime of cached responses
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest accepted cache lifetime (ten years)
pub const MAX_CACHE_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

const API_KEY_VARS: [&str; 2] = ["DGCONTENT_API_KEY", "dgcontent.api.key"];
const CACHE_TTL_VARS: [&str; 2] = ["DGCONTENT_CACHE_TTL", "dgcontent.cache.ttl"];
const BASE_URL_VARS: [&str; 2] = ["DGCONTENT_API_BASE_URL", "dgcontent.api.base.url"];
const WEBSITE_KEY_VARS: [&str; 2] = ["DGCONTENT_WEBSITE_KEY", "dgcontent.website.key"];
const TIMEOUT_VARS: [&str; 2] = ["DGCONTENT_TIMEOUT", "dgcontent.timeout"];
const APP_BASE_URL_VARS: [&str; 2] = ["APP_BASE_URL", "app.baseURL"];

/// Settings for a [`ContentClient`](crate::ContentClient)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentConfig {
    /// Base URL every request is sent to
    pub api_base_url: String,
    /// Bearer token for the API
    pub api_key: String,
    /// Website the content is scoped to
    pub website_key: String,
    /// How long successful responses stay cached; zero disables caching
    pub cache_ttl: Duration,
    /// Timeout applied to each request
    pub timeout: Duration,
}

impl ContentConfig {
    /// Creates a configuration with default base URL, TTL and timeout
    pub fn new(api_key: impl Into<String>, website_key: impl Into<String>) -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: api_key.into(),
            website_key: website_key.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Loads and validates the configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads and validates the configuration through an arbitrary lookup
    ///
    /// If no website key is configured, the host of `APP_BASE_URL` is used instead.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| first_set(&lookup, names);

        let api_key = first(&API_KEY_VARS[..]).unwrap_or_default();
        let api_base_url =
            first(&BASE_URL_VARS[..]).unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let cache_ttl = match first(&CACHE_TTL_VARS[..]) {
            Some(raw) => Duration::from_secs(parse_seconds(CACHE_TTL_VARS[0], &raw)?),
            None => DEFAULT_CACHE_TTL,
        };
        if cache_ttl > MAX_CACHE_TTL {
            return Err(ContentError::Config(format!(
                "{} must be at most {} seconds",
                CACHE_TTL_VARS[0],
                MAX_CACHE_TTL.as_secs()
            )));
        };
        let timeout = match first(&TIMEOUT_VARS[..]) {
            Some(raw) => Duration::from_secs(parse_seconds(TIMEOUT_VARS[0], &raw)?),
            None => DEFAULT_TIMEOUT,
        };

        let website_key = match first(&WEBSITE_KEY_VARS[..]) {
            Some(key) => key,
            None => first(&APP_BASE_URL_VARS[..])
                .and_then(|app_url| host_of(&app_url))
                .unwrap_or_default(),
        };

        let config = Self {
            api_base_url,
            api_key,
            website_key,
            cache_ttl,
            timeout,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that the required settings are present and well formed
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(ContentError::Config(
                "DG Content API key is required.".to_string(),
            ));
        }
        if self.website_key.is_empty() {
            return Err(ContentError::Config(
                "Website key is required for filtering content.".to_string(),
            ));
        }
        if self.cache_ttl > MAX_CACHE_TTL {
            return Err(ContentError::Config(format!(
                "Cache duration must be at most {} seconds.",
                MAX_CACHE_TTL.as_secs()
            )));
        }
        Url::parse(&self.api_base_url).map_err(|e| {
            ContentError::Config(format!("Invalid API base URL '{}': {}", self.api_base_url, e))
        })?;
        Ok(())
    }
}

/// Extracts the host name of a URL, e.g. `https://example.com/` -> `example.com`
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .filter(|host| !host.is_empty())
}

/// Returns the first non-empty value among `names`
fn first_set<F>(lookup: &F, names: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    names
        .iter()
        .filter_map(|name| lookup(*name))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

fn parse_seconds(name: &str, raw: &str) -> Result<u64> {
    raw.parse::<u64>().map_err(|_| {
        ContentError::Config(format!(
            "{} must be a non-negative number of seconds, got '{}'",
            name, raw
        ))
    })
}
