//! HTTP client for the content API
//!
//! Every read goes through the cache first. On a miss the API is called once,
//! the result is post-processed and, if non-empty, written back to the cache.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT},
    Client, RequestBuilder,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::params::{cache_key, scoped, Params, PostFilters, PostLookup, Resource, CACHE_PREFIX};
use super::post::{process_post, Post};
use super::{Category, PostList, StatKind, Stats};
use crate::cache::{ContentCache, FileCache, MemoryCache};
use crate::config::{ContentConfig, MAX_CACHE_TTL};
use crate::error::{ContentError, Result};

/// Client for the content API with a read-through cache
#[derive(Clone)]
pub struct ContentClient {
    /// HTTP client carrying the auth headers and timeout
    http: Client,
    config: ContentConfig,
    cache: Arc<dyn ContentCache>,
    /// Whether posts are post-processed before being returned
    process: bool,
}

impl ContentClient {
    /// Creates a client from a configuration and a cache backend
    pub fn new(config: ContentConfig, cache: Arc<dyn ContentCache>) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|e| ContentError::Config(format!("Invalid API key: {}", e)))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("dgcontent/", env!("CARGO_PKG_VERSION"))),
        );

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ContentError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            cache,
            process: true,
        })
    }

    /// Creates a client from environment variables, caching to the XDG cache directory
    ///
    /// Falls back to an in-memory cache when no cache directory can be determined.
    pub fn from_env() -> Result<Self> {
        let cache: Arc<dyn ContentCache> = match FileCache::new() {
            Some(cache) => Arc::new(cache),
            None => Arc::new(MemoryCache::new()),
        };
        Self::from_env_with_cache(cache)
    }

    /// Creates a client from environment variables with the given cache backend
    pub fn from_env_with_cache(cache: Arc<dyn ContentCache>) -> Result<Self> {
        Self::new(ContentConfig::from_env()?, cache)
    }

    pub fn config(&self) -> &ContentConfig {
        &self.config
    }

    /// Overrides the cache lifetime; zero disables caching
    pub fn set_cache_ttl(&mut self, seconds: i64) -> Result<&mut Self> {
        if seconds < 0 {
            return Err(ContentError::invalid(
                "Cache duration must be a positive integer.",
            ));
        }
        let ttl = Duration::from_secs(seconds.unsigned_abs());
        if ttl > MAX_CACHE_TTL {
            return Err(ContentError::invalid(format!(
                "Cache duration must be at most {} seconds.",
                MAX_CACHE_TTL.as_secs()
            )));
        }
        self.config.cache_ttl = ttl;
        Ok(self)
    }

    /// Turns post-processing (timestamps, site selection) on or off
    pub fn set_process_result(&mut self, process: bool) -> &mut Self {
        self.process = process;
        self
    }

    /// Lists posts matching `filters`
    pub async fn list_posts(&self, filters: &PostFilters) -> Result<PostList> {
        let params = filters.normalize(Resource::Posts, &self.config.website_key)?;
        let key = cache_key(self.kind(Resource::Posts), &params);

        if let Some(list) = self.cached::<PostList>(&key) {
            return Ok(list);
        }

        let body = self.get(&params).await?;
        let mut list: PostList = serde_json::from_value(body).map_err(ContentError::InvalidJson)?;

        if self.process {
            for post in &mut list.items {
                process_post(post, &self.config.website_key);
            }
        }

        if !list.items.is_empty() {
            self.store(&key, &list);
        }
        Ok(list)
    }

    /// Fetches a single post by id or slug
    ///
    /// Returns `None` when the API has no such post.
    pub async fn get_post(&self, lookup: &PostLookup) -> Result<Option<Post>> {
        let params = lookup.normalize(&self.config.website_key)?;
        let key = cache_key(self.kind(Resource::Post), &params);

        if let Some(post) = self.cached::<Post>(&key) {
            return Ok(Some(post));
        }

        let body = self.get(&params).await?;
        let mut post = match take_field(body, "post") {
            Value::Object(map) if !map.is_empty() => Post(map),
            _ => return Ok(None),
        };

        if self.process {
            process_post(&mut post, &self.config.website_key);
        }

        self.store(&key, &post);
        Ok(Some(post))
    }

    /// Lists categories, optionally only those used by the configured website
    pub async fn list_categories(&self, website_only: bool) -> Result<Vec<Category>> {
        let mut key = format!("{}categories", CACHE_PREFIX);
        let params = if website_only {
            key.push('_');
            key.push_str(&self.config.website_key);
            scoped(Params::new(), Resource::Categories, &self.config.website_key)
        } else {
            Params::from([(
                "resource".to_string(),
                Resource::Categories.as_str().to_string(),
            )])
        };

        if let Some(categories) = self.cached::<Vec<Category>>(&key) {
            return Ok(categories);
        }

        let body = self.get(&params).await?;
        let categories = match take_field(body, "categories") {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => {
                return Err(ContentError::Api(format!(
                    "Unexpected categories payload: {}",
                    other
                )))
            }
        };

        if !categories.is_empty() {
            self.store(&key, &categories);
        }
        Ok(categories)
    }

    /// Increments a post counter and returns the updated statistics
    ///
    /// Never cached.
    pub async fn record_stat(&self, kind: StatKind, id: &str, count: i64) -> Result<Stats> {
        if id.trim().is_empty() {
            return Err(ContentError::invalid(
                "Type and ID are required to update stats.",
            ));
        }
        if count < 1 {
            return Err(ContentError::invalid("Count must be a positive integer."));
        }

        let body = json!({
            "resource": Resource::Stats.as_str(),
            "type": kind.as_str(),
            "id": id,
            "count": count,
            "website": self.config.website_key,
        });

        let response = self.post(&body).await?;
        Ok(take_field(response, "stats"))
    }

    /// Removes every cache entry written by this crate
    pub fn clear_cache(&self) -> Result<usize> {
        let removed = self.cache.delete_matching(CACHE_PREFIX)?;
        info!(removed, "cleared content cache");
        Ok(removed)
    }

    /// Cache key namespace for a resource; raw results are kept apart from processed ones
    fn kind(&self, resource: Resource) -> &'static str {
        match (resource, self.process) {
            (Resource::Posts, true) => "posts",
            (Resource::Posts, false) => "posts_raw",
            (Resource::Post, true) => "post",
            (Resource::Post, false) => "post_raw",
            (Resource::Categories, _) => "categories",
            (Resource::Stats, _) => "stats",
        }
    }

    fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.cache.get(key)?;
        match serde_json::from_value(value) {
            Ok(data) => {
                debug!(key, "cache hit");
                Some(data)
            }
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable cache entry");
                None
            }
        }
    }

    fn store<T: Serialize>(&self, key: &str, data: &T) {
        if self.config.cache_ttl.is_zero() {
            return;
        }
        let result = serde_json::to_value(data)
            .map_err(std::io::Error::from)
            .and_then(|value| self.cache.set(key, &value, self.config.cache_ttl));
        if let Err(e) = result {
            warn!(key, error = %e, "failed to write cache entry");
        }
    }

    /// Sends a GET with `params` as the query string
    async fn get(&self, params: &Params) -> Result<Value> {
        debug!(resource = params.get("resource").map(|r| r.as_str()), "GET content API");
        let request = self.http.get(&self.config.api_base_url).query(params);
        self.send(request).await
    }

    /// Sends a POST with `body` as JSON
    async fn post(&self, body: &Value) -> Result<Value> {
        debug!(resource = body.get("resource").and_then(|r| r.as_str()), "POST content API");
        let request = self.http.post(&self.config.api_base_url).json(body);
        self.send(request).await
    }

    /// Sends the request and checks status, body and the API `error` field
    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "content API returned an error status");
            return Err(ContentError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Err(ContentError::EmptyResponse);
        }

        let body: Value = serde_json::from_str(&text).map_err(ContentError::InvalidJson)?;

        match body.get("error") {
            None | Some(Value::Null) => Ok(body),
            Some(Value::String(message)) => Err(ContentError::Api(message.clone())),
            Some(other) => Err(ContentError::Api(other.to_string())),
        }
    }
}

impl fmt::Debug for ContentClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentClient")
            .field("config", &self.config)
            .field("process", &self.process)
            .finish_non_exhaustive()
    }
}

/// Moves `name` out of a JSON object body, or returns `Null`
fn take_field(body: Value, name: &str) -> Value {
    match body {
        Value::Object(mut map) => map.remove(name).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_client() -> ContentClient {
        // Port 9 (discard) on localhost; these tests must fail before any request
        let config = ContentConfig::new("secret", "example.com")
            .with_base_url("http://127.0.0.1:9/api")
            .with_timeout(Duration::from_millis(200));
        ContentClient::new(config, Arc::new(MemoryCache::new())).unwrap()
    }

    #[test]
    fn test_new_rejects_missing_api_key() {
        let config = ContentConfig::new("", "example.com");
        let result = ContentClient::new(config, Arc::new(MemoryCache::new()));
        assert!(matches!(result, Err(ContentError::Config(_))));
    }

    #[test]
    fn test_set_cache_ttl_rejects_negative() {
        let mut client = offline_client();
        assert!(client.set_cache_ttl(-1).unwrap_err().is_invalid_argument());

        client.set_cache_ttl(120).unwrap();
        assert_eq!(client.config().cache_ttl, Duration::from_secs(120));
    }

    #[test]
    fn test_set_cache_ttl_rejects_values_past_the_cap() {
        let mut client = offline_client();
        for seconds in [i64::MAX, 10_000_000_000_000] {
            let err = client.set_cache_ttl(seconds).unwrap_err();
            assert!(err.is_invalid_argument(), "{} should be rejected", seconds);
        }
        // The previous lifetime is kept
        assert_eq!(client.config().cache_ttl, Duration::from_secs(3600));

        let max = MAX_CACHE_TTL.as_secs() as i64;
        client.set_cache_ttl(max).unwrap();
        assert_eq!(client.config().cache_ttl, MAX_CACHE_TTL);
    }

    #[test]
    fn test_debug_output_hides_cache() {
        let client = offline_client();
        let output = format!("{:?}", client);
        assert!(output.starts_with("ContentClient"));
        assert!(output.contains("example.com"));
        assert!(!output.contains("cache:"));
    }

    #[tokio::test]
    async fn test_get_post_without_identifier_is_invalid() {
        let client = offline_client();
        let err = client.get_post(&PostLookup::default()).await.unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn test_record_stat_rejects_non_positive_count() {
        let client = offline_client();
        for count in [0, -3] {
            let err = client
                .record_stat(StatKind::Views, "post-1", count)
                .await
                .unwrap_err();
            assert!(err.is_invalid_argument(), "count {} should be rejected", count);
        }
    }

    #[tokio::test]
    async fn test_record_stat_rejects_empty_id() {
        let client = offline_client();
        let err = client.record_stat(StatKind::Likes, "  ", 1).await.unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn test_list_posts_rejects_bad_limit_before_request() {
        let client = offline_client();
        let err = client
            .list_posts(&PostFilters::new().limit(-2))
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_cache_kind_separates_raw_results() {
        let mut client = offline_client();
        assert_eq!(client.kind(Resource::Posts), "posts");
        client.set_process_result(false);
        assert_eq!(client.kind(Resource::Posts), "posts_raw");
        assert_eq!(client.kind(Resource::Categories), "categories");
    }

    #[test]
    fn test_take_field() {
        assert_eq!(take_field(json!({"stats": {"views": 3}}), "stats"), json!({"views": 3}));
        assert_eq!(take_field(json!({"other": 1}), "stats"), Value::Null);
        assert_eq!(take_field(json!([1, 2]), "stats"), Value::Null);
    }
}
