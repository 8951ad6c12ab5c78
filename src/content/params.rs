//! Request parameters and cache keys
//!
//! Filters are normalized into an ordered map of strings before they are sent,
//! so the same filters always produce the same query string and cache key.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::error::{ContentError, Result};

/// Prefix shared by every cache key written by this crate
pub const CACHE_PREFIX: &str = "dg_content_";

/// Parameter names the client fills in itself
const RESERVED: [&str; 7] = [
    "resource", "website", "tags", "category", "offset", "limit", "count",
];

/// Normalized request parameters, ordered by name
pub type Params = BTreeMap<String, String>;

/// API discriminator selecting which content type a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Posts,
    Post,
    Categories,
    Stats,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Posts => "posts",
            Resource::Post => "post",
            Resource::Categories => "categories",
            Resource::Stats => "stats",
        }
    }
}

/// Filters accepted by `list_posts`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilters {
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    /// Additional API parameters such as `search` or `sort`
    pub extra: BTreeMap<String, String>,
}

impl PostFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Validates the filters and flattens them into request parameters
    ///
    /// Lists are comma-joined. The website key and resource are injected.
    pub fn normalize(&self, resource: Resource, website_key: &str) -> Result<Params> {
        let mut params = Params::new();

        for (key, value) in &self.extra {
            if RESERVED.contains(&key.as_str()) {
                return Err(ContentError::invalid(format!(
                    "'{}' is set by the client and cannot be passed as an extra parameter.",
                    key
                )));
            }
            params.insert(key.clone(), value.clone());
        }

        if !self.tags.is_empty() {
            params.insert("tags".to_string(), self.tags.join(","));
        }
        if !self.categories.is_empty() {
            params.insert("category".to_string(), self.categories.join(","));
        }

        if let Some(offset) = self.offset {
            if offset < 0 {
                return Err(ContentError::invalid("Offset must be a positive integer."));
            }
            params.insert("offset".to_string(), offset.to_string());
        }
        if let Some(limit) = self.limit {
            if limit < 1 {
                return Err(ContentError::invalid("Limit must be a positive integer."));
            }
            params.insert("limit".to_string(), limit.to_string());
        }

        Ok(scoped(params, resource, website_key))
    }
}

/// Identifies a single post; exactly one of `id` or `slug` must be set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostLookup {
    pub id: Option<String>,
    pub slug: Option<String>,
}

impl PostLookup {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            slug: None,
        }
    }

    pub fn by_slug(slug: impl Into<String>) -> Self {
        Self {
            id: None,
            slug: Some(slug.into()),
        }
    }

    pub fn normalize(&self, website_key: &str) -> Result<Params> {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());

        let (name, value) = match (present(&self.id), present(&self.slug)) {
            (true, false) => ("id", self.id.clone()),
            (false, true) => ("slug", self.slug.clone()),
            (false, false) => {
                return Err(ContentError::invalid(
                    "Either 'id' or 'slug' must be provided to fetch a post.",
                ))
            }
            (true, true) => {
                return Err(ContentError::invalid(
                    "Only one of 'id' or 'slug' may be provided to fetch a post.",
                ))
            }
        };

        let mut params = Params::new();
        params.insert(name.to_string(), value.unwrap_or_default());
        Ok(scoped(params, Resource::Post, website_key))
    }
}

/// Adds the resource discriminator and the website key
pub fn scoped(mut params: Params, resource: Resource, website_key: &str) -> Params {
    params.insert("resource".to_string(), resource.as_str().to_string());
    params.insert("website".to_string(), website_key.to_string());
    params
}

/// Derives `dg_content_<kind>_<sha256 of params>`
///
/// `Params` is ordered, so identical filters always hash to the same key.
pub fn cache_key(kind: &str, params: &Params) -> String {
    let mut hasher = Sha256::new();
    for (key, value) in params {
        hasher.update(key.as_bytes());
        hasher.update([0u8]);
        hasher.update(value.as_bytes());
        hasher.update([0u8]);
    }
    format!("{}{}_{}", CACHE_PREFIX, kind, hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_are_comma_joined() {
        let params = PostFilters::new()
            .tag("rust")
            .tag("web")
            .category("news")
            .normalize(Resource::Posts, "example.com")
            .unwrap();

        assert_eq!(params.get("tags").map(String::as_str), Some("rust,web"));
        assert_eq!(params.get("category").map(String::as_str), Some("news"));
        assert_eq!(params.get("resource").map(String::as_str), Some("posts"));
        assert_eq!(params.get("website").map(String::as_str), Some("example.com"));
    }

    #[test]
    fn test_empty_lists_are_omitted() {
        let params = PostFilters::new()
            .normalize(Resource::Posts, "example.com")
            .unwrap();
        assert!(!params.contains_key("tags"));
        assert!(!params.contains_key("category"));
    }

    #[test]
    fn test_negative_offset_is_rejected() {
        let err = PostFilters::new()
            .offset(-1)
            .normalize(Resource::Posts, "example.com")
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_zero_limit_is_rejected() {
        let err = PostFilters::new()
            .limit(0)
            .normalize(Resource::Posts, "example.com")
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_zero_offset_is_allowed() {
        let params = PostFilters::new()
            .offset(0)
            .limit(10)
            .normalize(Resource::Posts, "example.com")
            .unwrap();
        assert_eq!(params.get("offset").map(String::as_str), Some("0"));
        assert_eq!(params.get("limit").map(String::as_str), Some("10"));
    }

    #[test]
    fn test_reserved_extra_param_is_rejected() {
        let err = PostFilters::new()
            .param("website", "someone-else.com")
            .normalize(Resource::Posts, "example.com")
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_lookup_requires_exactly_one_identifier() {
        assert!(PostLookup::default()
            .normalize("example.com")
            .unwrap_err()
            .is_invalid_argument());

        let both = PostLookup {
            id: Some("1".to_string()),
            slug: Some("hello".to_string()),
        };
        assert!(both.normalize("example.com").unwrap_err().is_invalid_argument());

        let empty_id = PostLookup {
            id: Some(String::new()),
            slug: None,
        };
        assert!(empty_id.normalize("example.com").is_err());
    }

    #[test]
    fn test_lookup_by_slug() {
        let params = PostLookup::by_slug("hello").normalize("example.com").unwrap();
        assert_eq!(params.get("slug").map(String::as_str), Some("hello"));
        assert_eq!(params.get("resource").map(String::as_str), Some("post"));
        assert!(!params.contains_key("id"));
    }

    #[test]
    fn test_cache_key_is_deterministic() {
        let a = PostFilters::new()
            .param("sort", "desc")
            .tag("x")
            .normalize(Resource::Posts, "example.com")
            .unwrap();
        let b = PostFilters::new()
            .tag("x")
            .param("sort", "desc")
            .normalize(Resource::Posts, "example.com")
            .unwrap();

        let key = cache_key("posts", &a);
        assert_eq!(key, cache_key("posts", &b));
        assert!(key.starts_with("dg_content_posts_"));
        assert_eq!(key.len(), "dg_content_posts_".len() + 64);
    }

    #[test]
    fn test_cache_key_differs_by_filters_and_website() {
        let base = PostFilters::new().tag("x");
        let a = base.normalize(Resource::Posts, "a.example").unwrap();
        let b = base.normalize(Resource::Posts, "b.example").unwrap();
        let c = base.clone().limit(5).normalize(Resource::Posts, "a.example").unwrap();

        assert_ne!(cache_key("posts", &a), cache_key("posts", &b));
        assert_ne!(cache_key("posts", &a), cache_key("posts", &c));
    }
}
