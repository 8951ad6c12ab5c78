//! Post records and their post-processing
//!
//! Posts are passed through as opaque JSON objects. Only the timestamps and the
//! per-website `site` array are touched, and only when processing is enabled.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire name of the creation timestamp
pub const CREATED_AT: &str = "createdAt";
/// Wire name of the last-update timestamp
pub const UPDATED_AT: &str = "updatedAt";
/// Wire name of the per-website metadata
pub const SITE: &str = "site";

/// A single post as returned by the content API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Post(pub Map<String, Value>);

impl Post {
    /// Post identifier, rendered as a string whether the API sent a string or a number
    pub fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn slug(&self) -> Option<&str> {
        self.0.get("slug").and_then(Value::as_str)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp(CREATED_AT)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp(UPDATED_AT)
    }

    /// Site metadata for the configured website, once the post has been processed
    pub fn site(&self) -> Option<&Map<String, Value>> {
        self.0.get(SITE).and_then(Value::as_object)
    }

    /// Raw access to any other field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        self.0
            .get(field)
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
    }
}

/// Parses the timestamp formats the API is known to emit
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DD`. Offset-less values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Picks the site entry whose `key` matches the website key
pub fn select_site(sites: &[Value], website_key: &str) -> Option<Value> {
    sites
        .iter()
        .find(|site| site.get("key").and_then(Value::as_str) == Some(website_key))
        .cloned()
}

/// Normalizes timestamps and narrows `site` to the entry for `website_key`
///
/// A non-empty `site` array with no matching entry becomes `null`.
pub fn process_post(post: &mut Post, website_key: &str) {
    for field in [CREATED_AT, UPDATED_AT] {
        let parsed = post
            .0
            .get(field)
            .and_then(Value::as_str)
            .and_then(parse_timestamp);
        if let Some(dt) = parsed {
            post.0.insert(
                field.to_string(),
                Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            );
        }
    }

    if let Some(Value::Array(sites)) = post.0.get(SITE) {
        if !sites.is_empty() {
            let selected = select_site(sites, website_key).unwrap_or(Value::Null);
            post.0.insert(SITE.to_string(), selected);
        }
    }
}
