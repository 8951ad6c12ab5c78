//! Content API client and record types
//!
//! Posts, categories and statistics are fetched through [`ContentClient`], which
//! scopes every request to the configured website and caches successful reads.

pub mod client;
pub mod params;
pub mod post;

pub use client::ContentClient;
pub use params::{cache_key, PostFilters, PostLookup, Resource, CACHE_PREFIX};
pub use post::{parse_timestamp, process_post, select_site, Post};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// A category record, passed through unchanged
pub type Category = Value;

/// Updated counters returned after recording a statistic
pub type Stats = Value;

/// A page of posts together with the total number of matches
///
/// Deserialization is lenient: entries of `posts` that are not objects are
/// dropped, and a `total` that is not a non-negative number reads as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostList {
    #[serde(rename = "posts", default, deserialize_with = "lenient_posts")]
    pub items: Vec<Post>,
    #[serde(default, deserialize_with = "lenient_total")]
    pub total: u64,
}

fn lenient_posts<'de, D>(deserializer: D) -> Result<Vec<Post>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(Post(map)),
            other => {
                warn!(item = %other, "skipping post that is not an object");
                None
            }
        })
        .collect())
}

fn lenient_total<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let total = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(whole_count)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_count))
        }
        _ => None,
    };
    Ok(total.unwrap_or(0))
}

/// Truncates a finite, non-negative float to a count
fn whole_count(n: f64) -> Option<u64> {
    (n.is_finite() && n >= 0.0 && n <= u64::MAX as f64).then(|| n.trunc() as u64)
}

/// Counter that `record_stat` increments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    Views,
    Likes,
    Dislikes,
}

impl StatKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatKind::Views => "views",
            StatKind::Likes => "likes",
            StatKind::Dislikes => "dislikes",
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "view" | "views" => Ok(StatKind::Views),
            "like" | "likes" => Ok(StatKind::Likes),
            "dislike" | "dislikes" => Ok(StatKind::Dislikes),
            other => Err(format!(
                "Invalid stat type: '{}'. Valid types: views, likes, dislikes",
                other
            )),
        }
    }
}
