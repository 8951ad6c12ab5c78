//! Command-line interface parsing for the dgcontent binary
//!
//! Each subcommand maps onto one `ContentClient` operation. Global flags adjust
//! caching and post-processing for that single invocation.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use crate::content::{PostFilters, PostLookup, StatKind};

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// A `--param` value is not in `key=value` form
    #[error("Invalid parameter: '{0}'. Expected key=value")]
    InvalidParam(String),
}

/// DG Content API client
#[derive(Parser, Debug)]
#[command(name = "dgcontent")]
#[command(about = "Fetch posts, categories and stats from the DG Content API")]
#[command(version)]
pub struct Cli {
    /// Return posts exactly as the API sent them (no timestamp or site processing)
    #[arg(long, global = true)]
    pub no_process: bool,

    /// Override the cache lifetime in seconds (0 disables caching)
    #[arg(long, value_name = "SECS", global = true, allow_negative_numbers = true)]
    pub cache_ttl: Option<i64>,

    /// Directory for cached responses (defaults to the user cache directory)
    #[arg(long, value_name = "DIR", global = true, conflicts_with = "no_cache")]
    pub cache_dir: Option<PathBuf>,

    /// Keep cached responses in memory only
    #[arg(long, global = true)]
    pub no_cache: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List posts
    Posts(PostsArgs),
    /// Fetch a single post by id or slug
    Post(PostArgs),
    /// List categories
    Categories {
        /// Only categories used by the configured website
        #[arg(long)]
        website_only: bool,
    },
    /// Increment a post counter
    Stat {
        /// Counter to increment: views, likes or dislikes
        kind: StatKind,
        /// Post identifier
        id: String,
        /// Amount to add
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        count: i64,
    },
    /// Remove all cached responses
    ClearCache,
}

#[derive(Args, Debug)]
pub struct PostsArgs {
    /// Filter by tag (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Filter by category (repeatable)
    #[arg(long = "category", value_name = "CATEGORY")]
    pub categories: Vec<String>,

    #[arg(long, allow_negative_numbers = true)]
    pub offset: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    pub limit: Option<i64>,

    /// Extra API parameter as key=value (repeatable)
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,
}

#[derive(Args, Debug)]
pub struct PostArgs {
    #[arg(long, conflicts_with = "slug", required_unless_present = "slug")]
    pub id: Option<String>,

    #[arg(long)]
    pub slug: Option<String>,
}

impl PostsArgs {
    /// Builds the filters for `list_posts`
    pub fn to_filters(&self) -> Result<PostFilters, CliError> {
        let mut filters = PostFilters {
            tags: self.tags.clone(),
            categories: self.categories.clone(),
            offset: self.offset,
            limit: self.limit,
            ..PostFilters::default()
        };
        for raw in &self.params {
            let (key, value) = parse_param(raw)?;
            filters.extra.insert(key, value);
        }
        Ok(filters)
    }
}

impl PostArgs {
    pub fn to_lookup(&self) -> PostLookup {
        PostLookup {
            id: self.id.clone(),
            slug: self.slug.clone(),
        }
    }
}

/// Splits a `key=value` argument
pub fn parse_param(raw: &str) -> Result<(String, String), CliError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(CliError::InvalidParam(raw.to_string())),
    }
}
