//! DG Content client library
//!
//! Fetches posts, categories and statistics from the DG Content API for a
//! single website, caching successful reads for a configurable time.

pub mod cache;
pub mod cli;
pub mod config;
pub mod content;
pub mod error;

pub use cache::{ContentCache, FileCache, MemoryCache};
pub use config::ContentConfig;
pub use content::{
    Category, ContentClient, Post, PostFilters, PostList, PostLookup, StatKind, Stats,
};
pub use error::{ContentError, Result};
