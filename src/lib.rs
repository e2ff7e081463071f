//! Listing engine for the Mon Toit rental marketplace: TTL page cache,
//! infinite-scroll listing feed and weighted recommendations over the
//! hosted backend.

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod pagination;
pub mod recommendation;
pub mod seed;
pub mod store;

pub use cache::TtlCache;
pub use config::Settings;
pub use error::{MarketError, Result};
pub use pagination::{FeedOptions, FeedSnapshot, ListingFeed};
pub use recommendation::RecommendationEngine;
