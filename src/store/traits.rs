use crate::error::Result;
use crate::models::{ActivityRecord, Listing, RecommendationScore};
use crate::store::types::ListingFilters;
use async_trait::async_trait;

/// Read access to the listing catalogue
/// Implemented by the hosted backend and by the in-memory store
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Listings matching `filters`, newest first
    async fn fetch_page(
        &self,
        filters: &ListingFilters,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Listing>>;

    /// Total number of listings matching `filters`
    async fn count(&self, filters: &ListingFilters) -> Result<u64>;

    /// Available listings used as recommendation candidates, newest first
    async fn available(&self, limit: usize) -> Result<Vec<Listing>>;

    /// Available listings ordered by descending view count
    async fn most_viewed(&self, limit: usize) -> Result<Vec<Listing>>;

    /// Get the name of the backing source
    fn source_name(&self) -> &'static str;
}

/// User signals feeding the recommendation engine
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Identifiers of the user's favorite listings
    async fn favorites(&self, user_id: &str) -> Result<Vec<String>>;

    /// Most recent activity first
    async fn activity_history(&self, user_id: &str, limit: usize) -> Result<Vec<ActivityRecord>>;

    async fn record_activity(&self, record: &ActivityRecord) -> Result<()>;

    /// Upsert keyed by (user, listing)
    async fn upsert_recommendations(
        &self,
        user_id: &str,
        scores: &[RecommendationScore],
    ) -> Result<()>;

    async fn mark_clicked(&self, user_id: &str, property_id: &str) -> Result<()>;
}
