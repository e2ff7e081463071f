use crate::error::Result;
use crate::models::{ActivityRecord, Listing, ListingStatus, RecommendationScore};
use crate::store::traits::{ActivityStore, ListingStore};
use crate::store::types::ListingFilters;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Persisted recommendation row
#[derive(Debug, Clone)]
pub struct StoredRecommendation {
    pub score: RecommendationScore,
    pub clicked_at: Option<DateTime<Utc>>,
}

/// In-process store with the same filter semantics as the backend
///
/// Counts page fetches so callers can observe cache behaviour.
#[derive(Default)]
pub struct MemoryStore {
    listings: RwLock<Vec<Listing>>,
    favorites: RwLock<HashMap<String, Vec<String>>>,
    activity: RwLock<Vec<ActivityRecord>>,
    recommendations: RwLock<HashMap<(String, String), StoredRecommendation>>,
    page_fetches: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listings(listings: Vec<Listing>) -> Self {
        let store = Self::new();
        *store.listings.write() = listings;
        store
    }

    pub fn insert_listing(&self, listing: Listing) {
        self.listings.write().push(listing);
    }

    pub fn add_favorite(&self, user_id: &str, property_id: &str) {
        self.favorites
            .write()
            .entry(user_id.to_string())
            .or_default()
            .push(property_id.to_string());
    }

    /// Number of `fetch_page` calls served so far
    pub fn page_fetches(&self) -> usize {
        self.page_fetches.load(Ordering::SeqCst)
    }

    pub fn recommendation(&self, user_id: &str, property_id: &str) -> Option<StoredRecommendation> {
        self.recommendations
            .read()
            .get(&(user_id.to_string(), property_id.to_string()))
            .cloned()
    }

    /// Listings matching `filters`, newest first
    fn matching(&self, filters: &ListingFilters) -> Vec<Listing> {
        let mut matching: Vec<Listing> = self
            .listings
            .read()
            .iter()
            .filter(|listing| filters.matches(listing))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn fetch_page(
        &self,
        filters: &ListingFilters,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Listing>> {
        self.page_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .matching(filters)
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn count(&self, filters: &ListingFilters) -> Result<u64> {
        Ok(self.matching(filters).len() as u64)
    }

    async fn available(&self, limit: usize) -> Result<Vec<Listing>> {
        let filters = ListingFilters::default();
        Ok(self.matching(&filters).into_iter().take(limit).collect())
    }

    async fn most_viewed(&self, limit: usize) -> Result<Vec<Listing>> {
        let mut listings: Vec<Listing> = self
            .listings
            .read()
            .iter()
            .filter(|listing| listing.status == ListingStatus::Available)
            .cloned()
            .collect();
        listings.sort_by(|a, b| b.view_count.cmp(&a.view_count));
        listings.truncate(limit);
        Ok(listings)
    }

    fn source_name(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn favorites(&self, user_id: &str) -> Result<Vec<String>> {
        Ok(self
            .favorites
            .read()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn activity_history(&self, user_id: &str, limit: usize) -> Result<Vec<ActivityRecord>> {
        let mut history: Vec<ActivityRecord> = self
            .activity
            .read()
            .iter()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        history.truncate(limit);
        Ok(history)
    }

    async fn record_activity(&self, record: &ActivityRecord) -> Result<()> {
        self.activity.write().push(record.clone());
        Ok(())
    }

    async fn upsert_recommendations(
        &self,
        user_id: &str,
        scores: &[RecommendationScore],
    ) -> Result<()> {
        let mut recommendations = self.recommendations.write();
        for score in scores {
            let key = (user_id.to_string(), score.property_id.clone());
            let clicked_at = recommendations.get(&key).and_then(|row| row.clicked_at);
            recommendations.insert(
                key,
                StoredRecommendation {
                    score: score.clone(),
                    clicked_at,
                },
            );
        }
        Ok(())
    }

    async fn mark_clicked(&self, user_id: &str, property_id: &str) -> Result<()> {
        let key = (user_id.to_string(), property_id.to_string());
        if let Some(row) = self.recommendations.write().get_mut(&key) {
            row.clicked_at = Some(Utc::now());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyType;
    use chrono::Duration;

    fn listing(id: &str, age_days: i64, views: u64) -> Listing {
        Listing {
            id: id.to_string(),
            title: format!("Studio {}", id),
            property_type: PropertyType::Studio,
            city: "Abidjan".to_string(),
            neighborhood: Some("Marcory".to_string()),
            monthly_rent: 90_000,
            bedrooms: 1,
            bathrooms: 1,
            surface_area: None,
            is_furnished: true,
            has_parking: false,
            has_ac: true,
            status: ListingStatus::Available,
            created_at: Utc::now() - Duration::days(age_days),
            view_count: views,
        }
    }

    #[tokio::test]
    async fn pages_are_newest_first() {
        let store = MemoryStore::with_listings(vec![
            listing("old", 10, 0),
            listing("new", 1, 0),
            listing("mid", 5, 0),
        ]);
        let filters = ListingFilters::default();

        let first = store.fetch_page(&filters, 0, 2).await.unwrap();
        let second = store.fetch_page(&filters, 2, 2).await.unwrap();

        let ids: Vec<_> = first.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid"]);
        assert_eq!(second.len(), 1);
        assert_eq!(store.count(&filters).await.unwrap(), 3);
        assert_eq!(store.page_fetches(), 2);
    }

    #[tokio::test]
    async fn upsert_keeps_click_state() {
        let store = MemoryStore::new();
        let score = RecommendationScore {
            property_id: "p1".to_string(),
            score: 65.0,
            reasons: vec![],
            confidence: 0.65,
            factors: vec![],
        };

        store.upsert_recommendations("u1", &[score.clone()]).await.unwrap();
        store.mark_clicked("u1", "p1").await.unwrap();
        store
            .upsert_recommendations("u1", &[RecommendationScore { score: 70.0, ..score }])
            .await
            .unwrap();

        let row = store.recommendation("u1", "p1").unwrap();
        assert_eq!(row.score.score, 70.0);
        assert!(row.clicked_at.is_some());
    }
}
