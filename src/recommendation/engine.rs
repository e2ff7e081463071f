use crate::config::RecommendationSettings;
use crate::error::Result;
use crate::models::{ActivityAction, ActivityRecord, RecommendationScore};
use crate::recommendation::scoring::{popularity_fallback, rank};
use crate::recommendation::signals::UserSignals;
use crate::store::{ActivityStore, ListingStore};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Personalized recommendations with a popularity fallback
pub struct RecommendationEngine {
    listings: Arc<dyn ListingStore>,
    activity: Arc<dyn ActivityStore>,
    settings: RecommendationSettings,
}

impl RecommendationEngine {
    pub fn new(
        listings: Arc<dyn ListingStore>,
        activity: Arc<dyn ActivityStore>,
        settings: RecommendationSettings,
    ) -> Self {
        Self {
            listings,
            activity,
            settings,
        }
    }

    /// Top `limit` listings for `user_id`
    ///
    /// Falls back to the most viewed listings when the user has no usable
    /// signal or when no candidate scores.
    pub async fn personalized(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<RecommendationScore>> {
        let (favorites, history) = tokio::try_join!(
            self.activity.favorites(user_id),
            self.activity
                .activity_history(user_id, self.settings.activity_window),
        )?;

        let signals = UserSignals::collect(favorites, &history);
        if signals.is_empty() {
            debug!("No activity for user {}, using popular listings", user_id);
            return self.popular(limit).await;
        }

        let candidates = self.listings.available(self.settings.candidate_pool).await?;
        let ranked = rank(
            &candidates,
            &signals,
            &self.settings.weights,
            Utc::now(),
            limit,
        );

        if ranked.is_empty() {
            debug!("No candidate scored for user {}, using popular listings", user_id);
            return self.popular(limit).await;
        }

        info!(
            "Scored {} candidates for user {}, returning {}",
            candidates.len(),
            user_id,
            ranked.len()
        );

        // Persistence only feeds click tracking
        if let Err(err) = self.activity.upsert_recommendations(user_id, &ranked).await {
            warn!("Failed to save recommendations for user {}: {}", user_id, err);
        }

        Ok(ranked)
    }

    /// Most viewed listings, strictly by descending view count
    pub async fn popular(&self, limit: usize) -> Result<Vec<RecommendationScore>> {
        let listings = self.listings.most_viewed(limit).await?;
        Ok(popularity_fallback(listings, &self.settings.weights, limit))
    }

    /// Append to the activity log; failures are logged and dropped
    pub async fn track_activity(
        &self,
        user_id: &str,
        action: ActivityAction,
        property_id: Option<&str>,
        metadata: serde_json::Value,
    ) {
        let record = ActivityRecord {
            user_id: user_id.to_string(),
            action_type: action,
            property_id: property_id.map(str::to_string),
            action_data: metadata,
            created_at: Utc::now(),
        };

        if let Err(err) = self.activity.record_activity(&record).await {
            warn!("Failed to track {:?} for user {}: {}", action, user_id, err);
        }
    }

    /// Mark a recommended listing as clicked; failures are logged and dropped
    pub async fn track_click(&self, user_id: &str, property_id: &str) {
        if let Err(err) = self.activity.mark_clicked(user_id, property_id).await {
            warn!("Failed to track click on {} for user {}: {}", property_id, user_id, err);
        }
    }
}
