use serde::{Deserialize, Serialize};

/// Weight table for the recommendation signals
///
/// Flat signals add their full weight when they trigger. Popularity and
/// freshness are graded and only count above their thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub favorite: f64,
    pub preferred_city: f64,
    pub property_type: f64,
    pub budget: f64,
    pub bedrooms: f64,

    /// Points per view
    pub popularity_per_view: f64,
    pub popularity_cap: f64,
    pub popularity_threshold: f64,

    /// Points for a listing published today, minus one per day of age
    pub freshness_base: f64,
    pub freshness_threshold: f64,

    /// Factors at or above this weight count as strong for confidence
    pub strong_factor: f64,
    pub confidence_cap: f64,
    pub confidence_boost: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            favorite: 40.0,
            preferred_city: 25.0,
            property_type: 20.0,
            budget: 15.0,
            bedrooms: 10.0,
            popularity_per_view: 0.1,
            popularity_cap: 20.0,
            popularity_threshold: 10.0,
            freshness_base: 10.0,
            freshness_threshold: 5.0,
            strong_factor: 20.0,
            confidence_cap: 0.9,
            confidence_boost: 0.1,
        }
    }
}

impl ScoringWeights {
    /// Graded popularity points, zero unless above the threshold
    pub fn popularity(&self, view_count: u64) -> f64 {
        let points = (view_count as f64 * self.popularity_per_view).min(self.popularity_cap);
        if points > self.popularity_threshold {
            points
        } else {
            0.0
        }
    }

    /// Graded freshness points, zero unless above the threshold
    pub fn freshness(&self, days_old: i64) -> f64 {
        let points = (self.freshness_base - days_old as f64).max(0.0);
        if points > self.freshness_threshold {
            points
        } else {
            0.0
        }
    }
}
