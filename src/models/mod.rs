use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of property offered on the marketplace
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Apartment,
    House,
    Studio,
    Villa,
    Duplex,
    Office,
    Shop,
}

impl PropertyType {
    /// Column value used by the backend
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Apartment => "apartment",
            Self::House => "house",
            Self::Studio => "studio",
            Self::Villa => "villa",
            Self::Duplex => "duplex",
            Self::Office => "office",
            Self::Shop => "shop",
        }
    }
}

/// Listings are never deleted, only moved between these states
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    #[default]
    Available,
    Rented,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Rented => "rented",
        }
    }
}

/// A rental listing as stored in the `properties` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub property_type: PropertyType,
    pub city: String,
    pub neighborhood: Option<String>,
    /// Monthly rent in FCFA
    pub monthly_rent: i64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub surface_area: Option<f64>,
    #[serde(default)]
    pub is_furnished: bool,
    #[serde(default)]
    pub has_parking: bool,
    #[serde(default)]
    pub has_ac: bool,
    #[serde(default)]
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub view_count: u64,
}

impl Listing {
    /// Whole days since the listing was published, never negative
    pub fn days_old(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_days().max(0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    View,
    Search,
    Favorite,
    /// Any action type this crate does not score on
    #[serde(other)]
    Other,
}

/// One row of the append-only user activity log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub user_id: String,
    pub action_type: ActivityAction,
    #[serde(default)]
    pub property_id: Option<String>,
    #[serde(default)]
    pub action_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A single weighted signal behind a recommendation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreFactor {
    pub factor: String,
    pub weight: f64,
}

/// Ranked recommendation for one listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationScore {
    pub property_id: String,
    /// Between 0 and 100
    pub score: f64,
    pub reasons: Vec<String>,
    /// Between 0 and 1
    pub confidence: f64,
    pub factors: Vec<ScoreFactor>,
}
