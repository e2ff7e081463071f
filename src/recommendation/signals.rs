use crate::models::{ActivityAction, ActivityRecord};
use serde::Deserialize;
use std::collections::HashSet;

/// Criteria of a search, as recorded in activity metadata
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchCriteria {
    pub property_type: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub bedrooms: Option<u32>,
}

impl SearchCriteria {
    /// A price matches when it lies within the bounds that are set;
    /// no bound at all means no budget signal
    pub fn budget_matches(&self, price: i64) -> bool {
        if self.min_price.is_none() && self.max_price.is_none() {
            return false;
        }
        self.min_price.map_or(true, |min| price >= min)
            && self.max_price.map_or(true, |max| price <= max)
    }
}

/// What the engine knows about a user
#[derive(Debug, Clone, Default)]
pub struct UserSignals {
    pub favorites: HashSet<String>,
    /// Lowercased
    pub viewed_cities: HashSet<String>,
    pub last_search: Option<SearchCriteria>,
}

impl UserSignals {
    /// Build from favorites and an activity log ordered most recent first
    pub fn collect(favorites: Vec<String>, history: &[ActivityRecord]) -> Self {
        let viewed_cities = history
            .iter()
            .filter(|record| record.action_type == ActivityAction::View)
            .filter_map(|record| record.action_data.get("city")?.as_str())
            .map(|city| city.trim().to_lowercase())
            .filter(|city| !city.is_empty())
            .collect();

        let last_search = history
            .iter()
            .filter(|record| record.action_type == ActivityAction::Search)
            .find_map(|record| SearchCriteria::deserialize(&record.action_data).ok());

        Self {
            favorites: favorites.into_iter().collect(),
            viewed_cities,
            last_search,
        }
    }

    pub fn prefers_city(&self, city: &str) -> bool {
        self.viewed_cities.contains(&city.trim().to_lowercase())
    }

    /// No favorites and nothing usable in the activity log
    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty() && self.viewed_cities.is_empty() && self.last_search.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn record(action: ActivityAction, data: serde_json::Value, minutes_ago: i64) -> ActivityRecord {
        ActivityRecord {
            user_id: "u1".to_string(),
            action_type: action,
            property_id: None,
            action_data: data,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn most_recent_search_wins() {
        let history = vec![
            record(ActivityAction::Search, json!({ "property_type": "villa", "bedrooms": 4 }), 1),
            record(ActivityAction::Search, json!({ "property_type": "studio" }), 30),
        ];

        let signals = UserSignals::collect(vec![], &history);
        let search = signals.last_search.unwrap();

        assert_eq!(search.property_type.as_deref(), Some("villa"));
        assert_eq!(search.bedrooms, Some(4));
    }

    #[test]
    fn viewed_cities_are_case_insensitive() {
        let history = vec![
            record(ActivityAction::View, json!({ "city": "Abidjan" }), 2),
            record(ActivityAction::View, json!({}), 3),
            record(ActivityAction::Favorite, json!({ "city": "Bouaké" }), 4),
        ];

        let signals = UserSignals::collect(vec![], &history);

        assert!(signals.prefers_city("ABIDJAN"));
        assert!(!signals.prefers_city("Bouaké"));
        assert!(!signals.is_empty());
    }

    #[test]
    fn unknown_action_types_are_ignored() {
        let history: Vec<ActivityRecord> = serde_json::from_value(json!([
            {
                "user_id": "u1",
                "action_type": "contact_owner",
                "property_id": "p9",
                "action_data": { "city": "Korhogo", "property_type": "villa" },
                "created_at": "2024-05-01T10:00:00Z"
            },
            {
                "user_id": "u1",
                "action_type": "view",
                "property_id": "p2",
                "action_data": { "city": "Abidjan" },
                "created_at": "2024-05-01T09:00:00Z"
            }
        ]))
        .unwrap();

        assert_eq!(history[0].action_type, ActivityAction::Other);
        let signals = UserSignals::collect(vec![], &history);
        assert!(signals.prefers_city("Abidjan"));
        assert!(!signals.prefers_city("Korhogo"));
        assert!(signals.last_search.is_none());
    }

    #[test]
    fn budget_with_one_bound_is_open_on_the_other_side() {
        let criteria = SearchCriteria {
            max_price: Some(200_000),
            ..SearchCriteria::default()
        };
        assert!(criteria.budget_matches(50_000));
        assert!(!criteria.budget_matches(250_000));
        assert!(!SearchCriteria::default().budget_matches(50_000));
    }

    #[test]
    fn no_data_means_empty_signals() {
        assert!(UserSignals::collect(vec![], &[]).is_empty());
    }
}
