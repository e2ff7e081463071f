use crate::models::{Listing, RecommendationScore, ScoreFactor};
use crate::recommendation::signals::UserSignals;
use crate::recommendation::weights::ScoringWeights;
use chrono::{DateTime, Utc};

/// Score one candidate listing against the user's signals
pub fn score_listing(
    listing: &Listing,
    signals: &UserSignals,
    weights: &ScoringWeights,
    now: DateTime<Utc>,
) -> RecommendationScore {
    let mut contributions: Vec<(&str, f64, String)> = Vec::new();

    if signals.favorites.contains(&listing.id) {
        contributions.push((
            "favorite_similarity",
            weights.favorite,
            "Similaire à vos favoris".to_string(),
        ));
    }

    if signals.prefers_city(&listing.city) {
        contributions.push((
            "preferred_city",
            weights.preferred_city,
            format!("Situé à {}, une ville que vous consultez souvent", listing.city),
        ));
    }

    if let Some(search) = &signals.last_search {
        let type_matches = search
            .property_type
            .as_deref()
            .is_some_and(|wanted| wanted.eq_ignore_ascii_case(listing.property_type.as_str()));
        if type_matches {
            contributions.push((
                "property_type",
                weights.property_type,
                "Correspond au type de bien recherché".to_string(),
            ));
        }

        if search.budget_matches(listing.monthly_rent) {
            contributions.push(("budget", weights.budget, "Dans votre budget".to_string()));
        }

        if search.bedrooms == Some(listing.bedrooms) {
            contributions.push((
                "bedrooms",
                weights.bedrooms,
                format!("{} chambre(s) comme demandé", listing.bedrooms),
            ));
        }
    }

    let popularity = weights.popularity(listing.view_count);
    if popularity > 0.0 {
        contributions.push((
            "popularity",
            popularity,
            format!("Bien populaire ({} vues)", listing.view_count),
        ));
    }

    let freshness = weights.freshness(listing.days_old(now));
    if freshness > 0.0 {
        contributions.push(("freshness", freshness, "Nouvelle annonce".to_string()));
    }

    let score = contributions
        .iter()
        .map(|(_, weight, _)| weight)
        .sum::<f64>()
        .clamp(0.0, 100.0);

    let strong = contributions
        .iter()
        .filter(|(_, weight, _)| *weight >= weights.strong_factor)
        .count();
    let mut confidence = (score / 100.0).min(weights.confidence_cap);
    if strong >= 2 {
        confidence += weights.confidence_boost;
    }

    // Strongest reason first
    contributions.sort_by(|a, b| b.1.total_cmp(&a.1));

    let (factors, reasons): (Vec<ScoreFactor>, Vec<String>) = contributions
        .into_iter()
        .map(|(factor, weight, reason)| {
            (
                ScoreFactor {
                    factor: factor.to_string(),
                    weight,
                },
                reason,
            )
        })
        .unzip();

    RecommendationScore {
        property_id: listing.id.clone(),
        score,
        reasons,
        confidence: confidence.min(1.0),
        factors,
    }
}

/// Score every candidate, drop those without any signal and keep the best `limit`
///
/// Equal scores keep candidate order.
pub fn rank(
    candidates: &[Listing],
    signals: &UserSignals,
    weights: &ScoringWeights,
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<RecommendationScore> {
    let mut scored: Vec<RecommendationScore> = candidates
        .iter()
        .map(|listing| score_listing(listing, signals, weights, now))
        .filter(|score| score.score > 0.0)
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(limit);
    scored
}

/// Most viewed listings with a synthetic popularity reason
pub fn popularity_fallback(
    mut listings: Vec<Listing>,
    weights: &ScoringWeights,
    limit: usize,
) -> Vec<RecommendationScore> {
    listings.sort_by(|a, b| b.view_count.cmp(&a.view_count));
    listings.truncate(limit);

    listings
        .into_iter()
        .map(|listing| {
            let score = (listing.view_count as f64 * weights.popularity_per_view).min(100.0);
            RecommendationScore {
                property_id: listing.id,
                score,
                reasons: vec![format!("Populaire : {} vues", listing.view_count)],
                confidence: 0.5,
                factors: vec![ScoreFactor {
                    factor: "popularity".to_string(),
                    weight: score,
                }],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ListingStatus, PropertyType};
    use crate::recommendation::signals::SearchCriteria;
    use chrono::Duration;

    fn listing(id: &str, city: &str, views: u64, age_days: i64) -> Listing {
        Listing {
            id: id.to_string(),
            title: format!("Appartement {}", id),
            property_type: PropertyType::Apartment,
            city: city.to_string(),
            neighborhood: None,
            monthly_rent: 180_000,
            bedrooms: 2,
            bathrooms: 1,
            surface_area: Some(70.0),
            is_furnished: false,
            has_parking: false,
            has_ac: true,
            status: ListingStatus::Available,
            created_at: Utc::now() - Duration::days(age_days),
            view_count: views,
        }
    }

    fn signals(favorites: &[&str], cities: &[&str]) -> UserSignals {
        UserSignals {
            favorites: favorites.iter().map(|s| s.to_string()).collect(),
            viewed_cities: cities.iter().map(|s| s.to_lowercase()).collect(),
            last_search: None,
        }
    }

    #[test]
    fn favorite_in_preferred_city_scores_at_least_65() {
        let weights = ScoringWeights::default();
        let score = score_listing(
            &listing("a", "Abidjan", 0, 60),
            &signals(&["a"], &["Abidjan"]),
            &weights,
            Utc::now(),
        );

        assert_eq!(score.score, 65.0);
        assert_eq!(score.factors[0].factor, "favorite_similarity");
        assert_eq!(score.reasons[0], "Similaire à vos favoris");
        // 0.65 plus the boost for two strong factors
        assert!((score.confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn search_criteria_signals_add_up() {
        let weights = ScoringWeights::default();
        let user = UserSignals {
            last_search: Some(SearchCriteria {
                property_type: Some("Apartment".to_string()),
                min_price: Some(100_000),
                max_price: Some(200_000),
                bedrooms: Some(2),
            }),
            ..UserSignals::default()
        };

        let score = score_listing(&listing("a", "Bouaké", 0, 60), &user, &weights, Utc::now());

        assert_eq!(score.score, 45.0);
        let names: Vec<_> = score.factors.iter().map(|f| f.factor.as_str()).collect();
        assert_eq!(names, vec!["property_type", "budget", "bedrooms"]);
        assert!((score.confidence - 0.45).abs() < 1e-9);
    }

    #[test]
    fn score_is_clamped_and_confidence_capped() {
        let weights = ScoringWeights::default();
        let user = UserSignals {
            last_search: Some(SearchCriteria {
                property_type: Some("apartment".to_string()),
                min_price: None,
                max_price: Some(500_000),
                bedrooms: Some(2),
            }),
            ..signals(&["a"], &["abidjan"])
        };

        let score = score_listing(&listing("a", "Abidjan", 10_000, 0), &user, &weights, Utc::now());

        assert_eq!(score.score, 100.0);
        assert!((score.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn candidates_without_signal_are_dropped() {
        let weights = ScoringWeights::default();
        let candidates = vec![
            listing("quiet", "Korhogo", 3, 90),
            listing("fav", "Abidjan", 0, 90),
        ];

        let ranked = rank(&candidates, &signals(&["fav"], &[]), &weights, Utc::now(), 10);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].property_id, "fav");
    }

    #[test]
    fn equal_scores_keep_candidate_order() {
        let weights = ScoringWeights::default();
        let candidates = vec![
            listing("first", "Abidjan", 0, 90),
            listing("second", "Abidjan", 0, 90),
            listing("third", "Abidjan", 0, 90),
        ];

        let ranked = rank(&candidates, &signals(&[], &["abidjan"]), &weights, Utc::now(), 2);

        let ids: Vec<_> = ranked.iter().map(|r| r.property_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn fallback_orders_by_views() {
        let weights = ScoringWeights::default();
        let listings = vec![
            listing("b", "Abidjan", 40, 1),
            listing("a", "Abidjan", 900, 1),
            listing("c", "Abidjan", 300, 1),
        ];

        let fallback = popularity_fallback(listings, &weights, 2);

        let ids: Vec<_> = fallback.iter().map(|r| r.property_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(fallback[0].factors[0].factor, "popularity");
        assert!(fallback[0].reasons[0].starts_with("Populaire"));
    }
}
