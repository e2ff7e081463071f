use crate::models::{Listing, ListingStatus, PropertyType};
use serde::{Deserialize, Serialize};

/// Filter set applied to listing queries
///
/// Field order matters: the serialized form is used as a cache key prefix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingFilters {
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    pub property_type: Option<PropertyType>,
    /// Minimum monthly rent (FCFA)
    pub min_rent: Option<i64>,
    /// Maximum monthly rent (FCFA)
    pub max_rent: Option<i64>,
    pub min_bedrooms: Option<u32>,
    pub furnished: Option<bool>,
    pub parking: Option<bool>,
    pub air_conditioning: Option<bool>,
    pub status: Option<ListingStatus>,
}

impl Default for ListingFilters {
    fn default() -> Self {
        Self {
            city: None,
            neighborhood: None,
            property_type: None,
            min_rent: None,
            max_rent: None,
            min_bedrooms: None,
            furnished: None,
            parking: None,
            air_conditioning: None,
            status: Some(ListingStatus::Available),
        }
    }
}

impl ListingFilters {
    pub fn in_city(city: impl Into<String>) -> Self {
        Self {
            city: Some(city.into()),
            ..Self::default()
        }
    }

    /// Stable string form of the filter set, used in cache keys
    pub fn cache_fragment(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(city) = &self.city {
            if !same_text(&listing.city, city) {
                return false;
            }
        }
        if let Some(neighborhood) = &self.neighborhood {
            match &listing.neighborhood {
                Some(n) if same_text(n, neighborhood) => {}
                _ => return false,
            }
        }
        if self.property_type.is_some_and(|t| t != listing.property_type) {
            return false;
        }
        if self.min_rent.is_some_and(|min| listing.monthly_rent < min) {
            return false;
        }
        if self.max_rent.is_some_and(|max| listing.monthly_rent > max) {
            return false;
        }
        if self.min_bedrooms.is_some_and(|min| listing.bedrooms < min) {
            return false;
        }
        if self.furnished.is_some_and(|f| f != listing.is_furnished)
            || self.parking.is_some_and(|p| p != listing.has_parking)
            || self.air_conditioning.is_some_and(|ac| ac != listing.has_ac)
        {
            return false;
        }
        self.status.map_or(true, |s| s == listing.status)
    }
}

/// Case-insensitive comparison that also folds accented letters (`É` / `é`)
fn same_text(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn listing(city: &str, rent: i64, bedrooms: u32) -> Listing {
        Listing {
            id: "p1".to_string(),
            title: "Appartement 3 pièces".to_string(),
            property_type: PropertyType::Apartment,
            city: city.to_string(),
            neighborhood: Some("Cocody".to_string()),
            monthly_rent: rent,
            bedrooms,
            bathrooms: 1,
            surface_area: Some(85.0),
            is_furnished: false,
            has_parking: true,
            has_ac: true,
            status: ListingStatus::Available,
            created_at: Utc::now(),
            view_count: 0,
        }
    }

    #[test]
    fn default_filters_only_keep_available_listings() {
        let filters = ListingFilters::default();
        let mut rented = listing("Abidjan", 150_000, 2);
        rented.status = ListingStatus::Rented;

        assert!(filters.matches(&listing("Abidjan", 150_000, 2)));
        assert!(!filters.matches(&rented));
    }

    #[test]
    fn rent_bounds_and_city_are_applied() {
        let filters = ListingFilters {
            min_rent: Some(100_000),
            max_rent: Some(200_000),
            ..ListingFilters::in_city("abidjan")
        };

        assert!(filters.matches(&listing("Abidjan", 150_000, 2)));
        assert!(!filters.matches(&listing("Abidjan", 250_000, 2)));
        assert!(!filters.matches(&listing("Bouaké", 150_000, 2)));
    }

    #[test]
    fn city_and_neighborhood_ignore_accented_case() {
        let mut listing = listing("Bouaké", 150_000, 2);
        listing.neighborhood = Some("Dar-Es-Salam".to_string());
        let filters = ListingFilters {
            neighborhood: Some("dar-es-salam".to_string()),
            ..ListingFilters::in_city("BOUAKÉ")
        };

        assert!(filters.matches(&listing));
        assert!(!ListingFilters::in_city("Bouake").matches(&listing));
    }

    #[test]
    fn amenity_flags_must_agree_when_set() {
        let filters = ListingFilters {
            furnished: Some(true),
            ..ListingFilters::default()
        };
        assert!(!filters.matches(&listing("Abidjan", 150_000, 2)));
    }

    #[test]
    fn cache_fragment_differs_per_filter_set() {
        let a = ListingFilters::in_city("Abidjan");
        let b = ListingFilters::in_city("Yamoussoukro");
        assert_ne!(a.cache_fragment(), b.cache_fragment());
        assert_eq!(a.cache_fragment(), a.clone().cache_fragment());
    }
}
