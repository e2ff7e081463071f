use crate::models::{Listing, ListingStatus, PropertyType};
use chrono::{Duration, Utc};

/// Sample Abidjan and Bouaké listings used when no backend is configured
pub fn sample_listings() -> Vec<Listing> {
    let now = Utc::now();
    let listing = |id: &str,
                   title: &str,
                   property_type: PropertyType,
                   city: &str,
                   neighborhood: &str,
                   monthly_rent: i64,
                   bedrooms: u32,
                   age_days: i64,
                   view_count: u64| Listing {
        id: id.to_string(),
        title: title.to_string(),
        property_type,
        city: city.to_string(),
        neighborhood: Some(neighborhood.to_string()),
        monthly_rent,
        bedrooms,
        bathrooms: bedrooms.div_ceil(2).max(1),
        surface_area: Some(30.0 + bedrooms as f64 * 25.0),
        is_furnished: bedrooms <= 1,
        has_parking: property_type != PropertyType::Studio,
        has_ac: true,
        status: ListingStatus::Available,
        created_at: now - Duration::days(age_days),
        view_count,
    };

    let mut listings = vec![
        listing(
            "cocody_1",
            "Villa duplex avec piscine",
            PropertyType::Duplex,
            "Abidjan",
            "Cocody",
            850_000,
            4,
            1,
            420,
        ),
        listing(
            "cocody_2",
            "Appartement 3 pièces Riviera",
            PropertyType::Apartment,
            "Abidjan",
            "Cocody",
            250_000,
            2,
            3,
            180,
        ),
        listing(
            "plateau_1",
            "Bureau standing vue lagune",
            PropertyType::Office,
            "Abidjan",
            "Plateau",
            600_000,
            0,
            12,
            95,
        ),
        listing(
            "marcory_1",
            "Studio meublé Zone 4",
            PropertyType::Studio,
            "Abidjan",
            "Marcory",
            120_000,
            1,
            2,
            310,
        ),
        listing(
            "yopougon_1",
            "Maison basse 4 pièces",
            PropertyType::House,
            "Abidjan",
            "Yopougon",
            150_000,
            3,
            20,
            60,
        ),
        listing(
            "bingerville_1",
            "Villa basse avec jardin",
            PropertyType::Villa,
            "Abidjan",
            "Bingerville",
            400_000,
            3,
            7,
            140,
        ),
        listing(
            "bouake_1",
            "Appartement 2 pièces centre",
            PropertyType::Apartment,
            "Bouaké",
            "Commerce",
            90_000,
            1,
            4,
            45,
        ),
        listing(
            "bouake_2",
            "Maison familiale Air France",
            PropertyType::House,
            "Bouaké",
            "Air France",
            110_000,
            3,
            30,
            25,
        ),
        listing(
            "yakro_1",
            "Villa 5 pièces Habitat",
            PropertyType::Villa,
            "Yamoussoukro",
            "Habitat",
            300_000,
            4,
            9,
            70,
        ),
    ];

    let mut rented = listing(
        "cocody_3",
        "Appartement 4 pièces Angré",
        PropertyType::Apartment,
        "Abidjan",
        "Cocody",
        320_000,
        3,
        40,
        520,
    );
    rented.status = ListingStatus::Rented;
    listings.push(rented);

    listings
}
