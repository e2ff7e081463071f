use anyhow::Context;
use mon_toit::cache::TtlCache;
use mon_toit::models::ActivityAction;
use mon_toit::pagination::{FeedOptions, ListingFeed};
use mon_toit::recommendation::RecommendationEngine;
use mon_toit::seed::sample_listings;
use mon_toit::store::{ActivityStore, ListingFilters, ListingStore, MemoryStore, RestStore};
use mon_toit::Settings;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEMO_USER: &str = "demo-user";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🏠 Mon Toit - listing engine");
    info!("============================");

    let settings = Settings::load().context("Failed to load settings")?;
    let user_id = std::env::args().nth(1).unwrap_or_else(|| DEMO_USER.to_string());

    let (listings, activity): (Arc<dyn ListingStore>, Arc<dyn ActivityStore>) =
        match (&settings.backend.url, &settings.backend.api_key) {
            (Some(url), Some(api_key)) => {
                info!("Using backend at {}", url);
                let store = Arc::new(
                    RestStore::new(url, api_key, settings.backend.timeout())
                        .context("Failed to create backend client")?,
                );
                (store.clone() as Arc<dyn ListingStore>, store as Arc<dyn ActivityStore>)
            }
            _ => {
                info!("No backend configured, using sample listings");
                let store = Arc::new(MemoryStore::with_listings(sample_listings()));
                (store.clone() as Arc<dyn ListingStore>, store as Arc<dyn ActivityStore>)
            }
        };

    // Walk the feed the way a scrolling client would
    let cache = Arc::new(TtlCache::new());
    let feed = ListingFeed::new(
        listings.clone(),
        cache,
        ListingFilters::default(),
        FeedOptions::from(&settings.pagination),
    );

    feed.start().await.context("Failed to load first page")?;
    while feed.has_more() {
        feed.load_more().await.context("Failed to load next page")?;
    }
    feed.settle().await;

    let snapshot = feed.snapshot();
    info!(
        "\n✅ Loaded {} of {} listings in {} pages\n",
        snapshot.listings.len(),
        snapshot.total,
        snapshot.pages
    );

    for (i, listing) in snapshot.listings.iter().enumerate() {
        println!("{}. {} ({} FCFA/mois)", i + 1, listing.title, listing.monthly_rent);
        println!("   {} chambre(s), {} vues", listing.bedrooms, listing.view_count);
        match &listing.neighborhood {
            Some(neighborhood) => println!("   {}, {}", neighborhood, listing.city),
            None => println!("   {}", listing.city),
        }
        println!("   ID: {}", listing.id);
        println!();
    }

    let engine = RecommendationEngine::new(listings, activity, settings.recommendation.clone());

    if let Some(first) = snapshot.listings.first() {
        engine
            .track_activity(
                &user_id,
                ActivityAction::View,
                Some(first.id.as_str()),
                json!({ "city": first.city }),
            )
            .await;
    }

    let recommendations = engine
        .personalized(&user_id, settings.recommendation.limit)
        .await
        .context("Failed to compute recommendations")?;

    info!("⭐ {} recommendations for {}", recommendations.len(), user_id);
    for recommendation in &recommendations {
        println!(
            "{} - score {:.0}, confiance {:.2}",
            recommendation.property_id, recommendation.score, recommendation.confidence
        );
        for reason in &recommendation.reasons {
            println!("   • {}", reason);
        }
    }

    let json = serde_json::to_string_pretty(&recommendations)?;
    tokio::fs::write("recommendations.json", json).await?;
    info!("💾 Saved recommendations to recommendations.json");

    Ok(())
}
