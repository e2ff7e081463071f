use crate::error::{MarketError, Result};
use crate::models::{ActivityRecord, Listing, RecommendationScore};
use crate::store::traits::{ActivityStore, ListingStore};
use crate::store::types::ListingFilters;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

const LISTINGS_TABLE: &str = "properties";
const FAVORITES_TABLE: &str = "favorites";
const ACTIVITY_TABLE: &str = "user_activity_tracking";
const RECOMMENDATIONS_TABLE: &str = "ai_recommendations";

/// Store backed by the hosted Postgres REST interface (PostgREST)
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    /// Create a store talking to `base_url` (project URL, without `/rest/v1`)
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("mon-toit/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        debug!("{} {}", method, url);
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn select_listings(&self, params: Vec<(String, String)>) -> Result<Vec<Listing>> {
        let response = self
            .request(Method::GET, LISTINGS_TABLE)
            .query(&params)
            .send()
            .await?;
        let body = ensure_success(response).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Turn a non-success response into [`MarketError::Backend`]
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!("Backend returned status: {}", status);
    Err(MarketError::Backend {
        status: status.as_u16(),
        body,
    })
}

/// PostgREST query parameters for a filter set
pub fn filter_params(filters: &ListingFilters) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut push = |column: &str, op: &str, value: String| {
        params.push((column.to_string(), format!("{}.{}", op, value)));
    };

    if let Some(city) = &filters.city {
        push("city", "ilike", escape_like(city));
    }
    if let Some(neighborhood) = &filters.neighborhood {
        push("neighborhood", "ilike", escape_like(neighborhood));
    }
    if let Some(property_type) = filters.property_type {
        push("property_type", "eq", property_type.as_str().to_string());
    }
    if let Some(min) = filters.min_rent {
        push("monthly_rent", "gte", min.to_string());
    }
    if let Some(max) = filters.max_rent {
        push("monthly_rent", "lte", max.to_string());
    }
    if let Some(min) = filters.min_bedrooms {
        push("bedrooms", "gte", min.to_string());
    }
    if let Some(furnished) = filters.furnished {
        push("is_furnished", "eq", furnished.to_string());
    }
    if let Some(parking) = filters.parking {
        push("has_parking", "eq", parking.to_string());
    }
    if let Some(ac) = filters.air_conditioning {
        push("has_ac", "eq", ac.to_string());
    }
    if let Some(status) = filters.status {
        push("status", "eq", status.as_str().to_string());
    }

    params
}

/// `ilike` without wildcards is a case-insensitive equality; literal `%`, `_`
/// and `\` in the value are escaped
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Extract the total from a `Content-Range` header such as `0-19/125` or `*/0`
pub fn parse_content_range(header: &str) -> Option<u64> {
    let (_, total) = header.rsplit_once('/')?;
    total.trim().parse().ok()
}

fn page_params(offset: usize, limit: usize, order: &str) -> Vec<(String, String)> {
    vec![
        ("select".to_string(), "*".to_string()),
        ("order".to_string(), order.to_string()),
        ("offset".to_string(), offset.to_string()),
        ("limit".to_string(), limit.to_string()),
    ]
}

#[derive(Deserialize)]
struct FavoriteRow {
    property_id: String,
}

#[async_trait]
impl ListingStore for RestStore {
    async fn fetch_page(
        &self,
        filters: &ListingFilters,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Listing>> {
        let mut params = page_params(offset, limit, "created_at.desc");
        params.extend(filter_params(filters));
        let listings = self.select_listings(params).await?;
        debug!("Fetched {} listings at offset {}", listings.len(), offset);
        Ok(listings)
    }

    async fn count(&self, filters: &ListingFilters) -> Result<u64> {
        let mut params = vec![
            ("select".to_string(), "id".to_string()),
            ("limit".to_string(), "1".to_string()),
        ];
        params.extend(filter_params(filters));

        let response = self
            .request(Method::GET, LISTINGS_TABLE)
            .header("Prefer", "count=exact")
            .query(&params)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let total = response
            .headers()
            .get("content-range")
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range);

        match total {
            Some(total) => Ok(total),
            None => {
                warn!("Missing or malformed Content-Range header on count query");
                Err(MarketError::Backend {
                    status: response.status().as_u16(),
                    body: "missing Content-Range header".to_string(),
                })
            }
        }
    }

    async fn available(&self, limit: usize) -> Result<Vec<Listing>> {
        let mut params = page_params(0, limit, "created_at.desc");
        params.push(("status".to_string(), "eq.available".to_string()));
        self.select_listings(params).await
    }

    async fn most_viewed(&self, limit: usize) -> Result<Vec<Listing>> {
        let mut params = page_params(0, limit, "view_count.desc");
        params.push(("status".to_string(), "eq.available".to_string()));
        self.select_listings(params).await
    }

    fn source_name(&self) -> &'static str {
        "PostgREST"
    }
}

#[async_trait]
impl ActivityStore for RestStore {
    async fn favorites(&self, user_id: &str) -> Result<Vec<String>> {
        let response = self
            .request(Method::GET, FAVORITES_TABLE)
            .query(&[
                ("select", "property_id".to_string()),
                ("user_id", format!("eq.{}", user_id)),
            ])
            .send()
            .await?;
        let body = ensure_success(response).await?.text().await?;
        let rows: Vec<FavoriteRow> = serde_json::from_str(&body)?;
        Ok(rows.into_iter().map(|row| row.property_id).collect())
    }

    async fn activity_history(&self, user_id: &str, limit: usize) -> Result<Vec<ActivityRecord>> {
        let response = self
            .request(Method::GET, ACTIVITY_TABLE)
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{}", user_id)),
                ("order", "created_at.desc".to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;
        let body = ensure_success(response).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn record_activity(&self, record: &ActivityRecord) -> Result<()> {
        let response = self
            .request(Method::POST, ACTIVITY_TABLE)
            .json(record)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn upsert_recommendations(
        &self,
        user_id: &str,
        scores: &[RecommendationScore],
    ) -> Result<()> {
        if scores.is_empty() {
            return Ok(());
        }

        let rows: Vec<_> = scores
            .iter()
            .map(|score| {
                json!({
                    "user_id": user_id,
                    "property_id": score.property_id,
                    "score": score.score,
                    "reasons": score.reasons,
                    "confidence": score.confidence,
                    "factors": score.factors,
                })
            })
            .collect();

        let response = self
            .request(Method::POST, RECOMMENDATIONS_TABLE)
            .query(&[("on_conflict", "user_id,property_id")])
            .header("Prefer", "resolution=merge-duplicates")
            .json(&rows)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn mark_clicked(&self, user_id: &str, property_id: &str) -> Result<()> {
        let response = self
            .request(Method::PATCH, RECOMMENDATIONS_TABLE)
            .query(&[
                ("user_id", format!("eq.{}", user_id)),
                ("property_id", format!("eq.{}", property_id)),
            ])
            .json(&json!({ "clicked": true, "clicked_at": Utc::now() }))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyType;

    #[test]
    fn filters_become_postgrest_operators() {
        let filters = ListingFilters {
            property_type: Some(PropertyType::Villa),
            min_rent: Some(300_000),
            max_rent: Some(800_000),
            parking: Some(true),
            ..ListingFilters::in_city("Abidjan")
        };

        let params = filter_params(&filters);

        assert!(params.contains(&("city".to_string(), "ilike.Abidjan".to_string())));
        assert!(params.contains(&("property_type".to_string(), "eq.villa".to_string())));
        assert!(params.contains(&("monthly_rent".to_string(), "gte.300000".to_string())));
        assert!(params.contains(&("monthly_rent".to_string(), "lte.800000".to_string())));
        assert!(params.contains(&("has_parking".to_string(), "eq.true".to_string())));
        assert!(params.contains(&("status".to_string(), "eq.available".to_string())));
        assert!(!params.iter().any(|(column, _)| column == "is_furnished"));
    }

    #[test]
    fn place_names_match_case_insensitively_and_literally() {
        let filters = ListingFilters {
            neighborhood: Some("Zone_4%".to_string()),
            ..ListingFilters::in_city("Bouaké")
        };

        let params = filter_params(&filters);

        assert!(params.contains(&("city".to_string(), "ilike.Bouaké".to_string())));
        assert!(params.contains(&("neighborhood".to_string(), r"ilike.Zone\_4\%".to_string())));
    }

    #[test]
    fn content_range_total_is_parsed() {
        assert_eq!(parse_content_range("0-19/125"), Some(125));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-19/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let store = RestStore::new(
            "https://project.supabase.co/",
            "anon-key",
            Duration::from_secs(5),
        )
        .expect("client");
        assert_eq!(store.base_url, "https://project.supabase.co");
        assert_eq!(store.source_name(), "PostgREST");
    }
}
