//! Google Places Web Service provider.
//!
//! A search runs a paginated Text Search for `"{niche} in {city}, {country}"`,
//! then fetches Place Details for every new `place_id`. When the text search
//! comes back thin, the city is geocoded and a keyword Nearby Search fills in.
//! Only places with a location, an address and a website survive.

use super::common::{build_http_client, read_json, CallPacer};
use crate::error::{Result, SourceError};
use crate::provider::SourceProvider;
use async_trait::async_trait;
use leadscout_core::{normalize_website, City, Niche, PlaceRecord, PlacesConfig, Throttle};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

const PROVIDER: &str = "google";
const USER_AGENT: &str = "LeadDatasetBuilder/1.0";

/// Google Places provider.
pub struct PlacesProvider {
    client: Client,
    api_key: String,
    base_url: String,
    fields: String,
    country: String,
    token_delay: Duration,
    min_text_results: usize,
    nearby_radius_m: u32,
    throttle: Throttle,
}

impl PlacesProvider {
    /// Create a provider from configuration.
    ///
    /// `throttle` is the API channel throttle shared with the orchestrator.
    ///
    /// # Errors
    /// Returns error if no API key is configured or the HTTP client cannot be
    /// created.
    pub fn new(config: &PlacesConfig, country: &str, throttle: Throttle) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| SourceError::AccessDenied {
                provider: PROVIDER.to_string(),
                message: "no API key configured".to_string(),
            })?;

        Ok(Self {
            client: build_http_client(config.timeout_secs, USER_AGENT)?,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            fields: config.fields.join(","),
            country: country.to_string(),
            token_delay: Duration::from_millis(config.token_delay_ms),
            min_text_results: config.min_text_results,
            nearby_radius_m: config.nearby_radius_m,
            throttle,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        pacer: &mut CallPacer<'_>,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        pacer.ready().await;
        let response = self
            .client
            .get(format!("{}/{path}", self.base_url))
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;
        read_json(PROVIDER, response).await
    }

    /// Run a search endpoint and follow `next_page_token` to the end.
    async fn paged_search(
        &self,
        pacer: &mut CallPacer<'_>,
        path: &str,
        params: Vec<(&str, String)>,
    ) -> Result<Vec<String>> {
        let mut place_ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page_params = match &page_token {
                Some(token) => {
                    // Tokens only become valid a short while after they are issued.
                    tokio::time::sleep(self.token_delay).await;
                    vec![("pagetoken", token.clone())]
                }
                None => params.clone(),
            };

            let fetched = async {
                let page: SearchResponse = self.get(pacer, path, &page_params).await?;
                check_status(&page.status, page.error_message.as_deref())?;
                Ok::<_, SourceError>(page)
            }
            .await;

            let page = match fetched {
                Ok(page) => page,
                // Later pages are best effort; keep what the earlier pages found.
                Err(e) if page_token.is_some() && is_skippable(&e) => {
                    tracing::warn!(path, ids_kept = place_ids.len(), error = %e, "pagination stopped early");
                    break;
                }
                Err(e) => return Err(e),
            };

            place_ids.extend(page.results.into_iter().filter_map(|r| r.place_id));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(place_ids)
    }

    /// Fetch details for one place. Non-transient failures skip the place,
    /// except a rejected key, which no later call can fix either.
    async fn fetch_details(
        &self,
        pacer: &mut CallPacer<'_>,
        place_id: &str,
    ) -> Result<Option<PlaceRecord>> {
        let params = [
            ("place_id", place_id.to_string()),
            ("fields", self.fields.clone()),
        ];

        let outcome = async {
            let response: DetailsResponse =
                self.get(pacer, "place/details/json", &params).await?;
            check_status(&response.status, response.error_message.as_deref())?;
            Ok::<_, SourceError>(response.result)
        }
        .await;

        match outcome {
            Ok(Some(details)) => Ok(details.into_record()),
            Ok(None) => Ok(None),
            Err(e) if !is_skippable(&e) => Err(e),
            Err(e) => {
                tracing::warn!(place_id, error = %e, "Place Details failed, skipping");
                Ok(None)
            }
        }
    }

    async fn collect_details(
        &self,
        pacer: &mut CallPacer<'_>,
        place_ids: &[String],
        seen: &mut HashSet<String>,
        records: &mut Vec<PlaceRecord>,
    ) -> Result<()> {
        for place_id in place_ids {
            if !seen.insert(place_id.clone()) {
                continue;
            }
            if let Some(record) = self.fetch_details(pacer, place_id).await? {
                tracing::debug!(place_id, name = %record.name, "accepted place");
                records.push(record);
            }
        }
        Ok(())
    }

    /// Geocode the city for the nearby fallback. A non-transient failure
    /// skips the fallback instead of failing the search.
    async fn geocode(&self, pacer: &mut CallPacer<'_>, city: City) -> Result<Option<(f64, f64)>> {
        let params = [("address", format!("{}, {}", city.label(), self.country))];
        let outcome = async {
            let response: GeocodeResponse = self.get(pacer, "geocode/json", &params).await?;
            check_status(&response.status, response.error_message.as_deref())?;
            Ok::<_, SourceError>(response)
        }
        .await;

        let response = match outcome {
            Ok(response) => response,
            Err(e) if is_skippable(&e) => {
                tracing::warn!(city = %city, error = %e, "geocoding failed, skipping nearby search");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let location = response
            .results
            .into_iter()
            .next()
            .and_then(|r| r.geometry.location);
        if let Some(loc) = &location {
            tracing::info!(city = %city, lat = loc.lat, lng = loc.lng, "geocoded city");
        }
        Ok(location.map(|loc| (loc.lat, loc.lng)))
    }
}

#[async_trait]
impl SourceProvider for PlacesProvider {
    async fn search(&self, niche: Niche, city: City) -> Result<Vec<PlaceRecord>> {
        let mut pacer = CallPacer::new(&self.throttle);
        let mut seen = HashSet::new();
        let mut records = Vec::new();

        let query = format!("{} in {}, {}", niche.label(), city.label(), self.country);
        tracing::info!(%query, "text search");
        let text_ids = self
            .paged_search(&mut pacer, "place/textsearch/json", vec![("query", query)])
            .await?;
        tracing::info!(count = text_ids.len(), "text search returned place ids");

        self.collect_details(&mut pacer, &text_ids, &mut seen, &mut records)
            .await?;

        if records.len() < self.min_text_results && text_ids.len() < self.min_text_results {
            if let Some((lat, lng)) = self.geocode(&mut pacer, city).await? {
                tracing::info!(niche = %niche, city = %city, "nearby search fallback");
                let params = vec![
                    ("location", format!("{lat},{lng}")),
                    ("radius", self.nearby_radius_m.to_string()),
                    ("keyword", niche.label().to_string()),
                ];
                let nearby_ids = self
                    .paged_search(&mut pacer, "place/nearbysearch/json", params)
                    .await?;
                self.collect_details(&mut pacer, &nearby_ids, &mut seen, &mut records)
                    .await?;
            }
        }

        Ok(records)
    }

    fn source_id(&self) -> &str {
        PROVIDER
    }
}

/// Errors that only lose one optional call. Rate limits and server errors are
/// retried by the caller, and a rejected key fails every later call too.
fn is_skippable(error: &SourceError) -> bool {
    !error.is_transient() && !matches!(error, SourceError::AccessDenied { .. })
}

/// Map a Places `status` field to an error.
fn check_status(status: &str, error_message: Option<&str>) -> Result<()> {
    let message = error_message.unwrap_or(status).to_string();
    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        "OVER_QUERY_LIMIT" => Err(SourceError::RateLimited {
            provider: PROVIDER.to_string(),
            message,
        }),
        "REQUEST_DENIED" => Err(SourceError::AccessDenied {
            provider: PROVIDER.to_string(),
            message,
        }),
        "INVALID_REQUEST" => Err(SourceError::InvalidRequest {
            provider: PROVIDER.to_string(),
            message,
        }),
        // Server-side hiccup; Google documents a retry may succeed.
        "UNKNOWN_ERROR" => Err(SourceError::ApiError {
            provider: PROVIDER.to_string(),
            status: 500,
            message,
        }),
        other => Err(SourceError::ParseError {
            provider: PROVIDER.to_string(),
            message: format!("unexpected status {other}: {message}"),
        }),
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<SearchHit>,
    next_page_token: Option<String>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    place_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<PlaceDetails>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Default, Deserialize)]
struct Geometry {
    location: Option<LatLng>,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct PlaceDetails {
    place_id: Option<String>,
    name: Option<String>,
    formatted_address: Option<String>,
    #[serde(default)]
    geometry: Geometry,
    formatted_phone_number: Option<String>,
    international_phone_number: Option<String>,
    website: Option<String>,
    url: Option<String>,
    rating: Option<f64>,
    user_ratings_total: Option<u32>,
}

impl PlaceDetails {
    /// Keep only places with id, location, address and a usable website.
    fn into_record(self) -> Option<PlaceRecord> {
        let place_id = self.place_id.filter(|p| !p.is_empty())?;
        let location = self.geometry.location?;
        let formatted_address = self.formatted_address.filter(|a| !a.trim().is_empty())?;
        let website = self.website.filter(|w| normalize_website(w).is_some())?;

        Some(PlaceRecord {
            place_id,
            name: self.name.unwrap_or_default(),
            formatted_address,
            latitude: Some(location.lat),
            longitude: Some(location.lng),
            website: Some(website),
            phone: self
                .formatted_phone_number
                .or(self.international_phone_number),
            maps_url: self.url,
            rating: self.rating,
            ratings_count: self.user_ratings_total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_status() {
        assert!(check_status("OK", None).is_ok());
        assert!(check_status("ZERO_RESULTS", None).is_ok());

        let err = check_status("OVER_QUERY_LIMIT", Some("quota")).unwrap_err();
        assert!(err.is_transient());

        let err = check_status("REQUEST_DENIED", Some("bad key")).unwrap_err();
        assert!(matches!(err, SourceError::AccessDenied { .. }));
        assert!(!err.is_transient());

        let err = check_status("INVALID_REQUEST", None).unwrap_err();
        assert!(!err.is_transient());

        assert!(check_status("UNKNOWN_ERROR", None).unwrap_err().is_transient());
    }

    #[test]
    fn test_details_require_website_and_location() {
        let json = r#"{
            "place_id": "ChIJ1",
            "name": "Physio am Markt",
            "formatted_address": "Marktplatz 3, 72764 Reutlingen",
            "geometry": {"location": {"lat": 48.49, "lng": 9.21}},
            "international_phone_number": "+49 7121 0000",
            "website": "https://physio-am-markt.de/",
            "url": "https://maps.google.com/?cid=9",
            "user_ratings_total": 12
        }"#;
        let details: PlaceDetails = serde_json::from_str(json).expect("parse details");
        let record = details.into_record().expect("valid place");
        assert_eq!(record.place_id, "ChIJ1");
        assert_eq!(record.phone.as_deref(), Some("+49 7121 0000"));
        assert_eq!(record.ratings_count, Some(12));
        assert_eq!(record.rating, None);

        let no_site = r#"{
            "place_id": "ChIJ2",
            "formatted_address": "Somewhere",
            "geometry": {"location": {"lat": 1.0, "lng": 2.0}}
        }"#;
        let details: PlaceDetails = serde_json::from_str(no_site).expect("parse details");
        assert!(details.into_record().is_none());

        let no_location = r#"{
            "place_id": "ChIJ3",
            "formatted_address": "Somewhere",
            "website": "https://a.de"
        }"#;
        let details: PlaceDetails = serde_json::from_str(no_location).expect("parse details");
        assert!(details.into_record().is_none());
    }

    #[test]
    fn test_skippable_errors() {
        assert!(is_skippable(&check_status("INVALID_REQUEST", None).unwrap_err()));
        assert!(is_skippable(&check_status("NOT_FOUND", None).unwrap_err()));
        assert!(!is_skippable(&check_status("REQUEST_DENIED", None).unwrap_err()));
        assert!(!is_skippable(&check_status("OVER_QUERY_LIMIT", None).unwrap_err()));
    }

    #[test]
    fn test_new_requires_api_key() {
        let config = PlacesConfig::default();
        let result = PlacesProvider::new(&config, "Germany", Throttle::unlimited());
        assert!(matches!(result, Err(SourceError::AccessDenied { .. })));
    }
}
