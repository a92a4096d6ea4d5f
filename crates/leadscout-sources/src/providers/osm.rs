//! OpenStreetMap provider (Nominatim + Overpass). No key, no billing.

use super::common::{build_http_client, read_json, CallPacer};
use crate::error::Result;
use crate::provider::SourceProvider;
use async_trait::async_trait;
use leadscout_core::{normalize_website, City, Niche, OsmConfig, PlaceRecord, Throttle};
use reqwest::Client;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

const PROVIDER: &str = "osm";

/// Half-width in degrees of the box used when Nominatim returns only a point.
const FALLBACK_BOX_DELTA: f64 = 0.05;

/// Bounding box as `(south, west, north, east)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Southern latitude
    pub south: f64,
    /// Western longitude
    pub west: f64,
    /// Northern latitude
    pub north: f64,
    /// Eastern longitude
    pub east: f64,
}

impl BoundingBox {
    fn around(lat: f64, lon: f64) -> Self {
        Self {
            south: lat - FALLBACK_BOX_DELTA,
            west: lon - FALLBACK_BOX_DELTA,
            north: lat + FALLBACK_BOX_DELTA,
            east: lon + FALLBACK_BOX_DELTA,
        }
    }
}

/// OpenStreetMap provider.
pub struct OsmProvider {
    client: Client,
    nominatim_url: String,
    overpass_url: String,
    country: String,
    throttle: Throttle,
    bbox_cache: Mutex<HashMap<City, BoundingBox>>,
}

impl OsmProvider {
    /// Create a provider from configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: &OsmConfig, country: &str, throttle: Throttle) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config.timeout_secs, &config.user_agent)?,
            nominatim_url: config.nominatim_url.trim_end_matches('/').to_string(),
            overpass_url: config.overpass_url.clone(),
            country: country.to_string(),
            throttle,
            bbox_cache: Mutex::new(HashMap::new()),
        })
    }

    /// Resolve the city's bounding box, consulting the cache first.
    async fn city_bbox(&self, pacer: &mut CallPacer<'_>, city: City) -> Result<Option<BoundingBox>> {
        if let Some(bbox) = self.bbox_cache.lock().await.get(&city) {
            return Ok(Some(*bbox));
        }

        pacer.ready().await;
        let query = format!("{}, {}", city.label(), self.country);
        let response = self
            .client
            .get(format!("{}/search", self.nominatim_url))
            .query(&[("q", query.as_str()), ("format", "json"), ("limit", "1")])
            .send()
            .await?;
        let hits: Vec<NominatimHit> = read_json(PROVIDER, response).await?;

        let Some(bbox) = hits.into_iter().next().and_then(NominatimHit::bbox) else {
            tracing::warn!(city = %city, "Nominatim returned no usable location");
            return Ok(None);
        };

        tracing::debug!(city = %city, ?bbox, "resolved city bounding box");
        self.bbox_cache.lock().await.insert(city, bbox);
        Ok(Some(bbox))
    }

    async fn overpass(
        &self,
        pacer: &mut CallPacer<'_>,
        bbox: BoundingBox,
        tag: (&str, &str),
    ) -> Result<Vec<PlaceRecord>> {
        pacer.ready().await;
        let response = self
            .client
            .post(&self.overpass_url)
            .form(&[("data", overpass_query(bbox, tag))])
            .send()
            .await?;
        let body: OverpassResponse = read_json(PROVIDER, response).await?;

        Ok(body
            .elements
            .into_iter()
            .filter_map(OverpassElement::into_record)
            .collect())
    }
}

#[async_trait]
impl SourceProvider for OsmProvider {
    async fn search(&self, niche: Niche, city: City) -> Result<Vec<PlaceRecord>> {
        let mut pacer = CallPacer::new(&self.throttle);

        let Some(bbox) = self.city_bbox(&mut pacer, city).await? else {
            return Ok(Vec::new());
        };

        let mut seen = HashSet::new();
        let mut records = Vec::new();
        for &tag in niche.osm_tags() {
            let found = self.overpass(&mut pacer, bbox, tag).await?;
            tracing::debug!(tag = %format!("{}={}", tag.0, tag.1), count = found.len(), "overpass results");
            for record in found {
                if seen.insert(record.place_id.clone()) {
                    records.push(record);
                }
            }
        }

        tracing::info!(niche = %niche, city = %city, count = records.len(), "OSM places with website");
        Ok(records)
    }

    fn source_id(&self) -> &str {
        PROVIDER
    }
}

/// Overpass QL for nodes and ways carrying `key=value` inside `bbox`.
fn overpass_query(bbox: BoundingBox, (key, value): (&str, &str)) -> String {
    let area = format!("{},{},{},{}", bbox.south, bbox.west, bbox.north, bbox.east);
    format!(
        "[out:json][timeout:25];\n(\n  node[\"{key}\"=\"{value}\"]({area});\n  way[\"{key}\"=\"{value}\"]({area});\n);\nout center body;\n"
    )
}

#[derive(Debug, Deserialize)]
struct NominatimHit {
    lat: Option<String>,
    lon: Option<String>,
    /// `[south, north, west, east]` as strings
    #[serde(default)]
    boundingbox: Vec<String>,
}

impl NominatimHit {
    fn bbox(self) -> Option<BoundingBox> {
        let parsed: Vec<f64> = self
            .boundingbox
            .iter()
            .filter_map(|v| v.parse().ok())
            .collect();
        if let &[south, north, west, east] = &parsed[..] {
            return Some(BoundingBox {
                south,
                west,
                north,
                east,
            });
        }

        let lat = self.lat?.parse().ok()?;
        let lon = self.lon?.parse().ok()?;
        Some(BoundingBox::around(lat, lon))
    }
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: u64,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<Center>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct Center {
    lat: f64,
    lon: f64,
}

impl OverpassElement {
    fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Convert to a record; needs a name, coordinates and a website.
    fn into_record(self) -> Option<PlaceRecord> {
        let name = self.tag("name").or_else(|| self.tag("brand"))?.to_string();

        let (lat, lon) = match (self.lat, self.lon, &self.center) {
            (Some(lat), Some(lon), _) => (lat, lon),
            (_, _, Some(center)) => (center.lat, center.lon),
            _ => return None,
        };

        let website = self
            .tag("website")
            .or_else(|| self.tag("contact:website"))
            .filter(|w| normalize_website(w).is_some())?
            .to_string();

        let address = ["addr:street", "addr:housenumber", "addr:postcode", "addr:city"]
            .iter()
            .filter_map(|k| self.tag(k))
            .collect::<Vec<_>>()
            .join(" ");
        let formatted_address = if address.is_empty() {
            format!("{lat:.4}, {lon:.4}")
        } else {
            address
        };

        let phone = self
            .tag("phone")
            .or_else(|| self.tag("contact:phone"))
            .map(ToString::to_string);

        Some(PlaceRecord {
            place_id: format!("osm:{}:{}", self.kind, self.id),
            name,
            formatted_address,
            latitude: Some(lat),
            longitude: Some(lon),
            website: Some(website),
            phone,
            maps_url: Some(format!(
                "https://www.openstreetmap.org/{}/{}",
                self.kind, self.id
            )),
            rating: None,
            ratings_count: None,
        })
    }
}
