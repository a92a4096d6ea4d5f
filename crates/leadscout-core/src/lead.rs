//! Lead records and their identity keys.

use crate::normalize::{normalize_website, website_domain};
use crate::types::{City, Niche};
use serde::{Deserialize, Serialize};

/// A business listing as returned by a source provider, before it is tied to
/// the niche and city it was collected for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    /// Source-native id: Google `place_id` or `osm:{type}:{id}`
    pub place_id: String,
    /// Business name
    pub name: String,
    /// Postal address as reported by the source
    pub formatted_address: String,
    /// Latitude in decimal degrees
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees
    pub longitude: Option<f64>,
    /// Website as reported by the source (not yet normalized)
    pub website: Option<String>,
    /// Phone number
    pub phone: Option<String>,
    /// Google Maps link or OpenStreetMap link
    pub maps_url: Option<String>,
    /// Average rating (Google only)
    pub rating: Option<f64>,
    /// Number of ratings (Google only)
    pub ratings_count: Option<u32>,
}

/// A discovered business tied to the niche and city it was collected for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    /// Niche this lead was collected for
    pub niche: Niche,
    /// City this lead was collected in
    pub city: City,
    /// Business name
    pub business_name: String,
    /// Postal address
    pub formatted_address: String,
    /// Latitude in decimal degrees
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees
    pub longitude: Option<f64>,
    /// Phone number
    pub phone: Option<String>,
    /// Google Maps link (or OpenStreetMap link for the free source)
    pub google_maps_url: Option<String>,
    /// Normalized website
    pub website_url: Option<String>,
    /// Average rating
    pub rating: Option<f64>,
    /// Number of ratings
    pub ratings_count: Option<u32>,
    /// Source-native id
    pub place_id: String,
    /// Emails found on the website, in order of first occurrence
    #[serde(default)]
    pub emails_found: Vec<String>,
    /// Page the emails were found on
    pub email_source_page: Option<String>,
}

impl Lead {
    /// Build a lead from a source record, normalizing the website.
    #[must_use]
    pub fn from_record(record: PlaceRecord, niche: Niche, city: City) -> Self {
        let website_url = record.website.as_deref().and_then(normalize_website);
        Self {
            niche,
            city,
            business_name: record.name,
            formatted_address: record.formatted_address,
            latitude: record.latitude,
            longitude: record.longitude,
            phone: record.phone.filter(|p| !p.trim().is_empty()),
            google_maps_url: record.maps_url,
            website_url,
            rating: record.rating,
            ratings_count: record.ratings_count,
            place_id: record.place_id,
            emails_found: Vec::new(),
            email_source_page: None,
        }
    }

    /// Identity key used for deduplication.
    #[must_use]
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::new(&self.place_id, self.website_url.as_deref())
    }
}

/// Deduplication key: source id plus website domain (empty when unknown).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    /// Exact, case-sensitive source id
    pub place_id: String,
    /// Lowercase domain without `www.`, or empty
    pub domain: String,
}

impl IdentityKey {
    /// Derive a key from a source id and an optional website.
    #[must_use]
    pub fn new(place_id: &str, website: Option<&str>) -> Self {
        Self {
            place_id: place_id.to_string(),
            domain: website.map(website_domain).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PlaceRecord {
        PlaceRecord {
            place_id: "ChIJ-abc".to_string(),
            name: "Zahnarztpraxis Dr. Weber".to_string(),
            formatted_address: "Münsterplatz 1, 89073 Ulm".to_string(),
            latitude: Some(48.398),
            longitude: Some(9.991),
            website: Some("http://www.Praxis-Weber.de/?utm=gmb".to_string()),
            phone: Some(String::new()),
            maps_url: Some("https://maps.google.com/?cid=1".to_string()),
            rating: Some(4.7),
            ratings_count: Some(88),
        }
    }

    #[test]
    fn test_from_record_normalizes() {
        let lead = Lead::from_record(record(), Niche::Dentists, City::Ulm);
        assert_eq!(lead.website_url.as_deref(), Some("http://www.praxis-weber.de"));
        assert_eq!(lead.phone, None, "blank phone is dropped");
        assert_eq!(lead.business_name, "Zahnarztpraxis Dr. Weber");
        assert!(lead.emails_found.is_empty());
    }

    #[test]
    fn test_identity_key() {
        let lead = Lead::from_record(record(), Niche::Dentists, City::Ulm);
        let key = lead.identity_key();
        assert_eq!(key.place_id, "ChIJ-abc");
        assert_eq!(key.domain, "praxis-weber.de");

        let no_site = IdentityKey::new("osm:node:1", None);
        assert_eq!(no_site.domain, "");
    }
}
