//! LeadScout Sources - pluggable business-listing sources.
//!
//! This crate defines the [`SourceProvider`] trait and its two
//! implementations:
//!
//! - [`PlacesProvider`]: Google Places Web Service (API key, quota-limited)
//! - [`OsmProvider`]: OpenStreetMap via Nominatim and Overpass (free)
//!
//! Providers return normalized [`PlaceRecord`](leadscout_core::PlaceRecord)s
//! that carry a website. Errors are classified by
//! [`SourceError::is_transient`] so callers can decide between backing off
//! and aborting.
//!
//! # Example
//!
//! ```rust,no_run
//! use leadscout_core::{AppConfig, City, Niche, Throttle};
//! use leadscout_sources::build_provider;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load_with_env(None)?;
//! let api = Throttle::new(Duration::from_millis(config.collection.sleep_api_ms));
//! let provider = build_provider(&config, api)?;
//!
//! let records = provider.search(Niche::Dentists, City::Ulm).await?;
//! println!("{} dentists with a website", records.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod provider;
pub mod providers;

use leadscout_core::{AppConfig, SourceKind, Throttle};
use std::sync::Arc;

// Re-export commonly used types
pub use error::{Result, SourceError};
pub use provider::SourceProvider;
pub use providers::{BoundingBox, OsmProvider, PlacesProvider};

/// Build the provider selected by `config.source.kind`.
///
/// `api_throttle` is shared with the caller so provider-internal requests and
/// the caller's per-search wait draw from one schedule.
pub fn build_provider(config: &AppConfig, api_throttle: Throttle) -> Result<Arc<dyn SourceProvider>> {
    let country = config.source.country.as_str();
    let provider: Arc<dyn SourceProvider> = match config.source.kind {
        SourceKind::Google => Arc::new(PlacesProvider::new(&config.places, country, api_throttle)?),
        SourceKind::Osm => Arc::new(OsmProvider::new(&config.osm, country, api_throttle)?),
    };
    tracing::info!(source = provider.source_id(), "source provider ready");
    Ok(provider)
}
