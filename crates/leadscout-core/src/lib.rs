//! LeadScout Core - Foundation crate for the LeadScout lead collector.
//!
//! This crate provides the shared vocabulary every other LeadScout crate
//! depends on: the closed niche and city enumerations, the lead record and its
//! identity key, website normalization, TOML configuration, and the two
//! outbound delay policies (fixed throttle and exponential backoff).
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with environment overrides
//! - [`types`] - Closed enumerations (`Niche`, `City`) and `PairKey`
//! - [`lead`] - `PlaceRecord`, `Lead` and `IdentityKey`
//! - [`normalize`] - Website URL normalization and dedup domains
//! - [`throttle`] - Earliest-next-call throttle per outbound channel
//! - [`backoff`] - Exponential backoff policy for transient failures
//!
//! # Example
//!
//! ```rust
//! use leadscout_core::{normalize_website, website_domain, Niche};
//!
//! let site = normalize_website("www.Zahnarzt-Ulm.de/?utm_source=maps").unwrap();
//! assert_eq!(site, "https://www.zahnarzt-ulm.de");
//! assert_eq!(website_domain(&site), "zahnarzt-ulm.de");
//! assert_eq!(Niche::Dentists.label(), "Dentists");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod backoff;
pub mod config;
pub mod error;
pub mod lead;
pub mod normalize;
pub mod throttle;
pub mod types;

// Re-export commonly used types
pub use backoff::BackoffPolicy;
pub use config::{
    AppConfig, BackoffConfig, CollectionConfig, EmailConfig, OsmConfig, PlacesConfig,
    SourceConfig, SourceKind,
};
pub use error::{ConfigError, ConfigResult, LeadError, Result};
pub use lead::{IdentityKey, Lead, PlaceRecord};
pub use normalize::{normalize_website, website_domain};
pub use throttle::Throttle;
pub use types::{City, Niche, PairKey};
