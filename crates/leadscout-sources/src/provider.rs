//! Core source provider trait.

use crate::error::Result;
use async_trait::async_trait;
use leadscout_core::{City, Niche, PlaceRecord};

/// Trait for geographic business-listing sources.
///
/// A provider searches one niche within one city and returns normalized
/// records that carry a website. Implementations should be thread-safe
/// (Send + Sync) so the orchestrator can hold them behind an `Arc`.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Search businesses of `niche` in `city`.
    ///
    /// Records are unique by `place_id` within one call. Cross-call
    /// deduplication is the caller's job.
    ///
    /// # Errors
    /// Returns error if the source fails; [`crate::SourceError::is_transient`]
    /// tells the caller whether a retry may help.
    async fn search(&self, niche: Niche, city: City) -> Result<Vec<PlaceRecord>>;

    /// Get the unique identifier for this provider.
    fn source_id(&self) -> &str;
}
