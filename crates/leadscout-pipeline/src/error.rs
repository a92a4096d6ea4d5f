//! Error types for the collection pipeline.

use leadscout_core::{City, Niche};
use leadscout_sources::SourceError;
use thiserror::Error;

/// Errors that abort a collection run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A source failed in a way retrying cannot fix
    #[error("source {source_id} failed for {niche} in {city}: {source}")]
    Source {
        /// Niche being searched
        niche: Niche,
        /// City being searched
        city: City,
        /// Provider that failed
        source_id: String,
        /// Underlying error
        #[source]
        source: SourceError,
    },

    /// Run configuration is inconsistent
    #[error("invalid run configuration: {0}")]
    InvalidConfig(String),

    /// Dataset read/write error
    #[error("dataset error: {0}")]
    Csv(#[from] csv::Error),

    /// Checkpoint serialization error
    #[error("checkpoint serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_names_pair() {
        let err = PipelineError::Source {
            niche: Niche::Dentists,
            city: City::Ulm,
            source_id: "google".to_string(),
            source: SourceError::AccessDenied {
                provider: "google".to_string(),
                message: "The provided API key is invalid.".to_string(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("Dentists in Ulm"));
        assert!(msg.contains("google"));
        assert!(msg.contains("API key is invalid"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: PipelineError = io_err.into();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}
