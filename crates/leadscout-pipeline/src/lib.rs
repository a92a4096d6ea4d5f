//! LeadScout Pipeline - resumable lead collection runs.
//!
//! This crate ties a [`SourceProvider`](leadscout_sources::SourceProvider)
//! and an optional [`EmailExtractor`](leadscout_email::EmailExtractor) into a
//! sequential, budgeted, checkpointed collection run.
//!
//! # Modules
//!
//! - [`orchestrator`] - `RunConfig` and the `Orchestrator` state machine
//! - [`dedup`] - Run-wide identity-key deduplication
//! - [`checkpoint`] - Durable progress, written atomically
//! - [`dataset`] - CSV dataset writer and contactable export
//! - [`summary`] - Run outcome reporting
//! - [`error`] - Pipeline error types
//!
//! # Durability
//!
//! Leads are appended to the dataset and synced before the checkpoint that
//! counts them is saved. On resume the dataset is trimmed back to the
//! checkpointed row count, so an interrupted run never leaves rows whose
//! identity keys the checkpoint does not know.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod atomic;
pub mod checkpoint;
pub mod dataset;
pub mod dedup;
pub mod error;
pub mod orchestrator;
pub mod summary;

// Re-export commonly used types
pub use checkpoint::{Checkpoint, CheckpointStore, CHECKPOINT_VERSION};
pub use dataset::{export_contactable, DatasetWriter};
pub use dedup::Deduplicator;
pub use error::{PipelineError, Result};
pub use orchestrator::{Orchestrator, RunConfig};
pub use summary::{PairOutcome, RunSummary, StopReason};
