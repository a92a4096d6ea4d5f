//! Durable run progress.
//!
//! The checkpoint records which (niche, city) pairs are finished, how many
//! rows the dataset holds and every identity key seen so far. It is always
//! written after the dataset rows it describes, so it never claims data that
//! is not on disk.

use crate::atomic::write_atomically;
use crate::error::Result;
use chrono::{DateTime, Utc};
use leadscout_core::PairKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Current on-disk schema version.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Persisted pipeline progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Schema version
    pub version: u32,
    /// Dataset this checkpoint belongs to
    pub output_path: PathBuf,
    /// Pairs whose results are fully collected
    pub completed_pairs: BTreeSet<PairKey>,
    /// Rows in the dataset
    pub total_leads: usize,
    /// Source ids seen so far
    pub seen_place_ids: BTreeSet<String>,
    /// Website domains seen so far
    pub seen_domains: BTreeSet<String>,
    /// When this checkpoint was written
    pub saved_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Empty checkpoint for `output_path`.
    #[must_use]
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            output_path: output_path.into(),
            completed_pairs: BTreeSet::new(),
            total_leads: 0,
            seen_place_ids: BTreeSet::new(),
            seen_domains: BTreeSet::new(),
            saved_at: Utc::now(),
        }
    }
}

/// Reads and writes the checkpoint file.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    /// Store backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Checkpoint file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the checkpoint. Missing, unreadable, corrupt or foreign-version
    /// files all yield `None`.
    #[must_use]
    pub fn load(&self) -> Option<Checkpoint> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no checkpoint found");
            return None;
        }

        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "cannot read checkpoint, starting fresh");
                return None;
            }
        };

        match serde_json::from_str::<Checkpoint>(&contents) {
            Ok(cp) if cp.version == CHECKPOINT_VERSION => {
                tracing::info!(
                    leads = cp.total_leads,
                    place_ids = cp.seen_place_ids.len(),
                    domains = cp.seen_domains.len(),
                    completed_pairs = cp.completed_pairs.len(),
                    "loaded checkpoint"
                );
                Some(cp)
            }
            Ok(cp) => {
                tracing::warn!(version = cp.version, expected = CHECKPOINT_VERSION, "unsupported checkpoint version, starting fresh");
                None
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "corrupt checkpoint, starting fresh");
                None
            }
        }
    }

    /// Atomically replace the checkpoint file.
    pub fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let json = serde_json::to_string_pretty(checkpoint)?;
        write_atomically(&self.path, |mut file| {
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            Ok(())
        })?;
        tracing::debug!(leads = checkpoint.total_leads, "checkpoint saved");
        Ok(())
    }

    /// Delete the checkpoint file if present.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "checkpoint cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadscout_core::{City, Niche};
    use tempfile::TempDir;

    fn sample() -> Checkpoint {
        let mut cp = Checkpoint::new("outputs/leads.csv");
        cp.completed_pairs.insert(PairKey::new(Niche::Dentists, City::Ulm));
        cp.completed_pairs.insert(PairKey::new(Niche::PhysicalTherapists, City::Tuebingen));
        cp.total_leads = 2;
        cp.seen_place_ids.insert("ChIJ-b".to_string());
        cp.seen_place_ids.insert("ChIJ-a".to_string());
        cp.seen_domains.insert("praxis.de".to_string());
        cp
    }

    #[test]
    fn test_save_load_roundtrip() {
        let tmp = TempDir::new().expect("create temp dir");
        let store = CheckpointStore::new(tmp.path().join("checkpoint.json"));

        let cp = sample();
        store.save(&cp).expect("save checkpoint");
        let loaded = store.load().expect("checkpoint present");
        assert_eq!(loaded, cp);
    }

    #[test]
    fn test_json_is_sorted() {
        let tmp = TempDir::new().expect("create temp dir");
        let store = CheckpointStore::new(tmp.path().join("checkpoint.json"));
        store.save(&sample()).expect("save checkpoint");

        let raw = fs::read_to_string(store.path()).expect("read checkpoint");
        let a = raw.find("ChIJ-a").expect("id a present");
        let b = raw.find("ChIJ-b").expect("id b present");
        assert!(a < b);
        let physio = raw.find("Physical therapists").expect("physio present");
        let dentists = raw.find("\"Dentists\"").expect("dentists present");
        assert!(physio < dentists, "pairs sorted in walk order");
    }

    #[test]
    fn test_missing_and_corrupt_yield_none() {
        let tmp = TempDir::new().expect("create temp dir");
        let store = CheckpointStore::new(tmp.path().join("checkpoint.json"));
        assert!(store.load().is_none());

        fs::write(store.path(), "{ not json").expect("write garbage");
        assert!(store.load().is_none());
    }

    #[test]
    fn test_foreign_version_yields_none() {
        let tmp = TempDir::new().expect("create temp dir");
        let store = CheckpointStore::new(tmp.path().join("checkpoint.json"));
        let mut cp = sample();
        cp.version = CHECKPOINT_VERSION + 1;
        store.save(&cp).expect("save checkpoint");
        assert!(store.load().is_none());
    }

    #[test]
    fn test_clear() {
        let tmp = TempDir::new().expect("create temp dir");
        let store = CheckpointStore::new(tmp.path().join("checkpoint.json"));
        store.clear().expect("clearing a missing file is fine");

        store.save(&sample()).expect("save checkpoint");
        store.clear().expect("clear checkpoint");
        assert!(!store.path().exists());
    }
}
