//! Run-wide duplicate detection.
//!
//! A lead is a duplicate if its source id was seen before, or if its website
//! domain is non-empty and was seen before. Leads without a domain only
//! collide on id. Sets are sorted so checkpoints serialize deterministically.

use leadscout_core::IdentityKey;
use std::collections::BTreeSet;

/// Seen-key sets for one collection run. Nothing is ever evicted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deduplicator {
    ids: BTreeSet<String>,
    domains: BTreeSet<String>,
}

impl Deduplicator {
    /// Empty deduplicator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from checkpointed sets. Empty domains are dropped.
    #[must_use]
    pub fn from_sets(ids: BTreeSet<String>, mut domains: BTreeSet<String>) -> Self {
        domains.remove("");
        Self { ids, domains }
    }

    /// Whether `key` collides with anything marked so far.
    #[must_use]
    pub fn seen(&self, key: &IdentityKey) -> bool {
        self.ids.contains(&key.place_id)
            || (!key.domain.is_empty() && self.domains.contains(&key.domain))
    }

    /// Record `key`. Marking twice is a no-op.
    pub fn mark(&mut self, key: IdentityKey) {
        self.ids.insert(key.place_id);
        if !key.domain.is_empty() {
            self.domains.insert(key.domain);
        }
    }

    /// Seen source ids.
    #[must_use]
    pub fn ids(&self) -> &BTreeSet<String> {
        &self.ids
    }

    /// Seen domains.
    #[must_use]
    pub fn domains(&self) -> &BTreeSet<String> {
        &self.domains
    }
}
