//! Run outcome reporting.

use leadscout_core::PairKey;
use std::fmt;
use std::time::Duration;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every selected pair was processed
    Completed,
    /// The global lead budget was exhausted
    BudgetReached,
    /// Cancellation was requested
    Interrupted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Completed => "completed",
            Self::BudgetReached => "budget reached",
            Self::Interrupted => "interrupted",
        };
        f.write_str(s)
    }
}

/// Counts for one (niche, city) pair processed in this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairOutcome {
    /// Pair searched
    pub pair: PairKey,
    /// Records returned by the source
    pub fetched: usize,
    /// Records accepted as new leads
    pub accepted: usize,
    /// Records dropped as duplicates
    pub duplicates: usize,
    /// Accepted leads with at least one email
    pub emails_found: usize,
    /// Whether the pair was fully processed and marked complete
    pub complete: bool,
}

impl PairOutcome {
    pub(crate) fn new(pair: PairKey, fetched: usize) -> Self {
        Self {
            pair,
            fetched,
            accepted: 0,
            duplicates: 0,
            emails_found: 0,
            complete: false,
        }
    }
}

/// Result of [`Orchestrator::run`](crate::Orchestrator::run).
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Pairs searched in this run, in walk order
    pub pairs: Vec<PairOutcome>,
    /// Leads written by this run
    pub new_leads: usize,
    /// Leads in the dataset, including earlier runs
    pub total_leads: usize,
    /// Leads written by this run that carry at least one email
    pub emails_found: usize,
    /// Pairs abandoned after exhausting retries
    pub failed_pairs: Vec<PairKey>,
    /// Why the run stopped
    pub stop_reason: StopReason,
    /// Wall time spent in the run
    pub elapsed: Duration,
    /// Whether the run continued from a checkpoint
    pub resumed: bool,
}

impl RunSummary {
    /// Pairs that finished in this run.
    #[must_use]
    pub fn completed_pairs(&self) -> usize {
        self.pairs.iter().filter(|p| p.complete).count()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} new leads ({} with email), {} total, {} pairs completed, {} failed, {:.1}s",
            self.stop_reason,
            self.new_leads,
            self.emails_found,
            self.total_leads,
            self.completed_pairs(),
            self.failed_pairs.len(),
            self.elapsed.as_secs_f64()
        )
    }
}
