//! The collection run.
//!
//! Pairs are walked strictly sequentially, niches outer and cities inner, in
//! declaration order. Each accepted lead goes through the deduplicator, the
//! optional email extractor and the pending batch. The batch is appended to
//! the dataset before the checkpoint that counts it is saved.

use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::dataset::DatasetWriter;
use crate::dedup::Deduplicator;
use crate::error::{PipelineError, Result};
use crate::summary::{PairOutcome, RunSummary, StopReason};
use chrono::Utc;
use leadscout_core::{AppConfig, BackoffPolicy, City, Lead, Niche, PairKey, PlaceRecord, Throttle};
use leadscout_email::EmailExtractor;
use leadscout_sources::{SourceError, SourceProvider};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Parameters of one collection run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Niches to collect
    pub niches: Vec<Niche>,
    /// Cities to collect
    pub cities: Vec<City>,
    /// Global lead budget, counting leads from resumed runs
    pub max_leads: usize,
    /// Visit websites looking for emails
    pub extract_emails: bool,
    /// Minimum delay between source calls
    pub sleep_api: Duration,
    /// Minimum delay between website fetches
    pub sleep_web: Duration,
    /// Continue from a matching checkpoint if one exists
    pub resume: bool,
    /// Delete the checkpoint before starting
    pub clear_checkpoint: bool,
    /// CSV dataset
    pub output_path: PathBuf,
    /// Checkpoint JSON
    pub checkpoint_path: PathBuf,
    /// Accepted leads between checkpoint saves
    pub checkpoint_interval: usize,
}

impl RunConfig {
    /// Run parameters from the `[collection]` config section. Resuming is on
    /// by default.
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        let c = &config.collection;
        Self {
            niches: c.niches.clone(),
            cities: c.cities.clone(),
            max_leads: c.max_leads,
            extract_emails: c.extract_emails,
            sleep_api: c.sleep_api(),
            sleep_web: c.sleep_web(),
            resume: true,
            clear_checkpoint: false,
            output_path: c.output_path.clone(),
            checkpoint_path: c.checkpoint_path.clone(),
            checkpoint_interval: c.checkpoint_interval,
        }
    }

    /// Selected pairs in walk order. Filter order and repeats are ignored.
    #[must_use]
    pub fn pairs(&self) -> Vec<PairKey> {
        Niche::ALL
            .into_iter()
            .filter(|n| self.niches.contains(n))
            .flat_map(|niche| {
                City::ALL
                    .into_iter()
                    .filter(|c| self.cities.contains(c))
                    .map(move |city| PairKey::new(niche, city))
            })
            .collect()
    }

    /// Throttle for the source API channel.
    #[must_use]
    pub fn api_throttle(&self) -> Throttle {
        Throttle::new(self.sleep_api)
    }

    /// Throttle for the website channel.
    #[must_use]
    pub fn web_throttle(&self) -> Throttle {
        Throttle::new(self.sleep_web)
    }
}

enum SearchOutcome {
    Found(Vec<PlaceRecord>),
    Exhausted(SourceError),
    Cancelled,
}

/// Mutable state of a run between persists.
struct RunState {
    store: CheckpointStore,
    checkpoint: Checkpoint,
    writer: DatasetWriter,
    dedup: Deduplicator,
    pending: Vec<Lead>,
    total: usize,
}

impl RunState {
    /// Append pending leads, then save the checkpoint describing them.
    fn persist(&mut self) -> Result<()> {
        self.writer.append(&self.pending)?;
        self.pending.clear();

        self.checkpoint.total_leads = self.writer.rows();
        self.checkpoint.seen_place_ids.clone_from(self.dedup.ids());
        self.checkpoint.seen_domains.clone_from(self.dedup.domains());
        self.checkpoint.saved_at = Utc::now();
        self.store.save(&self.checkpoint)
    }
}

/// Drives a source provider and an optional email extractor over the
/// selected (niche, city) pairs.
pub struct Orchestrator {
    provider: Arc<dyn SourceProvider>,
    extractor: Option<Arc<dyn EmailExtractor>>,
    backoff: BackoffPolicy,
    api_throttle: Option<Throttle>,
    cancel: CancellationToken,
}

impl Orchestrator {
    /// Orchestrator over `provider`, retrying transient failures per `backoff`.
    #[must_use]
    pub fn new(provider: Arc<dyn SourceProvider>, backoff: BackoffPolicy) -> Self {
        Self {
            provider,
            extractor: None,
            backoff,
            api_throttle: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Email extractor used when the run enables extraction.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn EmailExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Share an API throttle with the provider. Without one, the run builds
    /// its own from `sleep_api`.
    #[must_use]
    pub fn with_api_throttle(mut self, throttle: Throttle) -> Self {
        self.api_throttle = Some(throttle);
        self
    }

    /// Token that interrupts the run when cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Execute one collection run.
    ///
    /// Transient source failures are retried with backoff and then recorded
    /// as failed pairs; permanent ones abort the run after pending leads are
    /// saved. Output and checkpoint write failures abort immediately.
    #[allow(clippy::too_many_lines)]
    pub async fn run(&self, config: &RunConfig) -> Result<RunSummary> {
        if config.checkpoint_interval == 0 {
            return Err(PipelineError::InvalidConfig(
                "checkpoint interval must be at least 1".to_string(),
            ));
        }
        let extractor = match (&self.extractor, config.extract_emails) {
            (Some(e), true) => Some(Arc::clone(e)),
            (None, true) => {
                return Err(PipelineError::InvalidConfig(
                    "email extraction enabled but no extractor configured".to_string(),
                ))
            }
            (_, false) => None,
        };

        let started = Instant::now();
        let api = self
            .api_throttle
            .clone()
            .unwrap_or_else(|| config.api_throttle());
        let web = config.web_throttle();

        let (mut state, resumed) = Self::open(config)?;
        let initial_total = state.total;

        let mut summary = RunSummary {
            pairs: Vec::new(),
            new_leads: 0,
            total_leads: state.total,
            emails_found: 0,
            failed_pairs: Vec::new(),
            stop_reason: StopReason::Completed,
            elapsed: Duration::ZERO,
            resumed,
        };

        tracing::info!(
            source = self.provider.source_id(),
            pairs = config.pairs().len(),
            max_leads = config.max_leads,
            extract_emails = config.extract_emails,
            resumed,
            existing_leads = state.total,
            "starting collection run"
        );

        for pair in config.pairs() {
            if state.checkpoint.completed_pairs.contains(&pair) {
                tracing::debug!(%pair, "pair already complete, skipping");
                continue;
            }
            if self.cancel.is_cancelled() {
                summary.stop_reason = StopReason::Interrupted;
                break;
            }
            if state.total >= config.max_leads {
                summary.stop_reason = StopReason::BudgetReached;
                break;
            }

            tracing::info!(%pair, "searching");
            let records = match self.search_with_retry(pair, &api).await {
                Ok(SearchOutcome::Found(records)) => records,
                Ok(SearchOutcome::Exhausted(error)) => {
                    tracing::warn!(%pair, %error, "giving up on pair after retries");
                    summary.failed_pairs.push(pair);
                    continue;
                }
                Ok(SearchOutcome::Cancelled) => {
                    summary.stop_reason = StopReason::Interrupted;
                    break;
                }
                Err(source) => {
                    state.persist()?;
                    return Err(PipelineError::Source {
                        niche: pair.niche,
                        city: pair.city,
                        source_id: self.provider.source_id().to_string(),
                        source,
                    });
                }
            };

            let mut outcome = PairOutcome::new(pair, records.len());
            let mut pair_stop = None;

            for record in records {
                let mut lead = Lead::from_record(record, pair.niche, pair.city);
                let key = lead.identity_key();
                if state.dedup.seen(&key) {
                    tracing::trace!(place_id = %key.place_id, domain = %key.domain, "duplicate");
                    outcome.duplicates += 1;
                    continue;
                }
                if state.total >= config.max_leads {
                    pair_stop = Some(StopReason::BudgetReached);
                    break;
                }
                if self.cancel.is_cancelled() {
                    pair_stop = Some(StopReason::Interrupted);
                    break;
                }
                state.dedup.mark(key);

                if let (Some(extractor), Some(site)) = (&extractor, lead.website_url.clone()) {
                    tokio::select! {
                        () = self.cancel.cancelled() => {}
                        () = web.ready() => {
                            if let Some(findings) = extractor.extract(&site).await {
                                lead.emails_found = findings.emails;
                                lead.email_source_page = findings.source_page;
                            }
                        }
                    }
                }

                if !lead.emails_found.is_empty() {
                    outcome.emails_found += 1;
                }
                outcome.accepted += 1;
                state.pending.push(lead);
                state.total += 1;

                if state.pending.len() >= config.checkpoint_interval {
                    state.persist()?;
                }
            }

            outcome.complete = pair_stop.is_none();
            if outcome.complete {
                state.checkpoint.completed_pairs.insert(pair);
            }
            state.persist()?;

            tracing::info!(
                %pair,
                fetched = outcome.fetched,
                accepted = outcome.accepted,
                duplicates = outcome.duplicates,
                emails = outcome.emails_found,
                total = state.total,
                complete = outcome.complete,
                "pair done"
            );

            summary.emails_found += outcome.emails_found;
            summary.pairs.push(outcome);

            if let Some(reason) = pair_stop {
                summary.stop_reason = reason;
                break;
            }
        }

        state.persist()?;

        summary.total_leads = state.total;
        summary.new_leads = state.total - initial_total;
        summary.elapsed = started.elapsed();
        tracing::info!(
            stop = %summary.stop_reason,
            new_leads = summary.new_leads,
            total = summary.total_leads,
            failed_pairs = summary.failed_pairs.len(),
            "collection run finished"
        );
        Ok(summary)
    }

    /// Load or create the checkpoint and open the dataset to match it.
    fn open(config: &RunConfig) -> Result<(RunState, bool)> {
        let store = CheckpointStore::new(&config.checkpoint_path);
        if config.clear_checkpoint {
            store.clear()?;
        }

        let previous = if config.resume {
            store.load().filter(|cp| {
                if cp.output_path != config.output_path {
                    tracing::warn!(
                        checkpoint_output = %cp.output_path.display(),
                        output = %config.output_path.display(),
                        "checkpoint belongs to a different dataset, starting fresh"
                    );
                    false
                } else if !config.output_path.exists() {
                    tracing::warn!(output = %config.output_path.display(), "dataset missing, ignoring checkpoint");
                    false
                } else {
                    true
                }
            })
        } else {
            None
        };

        let resumed = previous.is_some();
        let state = match previous {
            Some(mut checkpoint) => {
                let writer = DatasetWriter::resume(
                    &config.output_path,
                    config.extract_emails,
                    checkpoint.total_leads,
                )?;
                if writer.rows() < checkpoint.total_leads {
                    tracing::warn!(
                        expected = checkpoint.total_leads,
                        found = writer.rows(),
                        "dataset holds fewer rows than the checkpoint claims"
                    );
                    checkpoint.total_leads = writer.rows();
                }
                let dedup = Deduplicator::from_sets(
                    checkpoint.seen_place_ids.clone(),
                    checkpoint.seen_domains.clone(),
                );
                RunState {
                    store,
                    total: checkpoint.total_leads,
                    checkpoint,
                    writer,
                    dedup,
                    pending: Vec::new(),
                }
            }
            None => {
                let writer = DatasetWriter::create(&config.output_path, config.extract_emails)?;
                let mut state = RunState {
                    store,
                    checkpoint: Checkpoint::new(&config.output_path),
                    writer,
                    dedup: Deduplicator::new(),
                    pending: Vec::new(),
                    total: 0,
                };
                state.persist()?;
                state
            }
        };

        Ok((state, resumed))
    }

    async fn search_with_retry(
        &self,
        pair: PairKey,
        api: &Throttle,
    ) -> std::result::Result<SearchOutcome, SourceError> {
        let mut retry = 0u32;
        loop {
            tokio::select! {
                () = self.cancel.cancelled() => return Ok(SearchOutcome::Cancelled),
                () = api.ready() => {}
            }

            match self.provider.search(pair.niche, pair.city).await {
                Ok(records) => return Ok(SearchOutcome::Found(records)),
                Err(error) if error.is_transient() => {
                    if retry >= self.backoff.max_retries {
                        return Ok(SearchOutcome::Exhausted(error));
                    }
                    let delay = self.backoff.delay_for(retry);
                    retry += 1;
                    tracing::warn!(
                        %pair,
                        %error,
                        retry,
                        max_retries = self.backoff.max_retries,
                        delay_ms = delay.as_millis(),
                        "transient source error, backing off"
                    );
                    tokio::select! {
                        () = self.cancel.cancelled() => return Ok(SearchOutcome::Cancelled),
                        () = tokio::time::sleep(delay) => {}
                    }
                }
                Err(error) => return Err(error),
            }
        }
    }
}
