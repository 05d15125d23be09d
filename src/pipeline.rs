use crate::batch::Batches;
use crate::config::DEFAULT_BATCH_SIZE;
use crate::models::{CanonicalTrack, RawRecord};
use crate::stats::RunStats;
use crate::store::{CleanSink, ProgressObserver, RawSource};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rustc_hash::FxHashSet;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Rejected at entry, before any source interaction.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("batch size must be at least 1 (got {0})")]
pub struct InvalidBatchSize(pub usize);

/// Explicit configuration for one cleaning run, passed in by the caller.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Records per batch; bounds peak memory.
    pub batch_size: usize,
    /// When true, the dedupe seen-set persists across batches for the whole
    /// run, catching cross-batch duplicates at the cost of O(run) memory.
    /// The default scope is a single batch.
    pub global_dedup: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            global_dedup: false,
        }
    }
}

/// Runs the silver-layer cleaning pass: reset the sink, then stream the raw
/// source in batches through dedupe, default-fill, and schema validation,
/// bulk-appending survivors.
///
/// A single record's rejection never aborts the run; it is counted and
/// skipped. An empty source is a successful zero-batch run. A sink failure
/// is fatal and propagated without retry; rerunning the whole pipeline is
/// safe because the reset step is idempotent. The source cursor lives for
/// the duration of this call and is released on every exit path.
pub fn run_cleaning(
    source: &dyn RawSource,
    sink: &mut dyn CleanSink,
    observer: &mut dyn ProgressObserver,
    config: &PipelineConfig,
) -> Result<RunStats> {
    if config.batch_size == 0 {
        return Err(InvalidBatchSize(0).into());
    }

    sink.clear().context("Failed to reset clean store")?;
    info!("Cleared existing clean store");

    // Point-in-time estimate, used for progress rendering only.
    let total = source.count().context("Failed to count raw store")?;
    info!(total, "Found raw records to process");

    let cursor = source.iter().context("Failed to open raw store cursor")?;

    let mut stats = RunStats::new();
    let mut run_seen: FxHashSet<String> = FxHashSet::default();

    for batch in Batches::new(cursor, config.batch_size) {
        let batch_size = batch.len() as u64;

        // Records that cannot even be decoded are rejected like any other
        // bad record: logged, counted via the processed/valid gap, skipped.
        let mut records: Vec<RawRecord> = Vec::with_capacity(batch.len());
        for item in batch {
            match item {
                Ok(record) => records.push(record),
                Err(e) => warn!(error = %e, "Skipping unreadable raw record"),
            }
        }

        let mut batch_seen = FxHashSet::default();
        let seen = if config.global_dedup {
            &mut run_seen
        } else {
            &mut batch_seen
        };
        let mut records = dedupe_first_wins(records, seen);

        fill_default_popularity(&mut records);

        let mut accepted = Vec::with_capacity(records.len());
        for record in &records {
            match CanonicalTrack::validate(record) {
                Ok(track) => accepted.push(track),
                Err(e) => debug!(error = %e, "Rejected record"),
            }
        }

        // Skip the bulk write when nothing survived; a fully rejected batch
        // is a no-op, not an error.
        if !accepted.is_empty() {
            sink.append_many(&accepted)
                .context("Failed to persist batch to clean store")?;
        }

        stats.record_batch(batch_size, accepted.len() as u64);
        observer.batch_complete(stats.processed(), total, stats.valid());
        debug!(
            processed = stats.processed(),
            valid = stats.valid(),
            percent = stats.percent_of(total),
            "Batch complete"
        );
    }

    info!(
        processed = stats.processed(),
        valid = stats.valid(),
        rejected = stats.rejected(),
        "Cleaning pass finished"
    );
    Ok(stats)
}

/// Drops records whose `track_id` was already seen, first occurrence wins.
/// Records without a usable `track_id` pass through untouched; the validator
/// rejects them individually.
fn dedupe_first_wins(records: Vec<RawRecord>, seen: &mut FxHashSet<String>) -> Vec<RawRecord> {
    records
        .into_iter()
        .filter(|record| match record.get("track_id").and_then(Value::as_str) {
            Some(id) => seen.insert(id.to_string()),
            None => true,
        })
        .collect()
}

/// Any record missing `popularity` (or carrying an explicit null) gets 0.
fn fill_default_popularity(records: &mut [RawRecord]) {
    for record in records.iter_mut() {
        if matches!(record.get("popularity"), None | Some(Value::Null)) {
            record.insert("popularity".to_string(), Value::from(0));
        }
    }
}

/// Renders the per-batch progress tuple on an indicatif bar.
pub struct ProgressBarObserver {
    bar: ProgressBar,
}

impl ProgressBarObserver {
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "    {spinner:.cyan} Cleaning [{bar:30.cyan/blue}] {pos}/{len} records | {msg}",
                )
                .unwrap()
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressObserver for ProgressBarObserver {
    fn batch_complete(&mut self, processed: u64, total: u64, valid: u64) {
        // The total is a stale estimate; the live stream may outrun it.
        self.bar.set_length(total.max(processed));
        self.bar.set_position(processed);
        self.bar.set_message(format!("valid: {valid}"));
    }
}
