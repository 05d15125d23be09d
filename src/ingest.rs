use crate::config::EXPECTED_MIN_ROWS;
use crate::models::RawRecord;
use crate::pipeline::InvalidBatchSize;
use crate::store::{JsonlRawStore, RawSource};
use anyhow::{Context, Result};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing::{info, warn};

/// Row counts from one bronze ingestion pass.
#[derive(Debug)]
pub struct IngestReport {
    /// Rows read from the CSV.
    pub rows: u64,
    /// Records present in the raw store after the pass.
    pub stored: u64,
}

/// Loads a headered CSV into the raw store, untyped.
///
/// Cells are inferred per value (integer, then float, then string; empty
/// cells become null) so that downstream validation sees the same shapes it
/// would from any other raw producer. Each record is stamped with the
/// ingestion timestamp. The store is cleared first, and rows are appended in
/// batches to bound memory.
pub fn ingest_csv(csv_path: &str, store: &JsonlRawStore, batch_size: usize) -> Result<IngestReport> {
    if batch_size == 0 {
        return Err(InvalidBatchSize(0).into());
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open CSV: {csv_path}"))?;
    let headers = reader.headers()?.clone();

    store.clear().context("Failed to reset raw store")?;
    info!("Cleared existing raw store");

    let ingested_at = Utc::now().to_rfc3339();
    let pb = make_row_spinner();

    let mut batch: Vec<RawRecord> = Vec::with_capacity(batch_size);
    let mut rows = 0u64;

    for result in reader.records() {
        let row = result.context("Failed to read CSV row")?;

        let mut record = RawRecord::new();
        for (field, cell) in headers.iter().zip(row.iter()) {
            record.insert(field.to_string(), infer_value(cell));
        }
        record.insert(
            "ingested_at".to_string(),
            Value::String(ingested_at.clone()),
        );

        batch.push(record);
        rows += 1;

        if batch.len() >= batch_size {
            store
                .append_many(&batch)
                .context("Failed to append batch to raw store")?;
            batch.clear();
            pb.set_position(rows);
        }
    }

    if !batch.is_empty() {
        store
            .append_many(&batch)
            .context("Failed to append batch to raw store")?;
        pb.set_position(rows);
    }
    pb.finish_and_clear();

    if rows < EXPECTED_MIN_ROWS {
        warn!(
            rows,
            expected = EXPECTED_MIN_ROWS,
            "Raw volume below expected minimum"
        );
    }

    let stored = store.count()?;
    info!(rows, stored, "Ingestion complete");

    Ok(IngestReport { rows, stored })
}

/// Narrowest type that parses: i64, then f64, then string. Empty is null.
fn infer_value(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
            return Value::from(f);
        }
    }
    Value::String(cell.to_string())
}

fn make_row_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("    {spinner:.cyan} Ingesting: {pos} rows")
            .unwrap(),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
