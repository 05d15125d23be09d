use crate::models::{CanonicalTrack, RawRecord};
use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// A streaming cursor over raw records. Errors are per-record so one corrupt
/// line does not end the stream.
pub type RawRecordIter<'a> = Box<dyn Iterator<Item = Result<RawRecord>> + 'a>;

/// Read-only view of the bronze layer.
///
/// `count` and `iter` carry no transactional guarantee relative to each
/// other; the count is used for progress rendering only.
pub trait RawSource {
    fn count(&self) -> Result<u64>;
    fn iter(&self) -> Result<RawRecordIter<'_>>;
}

/// Destination for validated tracks (the silver layer). `append_many` is one
/// bulk write per batch; a failure here is fatal to the run.
pub trait CleanSink {
    fn clear(&mut self) -> Result<()>;
    fn append_many(&mut self, tracks: &[CanonicalTrack]) -> Result<()>;
}

/// Receives a progress tuple after every batch. Infallible from the
/// pipeline's point of view: implementations swallow their own I/O failures.
pub trait ProgressObserver {
    fn batch_complete(&mut self, processed: u64, total: u64, valid: u64);
}

/// Observer that discards all updates.
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn batch_complete(&mut self, _processed: u64, _total: u64, _valid: u64) {}
}

/// Bronze store: newline-delimited JSON, one raw record per line.
pub struct JsonlRawStore {
    path: PathBuf,
}

impl JsonlRawStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncates the store (creating it if absent). Idempotent.
    pub fn clear(&self) -> Result<()> {
        File::create(&self.path)
            .with_context(|| format!("Failed to clear raw store: {}", self.path.display()))?;
        Ok(())
    }

    /// Appends one record per line as compact JSON.
    pub fn append_many(&self, records: &[RawRecord]) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open raw store: {}", self.path.display()))?;
        let mut writer = BufWriter::new(file);
        for record in records {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl RawSource for JsonlRawStore {
    fn count(&self) -> Result<u64> {
        let file = File::open(&self.path).with_context(|| {
            format!(
                "Raw store not found: {}. Run 'orpheus ingest' first.",
                self.path.display()
            )
        })?;
        let mut count = 0u64;
        for line in BufReader::new(file).lines() {
            if !line?.trim().is_empty() {
                count += 1;
            }
        }
        Ok(count)
    }

    fn iter(&self) -> Result<RawRecordIter<'_>> {
        let file = File::open(&self.path).with_context(|| {
            format!(
                "Raw store not found: {}. Run 'orpheus ingest' first.",
                self.path.display()
            )
        })?;
        let lines = BufReader::new(file).lines();
        Ok(Box::new(lines.filter_map(|line| match line {
            Ok(l) if l.trim().is_empty() => None,
            Ok(l) => Some(
                serde_json::from_str::<RawRecord>(&l).context("Malformed raw store line"),
            ),
            Err(e) => Some(Err(e).context("Failed to read raw store")),
        })))
    }
}

/// Silver store: newline-delimited JSON, one canonical track per line.
pub struct JsonlCleanStore {
    path: PathBuf,
}

impl JsonlCleanStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn count(&self) -> Result<u64> {
        if !self.path.exists() {
            return Ok(0);
        }
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open clean store: {}", self.path.display()))?;
        let mut count = 0u64;
        for line in BufReader::new(file).lines() {
            if !line?.trim().is_empty() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Reads the whole store back; used by diagnostics and tests.
    pub fn read_all(&self) -> Result<Vec<CanonicalTrack>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open clean store: {}", self.path.display()))?;
        let mut tracks = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            tracks.push(serde_json::from_str(&line).context("Malformed clean store line")?);
        }
        Ok(tracks)
    }
}

impl CleanSink for JsonlCleanStore {
    fn clear(&mut self) -> Result<()> {
        File::create(&self.path)
            .with_context(|| format!("Failed to clear clean store: {}", self.path.display()))?;
        Ok(())
    }

    fn append_many(&mut self, tracks: &[CanonicalTrack]) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open clean store: {}", self.path.display()))?;
        let mut writer = BufWriter::new(file);
        for track in tracks {
            serde_json::to_writer(&mut writer, track)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// In-memory source for tests and small one-off runs.
pub struct MemoryRawSource {
    records: Vec<RawRecord>,
}

impl MemoryRawSource {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }
}

impl RawSource for MemoryRawSource {
    fn count(&self) -> Result<u64> {
        Ok(self.records.len() as u64)
    }

    fn iter(&self) -> Result<RawRecordIter<'_>> {
        Ok(Box::new(self.records.iter().cloned().map(Ok)))
    }
}

/// In-memory sink for tests. Tracks the number of bulk writes so callers can
/// assert that all-rejected batches skip the write entirely.
#[derive(Default)]
pub struct MemoryCleanSink {
    pub records: Vec<CanonicalTrack>,
    pub appends: u64,
    pub clears: u64,
}

impl MemoryCleanSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CleanSink for MemoryCleanSink {
    fn clear(&mut self) -> Result<()> {
        self.records.clear();
        self.clears += 1;
        Ok(())
    }

    fn append_many(&mut self, tracks: &[CanonicalTrack]) -> Result<()> {
        self.records.extend_from_slice(tracks);
        self.appends += 1;
        Ok(())
    }
}
