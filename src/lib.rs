//! Orpheus: a bronze/silver batch ETL pipeline for music-track metadata
//!
//! This crate ingests a CSV of track metadata into a raw store and streams it
//! through a schema-validation gate into a canonical record store:
//!
//! 1. **Ingest (bronze)** -- Load the source CSV into a raw store untyped,
//!    one record per row, with per-cell type inference
//! 2. **Clean (silver)** -- Stream the raw store in fixed-size batches through
//!    dedupe, default-fill, and schema validation; persist survivors and
//!    report processed/valid/rejected counts
//! 3. **Diagnose** -- Cross-check the source CSV, raw store, and clean store
//!    against the canonical schema
//!
//! # Architecture
//!
//! The cleaning pass is designed for bounded memory on unbounded input:
//!
//! - **Streaming cursor** -- The raw store is never loaded whole; records flow
//!   through a lazy batching iterator, peak memory O(batch)
//! - **Atomic validation** -- A record is wholly accepted or wholly rejected;
//!   a rejection is counted and skipped, never fatal
//! - **Idempotent reset** -- The clean store is cleared at the start of every
//!   run, so rerunning after a failure is always safe
//! - **Explicit collaborators** -- The pipeline takes its source, sink, and
//!   progress observer as trait objects; storage is swappable
//!
//! # Key Modules
//!
//! - [`schema`] -- Canonical track schema: per-field validation and
//!   normalization rules
//! - [`batch`] -- Lazy fixed-size batching iterator
//! - [`pipeline`] -- The cleaning controller (reset, stream, dedupe, fill,
//!   validate, persist, report)
//! - [`stats`] -- Run counters and progress snapshots
//! - [`store`] -- Source/sink traits, JSONL-backed stores, in-memory doubles
//! - [`ingest`] -- Bronze-layer CSV ingestion
//! - [`diagnose`] -- Environment and data-shape diagnostics
//! - [`models`] -- Core data types (RawRecord, CanonicalTrack)
//! - [`config`] -- Constants for batching and validation bounds
//!
//! # Example Usage
//!
//! ```bash
//! # Load the source CSV into the raw store
//! orpheus ingest -i data/tracks.csv --raw-store data/raw.jsonl
//!
//! # Run the cleaning pass with the default 5000-record batches
//! orpheus clean --raw-store data/raw.jsonl --clean-store data/clean.jsonl
//!
//! # Check the environment end to end
//! orpheus diagnose -i data/tracks.csv
//! ```

pub mod batch;
pub mod config;
pub mod diagnose;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod schema;
pub mod stats;
pub mod store;
