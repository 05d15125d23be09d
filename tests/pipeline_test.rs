//! End-to-end tests for the cleaning pipeline.
//!
//! These exercise the complete silver-layer flow (reset, stream, dedupe,
//! default-fill, validate, persist, report) against both the in-memory test
//! doubles and the JSONL file stores, plus the bronze-to-silver path that
//! starts from a real CSV file. Each test uses its own TempDir to avoid
//! cross-test pollution.

use orpheus::ingest::ingest_csv;
use orpheus::models::RawRecord;
use orpheus::pipeline::{run_cleaning, PipelineConfig};
use orpheus::store::{
    JsonlCleanStore, JsonlRawStore, MemoryCleanSink, MemoryRawSource, NullObserver,
    ProgressObserver, RawSource,
};
use serde_json::json;
use std::io::Write;
use tempfile::TempDir;

/// A fully valid raw record with the given track id.
fn raw_track(id: &str) -> RawRecord {
    json!({
        "track_id": id,
        "artist_name": "Artist",
        "track_name": "Song",
        "year": 2005,
        "genre": "indie",
        "danceability": 0.6,
        "energy": 0.7,
        "loudness": -8.0,
        "valence": 0.5,
        "tempo": 128.0,
        "duration_ms": 240_000,
        "popularity": 33
    })
    .as_object()
    .unwrap()
    .clone()
}

/// Captures every progress tuple the pipeline emits.
struct CaptureObserver(Vec<(u64, u64, u64)>);

impl ProgressObserver for CaptureObserver {
    fn batch_complete(&mut self, processed: u64, total: u64, valid: u64) {
        self.0.push((processed, total, valid));
    }
}

#[test]
fn twelve_thousand_records_one_bad_track_id() {
    // 12,000 well-formed records except record #9999, which is missing its
    // track_id. Expect 3 batches (5000, 5000, 2000) and exactly one reject.
    let mut records: Vec<RawRecord> = (0..12_000).map(|i| raw_track(&format!("t{i}"))).collect();
    records[9999].remove("track_id");

    let source = MemoryRawSource::new(records);
    let mut sink = MemoryCleanSink::new();
    let mut observer = CaptureObserver(Vec::new());
    let config = PipelineConfig {
        batch_size: 5000,
        global_dedup: false,
    };

    let stats = run_cleaning(&source, &mut sink, &mut observer, &config).unwrap();

    assert_eq!(observer.0.len(), 3, "expected 3 batches");
    assert_eq!(
        observer.0,
        vec![
            (5000, 12_000, 5000),
            (10_000, 12_000, 9999),
            (12_000, 12_000, 11_999),
        ]
    );
    assert_eq!(stats.processed(), 12_000);
    assert_eq!(stats.valid(), 11_999);
    assert_eq!(stats.rejected(), 1);
    assert_eq!(sink.records.len(), 11_999);
}

#[test]
fn full_rejection_still_reports_definitive_counts() {
    // Every record invalid: the run succeeds and the summary is exact,
    // never a silent no-op.
    let records: Vec<RawRecord> = (0..10)
        .map(|i| {
            let mut rec = raw_track(&format!("t{i}"));
            rec.insert("tempo".into(), json!(-1.0));
            rec
        })
        .collect();

    let source = MemoryRawSource::new(records);
    let mut sink = MemoryCleanSink::new();
    let stats = run_cleaning(
        &source,
        &mut sink,
        &mut NullObserver,
        &PipelineConfig::default(),
    )
    .unwrap();

    assert_eq!(stats.processed(), 10);
    assert_eq!(stats.valid(), 0);
    assert_eq!(stats.rejected(), 10);
    assert!(sink.records.is_empty());
    assert_eq!(sink.appends, 0);
}

#[test]
fn file_backed_run_matches_memory_semantics() {
    let dir = TempDir::new().unwrap();
    let raw = JsonlRawStore::new(dir.path().join("raw.jsonl"));
    raw.clear().unwrap();

    let mut records: Vec<RawRecord> = (0..7).map(|i| raw_track(&format!("t{i}"))).collect();
    records[3].insert("year".into(), json!(1850));
    raw.append_many(&records).unwrap();

    let mut clean = JsonlCleanStore::new(dir.path().join("clean.jsonl"));
    let config = PipelineConfig {
        batch_size: 3,
        global_dedup: false,
    };
    let stats = run_cleaning(&raw, &mut clean, &mut NullObserver, &config).unwrap();

    assert_eq!(stats.processed(), 7);
    assert_eq!(stats.valid(), 6);
    assert_eq!(clean.count().unwrap(), 6);
    let saved = clean.read_all().unwrap();
    assert!(saved.iter().all(|t| t.year == 2005));
}

#[test]
fn rerunning_the_pipeline_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let raw = JsonlRawStore::new(dir.path().join("raw.jsonl"));
    raw.clear().unwrap();
    raw.append_many(&[raw_track("a"), raw_track("b"), raw_track("a")])
        .unwrap();

    let mut clean = JsonlCleanStore::new(dir.path().join("clean.jsonl"));
    let config = PipelineConfig::default();

    run_cleaning(&raw, &mut clean, &mut NullObserver, &config).unwrap();
    let first = clean.read_all().unwrap();

    run_cleaning(&raw, &mut clean, &mut NullObserver, &config).unwrap();
    let second = clean.read_all().unwrap();

    assert_eq!(first, second);
    assert_eq!(second.len(), 2); // the duplicate "a" collapsed, once, both times
}

#[test]
fn csv_to_clean_store_end_to_end() {
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("tracks.csv");
    let mut file = std::fs::File::create(&csv_path).unwrap();
    write!(
        file,
        "track_id,artist_name,track_name,year,genre,danceability,energy,loudness,valence,tempo,duration_ms,popularity\n\
         t1,  the beatles ,Hey Jude,1968,  Rock ,0.5,0.6,-9.0,0.7,147.0,431333,82\n\
         t2,,Untitled,1999,pop,0.4,0.5,-7.0,0.6,100.0,180000,\n\
         t3,Bad Tempo,Song,2001,pop,0.4,0.5,-7.0,0.6,-5.0,180000,10\n\
         t1,The Beatles,Hey Jude (Duplicate),1968,rock,0.5,0.6,-9.0,0.7,147.0,431333,82\n"
    )
    .unwrap();

    let raw = JsonlRawStore::new(dir.path().join("raw.jsonl"));
    let report = ingest_csv(csv_path.to_str().unwrap(), &raw, 5000).unwrap();
    assert_eq!(report.stored, 4);

    let mut clean = JsonlCleanStore::new(dir.path().join("clean.jsonl"));
    let stats = run_cleaning(
        &raw,
        &mut clean,
        &mut NullObserver,
        &PipelineConfig::default(),
    )
    .unwrap();

    // t1 accepted (normalized), t2 accepted (repaired + defaulted),
    // t3 rejected (negative tempo), duplicate t1 deduped away.
    assert_eq!(stats.processed(), 4);
    assert_eq!(stats.valid(), 2);
    assert_eq!(stats.rejected(), 2);

    let tracks = clean.read_all().unwrap();
    assert_eq!(tracks.len(), 2);

    let t1 = tracks.iter().find(|t| t.track_id == "t1").unwrap();
    assert_eq!(t1.artist_name, "The Beatles");
    assert_eq!(t1.track_name, "Hey Jude");
    assert_eq!(t1.genre, "rock");

    let t2 = tracks.iter().find(|t| t.track_id == "t2").unwrap();
    assert_eq!(t2.artist_name, "Unknown");
    assert_eq!(t2.popularity, 0);
}

#[test]
fn empty_raw_store_is_a_successful_run() {
    let dir = TempDir::new().unwrap();
    let raw = JsonlRawStore::new(dir.path().join("raw.jsonl"));
    raw.clear().unwrap();

    let mut clean = JsonlCleanStore::new(dir.path().join("clean.jsonl"));
    let stats = run_cleaning(
        &raw,
        &mut clean,
        &mut NullObserver,
        &PipelineConfig::default(),
    )
    .unwrap();

    assert_eq!(stats.processed(), 0);
    assert_eq!(stats.rejected(), 0);
    assert_eq!(clean.count().unwrap(), 0);
}

#[test]
fn reset_discards_stale_clean_records() {
    let dir = TempDir::new().unwrap();
    let raw = JsonlRawStore::new(dir.path().join("raw.jsonl"));
    raw.clear().unwrap();
    raw.append_many(&[raw_track("fresh")]).unwrap();

    let mut clean = JsonlCleanStore::new(dir.path().join("clean.jsonl"));

    // Seed the clean store with leftovers from an older, larger run.
    run_cleaning(
        &MemoryRawSource::new(vec![raw_track("old1"), raw_track("old2")]),
        &mut clean,
        &mut NullObserver,
        &PipelineConfig::default(),
    )
    .unwrap();
    assert_eq!(clean.count().unwrap(), 2);

    run_cleaning(
        &raw,
        &mut clean,
        &mut NullObserver,
        &PipelineConfig::default(),
    )
    .unwrap();

    let tracks = clean.read_all().unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].track_id, "fresh");
}

#[test]
fn global_dedup_spans_file_backed_batches() {
    let dir = TempDir::new().unwrap();
    let raw = JsonlRawStore::new(dir.path().join("raw.jsonl"));
    raw.clear().unwrap();
    raw.append_many(&[raw_track("dup"), raw_track("x"), raw_track("dup")])
        .unwrap();

    let mut clean = JsonlCleanStore::new(dir.path().join("clean.jsonl"));
    let config = PipelineConfig {
        batch_size: 1,
        global_dedup: true,
    };
    let stats = run_cleaning(&raw, &mut clean, &mut NullObserver, &config).unwrap();

    assert_eq!(stats.processed(), 3);
    assert_eq!(stats.valid(), 2);
    assert_eq!(clean.count().unwrap(), 2);
}

#[test]
fn corrupt_raw_line_is_rejected_not_fatal() {
    let dir = TempDir::new().unwrap();
    let raw_path = dir.path().join("raw.jsonl");
    let raw = JsonlRawStore::new(&raw_path);
    raw.clear().unwrap();
    raw.append_many(&[raw_track("a")]).unwrap();

    // Corrupt the store by hand.
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(&raw_path)
        .unwrap();
    writeln!(file, "this is not json").unwrap();
    drop(file);

    raw.append_many(&[raw_track("b")]).unwrap();

    let mut clean = JsonlCleanStore::new(dir.path().join("clean.jsonl"));
    let stats = run_cleaning(
        &raw,
        &mut clean,
        &mut NullObserver,
        &PipelineConfig::default(),
    )
    .unwrap();

    assert_eq!(stats.processed(), 3);
    assert_eq!(stats.valid(), 2);
    assert_eq!(stats.rejected(), 1);
}

#[test]
fn count_and_iter_agree_on_an_unchanged_store() {
    let dir = TempDir::new().unwrap();
    let raw = JsonlRawStore::new(dir.path().join("raw.jsonl"));
    raw.clear().unwrap();
    raw.append_many(&(0..25).map(|i| raw_track(&format!("t{i}"))).collect::<Vec<_>>())
        .unwrap();

    let counted = raw.count().unwrap();
    let iterated = raw.iter().unwrap().count() as u64;
    assert_eq!(counted, iterated);
}
