use crate::models::{CanonicalTrack, RawRecord};
use crate::store::{JsonlCleanStore, JsonlRawStore, RawSource};
use anyhow::Result;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Prints a three-part environment report: source CSV columns, raw store
/// contents, clean store shape. Findings are hints, not errors; the command
/// always succeeds so it can be run against a half-built environment.
pub fn run_diagnostics(
    csv_path: Option<&str>,
    raw: &JsonlRawStore,
    clean: &JsonlCleanStore,
) -> Result<()> {
    println!();
    println!("=== Diagnostic Report ===");

    if let Some(path) = csv_path {
        check_csv(path);
    }
    check_raw_store(raw);
    check_clean_store(clean);

    println!("=========================");
    Ok(())
}

fn check_csv(path: &str) {
    let mut reader = match csv::Reader::from_path(path) {
        Ok(r) => r,
        Err(e) => {
            println!("  FAIL CSV: could not read {path}: {e}");
            return;
        }
    };
    match reader.headers() {
        Ok(headers) => {
            let missing = missing_columns(headers.iter());
            if missing.is_empty() {
                println!("  OK   CSV: all canonical columns present ('valence' included)");
            } else {
                println!("  FAIL CSV: missing columns: {}", missing.join(", "));
                println!("       -> The source file may predate the current schema.");
            }
        }
        Err(e) => println!("  FAIL CSV: could not parse header: {e}"),
    }
}

fn check_raw_store(raw: &JsonlRawStore) {
    match raw.count() {
        Ok(0) => {
            println!("  FAIL RAW: store is empty.");
            println!("       -> Run 'orpheus ingest' first.");
        }
        Ok(n) => println!("  OK   RAW: {n} records in {}", raw.path().display()),
        Err(_) => {
            println!("  FAIL RAW: store not found at {}", raw.path().display());
            println!("       -> Run 'orpheus ingest' first.");
        }
    }
}

fn check_clean_store(clean: &JsonlCleanStore) {
    match first_record(clean.path()) {
        Ok(Some(record)) => {
            let missing = missing_fields(&record);
            if missing.is_empty() {
                println!("  OK   CLEAN: records carry every canonical field");
            } else {
                println!("  FAIL CLEAN: stored records lack: {}", missing.join(", "));
                println!("       -> Run 'orpheus clean' again to rebuild the store.");
            }
        }
        Ok(None) => {
            println!("  FAIL CLEAN: store is empty.");
            println!("       -> Run 'orpheus clean' first.");
        }
        Err(e) => println!("  FAIL CLEAN: could not read store: {e}"),
    }
}

/// Canonical columns the source CSV must provide. `popularity` is optional
/// by schema and `ingested_at` is added during ingestion.
fn required_columns() -> impl Iterator<Item = &'static str> {
    CanonicalTrack::FIELDS
        .iter()
        .copied()
        .filter(|f| *f != "popularity")
}

fn missing_columns<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<&'static str> {
    let present: Vec<String> = headers.map(|h| h.trim().to_lowercase()).collect();
    required_columns()
        .filter(|col| !present.iter().any(|h| h == col))
        .collect()
}

fn missing_fields(record: &RawRecord) -> Vec<&'static str> {
    CanonicalTrack::FIELDS
        .iter()
        .copied()
        .filter(|field| !record.contains_key(*field))
        .collect()
}

fn first_record(path: &Path) -> Result<Option<RawRecord>> {
    if !path.exists() {
        return Ok(None);
    }
    let file = File::open(path)?;
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        return Ok(Some(serde_json::from_str(&line)?));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn full_header_has_no_missing_columns() {
        let headers = [
            "track_id",
            "artist_name",
            "track_name",
            "year",
            "genre",
            "danceability",
            "energy",
            "loudness",
            "valence",
            "tempo",
            "duration_ms",
            "popularity",
        ];
        assert!(missing_columns(headers.iter().copied()).is_empty());
    }

    #[test]
    fn detects_missing_valence_column() {
        let headers = [
            "track_id",
            "artist_name",
            "track_name",
            "year",
            "genre",
            "danceability",
            "energy",
            "loudness",
            "tempo",
            "duration_ms",
        ];
        assert_eq!(missing_columns(headers.iter().copied()), vec!["valence"]);
    }

    #[test]
    fn column_match_is_case_insensitive() {
        let headers = ["Track_ID", "VALENCE"];
        let missing = missing_columns(headers.iter().copied());
        assert!(!missing.contains(&"track_id"));
        assert!(!missing.contains(&"valence"));
    }

    #[test]
    fn popularity_is_not_required_in_the_csv() {
        assert!(!required_columns().any(|c| c == "popularity"));
    }

    #[test]
    fn detects_missing_fields_in_stored_record() {
        let record = json!({"track_id": "t1", "artist_name": "A"})
            .as_object()
            .unwrap()
            .clone();
        let missing = missing_fields(&record);
        assert!(missing.contains(&"valence"));
        assert!(!missing.contains(&"track_id"));
    }

    #[test]
    fn first_record_reads_the_first_nonempty_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clean.jsonl");
        let mut file = File::create(&path).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "{}", json!({"track_id": "t1"})).unwrap();
        writeln!(file, "{}", json!({"track_id": "t2"})).unwrap();

        let record = first_record(&path).unwrap().unwrap();
        assert_eq!(record["track_id"], json!("t1"));
    }

    #[test]
    fn first_record_of_absent_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(first_record(&dir.path().join("nope.jsonl"))
            .unwrap()
            .is_none());
    }
}
