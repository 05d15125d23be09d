use crate::config::{AUDIO_FEATURE_MAX, AUDIO_FEATURE_MIN, UNKNOWN_NAME, YEAR_MAX, YEAR_MIN};
use crate::models::{CanonicalTrack, RawRecord};
use serde_json::Value;
use thiserror::Error;

/// Why a raw record was rejected by the schema gate.
///
/// Expected and high-frequency: the pipeline counts these and moves on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("field '{field}' has wrong type (expected {expected})")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("field '{field}' out of range: {value} (expected {bounds})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        bounds: &'static str,
    },
}

impl CanonicalTrack {
    /// Validates one candidate record against the canonical schema.
    ///
    /// Atomic: either every constraint holds and a fully normalized track is
    /// returned, or the first failure is reported and nothing is produced.
    /// Name fields are repaired (empty/missing becomes "Unknown"), never
    /// rejected for emptiness. Pure; no side effects.
    pub fn validate(raw: &RawRecord) -> Result<Self, ValidationError> {
        let track_id = require_string(raw, "track_id")?;
        let artist_name = name_or_unknown(raw, "artist_name")?;
        let track_name = name_or_unknown(raw, "track_name")?;

        let year = require_int(raw, "year")?;
        if !(YEAR_MIN..=YEAR_MAX).contains(&year) {
            return Err(ValidationError::OutOfRange {
                field: "year",
                value: year as f64,
                bounds: "1900..=2030",
            });
        }

        let genre = normalize_genre(&require_string(raw, "genre")?);

        let danceability = require_unit_interval(raw, "danceability")?;
        let energy = require_unit_interval(raw, "energy")?;
        let valence = require_unit_interval(raw, "valence")?;
        let loudness = require_float(raw, "loudness")?;

        let tempo = require_float(raw, "tempo")?;
        if tempo <= 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "tempo",
                value: tempo,
                bounds: "> 0.0",
            });
        }

        let duration_ms = require_int(raw, "duration_ms")?;
        if duration_ms <= 0 {
            return Err(ValidationError::OutOfRange {
                field: "duration_ms",
                value: duration_ms as f64,
                bounds: "> 0",
            });
        }

        let popularity = optional_int(raw, "popularity", 0)?;

        Ok(CanonicalTrack {
            track_id,
            artist_name,
            track_name,
            year,
            genre,
            danceability,
            energy,
            loudness,
            valence,
            tempo,
            duration_ms,
            popularity,
        })
    }
}

/// Trims and title-cases a name; empty input is repaired to "Unknown".
pub fn normalize_name(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        UNKNOWN_NAME.to_string()
    } else {
        title_case(trimmed)
    }
}

/// Trims and lowercases a genre for consistent grouping downstream.
pub fn normalize_genre(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Title-cases each whitespace-separated word, lowercasing the rest.
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut word_start = true;
    for c in value.chars() {
        if c.is_whitespace() {
            word_start = true;
            out.push(c);
        } else if word_start {
            out.extend(c.to_uppercase());
            word_start = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

fn require_string(raw: &RawRecord, field: &'static str) -> Result<String, ValidationError> {
    match raw.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::WrongType {
            field,
            expected: "string",
        }),
    }
}

/// Name fields are repaired rather than rejected: missing or empty input
/// becomes the "Unknown" placeholder. Non-string input is still a type error.
fn name_or_unknown(raw: &RawRecord, field: &'static str) -> Result<String, ValidationError> {
    match raw.get(field) {
        None | Some(Value::Null) => Ok(UNKNOWN_NAME.to_string()),
        Some(Value::String(s)) => Ok(normalize_name(s)),
        Some(_) => Err(ValidationError::WrongType {
            field,
            expected: "string",
        }),
    }
}

/// Integers also accept a float with no fractional part (upstream CSV
/// inference sometimes widens whole numbers to floats).
fn require_int(raw: &RawRecord, field: &'static str) -> Result<i64, ValidationError> {
    match raw.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else if let Some(f) = n.as_f64().filter(|f| f.fract() == 0.0) {
                Ok(f as i64)
            } else {
                Err(ValidationError::WrongType {
                    field,
                    expected: "integer",
                })
            }
        }
        Some(_) => Err(ValidationError::WrongType {
            field,
            expected: "integer",
        }),
    }
}

fn require_float(raw: &RawRecord, field: &'static str) -> Result<f64, ValidationError> {
    match raw.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(Value::Number(n)) => n.as_f64().ok_or(ValidationError::WrongType {
            field,
            expected: "float",
        }),
        Some(_) => Err(ValidationError::WrongType {
            field,
            expected: "float",
        }),
    }
}

fn require_unit_interval(raw: &RawRecord, field: &'static str) -> Result<f64, ValidationError> {
    let value = require_float(raw, field)?;
    if !(AUDIO_FEATURE_MIN..=AUDIO_FEATURE_MAX).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            bounds: "0.0..=1.0",
        });
    }
    Ok(value)
}

fn optional_int(
    raw: &RawRecord,
    field: &'static str,
    default: i64,
) -> Result<i64, ValidationError> {
    match raw.get(field) {
        None | Some(Value::Null) => Ok(default),
        Some(_) => require_int(raw, field),
    }
}
