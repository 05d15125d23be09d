use serde::{Deserialize, Serialize};

/// An untyped record as it arrives from the bronze layer. Fields may be
/// missing, null, or the wrong type; no invariants hold yet.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// A track that has passed every validation and normalization rule.
///
/// Constructed only through [`CanonicalTrack::validate`](crate::schema);
/// a value of this type is wholly valid or does not exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalTrack {
    pub track_id: String,
    pub artist_name: String,
    pub track_name: String,
    pub year: i64,
    pub genre: String,
    pub danceability: f64,
    pub energy: f64,
    pub loudness: f64,
    pub valence: f64,
    pub tempo: f64,
    pub duration_ms: i64,
    pub popularity: i64,
}

impl CanonicalTrack {
    /// Field names a clean record is expected to carry, in schema order.
    pub const FIELDS: &'static [&'static str] = &[
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
}
