/// Default number of raw records per batch (bounds peak memory to O(batch))
pub const DEFAULT_BATCH_SIZE: usize = 5000;

/// Inclusive bounds for the release year of a track
pub const YEAR_MIN: i64 = 1900;
pub const YEAR_MAX: i64 = 2030;

/// Inclusive bounds for normalized audio features (danceability, energy, valence)
pub const AUDIO_FEATURE_MIN: f64 = 0.0;
pub const AUDIO_FEATURE_MAX: f64 = 1.0;

/// Placeholder for empty or missing artist/track names
pub const UNKNOWN_NAME: &str = "Unknown";

/// Expected minimum raw volume; ingestion warns below this (advisory only)
pub const EXPECTED_MIN_ROWS: u64 = 750_000;

/// Progress bar update interval (tick every N records during ingestion)
pub const PROGRESS_INTERVAL: u64 = 1000;
