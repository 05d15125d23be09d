/// Counters accumulated over one cleaning run.
///
/// Plain integers: the pipeline is single-threaded and batch-sequential, so
/// there is no concurrent access to guard against.
#[derive(Debug, Default)]
pub struct RunStats {
    processed: u64,
    valid: u64,
}

/// Read-only view of the counters at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub processed: u64,
    pub valid: u64,
    pub rejected: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one completed batch: `batch_size` is the pre-dedupe size,
    /// `valid` the number of records that survived validation.
    pub fn record_batch(&mut self, batch_size: u64, valid: u64) {
        self.processed += batch_size;
        self.valid += valid;
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn valid(&self) -> u64 {
        self.valid
    }

    /// Everything processed but not persisted: dedupe losses and validation
    /// failures alike.
    pub fn rejected(&self) -> u64 {
        self.processed - self.valid
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            processed: self.processed,
            valid: self.valid,
            rejected: self.rejected(),
        }
    }

    /// Advisory progress percentage against a point-in-time total. The total
    /// may be stale relative to the live source; staleness is acceptable.
    pub fn percent_of(&self, total: u64) -> f64 {
        if total == 0 {
            100.0
        } else {
            (self.processed as f64 / total as f64) * 100.0
        }
    }
}
