use serde::Serialize;
use tracing::{info, warn};

/// Row counts for one cleaning run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    pub rows_read: u64,
    pub duplicates_dropped: u64,
    pub missing_dropped: u64,
    pub unparsable_dropped: u64,
    pub normalized_duplicates_dropped: u64,
    pub rows_written: u64
}

impl CleaningReport {
    pub fn rows_dropped(&self) -> u64 {
        self.duplicates_dropped + self.missing_dropped + self.unparsable_dropped + self.normalized_duplicates_dropped
    }

    pub fn log(&self) {
        if self.duplicates_dropped > 0 {
            warn!("Removed {} duplicate rows", self.duplicates_dropped);
        }

        if self.missing_dropped > 0 {
            warn!("Removed {} rows due to missing required values", self.missing_dropped);
        }

        if self.unparsable_dropped > 0 {
            warn!("Removed {} rows due to values that could not be parsed", self.unparsable_dropped);
        }

        if self.normalized_duplicates_dropped > 0 {
            warn!("Removed {} rows that duplicated another row once normalized", self.normalized_duplicates_dropped);
        }

        info!("Cleaned {} rows into {} rows, dropping {}", self.rows_read, self.rows_written, self.rows_dropped());
    }
}
