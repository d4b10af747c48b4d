use std::num::ParseIntError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimeOfDayError {
    #[error("Time of day error: {0}")]
    InvalidFormat(String),
    #[error("Time of day error: {0}")]
    ParseInt(#[from] ParseIntError),
    #[error("Time of day error: [{0}] is out of range")]
    OutOfRange(String)
}
