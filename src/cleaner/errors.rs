use thiserror::Error;
use tokio::task::JoinError;

use crate::models::DataError;

#[derive(Debug, Error)]
pub enum CleanError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("CSV reader task did not finish: {0}")]
    Reader(#[from] JoinError)
}
