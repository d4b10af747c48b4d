mod cleaning_engine;
mod errors;
mod report;
#[cfg(test)]
mod tests;

use clap::ValueEnum;
use serde::Deserialize;

pub use cleaning_engine::CleaningEngine;
pub use errors::CleanError;
pub use report::CleaningReport;

/// What a cleaning run does with a row whose timestamp, amount or fraud flag
/// cannot be coerced. The policy holds for every row of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ParsePolicy {
    /// Drop the row and count it in the report.
    #[default]
    Drop,
    /// Fail the run without writing any output.
    Abort
}
