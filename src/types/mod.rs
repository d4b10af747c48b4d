mod errors;
mod time_of_day;

pub use errors::TimeOfDayError;
pub use time_of_day::TimeOfDay;

/// One-based line number within a CSV file, header included.
pub type LineNumber = u64;
