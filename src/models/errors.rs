use crate::types::LineNumber;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("Required column [{column}] was not found in the header")]
    MissingColumn {
        column: String
    },
    #[error("Missing value for column [{column}] on line [{line}]")]
    MissingValue {
        line: LineNumber,
        column: String
    },
    #[error("Could not parse [{value}] as {expected} for column [{column}] on line [{line}]")]
    Parse {
        line: LineNumber,
        column: String,
        value: String,
        expected: &'static str
    },
    #[error("Line [{line}] has {found} fields but the header has {expected}")]
    FieldCount {
        line: LineNumber,
        expected: usize,
        found: usize
    },
    #[error("Duplicate row on line [{line}]")]
    DuplicateRow {
        line: LineNumber
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error)
}

impl DataError {
    pub fn missing_column(column: &str) -> Self {
        Self::MissingColumn { column: column.to_string() }
    }

    pub fn missing_value(line: LineNumber, column: &str) -> Self {
        Self::MissingValue {
            line,
            column: column.to_string()
        }
    }

    pub fn parse(line: LineNumber, column: &str, value: &str, expected: &'static str) -> Self {
        Self::Parse {
            line,
            column: column.to_string(),
            value: value.to_string(),
            expected
        }
    }

    /// Whether this is a row-level value that could not be coerced, as opposed
    /// to a missing value or a file-level failure.
    pub fn is_unparsable_row(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::FieldCount { .. })
    }
}
