use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::models::errors::DataError;

pub const DEFAULT_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M"
];

/// Header names of the four columns every transaction file must carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub timestamp: String,
    pub amount: String,
    pub category: String,
    pub is_fraud: String
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            timestamp: "timestamp".to_string(),
            amount: "amount".to_string(),
            category: "category".to_string(),
            is_fraud: "is_fraud".to_string()
        }
    }
}

/// How a transaction file is laid out on disk.
#[derive(Debug, Clone)]
pub struct TableFormat {
    pub columns: ColumnNames,
    pub timestamp_formats: Vec<String>,
    pub delimiter: u8
}

impl Default for TableFormat {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            timestamp_formats: DEFAULT_TIMESTAMP_FORMATS.iter().map(|format| format.to_string()).collect(),
            delimiter: b','
        }
    }
}

/// The header of a transaction file with the required columns resolved to positions.
///
/// Every column that is not required is a passthrough column and is carried
/// verbatim, in header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    headers: Vec<String>,
    timestamp: usize,
    amount: usize,
    category: usize,
    is_fraud: usize,
    passthrough: Vec<usize>
}

impl Schema {
    /// Resolves the required columns against a header, ignoring case and surrounding whitespace.
    ///
    /// # Errors
    /// Returns `DataError::MissingColumn` naming the first required column that is absent.
    pub fn resolve(headers: &StringRecord, columns: &ColumnNames) -> Result<Self, DataError> {
        let headers: Vec<String> = headers.iter().map(|header| header.trim().to_string()).collect();

        let position = |name: &str| {
            headers.iter()
                .position(|header| header.eq_ignore_ascii_case(name.trim()))
                .ok_or_else(|| DataError::missing_column(name))
        };

        let timestamp = position(&columns.timestamp)?;
        let amount = position(&columns.amount)?;
        let category = position(&columns.category)?;
        let is_fraud = position(&columns.is_fraud)?;

        let required = [timestamp, amount, category, is_fraud];
        let passthrough = (0..headers.len()).filter(|index| !required.contains(index)).collect();

        Ok(Self {
            headers,
            timestamp,
            amount,
            category,
            is_fraud,
            passthrough
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn header(&self, index: usize) -> &str {
        self.headers.get(index).map(String::as_str).unwrap_or_default()
    }

    pub fn timestamp(&self) -> usize {
        self.timestamp
    }

    pub fn amount(&self) -> usize {
        self.amount
    }

    pub fn category(&self) -> usize {
        self.category
    }

    pub fn is_fraud(&self) -> usize {
        self.is_fraud
    }

    /// Positions of the required columns, in the order missing values are checked.
    pub fn required(&self) -> [usize; 4] {
        [self.timestamp, self.amount, self.category, self.is_fraud]
    }

    pub fn passthrough(&self) -> &[usize] {
        &self.passthrough
    }
}
