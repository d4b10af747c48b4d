use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Weekday};
use csv::StringRecord;
use rust_decimal::Decimal;

use crate::models::errors::DataError;
use crate::models::Schema;
use crate::types::{LineNumber, TimeOfDay};

const NULL_TOKENS: &[&str] = &["na", "n/a", "nan", "null", "none"];
const TIMESTAMP_OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TIMESTAMP_OUTPUT_FORMAT_FRACTIONAL: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Represents a single validated row of a transaction file.
///
/// Every required field is typed; everything else in the row is kept verbatim
/// in `passthrough`, in the order given by `Schema::passthrough`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// When the transaction happened.
    pub timestamp: NaiveDateTime,
    /// The transaction amount. Refunds may be negative.
    pub amount: Decimal,
    /// Merchant category, trimmed.
    pub category: String,
    /// Whether the transaction was flagged as fraudulent.
    pub is_fraud: bool,
    /// Identifying fields not used for filtering.
    pub passthrough: Vec<String>
}

impl Transaction {
    /// Builds a transaction from a CSV record.
    ///
    /// Missing required values are checked before anything is parsed, so a row
    /// that is both incomplete and malformed reports `MissingValue`.
    ///
    /// # Errors
    /// Returns `DataError` if:
    /// - A required value is missing or a null token.
    /// - The record has more fields than the header.
    /// - The timestamp, amount or fraud flag cannot be parsed.
    pub fn from_record(record: &StringRecord, line: LineNumber, schema: &Schema, timestamp_formats: &[String]) -> Result<Self, DataError> {
        for index in schema.required() {
            if is_missing(record.get(index)) {
                return Err(DataError::missing_value(line, schema.header(index)));
            }
        }

        if record.len() > schema.width() {
            return Err(DataError::FieldCount {
                line,
                expected: schema.width(),
                found: record.len()
            });
        }

        let timestamp_text = field(record, schema.timestamp());
        let timestamp = parse_timestamp(timestamp_text, timestamp_formats)
            .ok_or_else(|| DataError::parse(line, schema.header(schema.timestamp()), timestamp_text, "a date-time"))?;

        let amount_text = field(record, schema.amount());
        let amount = parse_amount(amount_text)
            .ok_or_else(|| DataError::parse(line, schema.header(schema.amount()), amount_text, "a number"))?;

        let fraud_text = field(record, schema.is_fraud());
        let is_fraud = parse_fraud_flag(fraud_text)
            .ok_or_else(|| DataError::parse(line, schema.header(schema.is_fraud()), fraud_text, "a fraud flag"))?;

        let passthrough = schema.passthrough().iter()
            .map(|&index| record.get(index).unwrap_or_default().to_string())
            .collect();

        Ok(Self {
            timestamp,
            amount,
            category: field(record, schema.category()).to_string(),
            is_fraud,
            passthrough
        })
    }

    /// Renders the transaction in header order using the normalized text of each typed field.
    pub fn to_row(&self, schema: &Schema) -> Vec<String> {
        let mut row = vec![String::new(); schema.width()];

        row[schema.timestamp()] = format_timestamp(&self.timestamp);
        row[schema.amount()] = self.amount.normalize().to_string();
        row[schema.category()] = self.category.clone();
        row[schema.is_fraud()] = if self.is_fraud { "1" } else { "0" }.to_string();

        for (value, &index) in self.passthrough.iter().zip(schema.passthrough()) {
            row[index] = value.clone();
        }

        row
    }

    pub fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay::from(self.timestamp.time())
    }

    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }

    pub fn weekday(&self) -> Weekday {
        self.timestamp.weekday()
    }
}

/// The one-based line a record was read from, or zero when the reader did not track it.
pub fn record_line(record: &StringRecord) -> LineNumber {
    record.position().map(|position| position.line()).unwrap_or_default()
}

pub fn is_missing(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None => true,
        Some(value) => value.is_empty() || NULL_TOKENS.iter().any(|token| value.eq_ignore_ascii_case(token))
    }
}

/// Parses a timestamp in the canonical output format, one of `formats`, or RFC 3339.
///
/// The canonical format is always accepted so a cleaned file reloads under any
/// configured format list.
pub fn parse_timestamp(value: &str, formats: &[String]) -> Option<NaiveDateTime> {
    [TIMESTAMP_OUTPUT_FORMAT, TIMESTAMP_OUTPUT_FORMAT_FRACTIONAL].into_iter()
        .chain(formats.iter().map(String::as_str))
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|timestamp| timestamp.naive_local()))
}

pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    if timestamp.nanosecond() == 0 {
        timestamp.format(TIMESTAMP_OUTPUT_FORMAT).to_string()
    } else {
        timestamp.format(TIMESTAMP_OUTPUT_FORMAT_FRACTIONAL).to_string()
    }
}

pub fn parse_amount(value: &str) -> Option<Decimal> {
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()
}

pub fn parse_fraud_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" | "t" | "yes" | "y" => Some(true),
        "0" | "0.0" | "false" | "f" | "no" | "n" => Some(false),
        _ => None
    }
}

fn field(record: &StringRecord, index: usize) -> &str {
    record.get(index).map(str::trim).unwrap_or_default()
}
