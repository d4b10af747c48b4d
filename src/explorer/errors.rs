use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::TimeOfDayError;

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("Amount range is inverted: min [{min}] is greater than max [{max}]")]
    InvalidAmountRange {
        min: Decimal,
        max: Decimal
    },
    #[error(transparent)]
    TimeOfDay(#[from] TimeOfDayError)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error("Amounts overflowed the decimal range while computing the {aggregate}")]
    Overflow {
        aggregate: &'static str
    }
}

impl AggregateError {
    pub fn overflow(aggregate: &'static str) -> Self {
        Self::Overflow { aggregate }
    }
}
