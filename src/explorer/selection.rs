use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::explorer::errors::SelectionError;
use crate::models::Transaction;
use crate::types::TimeOfDay;

/// A half-open time-of-day window `[start, end)`; the date of a record is ignored.
///
/// When `start` is after `end` the window wraps past midnight, so `22:00`–`04:00`
/// covers late evening and early morning. Equal bounds make an empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: TimeOfDay,
    pub end: TimeOfDay
}

impl TimeWindow {
    pub const FULL_DAY: TimeWindow = TimeWindow {
        start: TimeOfDay::MIDNIGHT,
        end: TimeOfDay::END_OF_DAY
    };

    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    /// Parses a window from `HH:MM[:SS]` text as typed by a user.
    ///
    /// # Errors
    /// - `SelectionError::TimeOfDay` when either bound is not a valid time of day
    pub fn parse(start: &str, end: &str) -> Result<Self, SelectionError> {
        Ok(Self::new(start.parse()?, end.parse()?))
    }

    pub fn contains(&self, time: TimeOfDay) -> bool {
        if self.start <= self.end {
            self.start <= time && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::FULL_DAY
    }
}

/// An inclusive amount range. A missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AmountRange {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>
}

impl AmountRange {
    pub fn between(min: Decimal, max: Decimal) -> Self {
        Self {
            min: Some(min),
            max: Some(max)
        }
    }

    pub fn validate(&self) -> Result<(), SelectionError> {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min > max => Err(SelectionError::InvalidAmountRange { min, max }),
            _ => Ok(())
        }
    }

    pub fn contains(&self, amount: Decimal) -> bool {
        self.min.is_none_or(|min| amount >= min) && self.max.is_none_or(|max| amount <= max)
    }
}

/// Which merchant categories a selection keeps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CategorySelection {
    #[default]
    All,
    Only(BTreeSet<String>)
}

impl CategorySelection {
    /// Builds a selection from user input. Blank entries are ignored and an
    /// empty selection means every category.
    pub fn from_categories<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let categories: BTreeSet<String> = categories.into_iter()
            .map(|category| category.as_ref().trim().to_string())
            .filter(|category| !category.is_empty())
            .collect();

        if categories.is_empty() {
            Self::All
        } else {
            Self::Only(categories)
        }
    }

    pub fn contains(&self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(categories) => categories.is_empty() || categories.contains(category)
        }
    }
}

/// The predicates a user picks for one interaction. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSelection {
    pub time_window: TimeWindow,
    pub amount_range: AmountRange,
    pub categories: CategorySelection
}

impl FilterSelection {
    pub fn validate(&self) -> Result<(), SelectionError> {
        self.amount_range.validate()
    }

    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.time_window.contains(transaction.time_of_day())
            && self.amount_range.contains(transaction.amount)
            && self.categories.contains(&transaction.category)
    }
}
