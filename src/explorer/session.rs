use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::explorer::errors::SelectionError;
use crate::explorer::{AmountRange, CategorySelection, FilterSelection, FilteredView, Summary, TimeWindow};
use crate::models::{DataError, TransactionTable};
use crate::storage::Storage;

/// The extent of a loaded table, used to seed the filter widgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetBounds {
    pub earliest: NaiveDateTime,
    pub latest: NaiveDateTime,
    pub min_hour: u32,
    pub max_hour: u32,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub categories: Vec<String>
}

/// A session-scoped handle on one immutable cleaned table.
///
/// Every filter and aggregate call reads the table through `&self`; nothing is
/// cached between calls.
pub struct Session {
    table: TransactionTable,
    histogram_bins: usize
}

impl Session {
    pub fn new(table: TransactionTable, histogram_bins: usize) -> Self {
        Self { table, histogram_bins }
    }

    /// Loads the cleaned table once for the lifetime of the session.
    pub fn open<S: Storage>(storage: &S, histogram_bins: usize) -> Result<Self, DataError> {
        let table = storage.load()?;

        if table.is_empty() {
            warn!("Cleaned dataset has no transactions; every selection will be empty");
        }

        Ok(Self::new(table, histogram_bins))
    }

    pub fn table(&self) -> &TransactionTable {
        &self.table
    }

    pub fn bounds(&self) -> Option<DatasetBounds> {
        let records = self.table.records();
        let first = records.first()?;

        let mut bounds = DatasetBounds {
            earliest: first.timestamp,
            latest: first.timestamp,
            min_hour: first.hour(),
            max_hour: first.hour(),
            min_amount: first.amount,
            max_amount: first.amount,
            categories: Vec::new()
        };

        let mut categories = BTreeSet::new();

        for transaction in records {
            bounds.earliest = bounds.earliest.min(transaction.timestamp);
            bounds.latest = bounds.latest.max(transaction.timestamp);
            bounds.min_hour = bounds.min_hour.min(transaction.hour());
            bounds.max_hour = bounds.max_hour.max(transaction.hour());
            bounds.min_amount = bounds.min_amount.min(transaction.amount);
            bounds.max_amount = bounds.max_amount.max(transaction.amount);
            categories.insert(transaction.category.as_str());
        }

        bounds.categories = categories.into_iter().map(String::from).collect();

        Some(bounds)
    }

    /// A selection covering the whole table: the full day, the table's amount range and every category.
    pub fn default_selection(&self) -> FilterSelection {
        let amount_range = self.bounds()
            .map(|bounds| AmountRange::between(bounds.min_amount, bounds.max_amount))
            .unwrap_or_default();

        FilterSelection {
            time_window: TimeWindow::FULL_DAY,
            amount_range,
            categories: CategorySelection::All
        }
    }

    pub fn filter(&self, selection: &FilterSelection) -> Result<FilteredView<'_>, SelectionError> {
        FilteredView::apply(self.table.records(), selection)
    }

    /// Filters and aggregates for the presentation layer.
    ///
    /// A malformed selection or an aggregate that leaves the decimal range
    /// never escapes as an error: it is logged and answered with an empty
    /// summary that carries the reason.
    pub fn summarize(&self, selection: &FilterSelection) -> Summary {
        let view = match self.filter(selection) {
            Ok(view) => view,
            Err(error) => {
                warn!("Rejected filter selection: {error}");
                return Summary::rejected(selection, error.to_string());
            }
        };

        if view.is_empty() {
            debug!("Selection matched none of {} transactions", self.table.len());
        } else {
            debug!("Selection matched {} of {} transactions", view.len(), self.table.len());
        }

        Summary::compute(&view, selection, self.histogram_bins).unwrap_or_else(|error| {
            warn!("Could not aggregate selection: {error}");
            Summary::rejected(selection, error.to_string())
        })
    }
}
