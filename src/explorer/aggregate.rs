use std::collections::BTreeMap;

use chrono::Weekday;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::explorer::errors::AggregateError;
use crate::explorer::{FilterSelection, FilteredView};
use crate::models::Transaction;

const HOURS_PER_DAY: usize = 24;
const BIN_EDGE_DECIMAL_PLACES: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryAggregate {
    pub category: String,
    pub count: u64,
    pub total_amount: Decimal,
    pub fraud_count: u64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourBucket {
    pub hour: u32,
    pub count: u64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeatmapCell {
    pub weekday: String,
    pub weekday_index: u32,
    pub hour: u32,
    pub count: u64
}

/// One equal-width amount bin. Bins are half-open except the last, which includes its upper edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistogramBin {
    pub lower: Decimal,
    pub upper: Decimal,
    pub count: u64
}

/// Five-number summary of the amounts sharing one fraud flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AmountDistribution {
    pub is_fraud: bool,
    pub count: u64,
    pub min: Decimal,
    pub first_quartile: Decimal,
    pub median: Decimal,
    pub third_quartile: Decimal,
    pub max: Decimal
}

/// Everything the presentation layer draws for one selection.
///
/// `fraud_rate` is `None` exactly when nothing matched. A rejected selection
/// produces an empty summary with `rejected` set to the reason.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub selection: FilterSelection,
    pub rejected: Option<String>,
    pub count: u64,
    pub total_amount: Decimal,
    pub fraud_count: u64,
    pub fraud_rate: Option<f64>,
    pub by_category: Vec<CategoryAggregate>,
    pub by_hour: Vec<HourBucket>,
    pub hour_weekday: Vec<HeatmapCell>,
    pub amount_histogram: Vec<HistogramBin>,
    pub fraud_amounts: Vec<AmountDistribution>
}

impl Summary {
    /// Aggregates a view.
    ///
    /// # Errors
    /// - `AggregateError::Overflow` when a sum or histogram edge leaves the decimal range
    pub fn compute(view: &FilteredView<'_>, selection: &FilterSelection, histogram_bins: usize) -> Result<Self, AggregateError> {
        let records = view.records();

        Ok(Self {
            selection: selection.clone(),
            rejected: None,
            count: records.len() as u64,
            total_amount: total_amount(records)?,
            fraud_count: fraud_count(records),
            fraud_rate: fraud_rate(records),
            by_category: by_category(records)?,
            by_hour: by_hour(records),
            hour_weekday: hour_weekday(records),
            amount_histogram: amount_histogram(records, histogram_bins)?,
            fraud_amounts: fraud_amounts(records)?
        })
    }

    /// An empty summary carrying the reason the selection could not be answered.
    pub fn rejected(selection: &FilterSelection, reason: String) -> Self {
        Self {
            selection: selection.clone(),
            rejected: Some(reason),
            count: 0,
            total_amount: Decimal::ZERO,
            fraud_count: 0,
            fraud_rate: None,
            by_category: Vec::new(),
            by_hour: by_hour(&[]),
            hour_weekday: Vec::new(),
            amount_histogram: Vec::new(),
            fraud_amounts: Vec::new()
        }
    }
}

fn checked(value: Option<Decimal>, aggregate: &'static str) -> Result<Decimal, AggregateError> {
    value.ok_or(AggregateError::overflow(aggregate))
}

pub fn total_amount(records: &[&Transaction]) -> Result<Decimal, AggregateError> {
    records.iter().try_fold(Decimal::ZERO, |total, transaction| {
        checked(total.checked_add(transaction.amount), "total amount")
    })
}

pub fn fraud_count(records: &[&Transaction]) -> u64 {
    records.iter().filter(|transaction| transaction.is_fraud).count() as u64
}

pub fn fraud_rate(records: &[&Transaction]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }

    Some(fraud_count(records) as f64 / records.len() as f64)
}

pub fn by_category(records: &[&Transaction]) -> Result<Vec<CategoryAggregate>, AggregateError> {
    let mut groups = BTreeMap::<&str, CategoryAggregate>::new();

    for transaction in records {
        let group = groups.entry(transaction.category.as_str()).or_insert_with(|| CategoryAggregate {
            category: transaction.category.clone(),
            count: 0,
            total_amount: Decimal::ZERO,
            fraud_count: 0
        });

        group.count += 1;
        group.total_amount = checked(group.total_amount.checked_add(transaction.amount), "category totals")?;

        if transaction.is_fraud {
            group.fraud_count += 1;
        }
    }

    Ok(groups.into_values().collect())
}

/// Counts per hour of the day. All 24 buckets are always present.
pub fn by_hour(records: &[&Transaction]) -> Vec<HourBucket> {
    let mut counts = [0u64; HOURS_PER_DAY];

    for transaction in records {
        counts[transaction.hour() as usize % HOURS_PER_DAY] += 1;
    }

    counts.iter()
        .enumerate()
        .map(|(hour, &count)| HourBucket {
            hour: hour as u32,
            count
        })
        .collect()
}

/// Non-empty (weekday, hour) cells, Monday first.
pub fn hour_weekday(records: &[&Transaction]) -> Vec<HeatmapCell> {
    let mut cells = BTreeMap::<(u32, u32), (Weekday, u64)>::new();

    for transaction in records {
        let weekday = transaction.weekday();
        let cell = cells.entry((weekday.num_days_from_monday(), transaction.hour())).or_insert((weekday, 0));
        cell.1 += 1;
    }

    cells.into_iter()
        .map(|((weekday_index, hour), (weekday, count))| HeatmapCell {
            weekday: weekday.to_string(),
            weekday_index,
            hour,
            count
        })
        .collect()
}

/// Equal-width bins between the smallest and largest amount.
///
/// Positions are measured on halved amounts so the span of any two decimals
/// stays representable.
pub fn amount_histogram(records: &[&Transaction], bins: usize) -> Result<Vec<HistogramBin>, AggregateError> {
    const AGGREGATE: &str = "amount histogram";

    let amounts = records.iter().map(|transaction| transaction.amount);

    let (Some(min), Some(max)) = (amounts.clone().min(), amounts.max()) else {
        return Ok(Vec::new());
    };

    if bins == 0 {
        return Ok(Vec::new());
    }

    let half = |value: Decimal| checked(value.checked_div(Decimal::TWO), AGGREGATE);
    let half_min = half(min)?;
    let half_span = checked(half(max)?.checked_sub(half_min), AGGREGATE)?;

    if half_span.is_zero() {
        return Ok(vec![HistogramBin {
            lower: min,
            upper: max,
            count: records.len() as u64
        }]);
    }

    let last = bins - 1;
    let bin_count = Decimal::from(bins);
    let mut counts = vec![0u64; bins];

    for transaction in records {
        let offset = checked(half(transaction.amount)?.checked_sub(half_min), AGGREGATE)?;
        let position = offset.checked_mul(bin_count)
            .and_then(|scaled| scaled.checked_div(half_span))
            .or_else(|| offset.checked_div(half_span)?.checked_mul(bin_count));
        let index = checked(position, AGGREGATE)?
            .floor()
            .to_usize()
            .unwrap_or(last)
            .min(last);

        counts[index] += 1;
    }

    let edge = |index: usize| -> Result<Decimal, AggregateError> {
        let from_min = min.checked_div(bin_count).and_then(|step| step.checked_mul(Decimal::from(bins - index)));
        let from_max = max.checked_div(bin_count).and_then(|step| step.checked_mul(Decimal::from(index)));
        let edge = checked(from_min.zip(from_max).and_then(|(low, high)| low.checked_add(high)), AGGREGATE)?;

        Ok(edge.round_dp(BIN_EDGE_DECIMAL_PLACES).normalize())
    };

    counts.into_iter()
        .enumerate()
        .map(|(index, count)| -> Result<HistogramBin, AggregateError> {
            Ok(HistogramBin {
                lower: edge(index)?,
                upper: if index == last { max } else { edge(index + 1)? },
                count
            })
        })
        .collect()
}

pub fn fraud_amounts(records: &[&Transaction]) -> Result<Vec<AmountDistribution>, AggregateError> {
    let mut distributions = Vec::new();

    for is_fraud in [false, true] {
        let mut amounts: Vec<Decimal> = records.iter()
            .filter(|transaction| transaction.is_fraud == is_fraud)
            .map(|transaction| transaction.amount)
            .collect();

        amounts.sort();

        let (Some(&min), Some(&max)) = (amounts.first(), amounts.last()) else {
            continue;
        };

        distributions.push(AmountDistribution {
            is_fraud,
            count: amounts.len() as u64,
            min,
            first_quartile: quantile(&amounts, Decimal::new(25, 2))?,
            median: quantile(&amounts, Decimal::new(5, 1))?,
            third_quartile: quantile(&amounts, Decimal::new(75, 2))?,
            max
        });
    }

    Ok(distributions)
}

/// Linear-interpolated quantile of a sorted, non-empty slice.
///
/// Interpolates as a weighted sum of the neighbours so no intermediate value
/// exceeds the larger of the two.
fn quantile(sorted: &[Decimal], probability: Decimal) -> Result<Decimal, AggregateError> {
    const AGGREGATE: &str = "fraud amount quartiles";

    let position = checked(Decimal::from(sorted.len() - 1).checked_mul(probability), AGGREGATE)?;
    let lower = position.floor();
    let index = lower.to_usize().unwrap_or_default();
    let fraction = position - lower;

    match (sorted.get(index), sorted.get(index + 1)) {
        (Some(&low), Some(&high)) => {
            let weighted_low = low.checked_mul(Decimal::ONE - fraction);
            let weighted_high = high.checked_mul(fraction);
            let value = weighted_low.zip(weighted_high).and_then(|(low, high)| low.checked_add(high));

            Ok(checked(value, AGGREGATE)?.normalize())
        }
        (Some(&low), None) => Ok(low),
        _ => Ok(Decimal::ZERO)
    }
}
