//! Monthly series helpers and transaction-log ingestion

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use statrs::statistics::Statistics;

use crate::error::{ForecastError, Result};

/// Transform a currency series into log space (`ln(1 + x)` element-wise).
///
/// Compresses large-magnitude variance before the series reaches the model;
/// inverted with [`from_log_space`].
pub fn to_log_space(series: &[f64]) -> Vec<f64> {
    series.iter().map(|v| v.ln_1p()).collect()
}

/// Invert a log-space value back to currency units
pub fn from_log_space(value: f64) -> f64 {
    value.exp_m1()
}

/// Mean of the trailing `window` points (whole series when shorter).
///
/// Returns 0 for an empty series or a zero window.
pub fn recent_mean(series: &[f64], window: usize) -> f64 {
    if series.is_empty() || window == 0 {
        return 0.0;
    }
    let tail = &series[series.len().saturating_sub(window)..];
    tail.mean()
}

/// A single ledger row from a personal-finance CSV export
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Transaction date
    pub date: NaiveDate,
    /// Transaction amount in currency units
    pub amount: f64,
    /// Spending category label
    pub category: String,
    /// Row type, `expense` or `income`
    pub kind: String,
}

impl Transaction {
    /// Whether this row counts toward expense totals
    pub fn is_expense(&self) -> bool {
        self.kind.trim().eq_ignore_ascii_case("expense")
    }
}

/// Raw CSV row shape: `Date,Amount,Category,Type`
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Amount")]
    amount: f64,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Type")]
    kind: String,
}

/// Loader for transaction-log CSV exports
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load transactions from a CSV file with `Date,Amount,Category,Type` columns
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Transaction>> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Load transactions from any CSV reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Transaction>> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut rows = Vec::new();

        for record in csv_reader.deserialize() {
            let raw: RawRecord = record?;
            rows.push(Transaction {
                date: parse_date(&raw.date)?,
                amount: raw.amount,
                category: raw.category,
                kind: raw.kind,
            });
        }

        Ok(rows)
    }
}

/// Parse a transaction date in the formats bank exports commonly use
fn parse_date(text: &str) -> Result<NaiveDate> {
    const FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y"];

    let trimmed = text.trim();
    for format in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }

    Err(ForecastError::DataError(format!(
        "Unrecognized transaction date: {}",
        text
    )))
}

/// Aggregate expense transactions into aligned per-category monthly totals.
///
/// Only rows of type `expense` contribute. Every category series spans the
/// same ordered range of observed months, oldest first; months where a
/// category had no spend stay at zero so lag features line up across
/// categories.
pub fn monthly_category_totals(transactions: &[Transaction]) -> BTreeMap<String, Vec<f64>> {
    let expenses: Vec<&Transaction> = transactions.iter().filter(|t| t.is_expense()).collect();

    let months: BTreeSet<(i32, u32)> = expenses
        .iter()
        .map(|t| (t.date.year(), t.date.month()))
        .collect();
    let slots: BTreeMap<(i32, u32), usize> = months
        .iter()
        .copied()
        .enumerate()
        .map(|(slot, month)| (month, slot))
        .collect();

    let mut totals: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for transaction in expenses {
        let slot = slots[&(transaction.date.year(), transaction.date.month())];
        let series = totals
            .entry(transaction.category.clone())
            .or_insert_with(|| vec![0.0; slots.len()]);
        series[slot] += transaction.amount;
    }

    totals
}
