//! The aggregation engine.
//!
//! One linear pass over the record set fills all three grouping structures
//! (period, category, period x category) so their totals are mutually
//! consistent to the cent. The engine is parameterized over the period key
//! so the same pass serves the twelve-month year view and the cross-month
//! export view.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::record::ExpenseRecord;
use crate::tax::derive_tax;

use super::types::{
    Bucket, CategoryBucket, ExpenseLine, ExpenseSummary, PeriodBucket, PeriodCategoryBucket,
};

/// Computes the per-record lines (with the tax split derived exactly once).
/// Input order is preserved.
#[must_use]
pub fn expense_lines(records: &[ExpenseRecord]) -> Vec<ExpenseLine> {
    records
        .iter()
        .map(|record| ExpenseLine {
            date: record.transaction_date,
            merchant: record.merchant.clone(),
            category: record.category.label().to_string(),
            owner: record.owner.clone(),
            notes: record.notes.clone(),
            total: record.amount,
            tax: derive_tax(record.amount, record.tax),
        })
        .collect()
}

/// English month name, e.g. "January".
#[must_use]
pub fn month_label(date: NaiveDate) -> String {
    date.format("%B").to_string()
}

/// English month name with year, e.g. "January 2024".
#[must_use]
pub fn month_year_label(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

/// Parses a "MonthName Year" label back to the first day of that month.
/// Used to sort cross-month period buckets chronologically.
#[must_use]
pub fn parse_month_year_label(label: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("1 {label}"), "%d %B %Y").ok()
}

/// Aggregates lines under an arbitrary period key. Bucket order follows
/// first-seen order of each key.
pub fn aggregate<F>(lines: &[ExpenseLine], period_key: F) -> ExpenseSummary
where
    F: Fn(NaiveDate) -> String,
{
    aggregate_with_axis(lines, period_key, &[])
}

/// Full-year aggregation: month-name keys with all twelve calendar months
/// present in chronological order, empty months included. Callers are
/// expected to have filtered the input to the given year.
#[must_use]
pub fn aggregate_year(lines: &[ExpenseLine], year: i32) -> ExpenseSummary {
    let axis: Vec<String> = (1..=12)
        .filter_map(|month| NaiveDate::from_ymd_opt(year, month, 1))
        .map(month_label)
        .collect();
    aggregate_with_axis(lines, month_label, &axis)
}

/// Cross-month aggregation: "MonthName Year" keys, period buckets sorted
/// chronologically ascending by parsing each label back into a date. This
/// ordering governs the PDF ledger and the spreadsheet month sheet.
#[must_use]
pub fn aggregate_by_month_year(lines: &[ExpenseLine]) -> ExpenseSummary {
    let mut summary = aggregate(lines, month_year_label);
    summary
        .by_period
        .sort_by_key(|bucket| parse_month_year_label(&bucket.period).unwrap_or(NaiveDate::MIN));
    summary
}

fn aggregate_with_axis<F>(lines: &[ExpenseLine], period_key: F, axis: &[String]) -> ExpenseSummary
where
    F: Fn(NaiveDate) -> String,
{
    let mut summary = ExpenseSummary {
        total_amount: rust_decimal::Decimal::ZERO,
        total_tax: rust_decimal::Decimal::ZERO,
        record_count: lines.len(),
        by_period: Vec::new(),
        by_category: Vec::new(),
        by_period_and_category: Vec::new(),
    };

    let mut period_index: HashMap<String, usize> = HashMap::new();
    let mut category_index: HashMap<String, usize> = HashMap::new();
    let mut pair_index: HashMap<(String, String), usize> = HashMap::new();

    for label in axis {
        period_index.insert(label.clone(), summary.by_period.len());
        summary.by_period.push(PeriodBucket {
            period: label.clone(),
            bucket: Bucket::default(),
        });
    }

    // The single pass: all three grouping structures are filled together.
    for line in lines {
        let period = period_key(line.date);

        summary.total_amount += line.total;
        summary.total_tax += line.tax;

        let period_slot = *period_index.entry(period.clone()).or_insert_with(|| {
            summary.by_period.push(PeriodBucket {
                period: period.clone(),
                bucket: Bucket::default(),
            });
            summary.by_period.len() - 1
        });
        summary.by_period[period_slot].bucket.add(line.total, line.tax);

        let category_slot = *category_index
            .entry(line.category.clone())
            .or_insert_with(|| {
                summary.by_category.push(CategoryBucket {
                    category: line.category.clone(),
                    bucket: Bucket::default(),
                });
                summary.by_category.len() - 1
            });
        summary.by_category[category_slot]
            .bucket
            .add(line.total, line.tax);

        let pair_slot = *pair_index
            .entry((period.clone(), line.category.clone()))
            .or_insert_with(|| {
                summary.by_period_and_category.push(PeriodCategoryBucket {
                    period,
                    category: line.category.clone(),
                    bucket: Bucket::default(),
                });
                summary.by_period_and_category.len() - 1
            });
        summary.by_period_and_category[pair_slot]
            .bucket
            .add(line.total, line.tax);
    }

    // Descending by total; the sort is stable so equal totals keep
    // first-seen order. Governs "Top Category" and breakdown table order.
    summary
        .by_category
        .sort_by(|a, b| b.bucket.total.cmp(&a.bucket.total));

    summary
}
