//! Aggregation output types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// A per-record computed view: the one place the tax split is derived.
///
/// The summary API, the Excel formatter and the PDF formatter all consume
/// these lines (or buckets accumulated from them), so the three surfaces can
/// never disagree on a record's pre-tax/tax/total triple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseLine {
    /// Transaction date.
    pub date: NaiveDate,
    /// Merchant name.
    pub merchant: String,
    /// Category label.
    pub category: String,
    /// Owner tag.
    pub owner: String,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Tax-inclusive total.
    pub total: Decimal,
    /// Tax portion (stored or derived).
    pub tax: Decimal,
}

impl ExpenseLine {
    /// Pre-tax display value, always `total - tax`.
    #[must_use]
    pub fn pre_tax(&self) -> Decimal {
        self.total - self.tax
    }
}

/// An aggregated total for one grouping key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Bucket {
    /// Sum of tax-inclusive totals.
    pub total: Decimal,
    /// Sum of tax portions.
    pub tax: Decimal,
    /// Number of records.
    pub count: usize,
}

impl Bucket {
    /// Pre-tax display value, computed at read time and never stored.
    #[must_use]
    pub fn pre_tax(&self) -> Decimal {
        self.total - self.tax
    }

    pub(crate) fn add(&mut self, total: Decimal, tax: Decimal) {
        self.total += total;
        self.tax += tax;
        self.count += 1;
    }
}

/// A bucket keyed by period label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodBucket {
    /// Period label ("January" or "January 2024").
    pub period: String,
    /// Aggregated totals.
    #[serde(flatten)]
    pub bucket: Bucket,
}

/// A bucket keyed by category label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBucket {
    /// Category label.
    pub category: String,
    /// Aggregated totals.
    #[serde(flatten)]
    pub bucket: Bucket,
}

/// A bucket keyed by (period, category).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodCategoryBucket {
    /// Period label.
    pub period: String,
    /// Category label.
    pub category: String,
    /// Aggregated totals.
    #[serde(flatten)]
    pub bucket: Bucket,
}

/// Full aggregation output for one filtered record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpenseSummary {
    /// Grand total of tax-inclusive amounts.
    pub total_amount: Decimal,
    /// Grand total of tax portions.
    pub total_tax: Decimal,
    /// Number of records aggregated.
    pub record_count: usize,
    /// Buckets keyed by period, axis order.
    pub by_period: Vec<PeriodBucket>,
    /// Buckets keyed by category, descending by total (stable on ties).
    pub by_category: Vec<CategoryBucket>,
    /// Buckets keyed by (period, category), insertion order.
    pub by_period_and_category: Vec<PeriodCategoryBucket>,
}

impl ExpenseSummary {
    /// Grand pre-tax total.
    #[must_use]
    pub fn total_pre_tax(&self) -> Decimal {
        self.total_amount - self.total_tax
    }

    /// Number of distinct categories present.
    #[must_use]
    pub fn distinct_category_count(&self) -> usize {
        self.by_category.len()
    }

    /// The largest category bucket, if any records were aggregated.
    #[must_use]
    pub fn top_category(&self) -> Option<&CategoryBucket> {
        self.by_category.first()
    }
}
