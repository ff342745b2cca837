//! Property-based and scenario tests for the aggregation engine.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use crate::filter::ReportFilter;
use crate::record::{Category, ExpenseRecord};

use super::engine::{
    aggregate_by_month_year, aggregate_year, expense_lines, month_year_label,
    parse_month_year_label,
};
use super::service::ReportService;

fn record(
    merchant: &str,
    amount: Decimal,
    tax: Option<Decimal>,
    date: &str,
    category: &str,
) -> ExpenseRecord {
    ExpenseRecord {
        id: Uuid::new_v4(),
        owner: "alice".to_string(),
        image_key: None,
        merchant: merchant.to_string(),
        transaction_date: date.parse().unwrap(),
        amount,
        tax,
        category: Category::from_label(category),
        notes: None,
    }
}

fn arbitrary_record() -> impl Strategy<Value = ExpenseRecord> {
    (
        0i64..1_000_000,
        proptest::option::of(0u8..=100),
        1u32..=12,
        1u32..=28,
        prop_oneof![
            Just("Meals"),
            Just("Travel"),
            Just("Fuel"),
            Just("Lodging"),
            Just("Stationery"),
        ],
    )
        .prop_map(|(cents, tax_pct, month, day, category)| {
            let amount = Decimal::new(cents, 2);
            // Stored tax as a percentage of the amount keeps 0 <= tax <= amount.
            let tax = tax_pct.map(|pct| {
                (amount * Decimal::from(pct) / Decimal::from(100u8)).round_dp(2)
            });
            let date = NaiveDate::from_ymd_opt(2024, month, day).unwrap();
            record("Merchant", amount, tax, &date.to_string(), category)
        })
}

proptest! {
    /// Sum of per-period totals, sum of per-category totals and the grand
    /// total agree to the cent for any record set, because all three
    /// structures are filled in the same pass.
    #[test]
    fn test_grouping_totals_are_mutually_consistent(
        records in proptest::collection::vec(arbitrary_record(), 0..60),
    ) {
        let lines = expense_lines(&records);
        let summary = aggregate_by_month_year(&lines);

        let period_total: Decimal = summary.by_period.iter().map(|b| b.bucket.total).sum();
        let category_total: Decimal = summary.by_category.iter().map(|b| b.bucket.total).sum();
        let pair_total: Decimal =
            summary.by_period_and_category.iter().map(|b| b.bucket.total).sum();

        prop_assert_eq!(period_total, summary.total_amount);
        prop_assert_eq!(category_total, summary.total_amount);
        prop_assert_eq!(pair_total, summary.total_amount);

        let period_tax: Decimal = summary.by_period.iter().map(|b| b.bucket.tax).sum();
        let category_tax: Decimal = summary.by_category.iter().map(|b| b.bucket.tax).sum();
        prop_assert_eq!(period_tax, summary.total_tax);
        prop_assert_eq!(category_tax, summary.total_tax);
    }

    /// A full-year aggregation always yields exactly twelve period buckets,
    /// chronological, regardless of how many months have records.
    #[test]
    fn test_full_year_always_has_twelve_months(
        records in proptest::collection::vec(arbitrary_record(), 0..30),
    ) {
        let lines = expense_lines(&records);
        let summary = aggregate_year(&lines, 2024);

        prop_assert_eq!(summary.by_period.len(), 12);
        prop_assert_eq!(summary.by_period[0].period.as_str(), "January");
        prop_assert_eq!(summary.by_period[11].period.as_str(), "December");

        let bucket_count: usize = summary.by_period.iter().map(|b| b.bucket.count).sum();
        prop_assert_eq!(bucket_count, records.len());
    }

    /// Category ordering is non-increasing by total amount.
    #[test]
    fn test_category_order_is_non_increasing(
        records in proptest::collection::vec(arbitrary_record(), 0..40),
    ) {
        let summary = aggregate_by_month_year(&expense_lines(&records));
        for pair in summary.by_category.windows(2) {
            prop_assert!(pair[0].bucket.total >= pair[1].bucket.total);
        }
    }
}

#[test]
fn test_two_record_scenario() {
    // 105.00 with no stored tax derives 5.00; 50.00 with stored 10.00 keeps it.
    let records = vec![
        record("A", dec!(105.00), None, "2024-01-15", "Food"),
        record("B", dec!(50.00), Some(dec!(10.00)), "2024-02-10", "Travel"),
    ];
    let lines = expense_lines(&records);
    let summary = aggregate_by_month_year(&lines);

    assert_eq!(summary.total_amount, dec!(155.00));
    assert_eq!(summary.total_tax, dec!(15.00));
    assert_eq!(summary.record_count, 2);
    assert_eq!(summary.distinct_category_count(), 2);

    assert_eq!(summary.by_category[0].category, "Food");
    assert_eq!(summary.by_category[0].bucket.total, dec!(105.00));
    assert_eq!(summary.by_category[1].category, "Travel");
    assert_eq!(summary.by_category[1].bucket.total, dec!(50.00));
    assert_eq!(summary.top_category().unwrap().category, "Food");

    assert_eq!(summary.by_period[0].period, "January 2024");
    assert_eq!(summary.by_period[1].period, "February 2024");
}

#[test]
fn test_equal_totals_keep_first_seen_order() {
    let records = vec![
        record("A", dec!(50.00), Some(dec!(2.00)), "2024-03-01", "Lodging"),
        record("B", dec!(50.00), Some(dec!(3.00)), "2024-03-02", "Fuel"),
    ];
    let summary = aggregate_by_month_year(&expense_lines(&records));

    assert_eq!(summary.by_category[0].category, "Lodging");
    assert_eq!(summary.by_category[1].category, "Fuel");
    assert_eq!(summary.top_category().unwrap().category, "Lodging");
}

#[test]
fn test_cross_month_periods_sorted_chronologically() {
    // Input order is scrambled across a year boundary.
    let records = vec![
        record("A", dec!(10.00), None, "2024-02-01", "Meals"),
        record("B", dec!(10.00), None, "2023-12-15", "Meals"),
        record("C", dec!(10.00), None, "2024-01-20", "Meals"),
    ];
    let summary = aggregate_by_month_year(&expense_lines(&records));

    let periods: Vec<&str> = summary.by_period.iter().map(|b| b.period.as_str()).collect();
    assert_eq!(periods, vec!["December 2023", "January 2024", "February 2024"]);
}

#[test]
fn test_empty_input_yields_zeroed_structures() {
    let summary = aggregate_by_month_year(&[]);
    assert_eq!(summary.total_amount, Decimal::ZERO);
    assert_eq!(summary.total_tax, Decimal::ZERO);
    assert_eq!(summary.record_count, 0);
    assert!(summary.by_period.is_empty());
    assert!(summary.by_category.is_empty());
    assert!(summary.top_category().is_none());

    let year = aggregate_year(&[], 2024);
    assert_eq!(year.by_period.len(), 12);
    assert!(year.by_period.iter().all(|b| b.bucket == super::types::Bucket::default()));
}

#[test]
fn test_month_year_label_round_trip() {
    let date = NaiveDate::from_ymd_opt(2024, 7, 19).unwrap();
    let label = month_year_label(date);
    assert_eq!(label, "July 2024");
    assert_eq!(
        parse_month_year_label(&label),
        NaiveDate::from_ymd_opt(2024, 7, 1)
    );
    assert_eq!(parse_month_year_label("not a label"), None);
}

#[test]
fn test_pre_tax_is_total_minus_tax_per_bucket() {
    let records = vec![
        record("A", dec!(100.00), None, "2024-01-01", "Meals"),
        record("B", dec!(100.00), None, "2024-01-02", "Meals"),
    ];
    let summary = aggregate_by_month_year(&expense_lines(&records));
    let bucket = summary.by_category[0].bucket;
    assert_eq!(bucket.tax, dec!(9.52));
    assert_eq!(bucket.pre_tax(), dec!(190.48));
    assert_eq!(summary.total_pre_tax(), dec!(190.48));
}

#[test]
fn test_summarize_uses_year_axis_only_for_bare_year_filters() {
    let records = vec![record("A", dec!(10.00), None, "2024-05-05", "Meals")];

    let year_filter = ReportFilter {
        year: Some(2024),
        ..ReportFilter::default()
    };
    assert_eq!(ReportService::summarize(&records, &year_filter).by_period.len(), 12);

    let month_filter = ReportFilter {
        year: Some(2024),
        month: Some(5),
        ..ReportFilter::default()
    };
    let summary = ReportService::summarize(&records, &month_filter);
    assert_eq!(summary.by_period.len(), 1);
    assert_eq!(summary.by_period[0].period, "May 2024");

    let range_filter = ReportFilter {
        year: Some(2024),
        start_date: Some("2024-01-01".parse().unwrap()),
        ..ReportFilter::default()
    };
    assert_eq!(ReportService::summarize(&records, &range_filter).by_period.len(), 1);
}
