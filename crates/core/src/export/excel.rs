//! Spreadsheet-style formatter.
//!
//! One detail sheet with a row per record (sortable/filterable by every
//! column) plus two derived summary sheets, one per month-year label and one
//! per category sorted descending by total.

use chrono::Datelike;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::report::engine::{month_label, month_year_label};
use crate::report::types::{ExpenseLine, ExpenseSummary};

use super::ExportError;

const DETAIL_SHEET: &str = "Expenses";
const MONTH_SHEET: &str = "By Month";
const CATEGORY_SHEET: &str = "By Category";

const DETAIL_HEADERS: [&str; 10] = [
    "Year",
    "Month",
    "Month-Year",
    "Date",
    "Category",
    "Merchant",
    "Pre-Tax",
    "Tax",
    "Total",
    "Notes",
];

/// Renders the workbook and returns its bytes.
///
/// The per-record triples and the summary-sheet totals come straight from
/// the engine's lines and buckets, so they match the JSON summary and the
/// PDF for the same filtered set.
pub fn render_workbook(
    lines: &[ExpenseLine],
    summary: &ExpenseSummary,
) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let money_format = Format::new().set_num_format("#,##0.00");

    write_detail_sheet(workbook.add_worksheet(), lines, &header_format, &money_format)?;
    write_month_sheet(workbook.add_worksheet(), summary, &header_format, &money_format)?;
    write_category_sheet(workbook.add_worksheet(), summary, &header_format, &money_format)?;

    Ok(workbook.save_to_buffer()?)
}

fn write_detail_sheet(
    sheet: &mut Worksheet,
    lines: &[ExpenseLine],
    header_format: &Format,
    money_format: &Format,
) -> Result<(), ExportError> {
    sheet.set_name(DETAIL_SHEET)?;

    for (col, header) in DETAIL_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col_index(col), *header, header_format)?;
    }

    for (i, line) in lines.iter().enumerate() {
        let row = row_index(i + 1);
        sheet.write_number(row, 0, f64::from(line.date.year()))?;
        sheet.write_string(row, 1, month_label(line.date))?;
        sheet.write_string(row, 2, month_year_label(line.date))?;
        sheet.write_string(row, 3, line.date.to_string())?;
        sheet.write_string(row, 4, &line.category)?;
        sheet.write_string(row, 5, &line.merchant)?;
        sheet.write_number_with_format(row, 6, money(line.pre_tax()), money_format)?;
        sheet.write_number_with_format(row, 7, money(line.tax), money_format)?;
        sheet.write_number_with_format(row, 8, money(line.total), money_format)?;
        sheet.write_string(row, 9, line.notes.as_deref().unwrap_or(""))?;
    }

    sheet.autofilter(0, 0, row_index(lines.len()), 9)?;
    sheet.set_column_width(3, 12)?;
    sheet.set_column_width(4, 18)?;
    sheet.set_column_width(5, 24)?;
    sheet.set_column_width(9, 32)?;
    Ok(())
}

fn write_month_sheet(
    sheet: &mut Worksheet,
    summary: &ExpenseSummary,
    header_format: &Format,
    money_format: &Format,
) -> Result<(), ExportError> {
    sheet.set_name(MONTH_SHEET)?;
    write_summary_headers(sheet, "Month-Year", header_format)?;

    // Chronological: the engine already sorted the month-year axis.
    for (i, period) in summary.by_period.iter().enumerate() {
        let row = row_index(i + 1);
        sheet.write_string(row, 0, &period.period)?;
        write_bucket_cells(sheet, row, period.bucket.count, period.bucket.pre_tax(),
            period.bucket.tax, period.bucket.total, money_format)?;
    }
    sheet.set_column_width(0, 18)?;
    Ok(())
}

fn write_category_sheet(
    sheet: &mut Worksheet,
    summary: &ExpenseSummary,
    header_format: &Format,
    money_format: &Format,
) -> Result<(), ExportError> {
    sheet.set_name(CATEGORY_SHEET)?;
    write_summary_headers(sheet, "Category", header_format)?;

    // Descending by total, ties in first-seen order (engine ordering).
    for (i, category) in summary.by_category.iter().enumerate() {
        let row = row_index(i + 1);
        sheet.write_string(row, 0, &category.category)?;
        write_bucket_cells(sheet, row, category.bucket.count, category.bucket.pre_tax(),
            category.bucket.tax, category.bucket.total, money_format)?;
    }
    sheet.set_column_width(0, 22)?;
    Ok(())
}

fn write_summary_headers(
    sheet: &mut Worksheet,
    key_header: &str,
    header_format: &Format,
) -> Result<(), ExportError> {
    for (col, header) in [key_header, "Count", "Pre-Tax", "Tax", "Total"].iter().enumerate() {
        sheet.write_string_with_format(0, col_index(col), *header, header_format)?;
    }
    Ok(())
}

fn write_bucket_cells(
    sheet: &mut Worksheet,
    row: u32,
    count: usize,
    pre_tax: Decimal,
    tax: Decimal,
    total: Decimal,
    money_format: &Format,
) -> Result<(), ExportError> {
    #[allow(clippy::cast_precision_loss)]
    sheet.write_number(row, 1, count as f64)?;
    sheet.write_number_with_format(row, 2, money(pre_tax), money_format)?;
    sheet.write_number_with_format(row, 3, money(tax), money_format)?;
    sheet.write_number_with_format(row, 4, money(total), money_format)?;
    Ok(())
}

fn money(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

#[allow(clippy::cast_possible_truncation)]
fn row_index(i: usize) -> u32 {
    i as u32
}

#[allow(clippy::cast_possible_truncation)]
fn col_index(i: usize) -> u16 {
    i as u16
}

#[cfg(test)]
#[allow(clippy::float_arithmetic, clippy::cast_possible_truncation)]
mod tests {
    use super::*;
    use crate::record::{Category, ExpenseRecord};
    use crate::report::engine::{aggregate_by_month_year, expense_lines};
    use calamine::{Data, Reader, Xlsx};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

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
            notes: Some("line items".to_string()),
        }
    }

    fn cents(range: &calamine::Range<Data>, row: u32, col: u32) -> i64 {
        match range.get_value((row, col)) {
            Some(Data::Float(f)) => (f * 100.0).round() as i64,
            other => panic!("expected numeric cell at ({row},{col}), got {other:?}"),
        }
    }

    fn text(range: &calamine::Range<Data>, row: u32, col: u32) -> String {
        match range.get_value((row, col)) {
            Some(Data::String(s)) => s.clone(),
            other => panic!("expected text cell at ({row},{col}), got {other:?}"),
        }
    }

    #[test]
    fn test_detail_sheet_round_trips_per_record_triples() {
        let records = vec![
            record("A", dec!(105.00), None, "2024-01-15", "Food"),
            record("B", dec!(50.00), Some(dec!(10.00)), "2024-02-10", "Travel"),
        ];
        let lines = expense_lines(&records);
        let summary = aggregate_by_month_year(&lines);
        let bytes = render_workbook(&lines, &summary).unwrap();

        let mut workbook = Xlsx::new(std::io::Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range("Expenses").unwrap();

        // Re-parsed triples must reproduce the engine's lines exactly.
        for (i, line) in lines.iter().enumerate() {
            let row = (i + 1) as u32;
            let to_cents = |d: Decimal| (d * dec!(100)).to_i64().unwrap_or(0);
            assert_eq!(cents(&range, row, 6), to_cents(line.pre_tax()));
            assert_eq!(cents(&range, row, 7), to_cents(line.tax));
            assert_eq!(cents(&range, row, 8), to_cents(line.total));
            assert_eq!(text(&range, row, 5), line.merchant);
            assert_eq!(text(&range, row, 4), line.category);
        }

        // Derived scenario values: 105.00 splits into 100.00 + 5.00.
        assert_eq!(cents(&range, 1, 6), 10_000);
        assert_eq!(cents(&range, 1, 7), 500);
        assert_eq!(text(&range, 1, 2), "January 2024");
    }

    #[test]
    fn test_category_sheet_sorted_descending_by_total() {
        let records = vec![
            record("B", dec!(50.00), Some(dec!(10.00)), "2024-02-10", "Travel"),
            record("A", dec!(105.00), None, "2024-01-15", "Food"),
        ];
        let lines = expense_lines(&records);
        let summary = aggregate_by_month_year(&lines);
        let bytes = render_workbook(&lines, &summary).unwrap();

        let mut workbook = Xlsx::new(std::io::Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range("By Category").unwrap();

        assert_eq!(text(&range, 1, 0), "Food");
        assert_eq!(cents(&range, 1, 4), 10_500);
        assert_eq!(text(&range, 2, 0), "Travel");
        assert_eq!(cents(&range, 2, 4), 5_000);
    }

    #[test]
    fn test_month_sheet_chronological_with_totals() {
        let records = vec![
            record("A", dec!(10.00), None, "2024-02-01", "Meals"),
            record("B", dec!(20.00), None, "2023-12-15", "Meals"),
        ];
        let lines = expense_lines(&records);
        let summary = aggregate_by_month_year(&lines);
        let bytes = render_workbook(&lines, &summary).unwrap();

        let mut workbook = Xlsx::new(std::io::Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range("By Month").unwrap();

        assert_eq!(text(&range, 1, 0), "December 2023");
        assert_eq!(text(&range, 2, 0), "February 2024");
        assert_eq!(cents(&range, 1, 4), 2_000);
    }

    #[test]
    fn test_empty_record_set_renders_header_only_workbook() {
        let lines = expense_lines(&[]);
        let summary = aggregate_by_month_year(&lines);
        let bytes = render_workbook(&lines, &summary).unwrap();

        let mut workbook = Xlsx::new(std::io::Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range("Expenses").unwrap();
        assert_eq!(text(&range, 0, 0), "Year");
        assert_eq!(text(&range, 0, 9), "Notes");
    }

    #[test]
    fn test_detail_sheet_has_expected_labels() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let records = vec![record("A", dec!(21.00), None, &date.to_string(), "Fuel")];
        let lines = expense_lines(&records);
        let summary = aggregate_by_month_year(&lines);
        let bytes = render_workbook(&lines, &summary).unwrap();

        let mut workbook = Xlsx::new(std::io::Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range("Expenses").unwrap();

        assert_eq!(cents(&range, 1, 0), 2024 * 100);
        assert_eq!(text(&range, 1, 1), "March");
        assert_eq!(text(&range, 1, 2), "March 2024");
        assert_eq!(text(&range, 1, 3), "2024-03-05");
    }
}
