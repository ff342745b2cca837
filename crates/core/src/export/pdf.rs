//! Paginated-document formatter.
//!
//! Renders the multi-section tax report: a cover/executive-summary page, a
//! detailed ledger iterating periods chronologically (categories alphabetical
//! within a period, records in selected order within a category), and a
//! certification section with a signature block. A vertical cursor tracks
//! remaining space and starts a new page before any section header, category
//! block, record row or the certification block would not fit, so no table
//! header is ever split across a page break.

use std::collections::BTreeSet;

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use rust_decimal::Decimal;

use crate::report::engine::month_year_label;
use crate::report::service::ReportMeta;
use crate::report::types::{Bucket, ExpenseLine, ExpenseSummary};

use super::ExportError;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 14.0;
const LINE_HEIGHT: f32 = 6.0;

// Page-break thresholds: presentation tuning constants, chosen so that a
// header and at least one row always land on the same page.
const MONTH_HEADER_SPACE: f32 = 34.0;
const CATEGORY_HEADER_SPACE: f32 = 22.0;
const ROW_SPACE: f32 = 10.0;
const CERTIFICATION_SPACE: f32 = 70.0;

// Truncation widths for the ledger columns.
const MERCHANT_WIDTH: usize = 24;
const NOTES_WIDTH: usize = 34;

// Ledger column x positions (mm).
const COL_DATE: f32 = MARGIN;
const COL_MERCHANT: f32 = 40.0;
const COL_NOTES: f32 = 90.0;
const COL_PRE_TAX: f32 = 138.0;
const COL_TAX: f32 = 160.0;
const COL_TOTAL: f32 = 182.0;

/// Renders the paginated report and returns the PDF bytes.
pub fn render_document(
    lines: &[ExpenseLine],
    summary: &ExpenseSummary,
    meta: &ReportMeta,
) -> Result<Vec<u8>, ExportError> {
    let mut writer = PageWriter::new("Tax Expense Report")?;

    write_cover(&mut writer, summary, meta);
    write_ledger(&mut writer, lines, summary);
    write_certification(&mut writer, summary, meta);

    writer.finish()
}

struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self, ExportError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ExportError::Document(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ExportError::Document(e.to_string()))?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            font,
            bold,
            y: PAGE_HEIGHT - MARGIN,
        })
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    /// Breaks the page when fewer than `needed` millimetres remain.
    fn ensure_space(&mut self, needed: f32) {
        if self.y - MARGIN < needed {
            self.new_page();
        }
    }

    fn text(&self, x: f32, size: f32, content: &str) {
        self.layer
            .use_text(content, size, Mm(x), Mm(self.y), &self.font);
    }

    fn text_bold(&self, x: f32, size: f32, content: &str) {
        self.layer
            .use_text(content, size, Mm(x), Mm(self.y), &self.bold);
    }

    fn advance(&mut self, height: f32) {
        self.y -= height;
    }

    fn finish(self) -> Result<Vec<u8>, ExportError> {
        self.doc
            .save_to_bytes()
            .map_err(|e| ExportError::Document(e.to_string()))
    }
}

fn write_cover(writer: &mut PageWriter, summary: &ExpenseSummary, meta: &ReportMeta) {
    writer.advance(8.0);
    writer.text_bold(MARGIN, 18.0, "TAX EXPENSE REPORT");
    writer.advance(10.0);

    writer.text(MARGIN, 10.0, &format!("Period: {}", meta.period));
    writer.advance(LINE_HEIGHT);
    if let Some(owner) = &meta.owner {
        writer.text(MARGIN, 10.0, &format!("Profile: {owner}"));
        writer.advance(LINE_HEIGHT);
    }
    writer.text(MARGIN, 10.0, &format!("Generated: {}", meta.generated_on));
    writer.advance(12.0);

    writer.text_bold(MARGIN, 13.0, "EXECUTIVE SUMMARY");
    writer.advance(8.0);
    let rows = [
        ("Total records", summary.record_count.to_string()),
        ("Categories", summary.distinct_category_count().to_string()),
        ("Total (pre-tax)", format_money(summary.total_pre_tax())),
        ("Total tax", format_money(summary.total_tax)),
        ("Total amount", format_money(summary.total_amount)),
    ];
    for (label, value) in rows {
        writer.text(MARGIN, 10.0, label);
        writer.text(COL_NOTES, 10.0, &value);
        writer.advance(LINE_HEIGHT);
    }
    if let Some(top) = summary.top_category() {
        writer.text(MARGIN, 10.0, "Top category");
        writer.text(
            COL_NOTES,
            10.0,
            &format!("{} ({})", top.category, format_money(top.bucket.total)),
        );
        writer.advance(LINE_HEIGHT);
    }
    writer.advance(8.0);

    writer.text_bold(MARGIN, 13.0, "EXPENSE BREAKDOWN BY CATEGORY");
    writer.advance(8.0);
    write_breakdown_header(writer);
    for category in &summary.by_category {
        writer.ensure_space(ROW_SPACE);
        writer.text(MARGIN, 9.0, &truncate(&category.category, 30));
        write_amount_columns(writer, false, category.bucket.count, &category.bucket);
        writer.advance(LINE_HEIGHT);
    }
    writer.ensure_space(ROW_SPACE);
    writer.text_bold(MARGIN, 9.0, "TOTAL");
    let grand = Bucket {
        total: summary.total_amount,
        tax: summary.total_tax,
        count: summary.record_count,
    };
    write_amount_columns(writer, true, summary.record_count, &grand);
    writer.advance(LINE_HEIGHT);
}

fn write_ledger(writer: &mut PageWriter, lines: &[ExpenseLine], summary: &ExpenseSummary) {
    writer.ensure_space(MONTH_HEADER_SPACE);
    writer.advance(6.0);
    writer.text_bold(MARGIN, 13.0, "DETAILED EXPENSE LEDGER");
    writer.advance(10.0);

    // summary.by_period carries the chronological month-year axis.
    for period in &summary.by_period {
        let period_lines: Vec<&ExpenseLine> = lines
            .iter()
            .filter(|line| month_year_label(line.date) == period.period)
            .collect();
        if period_lines.is_empty() {
            continue;
        }

        writer.ensure_space(MONTH_HEADER_SPACE);
        writer.text_bold(MARGIN, 12.0, &period.period.to_uppercase());
        writer.advance(8.0);

        let categories: BTreeSet<&str> = period_lines
            .iter()
            .map(|line| line.category.as_str())
            .collect();

        for category in categories {
            writer.ensure_space(CATEGORY_HEADER_SPACE);
            writer.text_bold(MARGIN + 2.0, 10.0, category);
            writer.advance(LINE_HEIGHT);
            write_row_header(writer);

            for line in period_lines.iter().filter(|l| l.category == category) {
                writer.ensure_space(ROW_SPACE);
                writer.text(COL_DATE, 9.0, &line.date.to_string());
                writer.text(COL_MERCHANT, 9.0, &truncate(&line.merchant, MERCHANT_WIDTH));
                writer.text(
                    COL_NOTES,
                    9.0,
                    &truncate(line.notes.as_deref().unwrap_or(""), NOTES_WIDTH),
                );
                writer.text(COL_PRE_TAX, 9.0, &format_money(line.pre_tax()));
                writer.text(COL_TAX, 9.0, &format_money(line.tax));
                writer.text(COL_TOTAL, 9.0, &format_money(line.total));
                writer.advance(LINE_HEIGHT);
            }

            let subtotal = pair_bucket(summary, &period.period, category);
            writer.ensure_space(ROW_SPACE);
            writer.text_bold(COL_MERCHANT, 9.0, &format!("{category} subtotal"));
            writer.text_bold(COL_PRE_TAX, 9.0, &format_money(subtotal.pre_tax()));
            writer.text_bold(COL_TAX, 9.0, &format_money(subtotal.tax));
            writer.text_bold(COL_TOTAL, 9.0, &format_money(subtotal.total));
            writer.advance(8.0);
        }

        writer.ensure_space(ROW_SPACE);
        writer.text_bold(MARGIN, 10.0, &format!("{} TOTAL", period.period.to_uppercase()));
        writer.text_bold(COL_PRE_TAX, 10.0, &format_money(period.bucket.pre_tax()));
        writer.text_bold(COL_TAX, 10.0, &format_money(period.bucket.tax));
        writer.text_bold(COL_TOTAL, 10.0, &format_money(period.bucket.total));
        writer.advance(10.0);
    }
}

fn write_certification(writer: &mut PageWriter, summary: &ExpenseSummary, meta: &ReportMeta) {
    writer.ensure_space(CERTIFICATION_SPACE);
    writer.advance(6.0);
    writer.text_bold(MARGIN, 13.0, "CERTIFICATION");
    writer.advance(10.0);

    writer.text(
        MARGIN,
        10.0,
        &format!(
            "I certify that the {} expense records listed in this report, totalling {} ({} pre-tax, {} tax),",
            summary.record_count,
            format_money(summary.total_amount),
            format_money(summary.total_pre_tax()),
            format_money(summary.total_tax),
        ),
    );
    writer.advance(LINE_HEIGHT);
    writer.text(
        MARGIN,
        10.0,
        &format!(
            "are true and accurate business expenses for the period {}.",
            meta.period
        ),
    );
    writer.advance(18.0);

    writer.text(MARGIN, 10.0, "Signature: ______________________________");
    writer.advance(12.0);
    writer.text(MARGIN, 10.0, "Name:      ______________________________");
    writer.advance(12.0);
    writer.text(MARGIN, 10.0, "Date:      ______________________________");
    writer.advance(LINE_HEIGHT);
}

fn write_breakdown_header(writer: &mut PageWriter) {
    writer.text_bold(MARGIN, 9.0, "Category");
    writer.text_bold(COL_NOTES, 9.0, "Records");
    writer.text_bold(COL_PRE_TAX, 9.0, "Pre-Tax");
    writer.text_bold(COL_TAX, 9.0, "Tax");
    writer.text_bold(COL_TOTAL, 9.0, "Total");
    writer.advance(LINE_HEIGHT);
}

fn write_row_header(writer: &mut PageWriter) {
    writer.text(COL_DATE, 8.0, "Date");
    writer.text(COL_MERCHANT, 8.0, "Merchant");
    writer.text(COL_NOTES, 8.0, "Description");
    writer.text(COL_PRE_TAX, 8.0, "Pre-Tax");
    writer.text(COL_TAX, 8.0, "Tax");
    writer.text(COL_TOTAL, 8.0, "Total");
    writer.advance(LINE_HEIGHT);
}

fn write_amount_columns(writer: &PageWriter, bold: bool, count: usize, bucket: &Bucket) {
    let cells = [
        (COL_NOTES, count.to_string()),
        (COL_PRE_TAX, format_money(bucket.pre_tax())),
        (COL_TAX, format_money(bucket.tax)),
        (COL_TOTAL, format_money(bucket.total)),
    ];
    for (x, value) in cells {
        if bold {
            writer.text_bold(x, 9.0, &value);
        } else {
            writer.text(x, 9.0, &value);
        }
    }
}

fn pair_bucket(summary: &ExpenseSummary, period: &str, category: &str) -> Bucket {
    summary
        .by_period_and_category
        .iter()
        .find(|b| b.period == period && b.category == category)
        .map_or_else(Bucket::default, |b| b.bucket)
}

fn format_money(value: Decimal) -> String {
    format!("{value:.2}")
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}
