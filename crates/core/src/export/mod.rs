//! Report export renderers.
//!
//! Both renderers consume the aggregation engine's lines and buckets; they
//! never re-derive the tax split. Each builds its entire artifact in memory
//! before emitting bytes, which is the documented scaling limit for very
//! large record sets.

pub mod excel;

// Page geometry is the one place floats are acceptable: millimetres and
// font sizes, never money.
#[allow(clippy::float_arithmetic, clippy::cast_precision_loss)]
pub mod pdf;

use thiserror::Error;

/// Export rendering errors.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The workbook could not be rendered.
    #[error("Spreadsheet rendering failed: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    /// The PDF document could not be rendered.
    #[error("Document rendering failed: {0}")]
    Document(String),
}
