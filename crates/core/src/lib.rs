//! Core business logic for Kvitto.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `record` - Expense record domain types and validation
//! - `tax` - Derived-tax heuristic for receipts without a captured tax line
//! - `filter` - Report filter validation and record selection
//! - `report` - Single-pass aggregation engine and summary service
//! - `export` - Excel workbook and paginated PDF renderers
//! - `vision` - Receipt field extraction via an external vision model
//! - `storage` - Receipt image storage (OpenDAL)

pub mod export;
pub mod filter;
pub mod record;
pub mod report;
pub mod storage;
pub mod tax;
pub mod vision;
