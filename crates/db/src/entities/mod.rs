//! `SeaORM` entity definitions.

pub mod expense_records;
