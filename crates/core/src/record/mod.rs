//! Expense record domain types and validation.

mod types;
mod validation;

pub use types::{Category, CategoryKind, ExpenseRecord};
pub use validation::RecordError;
