//! Expense record repository for database operations.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use kvitto_core::record::{Category, ExpenseRecord};

use crate::entities::expense_records;

/// Errors raised by the record repository.
#[derive(Debug, thiserror::Error)]
pub enum RecordRepoError {
    /// No record with the given id exists for the owner.
    #[error("expense record not found: {0}")]
    NotFound(Uuid),

    /// Underlying database error.
    #[error("database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for RecordRepoError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

/// Expense record repository.
///
/// Every read is scoped to an owner tag; filtering beyond owner (dates,
/// category, merchant search) happens in `kvitto_core::filter` so the
/// predicate has a single definition.
#[derive(Debug, Clone)]
pub struct RecordRepository {
    db: Arc<DatabaseConnection>,
}

impl RecordRepository {
    /// Create a new record repository over a shared connection.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a new expense record.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert(&self, record: &ExpenseRecord) -> Result<ExpenseRecord, RecordRepoError> {
        let model = to_active_model(record).insert(self.db.as_ref()).await?;
        Ok(to_domain(model))
    }

    /// Replace all mutable fields of an existing record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the record does not exist for the owner.
    pub async fn update(&self, record: &ExpenseRecord) -> Result<ExpenseRecord, RecordRepoError> {
        let existing = expense_records::Entity::find_by_id(record.id)
            .filter(expense_records::Column::Owner.eq(record.owner.as_str()))
            .one(self.db.as_ref())
            .await?
            .ok_or(RecordRepoError::NotFound(record.id))?;

        let mut active: expense_records::ActiveModel = existing.into();
        active.image_key = Set(record.image_key.clone());
        active.merchant = Set(record.merchant.clone());
        active.transaction_date = Set(record.transaction_date);
        active.amount = Set(record.amount);
        active.tax = Set(record.tax);
        active.category = Set(record.category.label().to_string());
        active.notes = Set(record.notes.clone());

        let model = active.update(self.db.as_ref()).await?;
        Ok(to_domain(model))
    }

    /// Set the receipt image key on a record after a confirmed upload.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the record does not exist for the owner.
    pub async fn set_image_key(
        &self,
        id: Uuid,
        owner: &str,
        image_key: Option<String>,
    ) -> Result<ExpenseRecord, RecordRepoError> {
        let existing = expense_records::Entity::find_by_id(id)
            .filter(expense_records::Column::Owner.eq(owner))
            .one(self.db.as_ref())
            .await?
            .ok_or(RecordRepoError::NotFound(id))?;

        let mut active: expense_records::ActiveModel = existing.into();
        active.image_key = Set(image_key);

        let model = active.update(self.db.as_ref()).await?;
        Ok(to_domain(model))
    }

    /// Find a record by id, scoped to an owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_id(
        &self,
        id: Uuid,
        owner: &str,
    ) -> Result<Option<ExpenseRecord>, RecordRepoError> {
        let model = expense_records::Entity::find_by_id(id)
            .filter(expense_records::Column::Owner.eq(owner))
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(to_domain))
    }

    /// List records, newest transaction first.
    ///
    /// With an owner, the query narrows to that owner's records; without one,
    /// all records are returned (cross-owner reports).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(&self, owner: Option<&str>) -> Result<Vec<ExpenseRecord>, RecordRepoError> {
        let mut query = expense_records::Entity::find();
        if let Some(owner) = owner {
            query = query.filter(expense_records::Column::Owner.eq(owner));
        }

        let models = query
            .order_by_desc(expense_records::Column::TransactionDate)
            .order_by_desc(expense_records::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(to_domain).collect())
    }

    /// Delete a record, scoped to an owner.
    ///
    /// Returns whether a record was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete(&self, id: Uuid, owner: &str) -> Result<bool, RecordRepoError> {
        let result = expense_records::Entity::delete_many()
            .filter(expense_records::Column::Id.eq(id))
            .filter(expense_records::Column::Owner.eq(owner))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected > 0)
    }
}

fn to_active_model(record: &ExpenseRecord) -> expense_records::ActiveModel {
    expense_records::ActiveModel {
        id: Set(record.id),
        owner: Set(record.owner.clone()),
        image_key: Set(record.image_key.clone()),
        merchant: Set(record.merchant.clone()),
        transaction_date: Set(record.transaction_date),
        amount: Set(record.amount),
        tax: Set(record.tax),
        category: Set(record.category.label().to_string()),
        notes: Set(record.notes.clone()),
        ..Default::default()
    }
}

fn to_domain(model: expense_records::Model) -> ExpenseRecord {
    ExpenseRecord {
        id: model.id,
        owner: model.owner,
        image_key: model.image_key,
        merchant: model.merchant,
        transaction_date: model.transaction_date,
        amount: model.amount,
        tax: model.tax,
        category: Category::from_label(&model.category),
        notes: model.notes,
    }
}
