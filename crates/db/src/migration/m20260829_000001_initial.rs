//! Initial database migration.
//!
//! Creates the expense_records table, its indexes, and the updated_at trigger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(EXPENSE_RECORDS_SQL).await?;
        db.execute_unprepared(INDEXES_SQL).await?;
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const EXPENSE_RECORDS_SQL: &str = r"
CREATE TABLE expense_records (
    id UUID PRIMARY KEY,
    owner VARCHAR(100) NOT NULL,
    image_key VARCHAR(500),
    merchant VARCHAR(255) NOT NULL,
    transaction_date DATE NOT NULL,
    amount NUMERIC(15, 2) NOT NULL,
    tax NUMERIC(15, 2),
    category VARCHAR(100) NOT NULL,
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_amount_not_negative CHECK (amount >= 0),
    CONSTRAINT chk_tax_within_amount CHECK (tax IS NULL OR (tax >= 0 AND tax <= amount))
);
";

const INDEXES_SQL: &str = r"
CREATE INDEX idx_expense_records_owner ON expense_records(owner);
CREATE INDEX idx_expense_records_date ON expense_records(transaction_date DESC);
CREATE INDEX idx_expense_records_owner_date ON expense_records(owner, transaction_date DESC);
CREATE INDEX idx_expense_records_category ON expense_records(category);
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = NOW();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_expense_records_updated_at
    BEFORE UPDATE ON expense_records
    FOR EACH ROW
    EXECUTE FUNCTION set_updated_at();
";

const DROP_ALL_SQL: &str = r"
DROP TRIGGER IF EXISTS trg_expense_records_updated_at ON expense_records;
DROP FUNCTION IF EXISTS set_updated_at();
DROP TABLE IF EXISTS expense_records;
";
