//! Database connection and schema bootstrap.
//!
//! Tables are generated from the entity definitions with `SeaORM`'s
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! models. The one constraint entities cannot express, a unique billing period
//! that ignores cancelled invoices, is added as a partial index afterwards.

use crate::entities::{Invoice, InvoiceHistory, LateFee, Payment, PaymentReminder};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};

const BILLING_PERIOD_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS \
     idx_invoices_live_billing_period \
     ON invoices (student_id, course_id, month, year) \
     WHERE status <> 'CANCELLED'";

/// Opens a connection to the database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    Database::connect(database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates every billing table and the billing period index if they don't exist yet.
///
/// Invoices are created first since every other table references them.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Invoice).await?;
    create_table(db, &schema, Payment).await?;
    create_table(db, &schema, LateFee).await?;
    create_table(db, &schema, InvoiceHistory).await?;
    create_table(db, &schema, PaymentReminder).await?;

    db.execute_unprepared(BILLING_PERIOD_INDEX).await?;

    Ok(())
}
