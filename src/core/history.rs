//! Invoice history - Append-only audit log of status changes.

use crate::{
    entities::{InvoiceHistory, InvoiceStatus, invoice_history},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};

/// Actor recorded for changes made by the overdue scan.
pub const SYSTEM_ACTOR: &str = "system";

/// Appends a history entry for an invoice.
pub async fn create_history_entry<C>(
    db: &C,
    invoice_id: i64,
    status: InvoiceStatus,
    description: String,
    created_by: String,
) -> Result<invoice_history::Model>
where
    C: ConnectionTrait,
{
    if created_by.trim().is_empty() {
        return Err(Error::Validation {
            field: "created_by",
            message: "must not be empty".to_string(),
        });
    }
    crate::core::invoice::require_invoice(db, invoice_id).await?;

    let model = invoice_history::ActiveModel {
        invoice_id: Set(invoice_id),
        status: Set(status),
        description: Set(description),
        created_by: Set(created_by),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}

/// Retrieves the history of an invoice, newest entry first.
pub async fn get_history_for_invoice<C>(
    db: &C,
    invoice_id: i64,
) -> Result<Vec<invoice_history::Model>>
where
    C: ConnectionTrait,
{
    InvoiceHistory::find()
        .filter(invoice_history::Column::InvoiceId.eq(invoice_id))
        .order_by_desc(invoice_history::Column::CreatedAt)
        .order_by_desc(invoice_history::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a single history entry, or None if it doesn't exist.
pub async fn get_history_entry_by_id<C>(
    db: &C,
    entry_id: i64,
) -> Result<Option<invoice_history::Model>>
where
    C: ConnectionTrait,
{
    InvoiceHistory::find_by_id(entry_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the most recent history entry of an invoice.
pub async fn get_last_history_entry<C>(
    db: &C,
    invoice_id: i64,
) -> Result<Option<invoice_history::Model>>
where
    C: ConnectionTrait,
{
    InvoiceHistory::find()
        .filter(invoice_history::Column::InvoiceId.eq(invoice_id))
        .order_by_desc(invoice_history::Column::CreatedAt)
        .order_by_desc(invoice_history::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}
