//! Payment reminders - Records of reminder dispatches per invoice.
//!
//! Sending the reminder is somebody else's job; only the attempt is stored.

use crate::{
    entities::{PaymentReminder, payment_reminder},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::debug;

/// Records that a reminder was dispatched for an invoice.
pub async fn create_reminder<C>(
    db: &C,
    invoice_id: i64,
    reminder_type: String,
    status: String,
) -> Result<payment_reminder::Model>
where
    C: ConnectionTrait,
{
    if reminder_type.trim().is_empty() {
        return Err(Error::Validation {
            field: "reminder_type",
            message: "must not be empty".to_string(),
        });
    }
    if status.trim().is_empty() {
        return Err(Error::Validation {
            field: "status",
            message: "must not be empty".to_string(),
        });
    }
    crate::core::invoice::require_invoice(db, invoice_id).await?;

    let model = payment_reminder::ActiveModel {
        invoice_id: Set(invoice_id),
        reminder_type: Set(reminder_type),
        status: Set(status),
        sent_at: Set(Utc::now()),
        ..Default::default()
    };

    let created = model.insert(db).await?;
    debug!(
        reminder_id = created.id,
        invoice_id,
        reminder_type = %created.reminder_type,
        "reminder recorded"
    );
    Ok(created)
}

/// Retrieves the reminders of an invoice, most recent first.
pub async fn get_reminders_for_invoice<C>(
    db: &C,
    invoice_id: i64,
) -> Result<Vec<payment_reminder::Model>>
where
    C: ConnectionTrait,
{
    PaymentReminder::find()
        .filter(payment_reminder::Column::InvoiceId.eq(invoice_id))
        .order_by_desc(payment_reminder::Column::SentAt)
        .order_by_desc(payment_reminder::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific reminder by its ID, or None if it doesn't exist.
pub async fn get_reminder_by_id<C>(db: &C, reminder_id: i64) -> Result<Option<payment_reminder::Model>>
where
    C: ConnectionTrait,
{
    PaymentReminder::find_by_id(reminder_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the latest reminder sent for an invoice.
pub async fn get_last_reminder<C>(
    db: &C,
    invoice_id: i64,
) -> Result<Option<payment_reminder::Model>>
where
    C: ConnectionTrait,
{
    PaymentReminder::find()
        .filter(payment_reminder::Column::InvoiceId.eq(invoice_id))
        .order_by_desc(payment_reminder::Column::SentAt)
        .order_by_desc(payment_reminder::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::Month;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_reminder_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_reminder(&db, 1, String::new(), "SENT".to_string()).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Validation {
                field: "reminder_type",
                ..
            }
        ));

        let result = create_reminder(&db, 1, "SMS".to_string(), "  ".to_string()).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Validation {
                field: "status",
                ..
            }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_last_reminder_wins() -> Result<()> {
        let db = setup_test_db().await?;
        let invoice = create_test_invoice(&db, "student-1", "course-1", Month::Fevereiro).await?;

        assert!(get_last_reminder(&db, invoice.id).await?.is_none());

        create_reminder(&db, invoice.id, "EMAIL".to_string(), "FAILED".to_string()).await?;
        let retry = create_reminder(&db, invoice.id, "SMS".to_string(), "SENT".to_string()).await?;

        let last = get_last_reminder(&db, invoice.id).await?.unwrap();
        assert_eq!(last.id, retry.id);
        assert_eq!(last.reminder_type, "SMS");
        assert_eq!(get_reminders_for_invoice(&db, invoice.id).await?.len(), 2);
        assert!(get_reminder_by_id(&db, retry.id).await?.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn test_reminder_for_unknown_invoice() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_reminder(&db, 77, "EMAIL".to_string(), "SENT".to_string()).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvoiceNotFound { id: 77 }
        ));

        Ok(())
    }
}
