//! Payment business logic - The payment ledger.
//!
//! Records money received against invoices. The ledger never reads or writes
//! invoice status: marking an invoice as paid is a separate, explicit action.

use crate::{
    core::late_fee::MAX_AMOUNT,
    entities::{Payment, PaymentMethod, payment},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::debug;

/// Fields required to record a payment.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    /// Invoice being paid
    pub invoice_id: i64,
    /// Amount received
    pub amount: f64,
    /// How it was received
    pub payment_method: PaymentMethod,
    /// When it was received; defaults to now
    pub payment_date: Option<DateTime<Utc>>,
    /// External reference
    pub reference: Option<String>,
    /// Free-text note
    pub description: Option<String>,
}

/// Corrections allowed on a recorded payment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentChanges {
    /// Corrected amount
    pub amount: Option<f64>,
    /// Corrected method
    pub payment_method: Option<PaymentMethod>,
    /// Corrected reference
    pub reference: Option<String>,
    /// Corrected description
    pub description: Option<String>,
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 || amount > MAX_AMOUNT {
        return Err(Error::InvalidAmount {
            field: "payment",
            amount,
        });
    }
    Ok(())
}

/// Records a payment against an existing invoice.
pub async fn create_payment<C>(db: &C, new_payment: NewPayment) -> Result<payment::Model>
where
    C: ConnectionTrait,
{
    validate_amount(new_payment.amount)?;
    crate::core::invoice::require_invoice(db, new_payment.invoice_id).await?;

    let model = payment::ActiveModel {
        invoice_id: Set(new_payment.invoice_id),
        amount: Set(new_payment.amount),
        payment_method: Set(new_payment.payment_method),
        payment_date: Set(new_payment.payment_date.unwrap_or_else(Utc::now)),
        reference: Set(new_payment.reference),
        description: Set(new_payment.description),
        ..Default::default()
    };

    let created = model.insert(db).await?;
    debug!(
        payment_id = created.id,
        invoice_id = created.invoice_id,
        amount = created.amount,
        "payment recorded"
    );
    Ok(created)
}

/// Retrieves a specific payment by its ID, or None if it doesn't exist.
pub async fn get_payment_by_id<C>(db: &C, payment_id: i64) -> Result<Option<payment::Model>>
where
    C: ConnectionTrait,
{
    Payment::find_by_id(payment_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves payments for an invoice, most recent payment date first.
pub async fn get_payments_for_invoice<C>(db: &C, invoice_id: i64) -> Result<Vec<payment::Model>>
where
    C: ConnectionTrait,
{
    Payment::find()
        .filter(payment::Column::InvoiceId.eq(invoice_id))
        .order_by_desc(payment::Column::PaymentDate)
        .order_by_desc(payment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves every recorded payment.
pub async fn get_all_payments<C>(db: &C) -> Result<Vec<payment::Model>>
where
    C: ConnectionTrait,
{
    Payment::find()
        .order_by_desc(payment::Column::PaymentDate)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies corrections to a recorded payment.
pub async fn update_payment<C>(
    db: &C,
    payment_id: i64,
    changes: PaymentChanges,
) -> Result<payment::Model>
where
    C: ConnectionTrait,
{
    if let Some(amount) = changes.amount {
        validate_amount(amount)?;
    }

    let existing = get_payment_by_id(db, payment_id)
        .await?
        .ok_or(Error::PaymentNotFound { id: payment_id })?;

    let mut active_model: payment::ActiveModel = existing.into();
    if let Some(amount) = changes.amount {
        active_model.amount = Set(amount);
    }
    if let Some(method) = changes.payment_method {
        active_model.payment_method = Set(method);
    }
    if let Some(reference) = changes.reference {
        active_model.reference = Set(Some(reference));
    }
    if let Some(description) = changes.description {
        active_model.description = Set(Some(description));
    }

    active_model.update(db).await.map_err(Into::into)
}

/// Deletes a recorded payment.
pub async fn delete_payment<C>(db: &C, payment_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Payment::delete_by_id(payment_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::PaymentNotFound { id: payment_id });
    }
    Ok(())
}

/// Sums every payment recorded against an invoice; 0.0 when there are none.
pub async fn total_paid<C>(db: &C, invoice_id: i64) -> Result<f64>
where
    C: ConnectionTrait,
{
    let payments = get_payments_for_invoice(db, invoice_id).await?;
    Ok(payments.iter().map(|p| p.amount).sum())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::{InvoiceStatus, Month};
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_payment_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        for amount in [0.0, -25.0, f64::NAN, 1e307] {
            let result = create_payment(
                &db,
                NewPayment {
                    invoice_id: 1,
                    amount,
                    payment_method: PaymentMethod::Dinheiro,
                    payment_date: None,
                    reference: None,
                    description: None,
                },
            )
            .await;
            assert!(matches!(
                result.unwrap_err(),
                Error::InvalidAmount {
                    field: "payment",
                    ..
                }
            ));
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_payment_for_unknown_invoice_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_test_payment(&db, 42, 100.0).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvoiceNotFound { id: 42 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_total_paid_sums_partial_payments() -> Result<()> {
        let db = setup_test_db().await?;
        let invoice = create_test_invoice(&db, "student-1", "course-1", Month::Janeiro).await?;

        create_test_payment(&db, invoice.id, 100.0).await?;
        create_test_payment(&db, invoice.id, 50.0).await?;
        create_test_payment(&db, invoice.id, 25.0).await?;

        assert_eq!(total_paid(&db, invoice.id).await?, 175.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_total_paid_without_payments_is_zero() -> Result<()> {
        let db = setup_test_db().await?;
        let invoice = create_test_invoice(&db, "student-1", "course-1", Month::Janeiro).await?;

        assert_eq!(total_paid(&db, invoice.id).await?, 0.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_payments_do_not_touch_invoice_status() -> Result<()> {
        let db = setup_test_db().await?;
        let invoice = create_test_invoice(&db, "student-1", "course-1", Month::Janeiro).await?;

        create_test_payment(&db, invoice.id, invoice.amount).await?;

        let reloaded = crate::core::invoice::require_invoice(&db, invoice.id).await?;
        assert_eq!(reloaded.status, InvoiceStatus::Pending);

        Ok(())
    }

    #[tokio::test]
    async fn test_payments_ordered_by_date_desc() -> Result<()> {
        let db = setup_test_db().await?;
        let invoice = create_test_invoice(&db, "student-1", "course-1", Month::Janeiro).await?;

        for day in [3, 20, 11] {
            create_payment(
                &db,
                NewPayment {
                    invoice_id: invoice.id,
                    amount: 10.0,
                    payment_method: PaymentMethod::Transferencia,
                    payment_date: Some(fixed_time(2025, 1, day)),
                    reference: Some(format!("TRF-{day}")),
                    description: None,
                },
            )
            .await?;
        }

        let payments = get_payments_for_invoice(&db, invoice.id).await?;
        let days: Vec<_> = payments
            .iter()
            .map(|p| p.reference.clone().unwrap())
            .collect();
        assert_eq!(days, vec!["TRF-20", "TRF-11", "TRF-3"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_delete_payment() -> Result<()> {
        let db = setup_test_db().await?;
        let invoice = create_test_invoice(&db, "student-1", "course-1", Month::Janeiro).await?;
        let payment = create_test_payment(&db, invoice.id, 80.0).await?;

        let corrected = update_payment(
            &db,
            payment.id,
            PaymentChanges {
                amount: Some(85.0),
                payment_method: Some(PaymentMethod::CartaoDebito),
                reference: Some("POS-991".to_string()),
                description: None,
            },
        )
        .await?;
        assert_eq!(corrected.amount, 85.0);
        assert_eq!(corrected.payment_method, PaymentMethod::CartaoDebito);
        assert_eq!(corrected.reference.as_deref(), Some("POS-991"));
        assert_eq!(corrected.invoice_id, invoice.id);

        delete_payment(&db, payment.id).await?;
        assert!(get_payment_by_id(&db, payment.id).await?.is_none());
        assert!(matches!(
            delete_payment(&db, payment.id).await.unwrap_err(),
            Error::PaymentNotFound { .. }
        ));
        assert!(get_all_payments(&db).await?.is_empty());

        Ok(())
    }
}
