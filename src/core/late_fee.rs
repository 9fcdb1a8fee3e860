//! Late fee business logic - Penalty policy and late fee records.
//!
//! The penalty is a step function of how many whole days an invoice is past
//! due: nothing on or before the due date, 20% of the invoice amount for the
//! first ten days, 50% after that. A fee record is written once per invoice and
//! is not re-tiered when the invoice later crosses into the 50% bracket.

use crate::{
    entities::{InvoiceStatus, LateFee, late_fee},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::debug;

/// Last day (inclusive) of the lower penalty tier.
pub const FIRST_TIER_MAX_DAYS: i64 = 10;
/// Penalty rate while within the first tier.
pub const FIRST_TIER_RATE: f64 = 0.20;
/// Penalty rate once past the first tier.
pub const SECOND_TIER_RATE: f64 = 0.50;

/// Outcome of assessing one invoice against the penalty policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    /// Whole days past the due date, never negative
    pub days_overdue: i64,
    /// Penalty amount rounded to cents; zero when not overdue
    pub penalty: f64,
}

impl Assessment {
    /// Whether the invoice is past its due date.
    #[must_use]
    pub const fn is_overdue(&self) -> bool {
        self.days_overdue > 0
    }
}

/// Largest money amount accepted for invoices, payments and late fees.
pub const MAX_AMOUNT: f64 = 1_000_000_000_000.0;

/// Rounds a money amount to two decimal places.
///
/// Values too large to scale to cents are returned unchanged.
#[must_use]
pub fn round_to_cents(amount: f64) -> f64 {
    let cents = amount * 100.0;
    if cents.is_finite() {
        cents.round() / 100.0
    } else {
        amount
    }
}

/// Applies the penalty policy to an invoice amount and due date as of a given instant.
#[must_use]
pub fn assess(amount: f64, due_date: DateTime<Utc>, as_of: DateTime<Utc>) -> Assessment {
    let days_overdue = (as_of - due_date).num_days().max(0);

    let rate = match days_overdue {
        0 => 0.0,
        1..=FIRST_TIER_MAX_DAYS => FIRST_TIER_RATE,
        _ => SECOND_TIER_RATE,
    };

    Assessment {
        days_overdue,
        penalty: round_to_cents(amount * rate),
    }
}

/// Creates the late fee for an invoice.
///
/// Fails with [`Error::InvoiceNotFound`] for an unknown invoice and with
/// [`Error::LateFeeExists`] when the invoice already has a fee.
pub async fn create_late_fee<C>(
    db: &C,
    invoice_id: i64,
    amount: f64,
    days_late: i32,
) -> Result<late_fee::Model>
where
    C: ConnectionTrait,
{
    if !amount.is_finite() || amount <= 0.0 || amount > MAX_AMOUNT {
        return Err(Error::InvalidAmount {
            field: "late_fee",
            amount,
        });
    }
    if days_late <= 0 {
        return Err(Error::Validation {
            field: "days_late",
            message: format!("must be positive, got {days_late}"),
        });
    }
    crate::core::invoice::require_invoice(db, invoice_id).await?;

    let model = late_fee::ActiveModel {
        invoice_id: Set(invoice_id),
        amount: Set(amount),
        days_late: Set(days_late),
        applied_at: Set(Utc::now()),
        status: Set(InvoiceStatus::Pending),
        paid_at: Set(None),
        ..Default::default()
    };

    let created = model.insert(db).await.map_err(|e| {
        if Error::is_unique_violation(&e) {
            Error::LateFeeExists { invoice_id }
        } else if Error::is_foreign_key_violation(&e) {
            Error::InvoiceNotFound { id: invoice_id }
        } else {
            Error::from(e)
        }
    })?;
    debug!(
        late_fee_id = created.id,
        invoice_id, amount, days_late, "late fee applied"
    );
    Ok(created)
}

/// Retrieves the late fees of an invoice, most recent first. Empty is not an error.
pub async fn get_late_fees_for_invoice<C>(db: &C, invoice_id: i64) -> Result<Vec<late_fee::Model>>
where
    C: ConnectionTrait,
{
    LateFee::find()
        .filter(late_fee::Column::InvoiceId.eq(invoice_id))
        .order_by_desc(late_fee::Column::AppliedAt)
        .order_by_desc(late_fee::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific late fee by its ID, or None if it doesn't exist.
pub async fn get_late_fee_by_id<C>(db: &C, late_fee_id: i64) -> Result<Option<late_fee::Model>>
where
    C: ConnectionTrait,
{
    LateFee::find_by_id(late_fee_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves every late fee.
pub async fn get_all_late_fees<C>(db: &C) -> Result<Vec<late_fee::Model>>
where
    C: ConnectionTrait,
{
    LateFee::find()
        .order_by_asc(late_fee::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sums every late fee recorded for an invoice.
pub async fn total_late_fees<C>(db: &C, invoice_id: i64) -> Result<f64>
where
    C: ConnectionTrait,
{
    let fees = get_late_fees_for_invoice(db, invoice_id).await?;
    Ok(fees.iter().map(|f| f.amount).sum())
}

/// Mirrors an invoice status onto a late fee, stamping `paid_at` when it becomes paid.
pub async fn update_late_fee_status<C>(
    db: &C,
    late_fee_id: i64,
    status: InvoiceStatus,
) -> Result<late_fee::Model>
where
    C: ConnectionTrait,
{
    let existing = get_late_fee_by_id(db, late_fee_id)
        .await?
        .ok_or(Error::LateFeeNotFound { id: late_fee_id })?;
    let already_paid = existing.paid_at.is_some();

    let mut active_model: late_fee::ActiveModel = existing.into();
    active_model.status = Set(status);
    if status == InvoiceStatus::Paid && !already_paid {
        active_model.paid_at = Set(Some(Utc::now()));
    }

    active_model.update(db).await.map_err(Into::into)
}

/// Deletes a late fee.
pub async fn delete_late_fee<C>(db: &C, late_fee_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = LateFee::delete_by_id(late_fee_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::LateFeeNotFound { id: late_fee_id });
    }
    Ok(())
}
