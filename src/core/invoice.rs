//! Invoice business logic - Persistence operations for invoices.
//!
//! This module owns reads and writes of invoice rows. It does not create late
//! fees or history entries on its own; the billing orchestrator in
//! [`crate::core::billing`] decides when those are written. Functions are generic
//! over [`ConnectionTrait`] so they can run inside an orchestrator transaction.

use crate::{
    core::late_fee::MAX_AMOUNT,
    entities::{Invoice, InvoiceStatus, InvoiceType, Month, invoice, late_fee},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::debug;

/// Fields required to persist a new invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoice {
    /// Student being billed
    pub student_id: String,
    /// Course the charge belongs to
    pub course_id: String,
    /// Kind of charge
    pub invoice_type: InvoiceType,
    /// Amount due
    pub amount: f64,
    /// When payment is due
    pub due_date: DateTime<Utc>,
    /// Billing month
    pub month: Month,
    /// Billing year
    pub year: i32,
}

/// Partial update of an invoice; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceChanges {
    /// New status
    pub status: Option<InvoiceStatus>,
    /// New amount
    pub amount: Option<f64>,
    /// New due date
    pub due_date: Option<DateTime<Utc>>,
    /// Cancellation timestamp
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Cancelling actor
    pub cancelled_by: Option<String>,
    /// Cancellation reason
    pub cancellation_reason: Option<String>,
}

/// An invoice together with its late fees.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceWithLateFees {
    /// The invoice row
    pub invoice: invoice::Model,
    /// Late fees attached to it
    pub late_fees: Vec<late_fee::Model>,
}

/// An invoice with every related record.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDetails {
    /// The invoice row
    pub invoice: invoice::Model,
    /// Payments, newest first
    pub payments: Vec<crate::entities::payment::Model>,
    /// Late fees, newest first
    pub late_fees: Vec<late_fee::Model>,
    /// History entries, newest first
    pub history: Vec<crate::entities::invoice_history::Model>,
    /// Reminders, newest first
    pub reminders: Vec<crate::entities::payment_reminder::Model>,
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || !(0.0..=MAX_AMOUNT).contains(&amount) {
        return Err(Error::InvalidAmount {
            field: "amount",
            amount,
        });
    }
    Ok(())
}

/// Persists a new invoice in `PENDING` status.
///
/// The caller is expected to have checked the billing period already; if another
/// non-cancelled invoice still holds it, the storage index rejects the insert and
/// this returns [`Error::DuplicateInvoice`].
pub async fn create_invoice<C>(db: &C, new_invoice: NewInvoice) -> Result<invoice::Model>
where
    C: ConnectionTrait,
{
    validate_amount(new_invoice.amount)?;
    if new_invoice.student_id.trim().is_empty() {
        return Err(Error::Validation {
            field: "student_id",
            message: "must not be empty".to_string(),
        });
    }
    if new_invoice.course_id.trim().is_empty() {
        return Err(Error::Validation {
            field: "course_id",
            message: "must not be empty".to_string(),
        });
    }

    let now = Utc::now();
    let month = new_invoice.month;
    let year = new_invoice.year;
    let model = invoice::ActiveModel {
        student_id: Set(new_invoice.student_id),
        course_id: Set(new_invoice.course_id),
        invoice_type: Set(new_invoice.invoice_type),
        amount: Set(new_invoice.amount),
        due_date: Set(new_invoice.due_date),
        month: Set(month),
        year: Set(year),
        status: Set(InvoiceStatus::Pending),
        cancelled_at: Set(None),
        cancelled_by: Set(None),
        cancellation_reason: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = model.insert(db).await.map_err(|e| {
        if Error::is_unique_violation(&e) {
            Error::DuplicateInvoice { month, year }
        } else {
            Error::from(e)
        }
    })?;
    debug!(invoice_id = created.id, %month, year, "invoice created");
    Ok(created)
}

/// Finds the live invoice for an exact (student, course, month, year) period.
///
/// Cancelled invoices release their period and are never returned here.
pub async fn find_by_student_course_month_year<C>(
    db: &C,
    student_id: &str,
    course_id: &str,
    month: Month,
    year: i32,
) -> Result<Option<invoice::Model>>
where
    C: ConnectionTrait,
{
    Invoice::find()
        .filter(invoice::Column::StudentId.eq(student_id))
        .filter(invoice::Column::CourseId.eq(course_id))
        .filter(invoice::Column::Month.eq(month))
        .filter(invoice::Column::Year.eq(year))
        .filter(invoice::Column::Status.ne(InvoiceStatus::Cancelled))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific invoice by its ID, or None if it doesn't exist.
pub async fn get_invoice_by_id<C>(db: &C, invoice_id: i64) -> Result<Option<invoice::Model>>
where
    C: ConnectionTrait,
{
    Invoice::find_by_id(invoice_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves an invoice or fails with [`Error::InvoiceNotFound`].
pub async fn require_invoice<C>(db: &C, invoice_id: i64) -> Result<invoice::Model>
where
    C: ConnectionTrait,
{
    get_invoice_by_id(db, invoice_id)
        .await?
        .ok_or(Error::InvoiceNotFound { id: invoice_id })
}

/// Retrieves every invoice, oldest first.
pub async fn get_all_invoices<C>(db: &C) -> Result<Vec<invoice::Model>>
where
    C: ConnectionTrait,
{
    Invoice::find()
        .order_by_asc(invoice::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves invoices that still take part in overdue scans.
pub async fn get_open_invoices<C>(db: &C) -> Result<Vec<invoice::Model>>
where
    C: ConnectionTrait,
{
    Invoice::find()
        .filter(invoice::Column::Status.is_not_in([InvoiceStatus::Paid, InvoiceStatus::Cancelled]))
        .order_by_asc(invoice::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all invoices billed to a student.
pub async fn get_invoices_for_student<C>(db: &C, student_id: &str) -> Result<Vec<invoice::Model>>
where
    C: ConnectionTrait,
{
    Invoice::find()
        .filter(invoice::Column::StudentId.eq(student_id))
        .order_by_asc(invoice::Column::Year)
        .order_by_asc(invoice::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all invoices issued for a course.
pub async fn get_invoices_for_course<C>(db: &C, course_id: &str) -> Result<Vec<invoice::Model>>
where
    C: ConnectionTrait,
{
    Invoice::find()
        .filter(invoice::Column::CourseId.eq(course_id))
        .order_by_asc(invoice::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a student's invoices for one course.
pub async fn get_invoices_for_student_and_course<C>(
    db: &C,
    student_id: &str,
    course_id: &str,
) -> Result<Vec<invoice::Model>>
where
    C: ConnectionTrait,
{
    Invoice::find()
        .filter(invoice::Column::StudentId.eq(student_id))
        .filter(invoice::Column::CourseId.eq(course_id))
        .order_by_asc(invoice::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a student's invoices for one course in a given status.
pub async fn get_invoices_by_status_for_student_and_course<C>(
    db: &C,
    student_id: &str,
    course_id: &str,
    status: InvoiceStatus,
) -> Result<Vec<invoice::Model>>
where
    C: ConnectionTrait,
{
    Invoice::find()
        .filter(invoice::Column::StudentId.eq(student_id))
        .filter(invoice::Column::CourseId.eq(course_id))
        .filter(invoice::Column::Status.eq(status))
        .order_by_asc(invoice::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies a partial update to an invoice.
///
/// Re-activating a cancelled invoice whose period has since been billed again
/// fails with [`Error::DuplicateInvoice`].
pub async fn update_invoice<C>(
    db: &C,
    invoice_id: i64,
    changes: InvoiceChanges,
) -> Result<invoice::Model>
where
    C: ConnectionTrait,
{
    if let Some(amount) = changes.amount {
        validate_amount(amount)?;
    }

    let existing = require_invoice(db, invoice_id).await?;
    let month = existing.month;
    let year = existing.year;

    let mut active_model: invoice::ActiveModel = existing.into();
    if let Some(status) = changes.status {
        active_model.status = Set(status);
    }
    if let Some(amount) = changes.amount {
        active_model.amount = Set(amount);
    }
    if let Some(due_date) = changes.due_date {
        active_model.due_date = Set(due_date);
    }
    if let Some(cancelled_at) = changes.cancelled_at {
        active_model.cancelled_at = Set(Some(cancelled_at));
    }
    if let Some(cancelled_by) = changes.cancelled_by {
        active_model.cancelled_by = Set(Some(cancelled_by));
    }
    if let Some(reason) = changes.cancellation_reason {
        active_model.cancellation_reason = Set(Some(reason));
    }
    active_model.updated_at = Set(Utc::now());

    active_model.update(db).await.map_err(|e| {
        if Error::is_unique_violation(&e) {
            Error::DuplicateInvoice { month, year }
        } else {
            Error::from(e)
        }
    })
}

/// Sets an invoice's status and returns it together with its late fees, so the
/// caller can mirror the status onto those fees without another lookup.
pub async fn update_invoice_status<C>(
    db: &C,
    invoice_id: i64,
    status: InvoiceStatus,
) -> Result<InvoiceWithLateFees>
where
    C: ConnectionTrait,
{
    let invoice = update_invoice(
        db,
        invoice_id,
        InvoiceChanges {
            status: Some(status),
            ..Default::default()
        },
    )
    .await?;
    let late_fees = crate::core::late_fee::get_late_fees_for_invoice(db, invoice_id).await?;

    Ok(InvoiceWithLateFees { invoice, late_fees })
}

/// Loads an invoice with its payments, late fees, history and reminders.
pub async fn get_invoice_details<C>(db: &C, invoice_id: i64) -> Result<InvoiceDetails>
where
    C: ConnectionTrait,
{
    let invoice = require_invoice(db, invoice_id).await?;
    let payments = crate::core::payment::get_payments_for_invoice(db, invoice_id).await?;
    let late_fees = crate::core::late_fee::get_late_fees_for_invoice(db, invoice_id).await?;
    let history = crate::core::history::get_history_for_invoice(db, invoice_id).await?;
    let reminders = crate::core::reminder::get_reminders_for_invoice(db, invoice_id).await?;

    Ok(InvoiceDetails {
        invoice,
        payments,
        late_fees,
        history,
        reminders,
    })
}

/// Deletes an invoice and, through the foreign keys, everything attached to it.
pub async fn delete_invoice<C>(db: &C, invoice_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Invoice::delete_by_id(invoice_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::InvoiceNotFound { id: invoice_id });
    }
    Ok(())
}

/// Deletes every invoice. Returns how many were removed.
pub async fn delete_all_invoices<C>(db: &C) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = Invoice::delete_many().exec(db).await?;
    Ok(result.rows_affected)
}
