//! Billing orchestrator - Multi-step invoice workflows.
//!
//! Ties the stores together: generating invoices from a registration and the
//! pricing table, the overdue scan that applies late fees, and status changes
//! that cascade onto late fees and the history log. Every workflow that writes
//! more than one row runs inside a single database transaction.

use crate::{
    core::{
        history::{self, SYSTEM_ACTOR},
        invoice::{self, InvoiceChanges, InvoiceDetails, InvoiceWithLateFees, NewInvoice},
        late_fee,
        payment::{self, NewPayment},
        pricing::{PricingTable, Quote},
        registration::{self, RegistrationLookup},
        reminder,
    },
    entities::{
        Invoice, InvoiceStatus, InvoiceType, LateFee, Month, invoice as invoice_entity,
        invoice_history, late_fee as late_fee_entity, payment as payment_entity,
        payment_reminder,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Datelike, Utc};
use sea_orm::{QueryOrder, TransactionTrait, prelude::*};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

/// Earliest billing year accepted.
pub const MIN_YEAR: i32 = 2000;
/// Latest billing year accepted.
pub const MAX_YEAR: i32 = 2100;

/// Request to bill a student for one or more months of a course.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateInvoicesRequest {
    /// Student to bill
    pub student_id: String,
    /// Course the student is registered in
    pub course_id: String,
    /// Kind of charge
    pub invoice_type: InvoiceType,
    /// Due date applied to every generated invoice
    pub due_date: DateTime<Utc>,
    /// Billing months; one invoice is created per month
    pub months: Vec<Month>,
    /// Billing year; defaults to the current year
    pub year: Option<i32>,
    /// Explicit amount; overrides the pricing table
    pub amount: Option<f64>,
}

/// Requested status change for an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    /// Target status
    pub status: InvoiceStatus,
    /// Who is making the change
    pub actor: String,
    /// Reason; required when cancelling
    pub reason: Option<String>,
}

impl StatusChange {
    /// Creates a status change without a reason.
    pub fn new(status: InvoiceStatus, actor: impl Into<String>) -> Self {
        Self {
            status,
            actor: actor.into(),
            reason: None,
        }
    }

    /// Creates a cancellation with the given reason.
    pub fn cancel(actor: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            status: InvoiceStatus::Cancelled,
            actor: actor.into(),
            reason: Some(reason.into()),
        }
    }
}

/// Outcome of an overdue scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    /// Open invoices examined
    pub scanned: usize,
    /// Invoices moved to `OVERDUE` by this run
    pub marked_overdue: Vec<i64>,
    /// Late fees created by this run
    pub late_fees_created: Vec<late_fee_entity::Model>,
}

impl ReconcileReport {
    /// True when the run changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marked_overdue.is_empty() && self.late_fees_created.is_empty()
    }
}

/// Money position of a single invoice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvoiceBalance {
    /// Invoice amount
    pub amount: f64,
    /// Sum of recorded payments
    pub total_paid: f64,
    /// Sum of applied late fees
    pub total_late_fees: f64,
    /// Amount plus fees minus payments, never below zero
    pub outstanding: f64,
}

fn resolve_year(year: Option<i32>) -> Result<i32> {
    let year = year.unwrap_or_else(|| Utc::now().year());
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(Error::Validation {
            field: "year",
            message: format!("must be between {MIN_YEAR} and {MAX_YEAR}, got {year}"),
        });
    }
    Ok(year)
}

fn validate_request(request: &CreateInvoicesRequest) -> Result<i32> {
    if request.student_id.trim().is_empty() {
        return Err(Error::Validation {
            field: "student_id",
            message: "must not be empty".to_string(),
        });
    }
    if request.course_id.trim().is_empty() {
        return Err(Error::Validation {
            field: "course_id",
            message: "must not be empty".to_string(),
        });
    }
    if request.months.is_empty() {
        return Err(Error::Validation {
            field: "months",
            message: "at least one month is required".to_string(),
        });
    }

    let year = resolve_year(request.year)?;

    let mut seen = HashSet::new();
    for month in &request.months {
        if !seen.insert(*month) {
            return Err(Error::DuplicateInvoice {
                month: *month,
                year,
            });
        }
    }

    if let Some(amount) = request.amount {
        if !amount.is_finite() || !(0.0..=late_fee::MAX_AMOUNT).contains(&amount) {
            return Err(Error::InvalidAmount {
                field: "amount",
                amount,
            });
        }
    }

    Ok(year)
}

/// Generates one invoice per requested month.
///
/// Either every month is billed or nothing is: a month that is already billed
/// (by a non-cancelled invoice) aborts the whole request with
/// [`Error::DuplicateInvoice`].
///
/// # Arguments
/// * `db` - Database connection
/// * `registrations` - Source of the student's registration in the course
/// * `pricing` - Tuition table used when no explicit amount is given
/// * `request` - What to bill
///
/// # Returns
/// The created invoices, in the order the months were requested
#[instrument(skip(db, registrations, pricing), fields(student_id = %request.student_id, course_id = %request.course_id))]
pub async fn create_invoices<R>(
    db: &DatabaseConnection,
    registrations: &R,
    pricing: &PricingTable,
    request: CreateInvoicesRequest,
) -> Result<Vec<invoice_entity::Model>>
where
    R: RegistrationLookup + ?Sized,
{
    let year = validate_request(&request)?;

    let registration =
        registration::find_registration(registrations, &request.student_id, &request.course_id)
            .await?;

    let quote = pricing.quote(
        request.invoice_type,
        registration.course.level,
        registration.course.period,
    );
    let amount = match (request.amount, quote) {
        (Some(amount), _) | (None, Quote::Listed(amount)) => amount,
        (None, Quote::Unlisted) => {
            return Err(Error::Validation {
                field: "amount",
                message: format!(
                    "no price listed for {} on a {:?} {:?} course; an explicit amount is required",
                    request.invoice_type, registration.course.level, registration.course.period
                ),
            });
        }
    };

    let txn = db.begin().await?;

    for month in &request.months {
        let existing = invoice::find_by_student_course_month_year(
            &txn,
            &request.student_id,
            &request.course_id,
            *month,
            year,
        )
        .await?;
        if let Some(existing) = existing {
            warn!(
                invoice_id = existing.id,
                %month, year, "billing period already invoiced"
            );
            return Err(Error::DuplicateInvoice {
                month: *month,
                year,
            });
        }
    }

    let mut created = Vec::with_capacity(request.months.len());
    for month in &request.months {
        let new_invoice = NewInvoice {
            student_id: request.student_id.clone(),
            course_id: request.course_id.clone(),
            invoice_type: request.invoice_type,
            amount,
            due_date: request.due_date,
            month: *month,
            year,
        };
        created.push(invoice::create_invoice(&txn, new_invoice).await?);
    }

    txn.commit().await?;

    info!(count = created.len(), amount, year, "invoices created");
    Ok(created)
}

/// Lists every invoice with its late fees, oldest first.
///
/// This is a plain read. Overdue status and late fees only change through
/// [`reconcile_overdue_invoices`].
pub async fn list_invoices<C>(db: &C) -> Result<Vec<InvoiceWithLateFees>>
where
    C: ConnectionTrait,
{
    let rows = Invoice::find()
        .find_with_related(LateFee)
        .order_by_asc(invoice_entity::Column::Id)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(invoice, late_fees)| InvoiceWithLateFees { invoice, late_fees })
        .collect())
}

/// Loads a single invoice with everything attached to it.
pub async fn get_invoice<C>(db: &C, invoice_id: i64) -> Result<InvoiceDetails>
where
    C: ConnectionTrait,
{
    invoice::get_invoice_details(db, invoice_id).await
}

/// Scans open invoices as of `as_of`, marking overdue ones and applying late fees.
///
/// Running it again with the same `as_of` changes nothing: an invoice that is
/// already `OVERDUE` gets no new history entry and an invoice that already has
/// a late fee gets no second one.
#[instrument(skip(db))]
pub async fn reconcile_overdue_invoices(
    db: &DatabaseConnection,
    as_of: DateTime<Utc>,
) -> Result<ReconcileReport> {
    let txn = db.begin().await?;
    let open = invoice::get_open_invoices(&txn).await?;

    let mut report = ReconcileReport {
        scanned: open.len(),
        ..Default::default()
    };

    for current in open {
        let assessment = late_fee::assess(current.amount, current.due_date, as_of);
        if !assessment.is_overdue() {
            continue;
        }

        if current.status != InvoiceStatus::Overdue {
            invoice::update_invoice(
                &txn,
                current.id,
                InvoiceChanges {
                    status: Some(InvoiceStatus::Overdue),
                    ..Default::default()
                },
            )
            .await?;
            history::create_history_entry(
                &txn,
                current.id,
                InvoiceStatus::Overdue,
                format!("Invoice overdue by {} days", assessment.days_overdue),
                SYSTEM_ACTOR.to_string(),
            )
            .await?;
            report.marked_overdue.push(current.id);
        }

        let existing_fees = late_fee::get_late_fees_for_invoice(&txn, current.id).await?;
        if existing_fees.is_empty() {
            if assessment.penalty > late_fee::MAX_AMOUNT {
                warn!(
                    invoice_id = current.id,
                    amount = current.amount,
                    penalty = assessment.penalty,
                    "penalty out of range, late fee skipped"
                );
            } else if assessment.penalty > 0.0 {
                let days_late = i32::try_from(assessment.days_overdue).unwrap_or(i32::MAX);
                let fee = late_fee::create_late_fee(&txn, current.id, assessment.penalty, days_late)
                    .await?;
                let fee =
                    late_fee::update_late_fee_status(&txn, fee.id, InvoiceStatus::Overdue).await?;
                report.late_fees_created.push(fee);
            }
        } else {
            for fee in existing_fees
                .into_iter()
                .filter(|f| f.status != InvoiceStatus::Overdue)
            {
                late_fee::update_late_fee_status(&txn, fee.id, InvoiceStatus::Overdue).await?;
            }
        }
    }

    txn.commit().await?;

    if report.is_empty() {
        debug!(scanned = report.scanned, "no overdue invoices");
    } else {
        info!(
            scanned = report.scanned,
            marked_overdue = report.marked_overdue.len(),
            late_fees_created = report.late_fees_created.len(),
            "overdue scan applied"
        );
    }
    Ok(report)
}

/// Runs [`reconcile_overdue_invoices`] as of the current instant.
pub async fn reconcile_overdue_invoices_now(db: &DatabaseConnection) -> Result<ReconcileReport> {
    reconcile_overdue_invoices(db, Utc::now()).await
}

/// Changes an invoice's status and cascades it onto its late fees.
///
/// The invoice update, the late fee updates and the history entry are
/// committed together. Cancelling requires a reason and records who cancelled
/// and when. Setting the current status again is accepted and still
/// re-synchronises the late fees.
#[instrument(skip(db, change), fields(status = %change.status, actor = %change.actor))]
pub async fn update_invoice_status(
    db: &DatabaseConnection,
    invoice_id: i64,
    change: StatusChange,
) -> Result<InvoiceWithLateFees> {
    if change.actor.trim().is_empty() {
        return Err(Error::Validation {
            field: "actor",
            message: "must not be empty".to_string(),
        });
    }

    let txn = db.begin().await?;
    let current = invoice::require_invoice(&txn, invoice_id).await?;

    if !current.status.can_transition_to(change.status) {
        return Err(Error::InvalidTransition {
            id: invoice_id,
            from: current.status,
            to: change.status,
        });
    }

    let entering_cancelled =
        change.status == InvoiceStatus::Cancelled && current.status != InvoiceStatus::Cancelled;
    if entering_cancelled {
        let reason = change
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| Error::Validation {
                field: "reason",
                message: "a reason is required to cancel an invoice".to_string(),
            })?;
        invoice::update_invoice(
            &txn,
            invoice_id,
            InvoiceChanges {
                cancelled_at: Some(Utc::now()),
                cancelled_by: Some(change.actor.clone()),
                cancellation_reason: Some(reason.to_string()),
                ..Default::default()
            },
        )
        .await?;
    }

    let InvoiceWithLateFees {
        invoice: updated,
        late_fees: attached,
    } = invoice::update_invoice_status(&txn, invoice_id, change.status).await?;

    let mut late_fees = Vec::with_capacity(attached.len());
    for fee in attached {
        late_fees.push(late_fee::update_late_fee_status(&txn, fee.id, change.status).await?);
    }

    let description = match &change.reason {
        Some(reason) if !reason.trim().is_empty() => format!(
            "Status changed from {} to {}: {}",
            current.status,
            change.status,
            reason.trim()
        ),
        _ => format!("Status changed from {} to {}", current.status, change.status),
    };
    history::create_history_entry(&txn, invoice_id, change.status, description, change.actor)
        .await?;

    txn.commit().await?;

    info!(
        invoice_id,
        from = %current.status,
        late_fees = late_fees.len(),
        "invoice status updated"
    );
    Ok(InvoiceWithLateFees {
        invoice: updated,
        late_fees,
    })
}

/// Records a payment. The invoice status is left untouched.
pub async fn add_payment<C>(db: &C, new_payment: NewPayment) -> Result<payment_entity::Model>
where
    C: ConnectionTrait,
{
    payment::create_payment(db, new_payment).await
}

/// Applies a manual late fee to an invoice.
pub async fn add_late_fee<C>(
    db: &C,
    invoice_id: i64,
    amount: f64,
    days_late: i32,
) -> Result<late_fee_entity::Model>
where
    C: ConnectionTrait,
{
    late_fee::create_late_fee(db, invoice_id, amount, days_late).await
}

/// Appends a free-form entry to an invoice's history.
pub async fn add_history_entry<C>(
    db: &C,
    invoice_id: i64,
    status: InvoiceStatus,
    description: String,
    actor: String,
) -> Result<invoice_history::Model>
where
    C: ConnectionTrait,
{
    history::create_history_entry(db, invoice_id, status, description, actor).await
}

/// Records a reminder dispatch for an invoice.
pub async fn add_reminder<C>(
    db: &C,
    invoice_id: i64,
    reminder_type: String,
    status: String,
) -> Result<payment_reminder::Model>
where
    C: ConnectionTrait,
{
    reminder::create_reminder(db, invoice_id, reminder_type, status).await
}

/// Computes what is still owed on an invoice.
pub async fn invoice_balance<C>(db: &C, invoice_id: i64) -> Result<InvoiceBalance>
where
    C: ConnectionTrait,
{
    let current = invoice::require_invoice(db, invoice_id).await?;
    let total_paid = payment::total_paid(db, invoice_id).await?;
    let total_late_fees = late_fee::total_late_fees(db, invoice_id).await?;
    let outstanding =
        late_fee::round_to_cents((current.amount + total_late_fees - total_paid).max(0.0));

    Ok(InvoiceBalance {
        amount: current.amount,
        total_paid,
        total_late_fees,
        outstanding,
    })
}
