//! Shared test utilities for the billing core.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test records with sensible defaults.

use crate::{
    core::{
        invoice::{self, NewInvoice},
        payment::{self, NewPayment},
        pricing::{CourseLevel, CoursePeriod},
        registration::{CourseInfo, InMemoryRegistrations},
    },
    entities::{self, InvoiceType, Month, PaymentMethod},
    errors::Result,
};
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::DatabaseConnection;

/// Billing year used by the fixtures.
pub const TEST_YEAR: i32 = 2025;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Midnight UTC on the given date.
///
/// # Panics
/// Panics if the date does not exist.
#[allow(clippy::unwrap_used)]
pub fn fixed_time(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// Builds a new invoice with sensible defaults.
///
/// # Defaults
/// * `invoice_type`: `MENSALIDADE`
/// * `amount`: 1000.0
/// * `due_date`: the 10th of January of [`TEST_YEAR`]
/// * `year`: [`TEST_YEAR`]
pub fn test_new_invoice(student_id: &str, course_id: &str, month: Month) -> NewInvoice {
    NewInvoice {
        student_id: student_id.to_string(),
        course_id: course_id.to_string(),
        invoice_type: InvoiceType::Mensalidade,
        amount: 1000.0,
        due_date: fixed_time(TEST_YEAR, 1, 10),
        month,
        year: TEST_YEAR,
    }
}

/// Creates a test invoice with the defaults of [`test_new_invoice`].
pub async fn create_test_invoice(
    db: &DatabaseConnection,
    student_id: &str,
    course_id: &str,
    month: Month,
) -> Result<entities::invoice::Model> {
    invoice::create_invoice(db, test_new_invoice(student_id, course_id, month)).await
}

/// Creates a test invoice for `student-1` in `course-1` with a custom due date.
pub async fn create_test_invoice_due(
    db: &DatabaseConnection,
    month: Month,
    due_date: DateTime<Utc>,
) -> Result<entities::invoice::Model> {
    let mut new_invoice = test_new_invoice("student-1", "course-1", month);
    new_invoice.due_date = due_date;
    invoice::create_invoice(db, new_invoice).await
}

/// Records a cash payment against an invoice.
pub async fn create_test_payment(
    db: &DatabaseConnection,
    invoice_id: i64,
    amount: f64,
) -> Result<entities::payment::Model> {
    payment::create_payment(
        db,
        NewPayment {
            invoice_id,
            amount,
            payment_method: PaymentMethod::Dinheiro,
            payment_date: None,
            reference: None,
            description: None,
        },
    )
    .await
}

/// Registrations with `student-1` enrolled in `course-1`, a daytime `LICENCIATURA`.
pub fn test_registrations() -> InMemoryRegistrations {
    InMemoryRegistrations::new().with(
        "student-1",
        CourseInfo {
            course_id: "course-1".to_string(),
            level: CourseLevel::Licenciatura,
            period: CoursePeriod::Laboral,
        },
    )
}
