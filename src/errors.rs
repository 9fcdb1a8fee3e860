//! Unified error type for the billing core.
//!
//! Every failure maps onto one of four [`ErrorKind`]s so a transport layer can
//! translate errors without matching on individual variants.

use crate::entities::{InvoiceStatus, Month};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Errors raised by the billing core.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Persistence failure
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Malformed input for a named field
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Offending input field
        field: &'static str,
        /// Why the value was rejected
        message: String,
    },

    /// A money amount was negative, zero where not allowed, or not finite
    #[error("Invalid {field} amount: {amount}")]
    InvalidAmount {
        /// Offending input field
        field: &'static str,
        /// Rejected value
        amount: f64,
    },

    /// No invoice with this id
    #[error("Invoice not found: {id}")]
    InvoiceNotFound {
        /// Requested invoice id
        id: i64,
    },

    /// No payment with this id
    #[error("Payment not found: {id}")]
    PaymentNotFound {
        /// Requested payment id
        id: i64,
    },

    /// No late fee with this id
    #[error("Late fee not found: {id}")]
    LateFeeNotFound {
        /// Requested late fee id
        id: i64,
    },

    /// The student is not registered in the course
    #[error("No registration for student {student_id} in course {course_id}")]
    RegistrationNotFound {
        /// Student that was looked up
        student_id: String,
        /// Course that was looked up
        course_id: String,
    },

    /// A non-cancelled invoice already covers this billing period
    #[error("Invoice already exists for {month} {year}")]
    DuplicateInvoice {
        /// Conflicting month
        month: Month,
        /// Conflicting year
        year: i32,
    },

    /// The invoice already carries a late fee
    #[error("Late fee already exists for invoice {invoice_id}")]
    LateFeeExists {
        /// Invoice that already has a fee
        invoice_id: i64,
    },

    /// The requested status change is not part of the invoice lifecycle
    #[error("Cannot move invoice {id} from {from} to {to}")]
    InvalidTransition {
        /// Invoice being changed
        id: i64,
        /// Current status
        from: InvoiceStatus,
        /// Requested status
        to: InvoiceStatus,
    },
}

/// Coarse error classes used to report failures to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Referenced record does not exist
    NotFound,
    /// Request collides with existing state
    Conflict,
    /// Request is malformed
    Validation,
    /// Persistence or environment failure
    Internal,
}

impl ErrorKind {
    /// HTTP-equivalent status code for this class.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Validation => 400,
            Self::Internal => 500,
        }
    }
}

impl Error {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvoiceNotFound { .. }
            | Self::PaymentNotFound { .. }
            | Self::LateFeeNotFound { .. }
            | Self::RegistrationNotFound { .. } => ErrorKind::NotFound,
            Self::DuplicateInvoice { .. }
            | Self::LateFeeExists { .. }
            | Self::InvalidTransition { .. } => ErrorKind::Conflict,
            Self::Validation { .. } | Self::InvalidAmount { .. } => ErrorKind::Validation,
            Self::Config { .. } | Self::Database(_) => ErrorKind::Internal,
        }
    }

    /// Returns true when a database error was caused by a unique index.
    pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
        matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
    }

    /// Returns true when a database error was caused by a foreign key.
    pub(crate) fn is_foreign_key_violation(err: &DbErr) -> bool {
        matches!(err.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_)))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
