//! Invoice entity - A billing obligation for one student, course and billing month.
//!
//! The (`student_id`, `course_id`, `month`, `year`) period is unique among
//! non-cancelled invoices; that index is created alongside the table in
//! [`crate::config::database::create_tables`].

use super::enums::{InvoiceStatus, InvoiceType, Month};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    /// Unique identifier for the invoice
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Student being billed (owned by the student registry)
    pub student_id: String,
    /// Course the charge belongs to (owned by the course registry)
    pub course_id: String,
    /// Kind of charge
    pub invoice_type: InvoiceType,
    /// Amount due, never negative
    #[sea_orm(column_type = "Double")]
    pub amount: f64,
    /// When payment is due
    pub due_date: DateTimeUtc,
    /// Billing month covered by this invoice
    pub month: Month,
    /// Billing year covered by this invoice
    pub year: i32,
    /// Current lifecycle status
    pub status: InvoiceStatus,
    /// When the invoice was cancelled
    #[sea_orm(nullable)]
    pub cancelled_at: Option<DateTimeUtc>,
    /// Who cancelled the invoice
    #[sea_orm(nullable)]
    pub cancelled_by: Option<String>,
    /// Why the invoice was cancelled
    #[sea_orm(nullable)]
    pub cancellation_reason: Option<String>,
    /// When the invoice was created
    pub created_at: DateTimeUtc,
    /// When the invoice was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Invoice and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One invoice has many payments
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
    /// One invoice has at most one late fee
    #[sea_orm(has_many = "super::late_fee::Entity")]
    LateFees,
    /// One invoice has many history entries
    #[sea_orm(has_many = "super::invoice_history::Entity")]
    History,
    /// One invoice has many payment reminders
    #[sea_orm(has_many = "super::payment_reminder::Entity")]
    Reminders,
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl Related<super::late_fee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LateFees.def()
    }
}

impl Related<super::invoice_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::History.def()
    }
}

impl Related<super::payment_reminder::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reminders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
