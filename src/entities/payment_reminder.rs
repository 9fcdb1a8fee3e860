//! Payment reminder entity - Record of reminder dispatch attempts.
//!
//! Delivery itself happens elsewhere; this table only remembers that a reminder
//! of some type was attempted and how it went.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment reminder database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_reminders")]
pub struct Model {
    /// Unique identifier for the reminder
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Invoice the reminder was about
    pub invoice_id: i64,
    /// Channel or template, e.g. `"EMAIL"` or `"SMS"`
    pub reminder_type: String,
    /// Dispatch outcome, e.g. `"SENT"` or `"FAILED"`
    pub status: String,
    /// When the reminder was dispatched
    pub sent_at: DateTimeUtc,
}

/// Defines relationships between `PaymentReminder` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each reminder belongs to one invoice
    #[sea_orm(
        belongs_to = "super::invoice::Entity",
        from = "Column::InvoiceId",
        to = "super::invoice::Column::Id",
        on_delete = "Cascade"
    )]
    Invoice,
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoice.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
