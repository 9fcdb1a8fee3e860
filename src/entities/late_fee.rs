//! Late fee entity - Penalty attached to an overdue invoice.
//!
//! `invoice_id` is unique: an invoice carries at most one late fee. The fee's
//! status mirrors the owning invoice's status.

use super::enums::InvoiceStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Late fee database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "late_fees")]
pub struct Model {
    /// Unique identifier for the late fee
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Invoice the penalty applies to
    #[sea_orm(unique)]
    pub invoice_id: i64,
    /// Penalty amount, always positive
    #[sea_orm(column_type = "Double")]
    pub amount: f64,
    /// Days past due when the penalty was computed
    pub days_late: i32,
    /// When the penalty was applied
    pub applied_at: DateTimeUtc,
    /// Status mirrored from the owning invoice
    pub status: InvoiceStatus,
    /// When the penalty was settled
    #[sea_orm(nullable)]
    pub paid_at: Option<DateTimeUtc>,
}

/// Defines relationships between `LateFee` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each late fee belongs to one invoice
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
