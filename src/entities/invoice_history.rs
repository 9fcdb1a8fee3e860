//! Invoice history entity - Append-only audit trail of invoice status changes.
use super::enums::InvoiceStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice history database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoice_history")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Invoice the entry describes
    pub invoice_id: i64,
    /// Status recorded by this entry
    pub status: InvoiceStatus,
    /// Human-readable description of what happened
    pub description: String,
    /// Actor who caused the change (`"system"` for automatic scans)
    pub created_by: String,
    /// When the entry was written
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `InvoiceHistory` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one invoice
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
