//! Payment entity - Money received against an invoice.
//!
//! Several payments may reference the same invoice. Their sum is not tied to the
//! invoice amount; settling an invoice is an explicit status change.

use super::enums::PaymentMethod;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    /// Unique identifier for the payment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Invoice this payment is applied to
    pub invoice_id: i64,
    /// Amount received, always positive
    #[sea_orm(column_type = "Double")]
    pub amount: f64,
    /// How the money was received
    pub payment_method: PaymentMethod,
    /// When the money was received
    pub payment_date: DateTimeUtc,
    /// External reference such as a bank transaction number
    #[sea_orm(nullable)]
    pub reference: Option<String>,
    /// Free-text note
    #[sea_orm(nullable)]
    pub description: Option<String>,
}

/// Defines relationships between Payment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payment belongs to one invoice
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
