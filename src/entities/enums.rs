//! Enumerations stored as strings in the billing tables.
//!
//! Each enum derives `DeriveActiveEnum` so it can be used directly as a column
//! type, and gets `Display`/`FromStr` from its database string value so the
//! same spelling is used in storage, logs and parsed input.

use sea_orm::ActiveEnum;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an invoice (and, mirrored, of its late fee).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    /// Issued and not yet due or settled
    #[sea_orm(string_value = "PENDING")]
    Pending,
    /// Settled in full (terminal)
    #[sea_orm(string_value = "PAID")]
    Paid,
    /// Past its due date without settlement
    #[sea_orm(string_value = "OVERDUE")]
    Overdue,
    /// Voided by an operator (terminal)
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
    /// Some, but not all, of the amount has been received
    #[sea_orm(string_value = "PARTIALLY_PAID")]
    PartiallyPaid,
}

impl InvoiceStatus {
    /// Terminal statuses accept no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Paid | Self::Cancelled)
    }

    /// Whether an invoice in this status still takes part in overdue scans.
    #[must_use]
    pub const fn is_open(self) -> bool {
        !self.is_terminal()
    }

    /// Returns true when an explicit status change from `self` to `next` is allowed.
    ///
    /// Setting the current status again is always accepted as a no-op.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        if self as u8 == next as u8 {
            return true;
        }
        match self {
            Self::Pending => matches!(
                next,
                Self::Overdue | Self::Paid | Self::Cancelled | Self::PartiallyPaid
            ),
            Self::Overdue => matches!(next, Self::Paid | Self::Cancelled | Self::PartiallyPaid),
            Self::PartiallyPaid => matches!(next, Self::Paid | Self::Cancelled | Self::Overdue),
            Self::Paid | Self::Cancelled => false,
        }
    }
}

/// Kind of charge an invoice represents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceType {
    /// Monthly tuition, the only type priced by the tuition table
    #[sea_orm(string_value = "MENSALIDADE")]
    Mensalidade,
    /// Enrollment fee
    #[sea_orm(string_value = "MATRICULA")]
    Matricula,
    /// Annual or one-off school fee
    #[sea_orm(string_value = "PROPINA")]
    Propina,
    /// Course material
    #[sea_orm(string_value = "MATERIAL")]
    Material,
    /// Anything else
    #[sea_orm(string_value = "OUTROS")]
    Outros,
}

/// Billing month of an invoice.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(12))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum Month {
    #[sea_orm(string_value = "JANEIRO")]
    Janeiro,
    #[sea_orm(string_value = "FEVEREIRO")]
    Fevereiro,
    #[sea_orm(string_value = "MARCO")]
    Marco,
    #[sea_orm(string_value = "ABRIL")]
    Abril,
    #[sea_orm(string_value = "MAIO")]
    Maio,
    #[sea_orm(string_value = "JUNHO")]
    Junho,
    #[sea_orm(string_value = "JULHO")]
    Julho,
    #[sea_orm(string_value = "AGOSTO")]
    Agosto,
    #[sea_orm(string_value = "SETEMBRO")]
    Setembro,
    #[sea_orm(string_value = "OUTUBRO")]
    Outubro,
    #[sea_orm(string_value = "NOVEMBRO")]
    Novembro,
    #[sea_orm(string_value = "DEZEMBRO")]
    Dezembro,
}

/// How a payment was made.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash at the front desk
    #[sea_orm(string_value = "DINHEIRO")]
    Dinheiro,
    /// Bank transfer
    #[sea_orm(string_value = "TRANSFERENCIA")]
    Transferencia,
    /// Bank deposit
    #[sea_orm(string_value = "DEPOSITO")]
    Deposito,
    /// Credit card
    #[sea_orm(string_value = "CARTAO_CREDITO")]
    CartaoCredito,
    /// Debit card
    #[sea_orm(string_value = "CARTAO_DEBITO")]
    CartaoDebito,
    /// Anything else
    #[sea_orm(string_value = "OUTROS")]
    Outros,
}

macro_rules! impl_string_enum {
    ($t:ty, $field:literal) => {
        impl std::fmt::Display for $t {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.to_value())
            }
        }

        impl std::str::FromStr for $t {
            type Err = crate::errors::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_uppercase();
                Self::try_from_value(&normalized).map_err(|_| crate::errors::Error::Validation {
                    field: $field,
                    message: format!("unknown value `{s}`"),
                })
            }
        }
    };
}

impl_string_enum!(InvoiceStatus, "status");
impl_string_enum!(InvoiceType, "type");
impl_string_enum!(Month, "month");
impl_string_enum!(PaymentMethod, "payment_method");

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::errors::Error;

    #[test]
    fn test_status_round_trips_through_strings() {
        assert_eq!(InvoiceStatus::PartiallyPaid.to_string(), "PARTIALLY_PAID");
        assert_eq!(
            "partially_paid".parse::<InvoiceStatus>().unwrap(),
            InvoiceStatus::PartiallyPaid
        );
        assert_eq!("MARCO".parse::<Month>().unwrap(), Month::Marco);
        assert_eq!(
            " cartao_debito ".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::CartaoDebito
        );
    }

    #[test]
    fn test_unknown_value_is_a_field_level_validation_error() {
        let err = "TRIMESTRAL".parse::<InvoiceType>().unwrap_err();
        assert!(matches!(err, Error::Validation { field: "type", .. }));
    }

    #[test]
    fn test_terminal_statuses_reject_changes() {
        assert!(!InvoiceStatus::Paid.can_transition_to(InvoiceStatus::Pending));
        assert!(!InvoiceStatus::Cancelled.can_transition_to(InvoiceStatus::Paid));
        assert!(InvoiceStatus::Paid.can_transition_to(InvoiceStatus::Paid));
    }

    #[test]
    fn test_open_status_transitions() {
        assert!(InvoiceStatus::Pending.can_transition_to(InvoiceStatus::Overdue));
        assert!(InvoiceStatus::Overdue.can_transition_to(InvoiceStatus::PartiallyPaid));
        assert!(InvoiceStatus::PartiallyPaid.can_transition_to(InvoiceStatus::Paid));
        assert!(!InvoiceStatus::Overdue.can_transition_to(InvoiceStatus::Pending));
    }
}
