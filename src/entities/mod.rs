//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the billing tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod enums;
pub mod invoice;
pub mod invoice_history;
pub mod late_fee;
pub mod payment;
pub mod payment_reminder;

pub use enums::{InvoiceStatus, InvoiceType, Month, PaymentMethod};

// Re-export specific types to avoid conflicts
pub use invoice::{Column as InvoiceColumn, Entity as Invoice, Model as InvoiceModel};
pub use invoice_history::{
    Column as InvoiceHistoryColumn, Entity as InvoiceHistory, Model as InvoiceHistoryModel,
};
pub use late_fee::{Column as LateFeeColumn, Entity as LateFee, Model as LateFeeModel};
pub use payment::{Column as PaymentColumn, Entity as Payment, Model as PaymentModel};
pub use payment_reminder::{
    Column as PaymentReminderColumn, Entity as PaymentReminder, Model as PaymentReminderModel,
};
