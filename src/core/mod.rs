/// Billing workflows: invoice generation, overdue scan, status changes
pub mod billing;

/// Append-only invoice history log
pub mod history;

/// Invoice storage operations
pub mod invoice;

/// Penalty policy and late fee records
pub mod late_fee;

/// Payment ledger
pub mod payment;

/// Tuition pricing table
pub mod pricing;

/// Registration lookup used when generating invoices
pub mod registration;

/// Payment reminder log
pub mod reminder;
