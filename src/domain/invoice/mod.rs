//! Invoice aggregate
//!
//! Totals over selected charges and the bill handed to the invoice store.

pub mod model;
pub mod repository;

pub use model::{BillingInfo, InvoiceLine, InvoicePayload, InvoiceReceipt, InvoiceTotals};
pub use repository::InvoiceStore;
