//! Invoicing session state

mod filter;
mod invoice_session;

pub use filter::ShipmentFilter;
pub use invoice_session::{InvoiceSession, ResolutionTicket};
