//! Clients and franchises that invoices are raised against.

pub mod model;

pub use model::{BillingParty, PartyKind};
