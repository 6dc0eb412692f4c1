//! Application services

mod charge_calculator;
mod invoicing;
mod rate_cards;
mod snapshot;

pub use charge_calculator::{ChargeBatch, ChargeCalculator, RateSource};
pub use invoicing::InvoiceService;
pub use rate_cards::{RateCardService, RateCardUpload};
pub use snapshot::WorkspaceSnapshot;
