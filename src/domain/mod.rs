pub mod charge;
pub mod invoice;
pub mod party;
pub mod ports;
pub mod rate_card;
pub mod shipment;
pub mod tax;

// Re-export commonly used types
pub use charge::{ChargeComponents, ChargeField, ComputedCharge};
pub use invoice::{BillingInfo, InvoiceLine, InvoicePayload, InvoiceReceipt, InvoiceStore, InvoiceTotals};
pub use party::{BillingParty, PartyKind};
pub use ports::{BackOfficeSource, RateQuery, RateResolver, ResolvedRate};
pub use rate_card::{RateCard, RateCardPayload, RateCardStore, RateType, WeightBracket, Zone, ZonePrice};
pub use shipment::{RateInfo, Receiver, Shipment, ShipmentBox};
pub use tax::{TaxComputation, TaxMode, TaxSettings, TaxSplit};

// Re-export errors from shared for convenience
pub use crate::shared::types::{DomainError, DomainResult};
