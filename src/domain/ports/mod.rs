//! Outbound ports: interfaces to the back-office services the engine
//! depends on but does not own.

mod back_office;
mod rate_resolver;

pub use back_office::BackOfficeSource;
pub use rate_resolver::{RateQuery, RateResolver, ResolvedRate};
