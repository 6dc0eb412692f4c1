//! Rate card aggregate
//!
//! Canonical weight × zone price matrix produced by rate sheet ingestion.

pub mod model;
pub mod repository;

pub use model::{RateCard, RateCardPayload, RateType, WeightBracket, Zone, ZonePrice};
pub use repository::RateCardStore;
