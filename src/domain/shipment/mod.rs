//! Shipment aggregate
//!
//! AWB records, their box sets and chargeable-weight derivation.

pub mod model;

pub use model::{box_set_weight, RateInfo, Receiver, Shipment, ShipmentBox, UNKNOWN_COUNTRY, VOLUMETRIC_DIVISOR};
