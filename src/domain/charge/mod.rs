pub mod model;

pub use model::{ChargeComponents, ChargeField, ComputedCharge};
