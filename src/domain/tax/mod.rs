//! Tax settings (CGST / SGST / IGST) and GST arithmetic.

pub mod model;

pub use model::{TaxComputation, TaxMode, TaxSettings, TaxSplit};
