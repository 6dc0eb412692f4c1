pub mod errors;
pub mod numeric;

pub use errors::*;
pub use numeric::*;
