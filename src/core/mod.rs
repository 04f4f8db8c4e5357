//! Core data structures and types.

pub mod constants;
pub mod dimensions;
pub mod error;
pub mod quantity;
pub mod species;
pub mod units;

pub use dimensions::Dimensions;
pub use error::{Error, Result};
pub use quantity::Quantity;
pub use species::Species;
