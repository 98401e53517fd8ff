//! Metron Core - Fundamental types
//!
//! This crate provides the shared building blocks of the Metron
//! workspace:
//! - `UnitsError`: every failure the engine reports, with stable codes
//! - Numeric text helpers: the 6-significant-digit formatter used for
//!   conversion results and the scanner that splits "72F" into value
//!   and unit text

mod error;
mod number;

pub use error::{codes, UnitsError};
pub use number::{format_g6, split_number};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{format_g6, split_number, UnitsError};
    pub use crate::error::codes;
}
