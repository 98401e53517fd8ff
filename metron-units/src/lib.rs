//! Metron Units - registry, parser and conversion engine
//!
//! The pieces here compose into the conversion engine:
//! - [`UnitRegistry`] stores unit definitions, conversion edges and
//!   generated metric prefixes
//! - [`parse_value`] and [`parse_units`] turn text like "5.00m/s"
//!   into [`CompoundExpr`] values
//! - [`convert_units`] moves numbers across the conversion graph,
//!   term by term

mod convert;
mod parse;
mod registry;
mod unit;

pub use convert::{convert_units, to_basis};
pub use parse::{parse_units, parse_value, render, render_units, CompoundExpr, CompoundTerm};
pub use registry::UnitRegistry;
pub use unit::{ConversionEdge, ConversionFn, Unit, UnitId};
