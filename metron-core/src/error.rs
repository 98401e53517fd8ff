use serde::Serialize;
use thiserror::Error;

/// Standard error codes (machine-readable)
pub mod codes {
    pub const INVALID_UNIT_NAME: &str = "INVALID_UNIT_NAME";
    pub const DUPLICATE_DEFINITION: &str = "DUPLICATE_DEFINITION";
    pub const UNKNOWN_UNIT: &str = "UNKNOWN_UNIT";
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const INCOMPATIBLE_UNITS: &str = "INCOMPATIBLE_UNITS";
    pub const NO_PATH_FOUND: &str = "NO_PATH_FOUND";
    pub const UNKNOWN_PRESET_GROUP: &str = "UNKNOWN_PRESET_GROUP";
}

/// Everything the engine can report instead of an answer.
///
/// Errors are plain values: malformed input, unknown names and
/// unreachable conversions never panic.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum UnitsError {
    /// Unit names are one or more ASCII letters with an optional
    /// trailing unsigned integer ("m", "cm3", "mmHg")
    #[error("invalid unit name: {0:?}")]
    InvalidUnitName(String),

    #[error("unit {0:?} is already defined")]
    DuplicateDefinition(String),

    #[error("unknown unit: {0:?}")]
    UnknownUnit(String),

    /// `offset` is the byte position of the offending text in the
    /// original input
    #[error("unrecognized unit text {text:?} at offset {offset}")]
    ParseError { offset: usize, text: String },

    #[error("incompatible units: cannot convert {from:?} to {to:?}")]
    IncompatibleUnits { from: String, to: String },

    #[error("no conversion path from {from:?} to {to:?}")]
    NoPathFound { from: String, to: String },

    #[error("unknown preset group: {0:?}")]
    UnknownPresetGroup(String),
}

impl UnitsError {
    /// Stable machine-readable code for binding layers
    pub fn code(&self) -> &'static str {
        match self {
            UnitsError::InvalidUnitName(_) => codes::INVALID_UNIT_NAME,
            UnitsError::DuplicateDefinition(_) => codes::DUPLICATE_DEFINITION,
            UnitsError::UnknownUnit(_) => codes::UNKNOWN_UNIT,
            UnitsError::ParseError { .. } => codes::PARSE_ERROR,
            UnitsError::IncompatibleUnits { .. } => codes::INCOMPATIBLE_UNITS,
            UnitsError::NoPathFound { .. } => codes::NO_PATH_FOUND,
            UnitsError::UnknownPresetGroup(_) => codes::UNKNOWN_PRESET_GROUP,
        }
    }
}
