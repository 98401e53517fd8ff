//! Metron - Units of Measure Conversion

mod presets;

pub use metron_core::{codes, format_g6, split_number, UnitsError};
pub use metron_units::{
    convert_units, parse_units, parse_value, render, render_units, to_basis, CompoundExpr,
    CompoundTerm, ConversionEdge, ConversionFn, Unit, UnitId, UnitRegistry,
};

use std::collections::HashSet;

use serde::Serialize;

/// What [`Units::validate`] reports about a unit name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Whether the name is registered
    pub ok: bool,
    /// Family label of the unit, empty when unknown
    pub family: String,
    /// Every unit it can convert to, itself first
    pub compatible: Vec<String>,
}

/// Main conversion engine
pub struct Units {
    registry: UnitRegistry,
    loaded: HashSet<String>,
}

impl Units {
    /// Start with an empty registry
    pub fn new() -> Self {
        Self {
            registry: UnitRegistry::new(),
            loaded: HashSet::new(),
        }
    }

    /// Start with every preset group loaded
    pub fn with_standard_units() -> Result<Self, UnitsError> {
        let mut units = Self::new();
        units.add_presets("all")?;
        Ok(units)
    }

    /// Load a preset group by name ("time", "temp", ..., or "all").
    /// Groups load at most once, so repeated calls are safe.
    pub fn add_presets(&mut self, group: &str) -> Result<(), UnitsError> {
        presets::load_group(&mut self.registry, &mut self.loaded, group)
    }

    /// Read access to the underlying registry
    pub fn registry(&self) -> &UnitRegistry {
        &self.registry
    }

    /// Register a unit; see [`UnitRegistry::define`]
    pub fn define(&mut self, name: &str, basis: Option<UnitId>) -> Result<UnitId, UnitsError> {
        self.registry.define(name, basis)
    }

    /// Register a unit under a family label
    pub fn define_in_family(
        &mut self,
        name: &str,
        basis: Option<UnitId>,
        family: &str,
    ) -> Result<UnitId, UnitsError> {
        self.registry.define_in_family(name, basis, family)
    }

    /// Register a conversion between two units; returns `from`
    pub fn define_conv(
        &mut self,
        from: UnitId,
        to: UnitId,
        forward: ConversionFn,
        backward: ConversionFn,
    ) -> Result<UnitId, UnitsError> {
        self.registry.define_conv(from, to, forward, backward)
    }

    /// Exact-name lookup
    pub fn find(&self, name: &str) -> Option<UnitId> {
        self.registry.find(name)
    }

    /// Generate metric prefix variants for a unit
    pub fn make_metric(&mut self, unit: UnitId) -> bool {
        self.registry.make_metric(unit)
    }

    /// Convert a value-with-units string to the target units,
    /// formatted with 6 significant digits.
    ///
    /// `convert("72F", "C", false)` gives "22.2222"; with
    /// `show_units` the canonical target rendering is appended:
    /// "22.2222C".
    pub fn convert(
        &self,
        from_value: &str,
        to_units: &str,
        show_units: bool,
    ) -> Result<String, UnitsError> {
        let (value, from) = parse_value(&self.registry, from_value)?;
        let to = parse_units(&self.registry, to_units)?;
        let result = convert_units(&self.registry, value, &from, &to)?;
        Ok(render(&self.registry, result, &to, show_units))
    }

    /// Convert a plain number between two unit expressions
    pub fn convert_f64(
        &self,
        value: f64,
        from_units: &str,
        to_units: &str,
    ) -> Result<f64, UnitsError> {
        let from = parse_units(&self.registry, from_units)?;
        let to = parse_units(&self.registry, to_units)?;
        convert_units(&self.registry, value, &from, &to)
    }

    /// Reduce a value to the unit's basis; values of basis-less units
    /// come back unchanged
    pub fn make_basis(&self, unit: UnitId, value: f64) -> Result<f64, UnitsError> {
        to_basis(&self.registry, unit, value)
    }

    /// Report whether `name` is registered, along with its family and
    /// everything it converts to
    pub fn validate(&self, name: &str) -> ValidationReport {
        match self.registry.find(name) {
            Some(id) => ValidationReport {
                ok: true,
                family: self.registry.unit(id).family.clone(),
                compatible: self.registry.compatible_units(id),
            },
            None => ValidationReport {
                ok: false,
                family: String::new(),
                compatible: Vec::new(),
            },
        }
    }

    /// Dimensional exponent carried by the unit's name
    pub fn get_exponent(&self, unit: UnitId) -> f64 {
        self.registry.unit(unit).exponent as f64
    }

    /// The unit this one was defined in terms of, if any
    pub fn get_basis(&self, unit: UnitId) -> Option<UnitId> {
        self.registry.unit(unit).basis
    }

    /// Names of every unit reachable from this one, itself first
    pub fn get_compatible(&self, unit: UnitId) -> Vec<String> {
        self.registry.compatible_units(unit)
    }
}

impl Default for Units {
    fn default() -> Self {
        Self::new()
    }
}
