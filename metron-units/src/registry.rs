//! The unit registry: definitions, conversion edges, metric prefixes

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use metron_core::UnitsError;

use crate::unit::{ConversionEdge, ConversionFn, Unit, UnitId};

/// Metric prefixes in generation order, with their powers of ten
const METRIC_PREFIXES: [(&str, f64); 16] = [
    ("d", 1e-1),
    ("c", 1e-2),
    ("m", 1e-3),
    ("u", 1e-6),
    ("n", 1e-9),
    ("p", 1e-12),
    ("f", 1e-15),
    ("a", 1e-18),
    ("da", 1e1),
    ("h", 1e2),
    ("k", 1e3),
    ("M", 1e6),
    ("G", 1e9),
    ("T", 1e12),
    ("P", 1e15),
    ("E", 1e18),
];

/// Split a unit name into its letter part and trailing exponent.
///
/// Valid names are one or more ASCII letters followed by an optional
/// unsigned integer; the exponent defaults to 1.
fn name_exponent(name: &str) -> Option<i32> {
    let bytes = name.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
        i += 1;
    }
    if i == 0 {
        return None;
    }
    if i == bytes.len() {
        return Some(1);
    }
    if !bytes[i..].iter().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name[i..].parse().ok()
}

/// Insertion-ordered store of unit definitions.
///
/// Units live in an arena and are addressed by [`UnitId`]. Name lookup
/// is case-sensitive on the exact registered spelling. Registration
/// order is observable: conversion-path search visits edges in the
/// order they were defined, so two registries built by the same call
/// sequence behave identically.
#[derive(Debug, Default)]
pub struct UnitRegistry {
    units: Vec<Unit>,
    names: HashMap<String, UnitId>,
}

impl UnitRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered units, generated prefix variants included
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Shared access to a unit record.
    ///
    /// Panics when `id` was minted by a different registry and is out
    /// of range here; that is a logic error, not an input error.
    pub fn unit(&self, id: UnitId) -> &Unit {
        &self.units[id.0]
    }

    pub(crate) fn contains(&self, id: UnitId) -> bool {
        id.0 < self.units.len()
    }

    /// Exact-name lookup
    pub fn find(&self, name: &str) -> Option<UnitId> {
        self.names.get(name).copied()
    }

    /// Register a unit with the default (empty) family
    pub fn define(&mut self, name: &str, basis: Option<UnitId>) -> Result<UnitId, UnitsError> {
        self.define_in_family(name, basis, "")
    }

    /// Register a unit under a family label.
    ///
    /// The name's trailing digits become its dimensional exponent:
    /// "m3" is stored with exponent 3. Defining a name that already
    /// exists with the same basis and family returns the existing
    /// handle; any other redefinition is rejected and changes
    /// nothing.
    pub fn define_in_family(
        &mut self,
        name: &str,
        basis: Option<UnitId>,
        family: &str,
    ) -> Result<UnitId, UnitsError> {
        let exponent = match name_exponent(name) {
            Some(exp) => exp,
            None => return Err(UnitsError::InvalidUnitName(name.to_string())),
        };
        if let Some(&existing) = self.names.get(name) {
            let unit = &self.units[existing.0];
            if unit.basis == basis && unit.family == family {
                return Ok(existing);
            }
            return Err(UnitsError::DuplicateDefinition(name.to_string()));
        }
        if let Some(basis) = basis {
            if !self.contains(basis) {
                return Err(UnitsError::UnknownUnit(format!("#{}", basis.index())));
            }
        }
        let id = UnitId(self.units.len());
        self.units.push(Unit {
            name: name.to_string(),
            exponent,
            basis,
            metric: false,
            family: family.to_string(),
            prefix_of: None,
            prefix_scale: 1.0,
            edges: Vec::new(),
        });
        self.names.insert(name.to_string(), id);
        debug!(name, id = id.index(), "defined unit");
        Ok(id)
    }

    /// Register a conversion between two existing units.
    ///
    /// The edge is stored on both endpoints, `forward` describing
    /// `from` to `to` and `backward` the reverse, so path search never
    /// needs to invert a transform. Both handles are checked before
    /// anything is stored; on error the registry is unchanged.
    ///
    /// Returns `from`, so definitions chain naturally.
    pub fn define_conv(
        &mut self,
        from: UnitId,
        to: UnitId,
        forward: ConversionFn,
        backward: ConversionFn,
    ) -> Result<UnitId, UnitsError> {
        if !self.contains(from) {
            return Err(UnitsError::UnknownUnit(format!("#{}", from.index())));
        }
        if !self.contains(to) {
            return Err(UnitsError::UnknownUnit(format!("#{}", to.index())));
        }
        self.units[from.0].edges.push(ConversionEdge {
            to,
            outbound: forward.clone(),
            inbound: backward.clone(),
        });
        if from != to {
            self.units[to.0].edges.push(ConversionEdge {
                to: from,
                outbound: backward,
                inbound: forward,
            });
        }
        Ok(from)
    }

    /// Generate the metric-prefixed variants of `unit`, from "d" down
    /// to "a" and from "da" up to "E".
    ///
    /// Each variant gets a conversion edge to the base with the proper
    /// power of ten; for exponent-bearing bases the factor is raised
    /// accordingly, so "cm3" relates to "m3" by 1e-6. Names that are
    /// already registered are left alone. Returns `false` without
    /// generating anything when the unit is already metric or is
    /// itself a generated variant.
    pub fn make_metric(&mut self, unit: UnitId) -> bool {
        let base = &self.units[unit.0];
        if base.metric || base.prefix_of.is_some() {
            return false;
        }
        let base_name = base.name.clone();
        let base_exponent = base.exponent;
        let family = base.family.clone();
        self.units[unit.0].metric = true;

        for (prefix, factor) in METRIC_PREFIXES {
            let name = format!("{}{}", prefix, base_name);
            if self.names.contains_key(&name) {
                continue;
            }
            let scale = factor.powi(base_exponent);
            let id = UnitId(self.units.len());
            self.units.push(Unit {
                name: name.clone(),
                exponent: base_exponent,
                basis: Some(unit),
                metric: false,
                family: family.clone(),
                prefix_of: Some(unit),
                prefix_scale: scale,
                edges: vec![ConversionEdge {
                    to: unit,
                    outbound: ConversionFn::scale(scale),
                    inbound: ConversionFn::scale(1.0 / scale),
                }],
            });
            self.units[unit.0].edges.push(ConversionEdge {
                to: id,
                outbound: ConversionFn::scale(1.0 / scale),
                inbound: ConversionFn::scale(scale),
            });
            self.names.insert(name, id);
        }
        debug!(unit = %base_name, "generated metric prefixes");
        true
    }

    /// Names of every unit reachable from `unit` through conversion
    /// edges, the unit itself first.
    ///
    /// Order is deterministic: breadth-first, edges in registration
    /// order.
    pub fn compatible_units(&self, unit: UnitId) -> Vec<String> {
        let mut seen = vec![false; self.units.len()];
        let mut queue = VecDeque::new();
        let mut names = Vec::new();
        seen[unit.0] = true;
        queue.push_back(unit);
        while let Some(id) = queue.pop_front() {
            names.push(self.units[id.0].name.clone());
            for edge in &self.units[id.0].edges {
                if !seen[edge.to.0] {
                    seen[edge.to.0] = true;
                    queue.push_back(edge.to);
                }
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_find() {
        let mut reg = UnitRegistry::new();
        let m = reg.define("m", None).unwrap();
        assert_eq!(reg.find("m"), Some(m));
        assert_eq!(reg.find("M"), None);
        assert_eq!(reg.unit(m).name, "m");
        assert_eq!(reg.unit(m).exponent, 1);
    }

    #[test]
    fn test_define_reads_trailing_exponent() {
        let mut reg = UnitRegistry::new();
        let m3 = reg.define("m3", None).unwrap();
        assert_eq!(reg.unit(m3).exponent, 3);

        let mmhg = reg.define("mmHg", None).unwrap();
        assert_eq!(reg.unit(mmhg).exponent, 1);
    }

    #[test]
    fn test_define_rejects_bad_names() {
        let mut reg = UnitRegistry::new();
        assert_eq!(
            reg.define("3m", None),
            Err(UnitsError::InvalidUnitName("3m".to_string()))
        );
        assert_eq!(
            reg.define("", None),
            Err(UnitsError::InvalidUnitName(String::new()))
        );
        assert_eq!(
            reg.define("m3x", None),
            Err(UnitsError::InvalidUnitName("m3x".to_string()))
        );
    }

    #[test]
    fn test_identical_redefinition_returns_existing() {
        let mut reg = UnitRegistry::new();
        let m = reg.define("m", None).unwrap();
        assert_eq!(reg.define("m", None), Ok(m));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_conflicting_redefinition_rejected() {
        let mut reg = UnitRegistry::new();
        let m = reg.define("m", None).unwrap();
        assert_eq!(
            reg.define("ft", Some(m)),
            reg.define("ft", Some(m)),
            "identical re-definition is not an error"
        );
        assert_eq!(
            reg.define("m", Some(m)),
            Err(UnitsError::DuplicateDefinition("m".to_string()))
        );
        assert_eq!(
            reg.define_in_family("m", None, "length"),
            Err(UnitsError::DuplicateDefinition("m".to_string()))
        );
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_define_conv_checks_handles_before_writing() {
        let mut reg = UnitRegistry::new();
        let m = reg.define("m", None).unwrap();
        let bogus = UnitId(99);
        let err = reg
            .define_conv(m, bogus, ConversionFn::scale(2.0), ConversionFn::scale(0.5))
            .unwrap_err();
        assert_eq!(err.code(), metron_core::codes::UNKNOWN_UNIT);
        assert!(reg.unit(m).edges.is_empty());
    }

    #[test]
    fn test_define_conv_stores_both_directions() {
        let mut reg = UnitRegistry::new();
        let m = reg.define("m", None).unwrap();
        let ft = reg.define("ft", None).unwrap();
        let returned = reg
            .define_conv(
                m,
                ft,
                ConversionFn::scale(3.2808),
                ConversionFn::scale(1.0 / 3.2808),
            )
            .unwrap();
        assert_eq!(returned, m);
        assert_eq!(reg.unit(m).edges.len(), 1);
        assert_eq!(reg.unit(ft).edges.len(), 1);
        assert_eq!(reg.unit(m).edges[0].to, ft);
        assert_eq!(reg.unit(ft).edges[0].to, m);
        // each side's outbound transform points away from it
        assert_eq!(reg.unit(m).edges[0].outbound.scale_factor(), Some(3.2808));
        assert_eq!(
            reg.unit(ft).edges[0].outbound.scale_factor(),
            Some(1.0 / 3.2808)
        );
    }

    #[test]
    fn test_make_metric_generates_prefixes() {
        let mut reg = UnitRegistry::new();
        let m = reg.define("m", None).unwrap();
        assert!(reg.make_metric(m));
        assert_eq!(reg.len(), 17);
        assert!(reg.unit(m).metric);

        let cm = reg.find("cm").unwrap();
        assert_eq!(reg.unit(cm).prefix_of, Some(m));
        assert_eq!(reg.unit(cm).prefix_scale, 1e-2);
        assert_eq!(reg.unit(cm).basis, Some(m));

        let km = reg.find("km").unwrap();
        assert_eq!(reg.unit(km).prefix_scale, 1e3);
        assert!(reg.find("Em").is_some());
    }

    #[test]
    fn test_make_metric_raises_prefix_to_base_exponent() {
        let mut reg = UnitRegistry::new();
        let m3 = reg.define("m3", None).unwrap();
        assert!(reg.make_metric(m3));
        let cm3 = reg.find("cm3").unwrap();
        assert!((reg.unit(cm3).prefix_scale - 1e-6).abs() < 1e-20);
    }

    #[test]
    fn test_make_metric_skips_taken_names() {
        let mut reg = UnitRegistry::new();
        let min = reg.define("min", None).unwrap();
        let s = reg.define("s", None).unwrap();
        assert!(reg.make_metric(s));
        // "min" was already a unit of its own, so no prefix variant
        // replaced it
        assert_eq!(reg.find("min"), Some(min));
        assert_eq!(reg.unit(min).prefix_of, None);
        assert!(reg.find("ms").is_some());
    }

    #[test]
    fn test_make_metric_refuses_repeats_and_variants() {
        let mut reg = UnitRegistry::new();
        let m = reg.define("m", None).unwrap();
        assert!(reg.make_metric(m));
        assert!(!reg.make_metric(m));
        let before = reg.len();
        let cm = reg.find("cm").unwrap();
        assert!(!reg.make_metric(cm));
        assert_eq!(reg.len(), before);
    }

    #[test]
    fn test_compatible_units_breadth_first() {
        let mut reg = UnitRegistry::new();
        let a = reg.define("a", None).unwrap();
        let b = reg.define("b", None).unwrap();
        let c = reg.define("c", None).unwrap();
        let d = reg.define("d", None).unwrap();
        reg.define("lonely", None).unwrap();
        reg.define_conv(a, b, ConversionFn::scale(2.0), ConversionFn::scale(0.5))
            .unwrap();
        reg.define_conv(a, c, ConversionFn::scale(3.0), ConversionFn::scale(1.0 / 3.0))
            .unwrap();
        reg.define_conv(c, d, ConversionFn::scale(4.0), ConversionFn::scale(0.25))
            .unwrap();
        assert_eq!(reg.compatible_units(a), vec!["a", "b", "c", "d"]);
        assert_eq!(reg.compatible_units(d), vec!["d", "c", "a", "b"]);
    }
}
