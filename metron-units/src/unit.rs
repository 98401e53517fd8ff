//! Unit records and conversion edges

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// Opaque handle to a unit inside a [`UnitRegistry`](crate::UnitRegistry).
///
/// Handles are only meaningful for the registry that minted them;
/// passing one to another registry is a logic error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UnitId(pub(crate) usize);

impl UnitId {
    /// Arena index inside the owning registry
    pub fn index(&self) -> usize {
        self.0
    }
}

/// The transform carried by one side of a conversion edge
#[derive(Clone)]
pub enum ConversionFn {
    /// `v * scale + offset`; covers every proportional conversion and
    /// the temperature-style shifted ones
    Affine { scale: f64, offset: f64 },
    /// Arbitrary caller-supplied transform
    External(Arc<dyn Fn(f64) -> f64 + Send + Sync>),
}

impl ConversionFn {
    /// Proportional conversion: `v * scale`
    pub fn scale(scale: f64) -> Self {
        ConversionFn::Affine { scale, offset: 0.0 }
    }

    /// Affine conversion: `v * scale + offset`
    pub fn affine(scale: f64, offset: f64) -> Self {
        ConversionFn::Affine { scale, offset }
    }

    /// Wrap an arbitrary callback
    pub fn external<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        ConversionFn::External(Arc::new(f))
    }

    /// Apply the transform to a value
    pub fn apply(&self, v: f64) -> f64 {
        match self {
            ConversionFn::Affine { scale, offset } => v * scale + offset,
            ConversionFn::External(f) => f(v),
        }
    }

    /// The multiplicative factor, when this is a pure scaling.
    ///
    /// Offset and callback transforms have no factor: they must be
    /// applied to the value itself and cannot be raised to a power.
    pub fn scale_factor(&self) -> Option<f64> {
        match self {
            ConversionFn::Affine { scale, offset } if *offset == 0.0 => Some(*scale),
            _ => None,
        }
    }
}

impl fmt::Debug for ConversionFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionFn::Affine { scale, offset } => f
                .debug_struct("Affine")
                .field("scale", scale)
                .field("offset", offset)
                .finish(),
            ConversionFn::External(_) => f.write_str("External(..)"),
        }
    }
}

/// A conversion edge from one unit to a neighbor.
///
/// Registering a conversion stores an edge on both endpoints, so
/// traversal only ever applies `outbound` transforms.
#[derive(Debug, Clone)]
pub struct ConversionEdge {
    /// Target unit of this edge
    pub to: UnitId,
    /// Transform applied when moving along the edge
    pub outbound: ConversionFn,
    /// Transform for the reverse direction
    pub inbound: ConversionFn,
}

/// A registered unit
#[derive(Debug, Clone)]
pub struct Unit {
    /// The symbol as registered (e.g. "m", "cm3", "mmHg")
    pub name: String,
    /// Dimensional exponent baked into the name ("m3" stores 3)
    pub exponent: i32,
    /// The unit this one is defined in terms of, if any
    pub basis: Option<UnitId>,
    /// Whether metric prefixes have been generated for this unit
    pub metric: bool,
    /// Family label for compatibility reporting (e.g. "temperature")
    pub family: String,
    /// For prefix-generated units, the base unit they scale
    pub prefix_of: Option<UnitId>,
    /// For prefix-generated units, the factor to the base unit. The
    /// base exponent is folded in: "cm3" stores 1e-6, not 1e-2.
    pub prefix_scale: f64,
    /// Outgoing conversion edges, in registration order
    pub edges: Vec<ConversionEdge>,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
