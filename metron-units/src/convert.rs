//! Conversion across the unit graph

use std::collections::VecDeque;

use tracing::trace;

use metron_core::UnitsError;

use crate::parse::{render_units, CompoundExpr, CompoundTerm};
use crate::registry::UnitRegistry;
use crate::unit::{ConversionFn, UnitId};

/// Convert `value` from one compound expression to another.
///
/// Terms pair up greedily: each source term takes the first remaining
/// target term with the same exponent magnitude that it can reach
/// through the graph. Pairs then convert independently, in source
/// order, so affine terms like a temperature numerator compose with
/// plain scalings on the other terms.
pub fn convert_units(
    registry: &UnitRegistry,
    value: f64,
    from: &CompoundExpr,
    to: &CompoundExpr,
) -> Result<f64, UnitsError> {
    let pairs = match_terms(registry, from, to)?;
    let mut result = value;
    for (source, target) in pairs {
        result = apply_pair(registry, result, source, target, from, to)?;
    }
    trace!(value, result, "converted expression");
    Ok(result)
}

/// Reduce a value to the unit's basis, following the basis chain.
///
/// Units without a basis return the value unchanged. Every step needs
/// a direct conversion edge from the unit to its basis.
pub fn to_basis(registry: &UnitRegistry, unit: UnitId, value: f64) -> Result<f64, UnitsError> {
    let mut current = unit;
    let mut result = value;
    while let Some(basis) = registry.unit(current).basis {
        let edge = registry
            .unit(current)
            .edges
            .iter()
            .find(|e| e.to == basis)
            .ok_or_else(|| UnitsError::NoPathFound {
                from: registry.unit(current).name.clone(),
                to: registry.unit(basis).name.clone(),
            })?;
        result = edge.outbound.apply(result);
        current = basis;
    }
    Ok(result)
}

fn incompatible(registry: &UnitRegistry, from: &CompoundExpr, to: &CompoundExpr) -> UnitsError {
    UnitsError::IncompatibleUnits {
        from: render_units(registry, from),
        to: render_units(registry, to),
    }
}

/// Pair source terms with target terms.
///
/// A source term with no target of matching exponent magnitude is a
/// shape mismatch; one whose candidates all sit in unreachable parts
/// of the graph is a path failure. Leftover target terms are shape
/// mismatches too.
fn match_terms(
    registry: &UnitRegistry,
    from: &CompoundExpr,
    to: &CompoundExpr,
) -> Result<Vec<(CompoundTerm, CompoundTerm)>, UnitsError> {
    let mut used = vec![false; to.terms.len()];
    let mut pairs = Vec::with_capacity(from.terms.len());
    for source in &from.terms {
        let mut first_candidate = None;
        let mut chosen = None;
        for (idx, target) in to.terms.iter().enumerate() {
            if used[idx] || target.exponent.unsigned_abs() != source.exponent.unsigned_abs() {
                continue;
            }
            if first_candidate.is_none() {
                first_candidate = Some(idx);
            }
            if reachable(registry, source.unit, target.unit) {
                chosen = Some(idx);
                break;
            }
        }
        match (chosen, first_candidate) {
            (Some(idx), _) => {
                used[idx] = true;
                pairs.push((*source, to.terms[idx]));
            }
            (None, Some(idx)) => {
                return Err(UnitsError::NoPathFound {
                    from: registry.unit(source.unit).name.clone(),
                    to: registry.unit(to.terms[idx].unit).name.clone(),
                });
            }
            (None, None) => return Err(incompatible(registry, from, to)),
        }
    }
    if used.iter().any(|u| !u) {
        return Err(incompatible(registry, from, to));
    }
    Ok(pairs)
}

fn apply_pair(
    registry: &UnitRegistry,
    value: f64,
    source: CompoundTerm,
    target: CompoundTerm,
    from: &CompoundExpr,
    to: &CompoundExpr,
) -> Result<f64, UnitsError> {
    let n = source.exponent;
    if source.unit == target.unit || n == 0 {
        return Ok(value);
    }

    // metric variants of one base resolve straight from their prefix
    // factors, no graph walk
    let (source_base, source_scale) = prefix_base(registry, source.unit);
    let (target_base, target_scale) = prefix_base(registry, target.unit);
    if source_base == target_base {
        return Ok(value * (source_scale / target_scale).powi(n));
    }

    let path = match find_path(registry, source.unit, target.unit) {
        Some(p) => p,
        None => {
            return Err(UnitsError::NoPathFound {
                from: registry.unit(source.unit).name.clone(),
                to: registry.unit(target.unit).name.clone(),
            })
        }
    };
    let mut product = 1.0;
    let mut pure = true;
    for step in &path {
        match step.scale_factor() {
            Some(k) => product *= k,
            None => {
                pure = false;
                break;
            }
        }
    }
    if pure {
        Ok(value * product.powi(n))
    } else if n == 1 {
        Ok(path.iter().fold(value, |v, step| step.apply(v)))
    } else {
        // offset and callback transforms act on the value itself;
        // they cannot be raised to a power
        Err(incompatible(registry, from, to))
    }
}

fn prefix_base(registry: &UnitRegistry, id: UnitId) -> (UnitId, f64) {
    let unit = registry.unit(id);
    match unit.prefix_of {
        Some(base) => (base, unit.prefix_scale),
        None => (id, 1.0),
    }
}

fn reachable(registry: &UnitRegistry, from: UnitId, to: UnitId) -> bool {
    if from == to {
        return true;
    }
    if prefix_base(registry, from).0 == prefix_base(registry, to).0 {
        return true;
    }
    find_path(registry, from, to).is_some()
}

/// Shortest conversion path between two units, as the outbound
/// transforms to apply in order.
///
/// Breadth-first over the edge lists in registration order: fewest
/// hops win, and among equal-length paths the earliest-registered
/// edges win, so the result never depends on anything but the call
/// sequence that built the registry.
fn find_path(registry: &UnitRegistry, from: UnitId, to: UnitId) -> Option<Vec<ConversionFn>> {
    if from == to {
        return Some(Vec::new());
    }
    let mut seen = vec![false; registry.len()];
    let mut prev: Vec<Option<(UnitId, usize)>> = vec![None; registry.len()];
    let mut queue = VecDeque::new();
    seen[from.index()] = true;
    queue.push_back(from);
    while let Some(id) = queue.pop_front() {
        for (edge_idx, edge) in registry.unit(id).edges.iter().enumerate() {
            if seen[edge.to.index()] {
                continue;
            }
            seen[edge.to.index()] = true;
            prev[edge.to.index()] = Some((id, edge_idx));
            if edge.to == to {
                let mut steps = Vec::new();
                let mut cursor = to;
                while cursor != from {
                    let (parent, idx) = prev[cursor.index()]?;
                    steps.push(registry.unit(parent).edges[idx].outbound.clone());
                    cursor = parent;
                }
                steps.reverse();
                return Some(steps);
            }
            queue.push_back(edge.to);
        }
    }
    None
}
