//! Compound-unit expression parsing - "72F", "m2/Vs", "kVus"

use metron_core::{format_g6, split_number, UnitsError};

use crate::registry::UnitRegistry;
use crate::unit::UnitId;

/// One unit reference inside a compound expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompoundTerm {
    pub unit: UnitId,
    /// Signed exponent; denominator terms are negative
    pub exponent: i32,
}

/// A compound-unit expression: a product of registered units raised
/// to signed integer exponents, e.g. "m2/Vs" is m²·V⁻¹·s⁻¹
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompoundExpr {
    pub terms: Vec<CompoundTerm>,
}

/// Parse a value with its units, like "72F" or "5.00 m/s".
///
/// Both the number and the unit expression are required; whitespace
/// may separate them but cannot appear inside the expression itself.
pub fn parse_value(
    registry: &UnitRegistry,
    text: &str,
) -> Result<(f64, CompoundExpr), UnitsError> {
    let lead = text.len() - text.trim_start().len();
    let body = text.trim();
    let (value, rest) = match split_number(body) {
        Some(pair) => pair,
        None => {
            return Err(UnitsError::ParseError {
                offset: lead,
                text: body.to_string(),
            })
        }
    };
    let after_number = lead + (body.len() - rest.len());
    let unit_text = rest.trim_start();
    let unit_offset = after_number + (rest.len() - unit_text.len());
    if unit_text.is_empty() {
        return Err(UnitsError::ParseError {
            offset: lead,
            text: body.to_string(),
        });
    }
    let units = parse_expression(registry, unit_text, unit_offset)?;
    Ok((value, units))
}

/// Parse a bare compound-unit expression like "m2/Vs".
///
/// A '/' sends every later unit to the denominator. Trailing integers
/// are exponents, except that a spelling registered as a whole ("m3")
/// is taken as that unit. Letter runs with no exact match are split
/// longest-registered-suffix-first, so "kVus" reads as kV·us.
pub fn parse_units(registry: &UnitRegistry, text: &str) -> Result<CompoundExpr, UnitsError> {
    let lead = text.len() - text.trim_start().len();
    let body = text.trim();
    if body.is_empty() {
        return Err(UnitsError::ParseError {
            offset: 0,
            text: String::new(),
        });
    }
    parse_expression(registry, body, lead)
}

/// Canonical text for an expression: numerator terms in order, then
/// '/' and the denominator terms, exponents spelled when not 1.
pub fn render_units(registry: &UnitRegistry, expr: &CompoundExpr) -> String {
    let mut out = String::new();
    for term in expr.terms.iter().filter(|t| t.exponent >= 0) {
        out.push_str(&registry.unit(term.unit).name);
        if term.exponent != 1 {
            out.push_str(&term.exponent.to_string());
        }
    }
    let denominator: Vec<_> = expr.terms.iter().filter(|t| t.exponent < 0).collect();
    if !denominator.is_empty() {
        out.push('/');
        for term in denominator {
            out.push_str(&registry.unit(term.unit).name);
            if term.exponent != -1 {
                out.push_str(&(-term.exponent).to_string());
            }
        }
    }
    out
}

/// Render a converted value, appending the expression's canonical
/// text when `show_units` is set
pub fn render(
    registry: &UnitRegistry,
    value: f64,
    expr: &CompoundExpr,
    show_units: bool,
) -> String {
    let text = format_g6(value);
    if show_units {
        format!("{}{}", text, render_units(registry, expr))
    } else {
        text
    }
}

fn parse_expression(
    registry: &UnitRegistry,
    text: &str,
    base: usize,
) -> Result<CompoundExpr, UnitsError> {
    let bytes = text.as_bytes();
    let mut terms: Vec<CompoundTerm> = Vec::new();
    let mut sign = 1;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'/' {
            sign = -1;
            i += 1;
            continue;
        }
        if bytes[i].is_ascii_alphabetic() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                i += 1;
            }
            let digits_start = i;
            let mut signed = false;
            if i < bytes.len()
                && (bytes[i] == b'-' || bytes[i] == b'+')
                && i + 1 < bytes.len()
                && bytes[i + 1].is_ascii_digit()
            {
                signed = true;
                i += 1;
            }
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let run = &text[start..digits_start];
            let digits = &text[digits_start..i];

            // a spelling with trailing digits is first tried whole, so
            // a registered "m3" wins over m raised to the third
            if !digits.is_empty() && !signed {
                if let Some(id) = registry.find(&text[start..i]) {
                    push_term(&mut terms, id, sign);
                    continue;
                }
            }
            let exp: i32 = if digits.is_empty() {
                1
            } else {
                match digits.parse() {
                    Ok(e) => e,
                    Err(_) => {
                        return Err(UnitsError::ParseError {
                            offset: base + digits_start,
                            text: digits.to_string(),
                        })
                    }
                }
            };
            resolve_run(registry, run, base + start, sign * exp, sign, &mut terms)?;
            continue;
        }
        // anything else has no place in the grammar
        let rest = &text[i..];
        let len = rest.chars().next().map(|c| c.len_utf8()).unwrap_or(1);
        return Err(UnitsError::ParseError {
            offset: base + i,
            text: rest[..len].to_string(),
        });
    }
    Ok(CompoundExpr { terms })
}

/// Resolve a letter run by peeling registered suffixes, longest
/// first. The rightmost part carries the explicit exponent; anything
/// to its left defaults to exponent 1 on the same side of the '/'.
fn resolve_run(
    registry: &UnitRegistry,
    run: &str,
    offset: usize,
    last_exp: i32,
    sign: i32,
    terms: &mut Vec<CompoundTerm>,
) -> Result<(), UnitsError> {
    let mut parts: Vec<(UnitId, i32)> = Vec::new();
    let mut rest = run;
    let mut exp = last_exp;
    while !rest.is_empty() {
        let mut found = None;
        for split in 0..rest.len() {
            if let Some(id) = registry.find(&rest[split..]) {
                found = Some((split, id));
                break;
            }
        }
        match found {
            Some((split, id)) => {
                parts.push((id, exp));
                rest = &rest[..split];
                exp = sign;
            }
            None => {
                return Err(UnitsError::ParseError {
                    offset,
                    text: run.to_string(),
                });
            }
        }
    }
    for (unit, exponent) in parts.into_iter().rev() {
        push_term(terms, unit, exponent);
    }
    Ok(())
}

/// Repeated units merge into the first occurrence by summing
/// exponents
fn push_term(terms: &mut Vec<CompoundTerm>, unit: UnitId, exponent: i32) {
    if let Some(existing) = terms.iter_mut().find(|t| t.unit == unit) {
        existing.exponent += exponent;
    } else {
        terms.push(CompoundTerm { unit, exponent });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_registry() -> UnitRegistry {
        let mut reg = UnitRegistry::new();
        let m = reg.define("m", None).unwrap();
        reg.make_metric(m);
        let s = reg.define("s", None).unwrap();
        reg.make_metric(s);
        let v = reg.define("V", None).unwrap();
        reg.make_metric(v);
        let m3 = reg.define("m3", None).unwrap();
        reg.make_metric(m3);
        reg
    }

    fn term(reg: &UnitRegistry, name: &str, exponent: i32) -> CompoundTerm {
        CompoundTerm {
            unit: reg.find(name).unwrap(),
            exponent,
        }
    }

    #[test]
    fn test_parse_simple_unit() {
        let reg = sample_registry();
        let expr = parse_units(&reg, "m").unwrap();
        assert_eq!(expr.terms, vec![term(&reg, "m", 1)]);
    }

    #[test]
    fn test_parse_value_splits_number() {
        let reg = sample_registry();
        let (value, expr) = parse_value(&reg, "5.00s").unwrap();
        assert_eq!(value, 5.0);
        assert_eq!(expr.terms, vec![term(&reg, "s", 1)]);

        let (value, expr) = parse_value(&reg, "  -2.5e1 m ").unwrap();
        assert_eq!(value, -25.0);
        assert_eq!(expr.terms, vec![term(&reg, "m", 1)]);
    }

    #[test]
    fn test_parse_quotient() {
        let reg = sample_registry();
        let expr = parse_units(&reg, "m/s").unwrap();
        assert_eq!(expr.terms, vec![term(&reg, "m", 1), term(&reg, "s", -1)]);
    }

    #[test]
    fn test_slash_applies_to_all_following_terms() {
        let reg = sample_registry();
        let expr = parse_units(&reg, "m/sV").unwrap();
        assert_eq!(
            expr.terms,
            vec![term(&reg, "m", 1), term(&reg, "s", -1), term(&reg, "V", -1)]
        );
        let again = parse_units(&reg, "m/s/V").unwrap();
        assert_eq!(again.terms, expr.terms);
    }

    #[test]
    fn test_leading_slash_puts_first_term_in_denominator() {
        let reg = sample_registry();
        let expr = parse_units(&reg, "/s").unwrap();
        assert_eq!(expr.terms, vec![term(&reg, "s", -1)]);

        // the registered spelling still wins below the slash
        let expr = parse_units(&reg, "/m3").unwrap();
        assert_eq!(expr.terms, vec![term(&reg, "m3", -1)]);

        let expr = parse_units(&reg, "/m2").unwrap();
        assert_eq!(expr.terms, vec![term(&reg, "m", -2)]);

        let (value, expr) = parse_value(&reg, "5/s").unwrap();
        assert_eq!(value, 5.0);
        assert_eq!(expr.terms, vec![term(&reg, "s", -1)]);
    }

    #[test]
    fn test_parse_exponents() {
        let reg = sample_registry();
        let expr = parse_units(&reg, "m2/Vs").unwrap();
        assert_eq!(
            expr.terms,
            vec![term(&reg, "m", 2), term(&reg, "V", -1), term(&reg, "s", -1)]
        );

        let expr = parse_units(&reg, "cm2/Vs").unwrap();
        assert_eq!(
            expr.terms,
            vec![term(&reg, "cm", 2), term(&reg, "V", -1), term(&reg, "s", -1)]
        );
    }

    #[test]
    fn test_parse_signed_exponent() {
        let reg = sample_registry();
        let expr = parse_units(&reg, "ms-1").unwrap();
        assert_eq!(expr.terms, vec![term(&reg, "ms", -1)]);

        let expr = parse_units(&reg, "m+2").unwrap();
        assert_eq!(expr.terms, vec![term(&reg, "m", 2)]);
    }

    #[test]
    fn test_registered_spelling_beats_exponent_split() {
        let reg = sample_registry();
        // "m3" is a unit of its own here, not m cubed
        let expr = parse_units(&reg, "m3").unwrap();
        assert_eq!(expr.terms, vec![term(&reg, "m3", 1)]);

        // "m2" is not registered, so it falls back to m squared
        let expr = parse_units(&reg, "m2").unwrap();
        assert_eq!(expr.terms, vec![term(&reg, "m", 2)]);
    }

    #[test]
    fn test_compound_run_splits_on_suffixes() {
        let reg = sample_registry();
        let expr = parse_units(&reg, "kVus").unwrap();
        assert_eq!(expr.terms, vec![term(&reg, "kV", 1), term(&reg, "us", 1)]);

        let expr = parse_units(&reg, "Vs2").unwrap();
        assert_eq!(expr.terms, vec![term(&reg, "V", 1), term(&reg, "s", 2)]);
    }

    #[test]
    fn test_whole_run_wins_over_split() {
        let reg = sample_registry();
        // "mm" is the millimeter, never m·m
        let expr = parse_units(&reg, "mm").unwrap();
        assert_eq!(expr.terms, vec![term(&reg, "mm", 1)]);
    }

    #[test]
    fn test_repeated_units_merge() {
        let reg = sample_registry();
        let expr = parse_units(&reg, "m2m").unwrap();
        assert_eq!(expr.terms, vec![term(&reg, "m", 3)]);

        let cancelled = parse_units(&reg, "m/m").unwrap();
        assert_eq!(cancelled.terms, vec![term(&reg, "m", 0)]);
    }

    #[test]
    fn test_unknown_run_reports_offset_and_text() {
        let reg = sample_registry();
        let err = parse_units(&reg, "m/xyz").unwrap_err();
        assert_eq!(
            err,
            UnitsError::ParseError {
                offset: 2,
                text: "xyz".to_string()
            }
        );

        let err = parse_value(&reg, "5.00xyz").unwrap_err();
        assert_eq!(
            err,
            UnitsError::ParseError {
                offset: 4,
                text: "xyz".to_string()
            }
        );
    }

    #[test]
    fn test_value_requires_number_and_units() {
        let reg = sample_registry();
        assert!(parse_value(&reg, "5.00").is_err());
        assert!(parse_value(&reg, "m").is_err());
        assert!(parse_value(&reg, "").is_err());
        assert!(parse_units(&reg, "  ").is_err());
    }

    #[test]
    fn test_no_whitespace_inside_expression() {
        let reg = sample_registry();
        let err = parse_units(&reg, "m /s").unwrap_err();
        assert_eq!(
            err,
            UnitsError::ParseError {
                offset: 1,
                text: " ".to_string()
            }
        );
    }

    #[test]
    fn test_non_ascii_rejected_whole() {
        let reg = sample_registry();
        let err = parse_units(&reg, "m·s").unwrap_err();
        match err {
            UnitsError::ParseError { offset, text } => {
                assert_eq!(offset, 1);
                assert_eq!(text, "·");
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_render_canonical_form() {
        let reg = sample_registry();
        let expr = parse_units(&reg, "m2/Vs").unwrap();
        assert_eq!(render_units(&reg, &expr), "m2/Vs");

        let expr = parse_units(&reg, "kVus").unwrap();
        assert_eq!(render_units(&reg, &expr), "kVus");

        let expr = parse_units(&reg, "m/s/V").unwrap();
        assert_eq!(render_units(&reg, &expr), "m/sV");
    }

    #[test]
    fn test_render_value_with_units() {
        let reg = sample_registry();
        let expr = parse_units(&reg, "m2/Vs").unwrap();
        assert_eq!(render(&reg, 0.0001, &expr, true), "0.0001m2/Vs");
        assert_eq!(render(&reg, 0.0001, &expr, false), "0.0001");
    }
}
