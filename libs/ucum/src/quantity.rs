//! Quantity canonicalisation.
//!
//! A quantity is reduced to a normal form in three steps: calendar duration
//! names map to definite UCUM codes (subject to the equality/equivalence
//! distinction), SI prefixes are stripped with the value scaled accordingly,
//! and single-base derived units are rewritten over their base unit. The
//! result is a scaled decimal value plus a base-unit exponent map that can be
//! compared or combined directly.

use rust_decimal::Decimal;
use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::tables::{pow10, pow_decimal, BASE_UNITS, DERIVED_UNITS, PREFIXES};
use crate::unit::UnitMap;

/// How calendar duration words translate to definite UCUM codes.
///
/// Under FHIRPath equality, a calendar year or month has no definite length
/// and stays verbatim; under equivalence both map to their Julian
/// approximations. Weeks and smaller always map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalendarMapping {
    Equality,
    Equivalence,
}

/// A quantity in canonical form: scaled value over base-unit exponents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalQuantity {
    pub value: Decimal,
    pub units: UnitMap,
}

impl CanonicalQuantity {
    /// Render the canonical unit as a quotable string.
    pub fn unit_string(&self) -> String {
        self.units.format()
    }

    pub fn same_dimension(&self, other: &CanonicalQuantity) -> bool {
        self.units == other.units
    }

    pub fn mul(&self, other: &CanonicalQuantity) -> Result<CanonicalQuantity> {
        Ok(CanonicalQuantity {
            value: self
                .value
                .checked_mul(other.value)
                .ok_or(Error::Overflow)?,
            units: self.units.mul(&other.units),
        })
    }

    /// Division; `None` when the divisor value is zero.
    pub fn div(&self, other: &CanonicalQuantity) -> Result<Option<CanonicalQuantity>> {
        if other.value.is_zero() {
            return Ok(None);
        }
        Ok(Some(CanonicalQuantity {
            value: self
                .value
                .checked_div(other.value)
                .ok_or(Error::Overflow)?,
            units: self.units.div(&other.units),
        }))
    }

    /// Compare two canonical quantities; `None` when dimensions differ.
    pub fn compare(&self, other: &CanonicalQuantity) -> Option<Ordering> {
        if !self.same_dimension(other) {
            return None;
        }
        Some(self.value.cmp(&other.value))
    }
}

/// True when `unit` is a calendar duration word (`year`, `months`, ...).
pub fn is_calendar_unit(unit: &str) -> bool {
    matches!(
        unit,
        "year"
            | "years"
            | "month"
            | "months"
            | "week"
            | "weeks"
            | "day"
            | "days"
            | "hour"
            | "hours"
            | "minute"
            | "minutes"
            | "second"
            | "seconds"
            | "millisecond"
            | "milliseconds"
    )
}

fn map_calendar_unit(unit: &str, mapping: CalendarMapping) -> Option<&'static str> {
    match unit {
        "week" | "weeks" => Some("wk"),
        "day" | "days" => Some("d"),
        "hour" | "hours" => Some("h"),
        "minute" | "minutes" => Some("min"),
        "second" | "seconds" => Some("s"),
        "millisecond" | "milliseconds" => Some("ms"),
        "year" | "years" if mapping == CalendarMapping::Equivalence => Some("a"),
        "month" | "months" if mapping == CalendarMapping::Equivalence => Some("mo"),
        _ => None,
    }
}

/// Canonicalise `value unit` into a [`CanonicalQuantity`].
///
/// Unknown symbols are kept verbatim with their exponent, so quantities over
/// units outside the table still compare equal to themselves.
pub fn canonicalize(
    value: Decimal,
    unit: &str,
    mapping: CalendarMapping,
) -> Result<CanonicalQuantity> {
    let code = map_calendar_unit(unit.trim(), mapping).unwrap_or(unit);
    let parsed = UnitMap::parse(code)?;

    let mut scale = Decimal::ONE;
    let mut units = UnitMap::new();
    for (symbol, exponent) in parsed.iter() {
        let component = resolve_symbol(symbol, exponent)?;
        scale = scale
            .checked_mul(component.factor)
            .ok_or(Error::Overflow)?;
        units.accumulate(component.base, component.exponent);
    }

    Ok(CanonicalQuantity {
        value: value.checked_mul(scale).ok_or(Error::Overflow)?,
        units,
    })
}

struct Resolved<'a> {
    factor: Decimal,
    base: &'a str,
    exponent: i32,
}

fn resolve_symbol(symbol: &str, exponent: i32) -> Result<Resolved<'_>> {
    // Base and derived lookups win over prefix splits, so `cd` is candela
    // rather than centi-day and bare `a` is the Julian year.
    if BASE_UNITS.contains(symbol) {
        return Ok(Resolved {
            factor: Decimal::ONE,
            base: symbol,
            exponent,
        });
    }
    if let Some(derived) = DERIVED_UNITS.get(symbol) {
        return Ok(Resolved {
            factor: pow_decimal(derived.factor(), exponent).ok_or(Error::Overflow)?,
            base: derived.base,
            exponent: derived.power * exponent,
        });
    }

    // Longest prefix first so `da` (deka) is tried before `d` (deci).
    for prefix_len in [2usize, 1] {
        if symbol.len() <= prefix_len {
            continue;
        }
        let (prefix, rest) = symbol.split_at(prefix_len);
        let Some(power) = PREFIXES.get(prefix) else {
            continue;
        };
        if BASE_UNITS.contains(rest) {
            let shift = power.checked_mul(exponent).ok_or(Error::Overflow)?;
            return Ok(Resolved {
                factor: pow10(shift).ok_or(Error::Overflow)?,
                base: rest,
                exponent,
            });
        }
        if let Some(derived) = DERIVED_UNITS.get(rest) {
            let shift = power.checked_mul(exponent).ok_or(Error::Overflow)?;
            let prefix_factor = pow10(shift).ok_or(Error::Overflow)?;
            let derived_factor =
                pow_decimal(derived.factor(), exponent).ok_or(Error::Overflow)?;
            return Ok(Resolved {
                factor: prefix_factor
                    .checked_mul(derived_factor)
                    .ok_or(Error::Overflow)?,
                base: derived.base,
                exponent: derived.power * exponent,
            });
        }
    }

    // Unknown symbol, e.g. a composite derived unit: keep it verbatim.
    Ok(Resolved {
        factor: Decimal::ONE,
        base: symbol,
        exponent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canon(value: i64, unit: &str) -> CanonicalQuantity {
        canonicalize(Decimal::new(value, 0), unit, CalendarMapping::Equality).unwrap()
    }

    #[test]
    fn prefix_stripping() {
        let q = canon(1, "kg");
        assert_eq!(q.value, Decimal::new(1_000, 0));
        assert_eq!(q.unit_string(), "g");

        let q = canon(2, "mm");
        assert_eq!(q.value, Decimal::new(2, 3));
        assert_eq!(q.unit_string(), "m");
    }

    #[test]
    fn derived_rewriting() {
        let q = canon(1, "h");
        assert_eq!(q.value, Decimal::new(3_600, 0));
        assert_eq!(q.unit_string(), "s");

        let q = canon(3, "L");
        assert_eq!(q.value, Decimal::new(3, 3));
        assert_eq!(q.unit_string(), "m3");
    }

    #[test]
    fn prefixed_derived() {
        // ms is milli + second, not a table entry of its own.
        let q = canon(1, "ms");
        assert_eq!(q.value, Decimal::new(1, 3));
        assert_eq!(q.unit_string(), "s");
    }

    #[test]
    fn ambiguous_symbols_prefer_units() {
        assert_eq!(canon(1, "cd").unit_string(), "cd");
        assert_eq!(canon(1, "a").unit_string(), "s");
        assert_eq!(canon(1, "min").unit_string(), "s");
    }

    #[test]
    fn composite_units_stay_naive() {
        let q = canon(5, "W");
        assert_eq!(q.value, Decimal::new(5, 0));
        assert_eq!(q.unit_string(), "W");
    }

    #[test]
    fn quantity_product() {
        let kg = canon(1, "kg");
        let m = canon(2, "m");
        let product = kg.mul(&m).unwrap();
        assert_eq!(product.value, Decimal::new(2_000, 0));
        assert_eq!(product.unit_string(), "g.m");
    }

    #[test]
    fn definite_duration_equality() {
        let h = canon(1, "h");
        let s = canon(3_600, "s");
        assert_eq!(h.compare(&s), Some(Ordering::Equal));
    }

    #[test]
    fn calendar_words() {
        // Weeks map under both relations.
        let wk = canon(1, "weeks");
        assert_eq!(wk.unit_string(), "s");
        assert_eq!(wk.value, Decimal::new(604_800, 0));

        // Years stay verbatim under equality but map under equivalence.
        let strict = canon(1, "year");
        assert_eq!(strict.unit_string(), "year");
        let lax =
            canonicalize(Decimal::ONE, "year", CalendarMapping::Equivalence).unwrap();
        assert_eq!(lax.unit_string(), "s");
        assert_eq!(lax.value, Decimal::new(31_557_600, 0));
    }

    #[test]
    fn incomparable_dimensions() {
        assert_eq!(canon(1, "g").compare(&canon(1, "m")), None);
    }

    #[test]
    fn division_by_zero_value() {
        let m = canon(6, "m");
        let z = canon(0, "s");
        assert_eq!(m.div(&z).unwrap(), None);
        let per_s = m.div(&canon(2, "s")).unwrap().unwrap();
        assert_eq!(per_s.value, Decimal::new(3, 0));
        assert_eq!(per_s.unit_string(), "m.s-1");
    }
}
