//! FHIRPath value model
//!
//! [`Value`] is the tagged union of everything an expression can produce;
//! [`Collection`] is the ordered sequence every evaluator entry returns.
//! Singletons are length-1 collections, never bare scalars.
//!
//! Equality comes in two strengths. [`Value::equals`] implements `=` and
//! returns `Option<bool>`: `None` means undecidable (partial-precision
//! temporals, incomparable quantity dimensions) and propagates as empty.
//! [`Value::equivalent`] implements `~` and always decides, normalising
//! strings, rounding decimals to the coarser scale and mapping calendar
//! durations.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use lumen_ucum::{canonicalize, CalendarMapping};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{Error, Result};
use crate::temporal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DatePrecision {
    Year,
    Month,
    Day,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DateTimePrecision {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimePrecision {
    Hour,
    Minute,
    Second,
    Millisecond,
}

/// Opaque handle into the host resource tree.
///
/// The engine never looks inside an element; the [`crate::ResourceAdapter`]
/// answers child and type queries. Two handles are the same element exactly
/// when their ids match.
#[derive(Debug, Clone)]
pub struct ElementHandle {
    pub id: u64,
    pub type_name: Arc<str>,
}

impl ElementHandle {
    pub fn new(id: u64, type_name: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            type_name: type_name.into(),
        }
    }
}

impl PartialEq for ElementHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// A single FHIRPath value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Long(i64),
    Decimal(Decimal),
    String(Arc<str>),
    Date {
        value: NaiveDate,
        precision: DatePrecision,
    },
    DateTime {
        value: DateTime<FixedOffset>,
        precision: DateTimePrecision,
        /// Offset seconds east of UTC as written; `None` when the literal
        /// carried no timezone.
        timezone_offset: Option<i32>,
    },
    Time {
        value: NaiveTime,
        precision: TimePrecision,
        timezone_offset: Option<i32>,
    },
    Quantity {
        value: Decimal,
        unit: Arc<str>,
    },
    Element(ElementHandle),
}

impl Value {
    pub fn boolean(v: bool) -> Self {
        Value::Boolean(v)
    }

    pub fn integer(v: i64) -> Self {
        Value::Integer(v)
    }

    pub fn long(v: i64) -> Self {
        Value::Long(v)
    }

    pub fn decimal(v: Decimal) -> Self {
        Value::Decimal(v)
    }

    pub fn string(v: impl Into<Arc<str>>) -> Self {
        Value::String(v.into())
    }

    pub fn quantity(value: Decimal, unit: impl Into<Arc<str>>) -> Self {
        Value::Quantity {
            value,
            unit: unit.into(),
        }
    }

    pub fn date(value: NaiveDate, precision: DatePrecision) -> Self {
        Value::Date { value, precision }
    }

    pub fn datetime(
        value: DateTime<FixedOffset>,
        precision: DateTimePrecision,
        timezone_offset: Option<i32>,
    ) -> Self {
        Value::DateTime {
            value,
            precision,
            timezone_offset,
        }
    }

    pub fn time(value: NaiveTime, precision: TimePrecision) -> Self {
        Value::Time {
            value,
            precision,
            timezone_offset: None,
        }
    }

    pub fn element(handle: ElementHandle) -> Self {
        Value::Element(handle)
    }

    /// Intrinsic System type name; elements report their declared type.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Boolean(_) => "Boolean",
            Value::Integer(_) => "Integer",
            Value::Long(_) => "Long",
            Value::Decimal(_) => "Decimal",
            Value::String(_) => "String",
            Value::Date { .. } => "Date",
            Value::DateTime { .. } => "DateTime",
            Value::Time { .. } => "Time",
            Value::Quantity { .. } => "Quantity",
            Value::Element(handle) => &handle.type_name,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Value::Element(_))
    }

    /// Numeric view shared by Integer, Long and Decimal.
    pub fn as_numeric(&self) -> Option<Decimal> {
        match self {
            Value::Integer(i) | Value::Long(i) => Some(Decimal::from(*i)),
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// FHIRPath `=`: `None` is undecidable and propagates as empty.
    pub fn equals(&self, other: &Value) -> Option<bool> {
        use Value::*;
        match (self, other) {
            (Boolean(a), Boolean(b)) => Some(a == b),
            (String(a), String(b)) => Some(a == b),
            (Element(a), Element(b)) => Some(a == b),

            (Date { .. } | DateTime { .. }, Date { .. } | DateTime { .. }) => {
                let (a, ap) = temporal::as_datetime(self)?;
                let (b, bp) = temporal::as_datetime(other)?;
                temporal::datetime_equals(a, ap, b, bp)
            }
            (
                Time {
                    value: a,
                    precision: ap,
                    ..
                },
                Time {
                    value: b,
                    precision: bp,
                    ..
                },
            ) => temporal::time_equals(*a, *ap, *b, *bp),

            (Quantity { value: av, unit: au }, Quantity { value: bv, unit: bu }) => {
                let a = canonicalize(*av, au, CalendarMapping::Equality).ok()?;
                let b = canonicalize(*bv, bu, CalendarMapping::Equality).ok()?;
                if !a.same_dimension(&b) {
                    return None;
                }
                Some(a.value == b.value)
            }

            _ => match (self.as_numeric(), other.as_numeric()) {
                (Some(a), Some(b)) => Some(a == b),
                _ => Some(false),
            },
        }
    }

    /// FHIRPath `~`: always decidable.
    pub fn equivalent(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Boolean(a), Boolean(b)) => a == b,
            (String(a), String(b)) => normalize_string(a) == normalize_string(b),
            (Element(a), Element(b)) => a == b,

            (Date { .. } | DateTime { .. }, Date { .. } | DateTime { .. }) => {
                let (Some((a, ap)), Some((b, bp))) =
                    (temporal::as_datetime(self), temporal::as_datetime(other))
                else {
                    return false;
                };
                ap == bp && temporal::datetime_equals(a, ap, b, bp) == Some(true)
            }
            (
                Time {
                    value: a,
                    precision: ap,
                    ..
                },
                Time {
                    value: b,
                    precision: bp,
                    ..
                },
            ) => ap == bp && temporal::time_equals(*a, *ap, *b, *bp) == Some(true),

            (Quantity { value: av, unit: au }, Quantity { value: bv, unit: bu }) => {
                let (Ok(a), Ok(b)) = (
                    canonicalize(*av, au, CalendarMapping::Equivalence),
                    canonicalize(*bv, bu, CalendarMapping::Equivalence),
                ) else {
                    return false;
                };
                a.same_dimension(&b) && decimals_equivalent(a.value, b.value)
            }

            _ => match (self.as_numeric(), other.as_numeric()) {
                (Some(a), Some(b)) => decimals_equivalent(a, b),
                _ => false,
            },
        }
    }

    /// Ordering for `<`/`<=`/`>`/`>=`: `Ok(None)` is undecidable (empty),
    /// `Err` a type error.
    pub fn compare(&self, other: &Value) -> Result<Option<Ordering>> {
        use Value::*;
        match (self, other) {
            (String(a), String(b)) => Ok(Some(a.as_ref().cmp(b.as_ref()))),

            (Date { .. } | DateTime { .. }, Date { .. } | DateTime { .. }) => {
                let pair = temporal::as_datetime(self).zip(temporal::as_datetime(other));
                let Some(((a, ap), (b, bp))) = pair else {
                    return Ok(None);
                };
                Ok(temporal::datetime_compare(a, ap, b, bp))
            }
            (
                Time {
                    value: a,
                    precision: ap,
                    ..
                },
                Time {
                    value: b,
                    precision: bp,
                    ..
                },
            ) => Ok(temporal::time_compare(*a, *ap, *b, *bp)),

            (Quantity { value: av, unit: au }, Quantity { value: bv, unit: bu }) => {
                let a = canonicalize(*av, au, CalendarMapping::Equality)
                    .map_err(|e| Error::Type(format!("invalid unit '{au}': {e}")))?;
                let b = canonicalize(*bv, bu, CalendarMapping::Equality)
                    .map_err(|e| Error::Type(format!("invalid unit '{bu}': {e}")))?;
                Ok(a.compare(&b))
            }

            _ => match (self.as_numeric(), other.as_numeric()) {
                (Some(a), Some(b)) => Ok(Some(a.cmp(&b))),
                _ => Err(Error::Type(format!(
                    "cannot compare {} with {}",
                    self.type_name(),
                    other.type_name()
                ))),
            },
        }
    }
}

/// Collapse whitespace runs to single spaces, trim, lowercase.
fn normalize_string(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Decimal equivalence: compare rounded to the coarser scale.
fn decimals_equivalent(a: Decimal, b: Decimal) -> bool {
    let dp = a.scale().min(b.scale());
    a.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
        == b.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// An ordered, possibly-empty sequence of values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection(Vec<Value>);

impl Collection {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn singleton(value: Value) -> Self {
        Self(vec![value])
    }

    pub fn from_values(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn push(&mut self, value: Value) {
        self.0.push(value);
    }

    pub fn extend(&mut self, other: Collection) {
        self.0.extend(other.0);
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn first(&self) -> Option<&Value> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&Value> {
        self.0.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }

    /// The single value, if any; length 2 or more is a singleton error.
    pub fn as_singleton(&self, what: &str) -> Result<Option<&Value>> {
        match self.0.len() {
            0 => Ok(None),
            1 => Ok(Some(&self.0[0])),
            n => Err(Error::Singleton(format!(
                "{what} expected a singleton collection, found {n} items"
            ))),
        }
    }

    /// Kleene operand view: empty is unknown, a Boolean is itself, any other
    /// single value collapses to `true` (singleton evaluation).
    pub fn boolean_operand(&self, what: &str) -> Result<Option<bool>> {
        match self.as_singleton(what)? {
            None => Ok(None),
            Some(Value::Boolean(b)) => Ok(Some(*b)),
            Some(_) => Ok(Some(true)),
        }
    }

    /// Singleton string, erroring on any other kind.
    pub fn as_string(&self, what: &str) -> Result<Option<Arc<str>>> {
        match self.as_singleton(what)? {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(v) => Err(Error::Type(format!(
                "{what} expected a String, found {}",
                v.type_name()
            ))),
        }
    }

    /// Singleton integer (Integer or Long), erroring on any other kind.
    pub fn as_integer(&self, what: &str) -> Result<Option<i64>> {
        match self.as_singleton(what)? {
            None => Ok(None),
            Some(Value::Integer(i) | Value::Long(i)) => Ok(Some(*i)),
            Some(v) => Err(Error::Type(format!(
                "{what} expected an Integer, found {}",
                v.type_name()
            ))),
        }
    }

    /// True when some member equals `value` under `=` semantics.
    pub fn contains_value(&self, value: &Value) -> bool {
        self.iter().any(|v| v.equals(value) == Some(true))
    }

    /// True when some member is equivalent to `value` under `~` semantics.
    pub fn contains_equivalent(&self, value: &Value) -> bool {
        self.iter().any(|v| v.equivalent(value))
    }
}

impl FromIterator<Value> for Collection {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Collection {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn numeric_equality_widens() {
        assert_eq!(
            Value::integer(1).equals(&Value::decimal(Decimal::from_str("1.0").unwrap())),
            Some(true)
        );
        assert_eq!(Value::integer(1).equals(&Value::long(1)), Some(true));
        assert_eq!(Value::integer(1).equals(&Value::integer(2)), Some(false));
    }

    #[test]
    fn mismatched_kinds_are_unequal() {
        assert_eq!(
            Value::string("1").equals(&Value::integer(1)),
            Some(false)
        );
        assert_eq!(Value::boolean(true).equals(&Value::integer(1)), Some(false));
    }

    #[test]
    fn string_equality_is_case_sensitive() {
        assert_eq!(
            Value::string("Abc").equals(&Value::string("abc")),
            Some(false)
        );
        assert!(Value::string("Abc").equivalent(&Value::string("abc")));
        assert!(Value::string("a  b").equivalent(&Value::string("a b")));
    }

    #[test]
    fn decimal_equivalence_rounds_to_coarser_scale() {
        let a = Value::decimal(Decimal::from_str("1.01").unwrap());
        let b = Value::decimal(Decimal::from_str("1.012").unwrap());
        assert!(a.equivalent(&b));
        assert_eq!(a.equals(&b), Some(false));
    }

    #[test]
    fn quantity_equality_canonicalises() {
        let h = Value::quantity(Decimal::ONE, "h");
        let s = Value::quantity(Decimal::from(3600), "s");
        assert_eq!(h.equals(&s), Some(true));

        let g = Value::quantity(Decimal::ONE, "g");
        let m = Value::quantity(Decimal::ONE, "m");
        assert_eq!(g.equals(&m), None);
    }

    #[test]
    fn calendar_year_under_both_relations() {
        let calendar = Value::quantity(Decimal::ONE, "year");
        let definite = Value::quantity(Decimal::ONE, "a");
        assert_eq!(calendar.equals(&definite), None);
        assert!(calendar.equivalent(&definite));

        let weeks = Value::quantity(Decimal::ONE, "week");
        let days = Value::quantity(Decimal::from(7), "days");
        assert_eq!(weeks.equals(&days), Some(true));
        assert!(weeks.equivalent(&days));
    }

    #[test]
    fn string_ordering_is_code_point() {
        assert_eq!(
            Value::string("abc").compare(&Value::string("abd")).unwrap(),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn incompatible_comparison_is_type_error() {
        assert!(Value::string("a").compare(&Value::integer(1)).is_err());
    }

    #[test]
    fn boolean_operand_rules() {
        assert_eq!(Collection::empty().boolean_operand("test").unwrap(), None);
        assert_eq!(
            Collection::singleton(Value::boolean(false))
                .boolean_operand("test")
                .unwrap(),
            Some(false)
        );
        assert_eq!(
            Collection::singleton(Value::integer(7))
                .boolean_operand("test")
                .unwrap(),
            Some(true)
        );
        let two = Collection::from_values(vec![Value::integer(1), Value::integer(2)]);
        assert!(two.boolean_operand("test").is_err());
    }
}
