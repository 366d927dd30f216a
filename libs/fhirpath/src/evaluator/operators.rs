//! Operator semantics
//!
//! Binary and unary dispatch over evaluated operands. Empty operands
//! propagate to empty results everywhere except the boolean operators,
//! which follow three-valued Kleene logic with empty as unknown.

use std::cmp::Ordering;

use lumen_ucum::{canonicalize, CalendarMapping, CanonicalQuantity};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::ast::{BinaryOp, UnaryOp};
use crate::error::{Error, Result};
use crate::evaluator::Evaluator;
use crate::value::{Collection, Value};

pub(crate) fn unary(op: UnaryOp, operand: &Collection) -> Result<Collection> {
    let Some(value) = operand.as_singleton("unary operator")? else {
        return Ok(Collection::empty());
    };
    let negated = match (op, value) {
        (UnaryOp::Plus, v @ (Value::Integer(_) | Value::Long(_) | Value::Decimal(_))) => v.clone(),
        (UnaryOp::Plus, Value::Quantity { .. }) => value.clone(),
        (UnaryOp::Minus, Value::Integer(i)) => Value::integer(-i),
        (UnaryOp::Minus, Value::Long(i)) => Value::long(-i),
        (UnaryOp::Minus, Value::Decimal(d)) => Value::decimal(-d),
        (UnaryOp::Minus, Value::Quantity { value, unit }) => {
            Value::quantity(-value, unit.clone())
        }
        _ => {
            return Err(Error::Type(format!(
                "unary '{}' requires a numeric operand, found {}",
                if op == UnaryOp::Minus { "-" } else { "+" },
                value.type_name()
            )))
        }
    };
    Ok(Collection::singleton(negated))
}

pub(crate) fn binary(
    ev: &Evaluator,
    op: BinaryOp,
    left: Collection,
    right: Collection,
) -> Result<Collection> {
    match op {
        BinaryOp::And | BinaryOp::Or | BinaryOp::Xor | BinaryOp::Implies => {
            let l = left.boolean_operand("boolean operator")?;
            let r = right.boolean_operand("boolean operator")?;
            Ok(from_tristate(kleene(op, l, r)))
        }

        BinaryOp::Equal => Ok(from_tristate(collection_equals(&left, &right))),
        BinaryOp::NotEqual => {
            Ok(from_tristate(collection_equals(&left, &right).map(|b| !b)))
        }
        BinaryOp::Equivalent => Ok(Collection::singleton(Value::boolean(
            collection_equivalent(&left, &right),
        ))),
        BinaryOp::NotEquivalent => Ok(Collection::singleton(Value::boolean(
            !collection_equivalent(&left, &right),
        ))),

        BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => {
            let (Some(l), Some(r)) = (
                left.as_singleton("comparison")?,
                right.as_singleton("comparison")?,
            ) else {
                return Ok(Collection::empty());
            };
            let decided = l.compare(r)?.map(|ordering| match op {
                BinaryOp::Less => ordering == Ordering::Less,
                BinaryOp::LessEqual => ordering != Ordering::Greater,
                BinaryOp::Greater => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            });
            Ok(from_tristate(decided))
        }

        BinaryOp::In => membership(&left, &right),
        BinaryOp::Contains => membership(&right, &left),

        BinaryOp::Union => Ok(union(left, right)),

        BinaryOp::Add
        | BinaryOp::Sub
        | BinaryOp::Mul
        | BinaryOp::Div
        | BinaryOp::IntDiv
        | BinaryOp::Mod
        | BinaryOp::Concat => arithmetic(ev, op, &left, &right),
    }
}

fn from_tristate(value: Option<bool>) -> Collection {
    match value {
        Some(b) => Collection::singleton(Value::boolean(b)),
        None => Collection::empty(),
    }
}

/// Kleene truth tables with `None` as unknown.
fn kleene(op: BinaryOp, l: Option<bool>, r: Option<bool>) -> Option<bool> {
    match op {
        BinaryOp::And => match (l, r) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        },
        BinaryOp::Or => match (l, r) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        },
        BinaryOp::Xor => match (l, r) {
            (Some(a), Some(b)) => Some(a != b),
            _ => None,
        },
        BinaryOp::Implies => match (l, r) {
            (Some(false), _) => Some(true),
            (Some(true), r) => r,
            (None, Some(true)) => Some(true),
            (None, _) => None,
        },
        _ => unreachable!("kleene() called with non-boolean operator"),
    }
}

/// `=` over collections: pairwise and ordered; empty on either side is
/// undecidable, an undecidable pair poisons the whole comparison.
pub(crate) fn collection_equals(left: &Collection, right: &Collection) -> Option<bool> {
    if left.is_empty() || right.is_empty() {
        return None;
    }
    if left.len() != right.len() {
        return Some(false);
    }
    let mut undecided = false;
    for (l, r) in left.iter().zip(right.iter()) {
        match l.equals(r) {
            Some(false) => return Some(false),
            Some(true) => {}
            None => undecided = true,
        }
    }
    if undecided {
        None
    } else {
        Some(true)
    }
}

/// `~` over collections: order-insensitive, always decidable.
pub(crate) fn collection_equivalent(left: &Collection, right: &Collection) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut unmatched: Vec<&Value> = right.iter().collect();
    for l in left.iter() {
        let Some(pos) = unmatched.iter().position(|r| l.equivalent(r)) else {
            return false;
        };
        unmatched.swap_remove(pos);
    }
    true
}

/// `item in collection`; empty item is empty, empty collection is false.
fn membership(item: &Collection, collection: &Collection) -> Result<Collection> {
    let Some(value) = item.as_singleton("membership operator")? else {
        return Ok(Collection::empty());
    };
    Ok(Collection::singleton(Value::boolean(
        collection.contains_value(value),
    )))
}

/// `|`: concatenate then deduplicate by equivalence, first occurrence wins.
pub(crate) fn union(left: Collection, right: Collection) -> Collection {
    let mut out = Collection::with_capacity(left.len() + right.len());
    for value in left.into_iter().chain(right) {
        if !out.contains_equivalent(&value) {
            out.push(value);
        }
    }
    out
}

/// Round to `digits` significant digits, half away from zero.
pub(crate) fn round_significant(d: Decimal, digits: u32) -> Decimal {
    if d.is_zero() {
        return d;
    }
    let mantissa_digits = d.mantissa().unsigned_abs().to_string().len() as i64;
    let excess = mantissa_digits - digits as i64;
    if excess <= 0 {
        return d;
    }
    let target_scale = d.scale() as i64 - excess;
    if target_scale >= 0 {
        return d.round_dp_with_strategy(
            target_scale as u32,
            RoundingStrategy::MidpointAwayFromZero,
        );
    }
    // Rounding reaches into the integer part: shift, round, shift back.
    let shift = Decimal::from_i128_with_scale(10i128.pow((-target_scale) as u32), 0);
    match d.checked_div(shift) {
        Some(scaled) => scaled
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .checked_mul(shift)
            .unwrap_or(d),
        None => d,
    }
}

enum Number {
    Integer(i64),
    Long(i64),
    Decimal(Decimal),
}

fn as_number(value: &Value) -> Option<Number> {
    match value {
        Value::Integer(i) => Some(Number::Integer(*i)),
        Value::Long(i) => Some(Number::Long(*i)),
        Value::Decimal(d) => Some(Number::Decimal(*d)),
        _ => None,
    }
}

fn arithmetic(
    ev: &Evaluator,
    op: BinaryOp,
    left: &Collection,
    right: &Collection,
) -> Result<Collection> {
    // `&` treats an empty operand as the empty string instead of
    // propagating it, so it is handled before singleton extraction.
    if op == BinaryOp::Concat {
        let l = left.as_string("'&'")?.unwrap_or_else(|| "".into());
        let r = right.as_string("'&'")?.unwrap_or_else(|| "".into());
        return Ok(Collection::singleton(Value::string(format!("{l}{r}"))));
    }

    let (Some(l), Some(r)) = (
        left.as_singleton("arithmetic operator")?,
        right.as_singleton("arithmetic operator")?,
    ) else {
        return Ok(Collection::empty());
    };

    let result = match (op, l, r) {
        (BinaryOp::Add, Value::String(a), Value::String(b)) => {
            Some(Value::string(format!("{a}{b}")))
        }
        (BinaryOp::Add | BinaryOp::Sub, Value::Quantity { .. }, _) => {
            quantity_add_sub(op, l, r)?
        }
        (BinaryOp::Mul | BinaryOp::Div, Value::Quantity { .. }, _)
        | (BinaryOp::Mul | BinaryOp::Div, _, Value::Quantity { .. }) => {
            quantity_mul_div(ev, op, l, r)?
        }
        _ => numeric(ev, op, l, r)?,
    };

    Ok(match result {
        Some(value) => Collection::singleton(value),
        None => Collection::empty(),
    })
}

fn quantity_add_sub(op: BinaryOp, l: &Value, r: &Value) -> Result<Option<Value>> {
    let (Value::Quantity { value: lv, unit: lu }, Value::Quantity { value: rv, unit: ru }) =
        (l, r)
    else {
        return Err(Error::Type(format!(
            "cannot {} {} and {}",
            if op == BinaryOp::Add { "add" } else { "subtract" },
            l.type_name(),
            r.type_name()
        )));
    };
    let a = canonical(*lv, lu)?;
    let b = canonical(*rv, ru)?;
    if !a.same_dimension(&b) {
        return Ok(None);
    }
    let value = if op == BinaryOp::Add {
        a.value.checked_add(b.value)
    } else {
        a.value.checked_sub(b.value)
    };
    Ok(value.map(|v| Value::quantity(v, a.unit_string())))
}

fn quantity_mul_div(
    ev: &Evaluator,
    op: BinaryOp,
    l: &Value,
    r: &Value,
) -> Result<Option<Value>> {
    use Value::Quantity;

    match (l, r) {
        (Quantity { value: lv, unit: lu }, Quantity { value: rv, unit: ru }) => {
            let a = canonical(*lv, lu)?;
            let b = canonical(*rv, ru)?;
            if op == BinaryOp::Mul {
                let product = a.mul(&b).map_err(overflow)?;
                Ok(Some(Value::quantity(
                    round_significant(product.value, ev.precision),
                    product.unit_string(),
                )))
            } else {
                match a.div(&b).map_err(overflow)? {
                    Some(quotient) => Ok(Some(Value::quantity(
                        round_significant(quotient.value, ev.precision),
                        quotient.unit_string(),
                    ))),
                    None => Ok(None),
                }
            }
        }
        // Scaling by a dimensionless number keeps the written unit.
        (Quantity { value, unit }, scalar) | (scalar, Quantity { value, unit })
            if as_number(scalar).is_some() =>
        {
            let n = match as_number(scalar).unwrap() {
                Number::Integer(i) | Number::Long(i) => Decimal::from(i),
                Number::Decimal(d) => d,
            };
            if op == BinaryOp::Mul {
                Ok(value
                    .checked_mul(n)
                    .map(|v| Value::quantity(round_significant(v, ev.precision), unit.clone())))
            } else if matches!(l, Quantity { .. }) {
                if n.is_zero() {
                    return Ok(None);
                }
                Ok(value
                    .checked_div(n)
                    .map(|v| Value::quantity(round_significant(v, ev.precision), unit.clone())))
            } else {
                // number / quantity has no representable unit here
                Err(Error::Type(
                    "cannot divide a number by a quantity".into(),
                ))
            }
        }
        _ => Err(Error::Type(format!(
            "cannot combine {} and {} arithmetically",
            l.type_name(),
            r.type_name()
        ))),
    }
}

fn numeric(ev: &Evaluator, op: BinaryOp, l: &Value, r: &Value) -> Result<Option<Value>> {
    let (Some(a), Some(b)) = (as_number(l), as_number(r)) else {
        return Err(Error::Type(format!(
            "operator '{}' cannot combine {} and {}",
            symbol(op),
            l.type_name(),
            r.type_name()
        )));
    };

    // Division always produces a Decimal.
    if op == BinaryOp::Div {
        let (a, b) = (widen(&a), widen(&b));
        if b.is_zero() {
            return Ok(None);
        }
        return Ok(a
            .checked_div(b)
            .map(|v| Value::decimal(round_significant(v, ev.precision))));
    }

    match (a, b) {
        // Same-width integer arithmetic stays integral; Long wins over
        // Integer, Decimal over both.
        (Number::Integer(a), Number::Integer(b)) => Ok(integer_op(op, a, b)?.map(Value::integer)),
        (Number::Integer(a) | Number::Long(a), Number::Integer(b) | Number::Long(b)) => {
            Ok(integer_op(op, a, b)?.map(Value::long))
        }
        (a, b) => {
            let (a, b) = (widen(&a), widen(&b));
            let value = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                BinaryOp::IntDiv => {
                    if b.is_zero() {
                        return Ok(None);
                    }
                    return Ok(a
                        .checked_div(b)
                        .map(|v| v.trunc())
                        .and_then(|v| rust_decimal::prelude::ToPrimitive::to_i64(&v))
                        .map(Value::integer));
                }
                BinaryOp::Mod => {
                    if b.is_zero() {
                        return Ok(None);
                    }
                    a.checked_rem(b)
                }
                _ => unreachable!(),
            };
            Ok(value.map(|v| Value::decimal(round_significant(v, ev.precision))))
        }
    }
}

fn integer_op(op: BinaryOp, a: i64, b: i64) -> Result<Option<i64>> {
    Ok(match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::IntDiv => {
            if b == 0 {
                None
            } else {
                a.checked_div(b)
            }
        }
        BinaryOp::Mod => {
            if b == 0 {
                None
            } else {
                a.checked_rem(b)
            }
        }
        _ => unreachable!(),
    })
}

fn widen(n: &Number) -> Decimal {
    match n {
        Number::Integer(i) | Number::Long(i) => Decimal::from(*i),
        Number::Decimal(d) => *d,
    }
}

fn canonical(value: Decimal, unit: &str) -> Result<CanonicalQuantity> {
    canonicalize(value, unit, CalendarMapping::Equality)
        .map_err(|e| Error::Type(format!("invalid unit '{unit}': {e}")))
}

fn overflow(_: lumen_ucum::Error) -> Error {
    Error::Type("quantity arithmetic overflowed".into())
}

fn symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::IntDiv => "div",
        BinaryOp::Mod => "mod",
        BinaryOp::Concat => "&",
        _ => "?",
    }
}
