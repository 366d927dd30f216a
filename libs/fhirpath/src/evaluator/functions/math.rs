//! Math functions.
//!
//! `abs`/`ceiling`/`floor`/`round`/`truncate` stay in exact decimal
//! arithmetic; the transcendentals (`sqrt`, `exp`, `ln`, `log`, `power`) go
//! through f64 and come back as Decimal, which matches the precision the
//! specification asks of them.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{Error, Result};
use crate::value::{Collection, Value};

fn singleton_number(input: &Collection, what: &str) -> Result<Option<Decimal>> {
    match input.as_singleton(what)? {
        None => Ok(None),
        Some(value) => value.as_numeric().map(Some).ok_or_else(|| {
            Error::Type(format!("{what} requires a number, found {}", value.type_name()))
        }),
    }
}

fn decimal_from_f64(value: f64, what: &str) -> Result<Decimal> {
    if value.is_infinite() || value.is_nan() {
        return Err(Error::Type(format!("{what} result is not representable")));
    }
    Decimal::from_str(&value.to_string())
        .map_err(|_| Error::Type(format!("{what} result is not representable")))
}

fn to_f64(value: Decimal, what: &str) -> Result<f64> {
    value
        .to_f64()
        .ok_or_else(|| Error::Type(format!("{what} input is out of range")))
}

pub(crate) fn abs(input: &Collection) -> Result<Collection> {
    let Some(value) = input.as_singleton("abs()")? else {
        return Ok(Collection::empty());
    };
    let out = match value {
        Value::Integer(i) => Value::integer(i.abs()),
        Value::Long(i) => Value::long(i.abs()),
        Value::Decimal(d) => Value::decimal(d.abs()),
        Value::Quantity { value, unit } => Value::quantity(value.abs(), unit.clone()),
        other => {
            return Err(Error::Type(format!(
                "abs() requires a number or Quantity, found {}",
                other.type_name()
            )))
        }
    };
    Ok(Collection::singleton(out))
}

fn to_integer_value(d: Decimal) -> Option<Value> {
    d.to_i64().map(Value::integer)
}

pub(crate) fn ceiling(input: &Collection) -> Result<Collection> {
    let Some(n) = singleton_number(input, "ceiling()")? else {
        return Ok(Collection::empty());
    };
    Ok(to_integer_value(n.ceil()).map_or_else(Collection::empty, Collection::singleton))
}

pub(crate) fn floor(input: &Collection) -> Result<Collection> {
    let Some(n) = singleton_number(input, "floor()")? else {
        return Ok(Collection::empty());
    };
    Ok(to_integer_value(n.floor()).map_or_else(Collection::empty, Collection::singleton))
}

pub(crate) fn truncate(input: &Collection) -> Result<Collection> {
    let Some(n) = singleton_number(input, "truncate()")? else {
        return Ok(Collection::empty());
    };
    Ok(to_integer_value(n.trunc()).map_or_else(Collection::empty, Collection::singleton))
}

/// `round(precision?)`, half away from zero; integers round to themselves.
pub(crate) fn round(input: &Collection, precision: Option<&Collection>) -> Result<Collection> {
    let Some(value) = input.as_singleton("round()")? else {
        return Ok(Collection::empty());
    };
    let digits = match precision {
        Some(arg) => match arg.as_integer("round() precision")? {
            Some(n) if n >= 0 => n as u32,
            Some(n) => {
                return Err(Error::Type(format!(
                    "round() precision must be non-negative, found {n}"
                )))
            }
            None => return Ok(Collection::empty()),
        },
        None => 0,
    };
    let out = match value {
        Value::Integer(i) => Value::integer(*i),
        Value::Long(i) => Value::long(*i),
        Value::Decimal(d) => Value::decimal(
            d.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero),
        ),
        other => {
            return Err(Error::Type(format!(
                "round() requires a number, found {}",
                other.type_name()
            )))
        }
    };
    Ok(Collection::singleton(out))
}

pub(crate) fn sqrt(input: &Collection) -> Result<Collection> {
    let Some(n) = singleton_number(input, "sqrt()")? else {
        return Ok(Collection::empty());
    };
    if n < Decimal::ZERO {
        return Ok(Collection::empty());
    }
    let root = to_f64(n, "sqrt()")?.sqrt();
    Ok(Collection::singleton(Value::decimal(decimal_from_f64(
        root,
        "sqrt()",
    )?)))
}

pub(crate) fn exp(input: &Collection) -> Result<Collection> {
    let Some(n) = singleton_number(input, "exp()")? else {
        return Ok(Collection::empty());
    };
    let out = to_f64(n, "exp()")?.exp();
    Ok(Collection::singleton(Value::decimal(decimal_from_f64(
        out,
        "exp()",
    )?)))
}

pub(crate) fn ln(input: &Collection) -> Result<Collection> {
    let Some(n) = singleton_number(input, "ln()")? else {
        return Ok(Collection::empty());
    };
    if n <= Decimal::ZERO {
        return Ok(Collection::empty());
    }
    let out = to_f64(n, "ln()")?.ln();
    Ok(Collection::singleton(Value::decimal(decimal_from_f64(
        out,
        "ln()",
    )?)))
}

pub(crate) fn log(input: &Collection, base: &Collection) -> Result<Collection> {
    let (Some(n), Some(base)) = (
        singleton_number(input, "log()")?,
        singleton_number(base, "log() base")?,
    ) else {
        return Ok(Collection::empty());
    };
    if n <= Decimal::ZERO || base <= Decimal::ZERO || base == Decimal::ONE {
        return Ok(Collection::empty());
    }
    let out = to_f64(n, "log()")?.ln() / to_f64(base, "log()")?.ln();
    Ok(Collection::singleton(Value::decimal(decimal_from_f64(
        out,
        "log()",
    )?)))
}

/// `power(exponent)`: Integer when both operands are integers and the
/// result is exact, Decimal otherwise; unrepresentable results are empty.
pub(crate) fn power(input: &Collection, exponent: &Collection) -> Result<Collection> {
    let (Some(base_value), Some(exp_value)) = (
        input.as_singleton("power()")?,
        exponent.as_singleton("power()")?,
    ) else {
        return Ok(Collection::empty());
    };

    let base = base_value.as_numeric().ok_or_else(|| {
        Error::Type(format!(
            "power() requires a numeric base, found {}",
            base_value.type_name()
        ))
    })?;
    let exp = exp_value.as_numeric().ok_or_else(|| {
        Error::Type(format!(
            "power() requires a numeric exponent, found {}",
            exp_value.type_name()
        ))
    })?;

    let both_integers = !matches!(base_value, Value::Decimal(_))
        && !matches!(exp_value, Value::Decimal(_));

    let base_f = to_f64(base, "power()")?;
    let exp_f = to_f64(exp, "power()")?;
    // A negative base with a fractional exponent has no real result.
    if base_f < 0.0 && exp_f.fract() != 0.0 {
        return Ok(Collection::empty());
    }
    let out = base_f.powf(exp_f);
    if out.is_infinite() || out.is_nan() {
        return Ok(Collection::empty());
    }

    if both_integers && exp >= Decimal::ZERO && out.fract() == 0.0 {
        let as_int = out as i64;
        if as_int as f64 == out {
            return Ok(Collection::singleton(Value::integer(as_int)));
        }
    }
    Ok(Collection::singleton(Value::decimal(decimal_from_f64(
        out,
        "power()",
    )?)))
}
