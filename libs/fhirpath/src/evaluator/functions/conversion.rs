//! Conversion functions: `toX()` and their `convertsToX()` partners.
//!
//! Conversions are lenient: a singleton that cannot convert yields empty,
//! and `convertsToX()` reports whether `toX()` would produce a value.

use std::str::FromStr;

use chrono::Timelike;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::temporal;
use crate::value::{
    Collection, DatePrecision, DateTimePrecision, TimePrecision, Value,
};

/// `"4 days"`, `"4.5 'mg'"`, `"5"`.
static QUANTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<value>-?\d+(?:\.\d+)?)\s*(?:'(?P<quoted>[^']+)'|(?P<word>[A-Za-z]+))?$")
        .expect("quantity pattern is valid")
});

fn singleton(input: &Collection, what: &str) -> Result<Option<Value>> {
    Ok(input.as_singleton(what)?.cloned())
}

fn convert(
    input: &Collection,
    what: &str,
    f: impl Fn(&Value) -> Option<Value>,
) -> Result<Collection> {
    Ok(match singleton(input, what)? {
        Some(value) => f(&value).map_or_else(Collection::empty, Collection::singleton),
        None => Collection::empty(),
    })
}

fn converts(
    input: &Collection,
    what: &str,
    f: impl Fn(&Value) -> Option<Value>,
) -> Result<Collection> {
    Ok(match singleton(input, what)? {
        Some(value) => Collection::singleton(Value::boolean(f(&value).is_some())),
        None => Collection::empty(),
    })
}

fn boolean_value(value: &Value) -> Option<Value> {
    match value {
        Value::Boolean(_) => Some(value.clone()),
        Value::Integer(1) | Value::Long(1) => Some(Value::boolean(true)),
        Value::Integer(0) | Value::Long(0) => Some(Value::boolean(false)),
        Value::Decimal(d) if *d == Decimal::ONE => Some(Value::boolean(true)),
        Value::Decimal(d) if d.is_zero() => Some(Value::boolean(false)),
        Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" | "1.0" => Some(Value::boolean(true)),
            "false" | "f" | "no" | "n" | "0" | "0.0" => Some(Value::boolean(false)),
            _ => None,
        },
        _ => None,
    }
}

fn integer_value(value: &Value) -> Option<Value> {
    match value {
        Value::Integer(_) => Some(value.clone()),
        Value::Long(i) => Some(Value::integer(*i)),
        Value::Boolean(b) => Some(Value::integer(i64::from(*b))),
        Value::String(s) => s.trim().parse::<i64>().ok().map(Value::integer),
        _ => None,
    }
}

fn decimal_value(value: &Value) -> Option<Value> {
    match value {
        Value::Decimal(_) => Some(value.clone()),
        Value::Integer(i) | Value::Long(i) => Some(Value::decimal(Decimal::from(*i))),
        Value::Boolean(b) => Some(Value::decimal(Decimal::from(i64::from(*b)))),
        Value::String(s) => Decimal::from_str(s.trim()).ok().map(Value::decimal),
        _ => None,
    }
}

fn date_value(value: &Value) -> Option<Value> {
    match value {
        Value::Date { .. } => Some(value.clone()),
        Value::DateTime {
            value: dt,
            precision,
            ..
        } => {
            let precision = match precision {
                DateTimePrecision::Year => DatePrecision::Year,
                DateTimePrecision::Month => DatePrecision::Month,
                _ => DatePrecision::Day,
            };
            Some(Value::date(dt.date_naive(), precision))
        }
        Value::String(s) => temporal::parse_date(s).map(|(d, p)| Value::date(d, p)),
        _ => None,
    }
}

fn datetime_value(value: &Value) -> Option<Value> {
    match value {
        Value::DateTime { .. } => Some(value.clone()),
        Value::Date { .. } | Value::String(_) => {
            let text = render(value)?;
            temporal::parse_datetime(&text).map(|(dt, p, tz)| Value::datetime(dt, p, tz))
        }
        _ => None,
    }
}

fn time_value(value: &Value) -> Option<Value> {
    match value {
        Value::Time { .. } => Some(value.clone()),
        Value::String(s) => {
            let text = s.as_ref();
            let text = text.strip_prefix('T').unwrap_or(text);
            temporal::parse_time(text).map(|(t, p)| Value::time(t, p))
        }
        _ => None,
    }
}

fn quantity_value(value: &Value) -> Option<Value> {
    match value {
        Value::Quantity { .. } => Some(value.clone()),
        Value::Integer(i) | Value::Long(i) => Some(Value::quantity(Decimal::from(*i), "1")),
        Value::Decimal(d) => Some(Value::quantity(*d, "1")),
        Value::Boolean(b) => Some(Value::quantity(Decimal::from(i64::from(*b)), "1")),
        Value::String(s) => {
            let captures = QUANTITY_RE.captures(s.trim())?;
            let value = Decimal::from_str(&captures["value"]).ok()?;
            let unit = if let Some(quoted) = captures.name("quoted") {
                quoted.as_str().to_string()
            } else if let Some(word) = captures.name("word") {
                // A bare word is only a unit when it is a calendar duration.
                if !lumen_ucum::is_calendar_unit(word.as_str()) {
                    return None;
                }
                word.as_str().to_string()
            } else {
                "1".to_string()
            };
            Some(Value::quantity(value, unit))
        }
        _ => None,
    }
}

/// Literal-form rendering used by `toString()`.
pub(crate) fn render(value: &Value) -> Option<String> {
    Some(match value {
        Value::Boolean(b) => b.to_string(),
        Value::Integer(i) | Value::Long(i) => i.to_string(),
        Value::Decimal(d) => d.to_string(),
        Value::String(s) => s.to_string(),
        Value::Date {
            value: d,
            precision,
        } => match precision {
            DatePrecision::Year => d.format("%Y").to_string(),
            DatePrecision::Month => d.format("%Y-%m").to_string(),
            DatePrecision::Day => d.format("%Y-%m-%d").to_string(),
        },
        Value::DateTime {
            value: dt,
            precision,
            timezone_offset,
        } => {
            let core = match precision {
                DateTimePrecision::Year => dt.format("%Y").to_string(),
                DateTimePrecision::Month => dt.format("%Y-%m").to_string(),
                DateTimePrecision::Day => dt.format("%Y-%m-%d").to_string(),
                DateTimePrecision::Hour => dt.format("%Y-%m-%dT%H").to_string(),
                DateTimePrecision::Minute => dt.format("%Y-%m-%dT%H:%M").to_string(),
                DateTimePrecision::Second => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
                DateTimePrecision::Millisecond => format!(
                    "{}.{:03}",
                    dt.format("%Y-%m-%dT%H:%M:%S"),
                    dt.timestamp_subsec_millis()
                ),
            };
            // The timezone is only renderable once a time component is.
            let with_time = matches!(
                precision,
                DateTimePrecision::Hour
                    | DateTimePrecision::Minute
                    | DateTimePrecision::Second
                    | DateTimePrecision::Millisecond
            );
            match timezone_offset {
                Some(offset) if with_time => format!("{core}{}", offset_suffix(*offset)),
                _ => core,
            }
        }
        Value::Time {
            value: t,
            precision,
            ..
        } => match precision {
            TimePrecision::Hour => t.format("%H").to_string(),
            TimePrecision::Minute => t.format("%H:%M").to_string(),
            TimePrecision::Second => t.format("%H:%M:%S").to_string(),
            TimePrecision::Millisecond => {
                format!("{}.{:03}", t.format("%H:%M:%S"), t.nanosecond() / 1_000_000)
            }
        },
        Value::Quantity { value, unit } => {
            if lumen_ucum::is_calendar_unit(unit) {
                format!("{value} {unit}")
            } else {
                format!("{value} '{unit}'")
            }
        }
        Value::Element(_) => return None,
    })
}

fn offset_suffix(offset_secs: i32) -> String {
    if offset_secs == 0 {
        return "Z".to_string();
    }
    let sign = if offset_secs < 0 { '-' } else { '+' };
    let abs = offset_secs.abs();
    format!("{sign}{:02}:{:02}", abs / 3600, (abs % 3600) / 60)
}

fn string_value(value: &Value) -> Option<Value> {
    render(value).map(Value::string)
}

pub(crate) fn to_boolean(input: &Collection) -> Result<Collection> {
    convert(input, "toBoolean()", boolean_value)
}

pub(crate) fn converts_to_boolean(input: &Collection) -> Result<Collection> {
    converts(input, "convertsToBoolean()", boolean_value)
}

pub(crate) fn to_integer(input: &Collection) -> Result<Collection> {
    convert(input, "toInteger()", integer_value)
}

pub(crate) fn converts_to_integer(input: &Collection) -> Result<Collection> {
    converts(input, "convertsToInteger()", integer_value)
}

pub(crate) fn to_decimal(input: &Collection) -> Result<Collection> {
    convert(input, "toDecimal()", decimal_value)
}

pub(crate) fn converts_to_decimal(input: &Collection) -> Result<Collection> {
    converts(input, "convertsToDecimal()", decimal_value)
}

pub(crate) fn to_string(input: &Collection) -> Result<Collection> {
    convert(input, "toString()", string_value)
}

pub(crate) fn converts_to_string(input: &Collection) -> Result<Collection> {
    converts(input, "convertsToString()", string_value)
}

pub(crate) fn to_date(input: &Collection) -> Result<Collection> {
    convert(input, "toDate()", date_value)
}

pub(crate) fn converts_to_date(input: &Collection) -> Result<Collection> {
    converts(input, "convertsToDate()", date_value)
}

pub(crate) fn to_datetime(input: &Collection) -> Result<Collection> {
    convert(input, "toDateTime()", datetime_value)
}

pub(crate) fn converts_to_datetime(input: &Collection) -> Result<Collection> {
    converts(input, "convertsToDateTime()", datetime_value)
}

pub(crate) fn to_time(input: &Collection) -> Result<Collection> {
    convert(input, "toTime()", time_value)
}

pub(crate) fn converts_to_time(input: &Collection) -> Result<Collection> {
    converts(input, "convertsToTime()", time_value)
}

pub(crate) fn to_quantity(input: &Collection) -> Result<Collection> {
    convert(input, "toQuantity()", quantity_value)
}

pub(crate) fn converts_to_quantity(input: &Collection) -> Result<Collection> {
    converts(input, "convertsToQuantity()", quantity_value)
}
