//! Type operations: `is`, `as`, `ofType()`, `type()`.
//!
//! Scalars match against the System namespace by intrinsic tag; elements
//! are answered by the resource adapter, which owns `choice[x]` resolution.

use crate::ast::{Expr, TypeOperator, TypeSpecifier};
use crate::error::{Error, Result};
use crate::evaluator::Evaluator;
use crate::value::{Collection, Value};

const SYSTEM_TYPES: &[&str] = &[
    "Boolean", "Integer", "Long", "Decimal", "String", "Date", "DateTime", "Time", "Quantity",
];

/// Reinterpret a function argument as a type specifier (`ofType(Patient)`,
/// `is(System.Integer)`).
pub(crate) fn specifier_from_expr(expr: &Expr) -> Result<TypeSpecifier> {
    fn collect(expr: &Expr, parts: &mut Vec<String>) -> bool {
        match expr {
            Expr::Identifier(name) | Expr::DelimitedIdentifier(name) => {
                parts.push(name.clone());
                true
            }
            Expr::Path { receiver, name } => {
                if !collect(receiver, parts) {
                    return false;
                }
                parts.push(name.clone());
                true
            }
            _ => false,
        }
    }

    let mut parts = Vec::new();
    if !collect(expr, &mut parts) || parts.is_empty() {
        return Err(Error::Type(
            "expected a type specifier argument (e.g. Patient or System.Integer)".into(),
        ));
    }
    Ok(TypeSpecifier::new(parts))
}

fn validate(specifier: &TypeSpecifier) -> Result<()> {
    if matches!(specifier.namespace.as_deref(), Some("System"))
        && !SYSTEM_TYPES.contains(&specifier.name.as_str())
    {
        return Err(Error::Resolution(format!(
            "unknown type 'System.{}'",
            specifier.name
        )));
    }
    Ok(())
}

fn matches_type(ev: &Evaluator, value: &Value, specifier: &TypeSpecifier) -> bool {
    match value {
        Value::Element(handle) => {
            // Elements live in the FHIR namespace; System names never match.
            if matches!(specifier.namespace.as_deref(), Some("System")) {
                return false;
            }
            ev.adapter.is_type(handle, &specifier.name)
        }
        scalar => {
            if matches!(specifier.namespace.as_deref(), Some(ns) if ns != "System") {
                return false;
            }
            scalar.type_name() == specifier.name
        }
    }
}

pub(crate) fn eval_type_op(
    ev: &Evaluator,
    op: TypeOperator,
    input: &Collection,
    specifier: &TypeSpecifier,
) -> Result<Collection> {
    validate(specifier)?;
    let name = match op {
        TypeOperator::Is => "'is'",
        TypeOperator::As => "'as'",
    };
    let Some(value) = input.as_singleton(name)? else {
        return Ok(Collection::empty());
    };
    let matched = matches_type(ev, value, specifier);
    Ok(match op {
        TypeOperator::Is => Collection::singleton(Value::boolean(matched)),
        TypeOperator::As if matched => Collection::singleton(value.clone()),
        TypeOperator::As => Collection::empty(),
    })
}

pub(crate) fn of_type(
    ev: &Evaluator,
    input: &Collection,
    specifier: &TypeSpecifier,
) -> Result<Collection> {
    validate(specifier)?;
    Ok(input
        .iter()
        .filter(|value| matches_type(ev, value, specifier))
        .cloned()
        .collect())
}

/// `type()`: qualified type name per element, `System.*` for scalars and
/// `FHIR.*` for adapter-backed elements.
pub(crate) fn type_of(ev: &Evaluator, input: &Collection) -> Result<Collection> {
    Ok(input
        .iter()
        .map(|value| {
            let name = match value {
                Value::Element(handle) => {
                    format!("FHIR.{}", ev.adapter.type_name(handle))
                }
                scalar => format!("System.{}", scalar.type_name()),
            };
            Value::string(name)
        })
        .collect())
}
