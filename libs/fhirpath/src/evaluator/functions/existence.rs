//! Existence and collection query functions: `empty()`, `exists()`,
//! `all()`, the boolean folds, subset tests, `count()` and `distinct()`.

use crate::ast::Expr;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::evaluator::Evaluator;
use crate::value::{Collection, Value};

pub(crate) fn empty(input: &Collection) -> Result<Collection> {
    Ok(Collection::singleton(Value::boolean(input.is_empty())))
}

/// `exists()` or `exists(criteria)`; the criteria is re-evaluated per
/// element with `$this`/`$index` bound.
pub(crate) fn exists(
    ev: &Evaluator,
    input: &Collection,
    criteria: Option<&Expr>,
    ctx: &Context,
) -> Result<Collection> {
    let Some(criteria) = criteria else {
        return Ok(Collection::singleton(Value::boolean(!input.is_empty())));
    };
    for (index, item) in input.iter().enumerate() {
        let frame = ctx.iteration(item.clone(), index);
        let outcome = ev.eval(criteria, &frame)?;
        if outcome.boolean_operand("exists() criteria")? == Some(true) {
            return Ok(Collection::singleton(Value::boolean(true)));
        }
    }
    Ok(Collection::singleton(Value::boolean(false)))
}

/// `all(criteria)`: vacuously true on empty input; an empty or false
/// criteria result on any element decides false.
pub(crate) fn all(
    ev: &Evaluator,
    input: &Collection,
    criteria: &Expr,
    ctx: &Context,
) -> Result<Collection> {
    for (index, item) in input.iter().enumerate() {
        let frame = ctx.iteration(item.clone(), index);
        let outcome = ev.eval(criteria, &frame)?;
        if outcome.boolean_operand("all() criteria")? != Some(true) {
            return Ok(Collection::singleton(Value::boolean(false)));
        }
    }
    Ok(Collection::singleton(Value::boolean(true)))
}

fn boolean_fold(
    input: &Collection,
    what: &str,
    empty_result: bool,
    decide_on: bool,
    decision: bool,
) -> Result<Collection> {
    if input.is_empty() {
        return Ok(Collection::singleton(Value::boolean(empty_result)));
    }
    for item in input.iter() {
        match item {
            Value::Boolean(b) => {
                if *b == decide_on {
                    return Ok(Collection::singleton(Value::boolean(decision)));
                }
            }
            other => {
                return Err(Error::Type(format!(
                    "{what} requires a collection of Booleans, found {}",
                    other.type_name()
                )))
            }
        }
    }
    Ok(Collection::singleton(Value::boolean(!decision)))
}

pub(crate) fn all_true(input: &Collection) -> Result<Collection> {
    boolean_fold(input, "allTrue()", true, false, false)
}

pub(crate) fn any_true(input: &Collection) -> Result<Collection> {
    boolean_fold(input, "anyTrue()", false, true, true)
}

pub(crate) fn all_false(input: &Collection) -> Result<Collection> {
    boolean_fold(input, "allFalse()", true, true, false)
}

pub(crate) fn any_false(input: &Collection) -> Result<Collection> {
    boolean_fold(input, "anyFalse()", false, false, true)
}

pub(crate) fn subset_of(input: &Collection, other: &Collection) -> Result<Collection> {
    let is_subset = input.iter().all(|item| other.contains_value(item));
    Ok(Collection::singleton(Value::boolean(is_subset)))
}

pub(crate) fn superset_of(input: &Collection, other: &Collection) -> Result<Collection> {
    subset_of(other, input)
}

pub(crate) fn count(input: &Collection) -> Result<Collection> {
    Ok(Collection::singleton(Value::integer(input.len() as i64)))
}

/// Order-preserving deduplication under `=`; first occurrence wins.
pub(crate) fn distinct(input: &Collection) -> Result<Collection> {
    let mut out = Collection::with_capacity(input.len());
    for item in input.iter() {
        if !out.contains_value(item) {
            out.push(item.clone());
        }
    }
    Ok(out)
}

pub(crate) fn is_distinct(input: &Collection) -> Result<Collection> {
    let deduplicated = distinct(input)?;
    Ok(Collection::singleton(Value::boolean(
        deduplicated.len() == input.len(),
    )))
}
