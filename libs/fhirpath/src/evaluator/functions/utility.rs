//! Utility functions: `not()`, `iif()`, `trace()`, `sort()`.

use std::cmp::Ordering;

use crate::ast::Expr;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::evaluator::functions::conversion;
use crate::evaluator::Evaluator;
use crate::value::{Collection, Value};

pub(crate) fn not_func(input: &Collection) -> Result<Collection> {
    Ok(match input.boolean_operand("not()")? {
        Some(b) => Collection::singleton(Value::boolean(!b)),
        None => Collection::empty(),
    })
}

/// `iif(criterion, then, else?)`: only the selected branch is evaluated.
pub(crate) fn iif(
    ev: &Evaluator,
    input: &Collection,
    criterion: &Expr,
    then_branch: &Expr,
    else_branch: Option<&Expr>,
    ctx: &Context,
) -> Result<Collection> {
    let ctx = ctx.with_focus(input.clone());
    let decided = ev.eval(criterion, &ctx)?.boolean_operand("iif() criterion")?;
    match decided {
        Some(true) => ev.eval(then_branch, &ctx),
        _ => match else_branch {
            Some(branch) => ev.eval(branch, &ctx),
            None => Ok(Collection::empty()),
        },
    }
}

/// `trace(name)`: emits the traced collection and passes it through.
pub(crate) fn trace(input: Collection, name: &Collection) -> Result<Collection> {
    let Some(label) = name.as_string("trace()")? else {
        return Ok(input);
    };
    let rendered: Vec<String> = input
        .iter()
        .map(|v| conversion::render(v).unwrap_or_else(|| format!("{}(...)", v.type_name())))
        .collect();
    tracing::info!(target: "fhirpath", trace = %label, values = ?rendered, "trace()");
    Ok(input)
}

/// `sort(projection?)`: stable ascending sort, by the item itself or by the
/// projected key; incomparable keys are a type error.
pub(crate) fn sort(
    ev: &Evaluator,
    input: Collection,
    projection: Option<&Expr>,
    ctx: &Context,
) -> Result<Collection> {
    let mut keyed: Vec<(Value, Collection)> = Vec::with_capacity(input.len());
    for (index, item) in input.iter().enumerate() {
        let key = match projection {
            Some(projection) => {
                let frame = ctx.iteration(item.clone(), index);
                ev.eval(projection, &frame)?
            }
            None => Collection::singleton(item.clone()),
        };
        keyed.push((item.clone(), key));
    }

    let mut error = None;
    keyed.sort_by(|(_, a), (_, b)| match compare_keys(a, b) {
        Ok(ordering) => ordering,
        Err(e) => {
            error.get_or_insert(e);
            Ordering::Equal
        }
    });
    if let Some(e) = error {
        return Err(e);
    }

    Ok(keyed.into_iter().map(|(item, _)| item).collect())
}

/// Empty keys order before non-empty ones; undecidable comparisons are
/// errors rather than silently unstable output.
fn compare_keys(a: &Collection, b: &Collection) -> Result<Ordering> {
    let (Some(a), Some(b)) = (a.as_singleton("sort() key")?, b.as_singleton("sort() key")?)
    else {
        return Ok(match (a.is_empty(), b.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => unreachable!(),
        });
    };
    a.compare(b)?
        .ok_or_else(|| Error::Type("sort() keys are not comparable".into()))
}
