//! Filtering and projection: `where()`, `select()`, `repeat()`.
//!
//! All three take re-evaluable expression arguments; each element is visited
//! in an iteration frame binding `$this` and `$index`.

use crate::ast::Expr;
use crate::context::Context;
use crate::error::Result;
use crate::evaluator::Evaluator;
use crate::value::Collection;

pub(crate) fn where_func(
    ev: &Evaluator,
    input: &Collection,
    criteria: &Expr,
    ctx: &Context,
) -> Result<Collection> {
    let mut out = Collection::with_capacity(input.len());
    for (index, item) in input.iter().enumerate() {
        let frame = ctx.iteration(item.clone(), index);
        let outcome = ev.eval(criteria, &frame)?;
        if outcome.boolean_operand("where() criteria")? == Some(true) {
            out.push(item.clone());
        }
    }
    Ok(out)
}

pub(crate) fn select_func(
    ev: &Evaluator,
    input: &Collection,
    projection: &Expr,
    ctx: &Context,
) -> Result<Collection> {
    let mut out = Collection::empty();
    for (index, item) in input.iter().enumerate() {
        let frame = ctx.iteration(item.clone(), index);
        out.extend(ev.eval(projection, &frame)?);
    }
    Ok(out)
}

/// Fixed-point projection: apply `projection` to the input, then to every
/// new result, until nothing new appears. Already-seen items are dropped so
/// cyclic structures terminate.
pub(crate) fn repeat_func(
    ev: &Evaluator,
    input: &Collection,
    projection: &Expr,
    ctx: &Context,
) -> Result<Collection> {
    let mut out = Collection::empty();
    let mut frontier = input.clone();

    while !frontier.is_empty() {
        let produced = select_func(ev, &frontier, projection, ctx)?;
        frontier = Collection::empty();
        for item in produced {
            if !out.contains_value(&item) {
                out.push(item.clone());
                frontier.push(item);
            }
        }
    }
    Ok(out)
}
