//! `aggregate(aggregator, init?)`
//!
//! Threads `$total` across `$this`/`$index` iterations and returns the final
//! `$total`. Each call builds its own accumulator frame, so a nested
//! `aggregate` never observes the outer call's `$total`; the outer binding
//! is restored as soon as the inner call returns.

use crate::ast::Expr;
use crate::context::Context;
use crate::error::Result;
use crate::evaluator::Evaluator;
use crate::value::Collection;

pub(crate) fn aggregate(
    ev: &Evaluator,
    input: &Collection,
    aggregator: &Expr,
    init: Option<&Expr>,
    ctx: &Context,
) -> Result<Collection> {
    // The init expression is evaluated once, in the caller's frame.
    let mut total = match init {
        Some(init) => ev.eval(init, ctx)?,
        None => Collection::empty(),
    };

    for (index, item) in input.iter().enumerate() {
        let frame = ctx.iteration(item.clone(), index).with_total(total);
        total = ev.eval(aggregator, &frame)?;
    }

    Ok(total)
}
