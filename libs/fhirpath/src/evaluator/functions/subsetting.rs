//! Subsetting functions: `single()`, `first()`, `last()`, `tail()`,
//! `skip()`, `take()`, `intersect()`, `exclude()`.

use crate::error::{Error, Result};
use crate::value::Collection;

pub(crate) fn single(input: Collection) -> Result<Collection> {
    match input.len() {
        0 | 1 => Ok(input),
        n => Err(Error::Singleton(format!(
            "single() requires at most one item, found {n}"
        ))),
    }
}

pub(crate) fn first(input: Collection) -> Result<Collection> {
    Ok(match input.first() {
        Some(value) => Collection::singleton(value.clone()),
        None => Collection::empty(),
    })
}

pub(crate) fn last(input: Collection) -> Result<Collection> {
    Ok(match input.last() {
        Some(value) => Collection::singleton(value.clone()),
        None => Collection::empty(),
    })
}

pub(crate) fn tail(input: Collection) -> Result<Collection> {
    Ok(input.into_iter().skip(1).collect())
}

pub(crate) fn skip(input: Collection, n: &Collection) -> Result<Collection> {
    let Some(n) = n.as_integer("skip()")? else {
        return Ok(Collection::empty());
    };
    if n <= 0 {
        return Ok(input);
    }
    Ok(input.into_iter().skip(n as usize).collect())
}

pub(crate) fn take(input: Collection, n: &Collection) -> Result<Collection> {
    let Some(n) = n.as_integer("take()")? else {
        return Ok(Collection::empty());
    };
    if n <= 0 {
        return Ok(Collection::empty());
    }
    Ok(input.into_iter().take(n as usize).collect())
}

/// Items present in both collections, deduplicated, input order kept.
pub(crate) fn intersect(input: &Collection, other: &Collection) -> Result<Collection> {
    let mut out = Collection::empty();
    for item in input.iter() {
        if other.contains_value(item) && !out.contains_value(item) {
            out.push(item.clone());
        }
    }
    Ok(out)
}

/// Items not present in `other`; duplicates and order are preserved.
pub(crate) fn exclude(input: &Collection, other: &Collection) -> Result<Collection> {
    Ok(input
        .iter()
        .filter(|item| !other.contains_value(item))
        .cloned()
        .collect())
}
