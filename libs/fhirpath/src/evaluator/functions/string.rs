//! String functions.
//!
//! All of these take a singleton String input (empty propagates to empty)
//! and operate on Unicode code points, so `substring`/`indexOf`/`length`
//! agree with each other on non-ASCII text.

use regex::Regex;

use crate::error::{Error, Result};
use crate::value::{Collection, Value};

fn compile(pattern: &str, what: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| Error::Type(format!("{what} received an invalid regular expression: {e}")))
}

pub(crate) fn index_of(input: &Collection, search: &Collection) -> Result<Collection> {
    let (Some(s), Some(needle)) = (input.as_string("indexOf()")?, search.as_string("indexOf()")?)
    else {
        return Ok(Collection::empty());
    };
    let index = match s.find(needle.as_ref()) {
        Some(byte_index) => s[..byte_index].chars().count() as i64,
        None => -1,
    };
    Ok(Collection::singleton(Value::integer(index)))
}

/// `substring(start, length?)` in code points; a start outside the string
/// yields empty.
pub(crate) fn substring(
    input: &Collection,
    start: &Collection,
    length: Option<&Collection>,
) -> Result<Collection> {
    let (Some(s), Some(start)) = (
        input.as_string("substring()")?,
        start.as_integer("substring()")?,
    ) else {
        return Ok(Collection::empty());
    };

    let total = s.chars().count() as i64;
    if start < 0 || start >= total {
        return Ok(Collection::empty());
    }

    let taken = match length {
        Some(length) => match length.as_integer("substring()")? {
            Some(n) if n <= 0 => return Ok(Collection::empty()),
            Some(n) => n as usize,
            None => return Ok(Collection::empty()),
        },
        None => usize::MAX,
    };

    let out: String = s.chars().skip(start as usize).take(taken).collect();
    Ok(Collection::singleton(Value::string(out)))
}

pub(crate) fn starts_with(input: &Collection, prefix: &Collection) -> Result<Collection> {
    let (Some(s), Some(prefix)) = (
        input.as_string("startsWith()")?,
        prefix.as_string("startsWith()")?,
    ) else {
        return Ok(Collection::empty());
    };
    Ok(Collection::singleton(Value::boolean(
        s.starts_with(prefix.as_ref()),
    )))
}

pub(crate) fn ends_with(input: &Collection, suffix: &Collection) -> Result<Collection> {
    let (Some(s), Some(suffix)) = (
        input.as_string("endsWith()")?,
        suffix.as_string("endsWith()")?,
    ) else {
        return Ok(Collection::empty());
    };
    Ok(Collection::singleton(Value::boolean(
        s.ends_with(suffix.as_ref()),
    )))
}

pub(crate) fn contains_str(input: &Collection, needle: &Collection) -> Result<Collection> {
    let (Some(s), Some(needle)) = (
        input.as_string("contains()")?,
        needle.as_string("contains()")?,
    ) else {
        return Ok(Collection::empty());
    };
    Ok(Collection::singleton(Value::boolean(
        s.contains(needle.as_ref()),
    )))
}

pub(crate) fn upper(input: &Collection) -> Result<Collection> {
    let Some(s) = input.as_string("upper()")? else {
        return Ok(Collection::empty());
    };
    Ok(Collection::singleton(Value::string(s.to_uppercase())))
}

pub(crate) fn lower(input: &Collection) -> Result<Collection> {
    let Some(s) = input.as_string("lower()")? else {
        return Ok(Collection::empty());
    };
    Ok(Collection::singleton(Value::string(s.to_lowercase())))
}

pub(crate) fn replace(
    input: &Collection,
    pattern: &Collection,
    replacement: &Collection,
) -> Result<Collection> {
    let (Some(s), Some(pattern), Some(replacement)) = (
        input.as_string("replace()")?,
        pattern.as_string("replace()")?,
        replacement.as_string("replace()")?,
    ) else {
        return Ok(Collection::empty());
    };
    // Replacing the empty pattern surrounds every character, per spec.
    if pattern.is_empty() {
        let mut out = String::from(replacement.as_ref());
        for c in s.chars() {
            out.push(c);
            out.push_str(&replacement);
        }
        return Ok(Collection::singleton(Value::string(out)));
    }
    Ok(Collection::singleton(Value::string(
        s.replace(pattern.as_ref(), &replacement),
    )))
}

pub(crate) fn matches(input: &Collection, pattern: &Collection) -> Result<Collection> {
    let (Some(s), Some(pattern)) = (
        input.as_string("matches()")?,
        pattern.as_string("matches()")?,
    ) else {
        return Ok(Collection::empty());
    };
    let regex = compile(&pattern, "matches()")?;
    Ok(Collection::singleton(Value::boolean(regex.is_match(&s))))
}

pub(crate) fn replace_matches(
    input: &Collection,
    pattern: &Collection,
    replacement: &Collection,
) -> Result<Collection> {
    let (Some(s), Some(pattern), Some(replacement)) = (
        input.as_string("replaceMatches()")?,
        pattern.as_string("replaceMatches()")?,
        replacement.as_string("replaceMatches()")?,
    ) else {
        return Ok(Collection::empty());
    };
    let regex = compile(&pattern, "replaceMatches()")?;
    Ok(Collection::singleton(Value::string(
        regex.replace_all(&s, replacement.as_ref()).into_owned(),
    )))
}

pub(crate) fn length(input: &Collection) -> Result<Collection> {
    let Some(s) = input.as_string("length()")? else {
        return Ok(Collection::empty());
    };
    Ok(Collection::singleton(Value::integer(
        s.chars().count() as i64
    )))
}

pub(crate) fn to_chars(input: &Collection) -> Result<Collection> {
    let Some(s) = input.as_string("toChars()")? else {
        return Ok(Collection::empty());
    };
    Ok(s.chars().map(|c| Value::string(c.to_string())).collect())
}
