//! Exponent-map representation of UCUM unit expressions.
//!
//! A unit string like `kg.m/s2` is reduced to a map from unit symbol to
//! signed integer exponent. Entries with exponent zero are never stored;
//! the empty map is the dimensionless unit `'1'`.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};

/// Map from unit symbol to integer exponent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnitMap(BTreeMap<String, i32>);

impl UnitMap {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// True for the dimensionless unit `'1'`.
    pub fn is_dimensionless(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn exponent(&self, symbol: &str) -> i32 {
        self.0.get(symbol).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Add `exponent` to the entry for `symbol`, dropping the entry when the
    /// sum reaches zero.
    pub fn accumulate(&mut self, symbol: &str, exponent: i32) {
        if exponent == 0 {
            return;
        }
        match self.0.entry(symbol.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(exponent);
            }
            Entry::Occupied(mut slot) => {
                let sum = slot.get() + exponent;
                if sum == 0 {
                    slot.remove();
                } else {
                    *slot.get_mut() = sum;
                }
            }
        }
    }

    /// Element-wise sum of exponents (unit multiplication).
    pub fn mul(&self, other: &UnitMap) -> UnitMap {
        let mut out = self.clone();
        for (symbol, exponent) in other.iter() {
            out.accumulate(symbol, exponent);
        }
        out
    }

    /// Element-wise difference of exponents (unit division).
    pub fn div(&self, other: &UnitMap) -> UnitMap {
        let mut out = self.clone();
        for (symbol, exponent) in other.iter() {
            out.accumulate(symbol, -exponent);
        }
        out
    }

    /// Parse a unit string into an exponent map.
    ///
    /// Surrounding single quotes are stripped; an empty string or `1` is the
    /// empty map. Components are separated by `.` or `/`; every component
    /// after the first `/` has its exponent negated, including components
    /// subsequently joined with `.`. A component is a run of letters followed
    /// by an optional signed integer exponent (default 1). Duplicate symbols
    /// are rejected.
    pub fn parse(input: &str) -> Result<UnitMap> {
        let s = input.trim();
        let s = s
            .strip_prefix('\'')
            .and_then(|rest| rest.strip_suffix('\''))
            .unwrap_or(s);
        if s.is_empty() || s == "1" {
            return Ok(UnitMap::new());
        }
        if !s.is_ascii() {
            return Err(Error::NonAscii);
        }

        let bytes = s.as_bytes();
        let mut map = UnitMap::new();
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut negate = false;
        let mut pos = 0;
        let mut first = true;

        while pos < bytes.len() {
            if first {
                // A leading '/' inverts the whole expression (e.g. "/min").
                if bytes[pos] == b'/' {
                    negate = true;
                    pos += 1;
                }
                first = false;
            } else {
                match bytes[pos] {
                    b'.' => pos += 1,
                    b'/' => {
                        negate = true;
                        pos += 1;
                    }
                    _ => {
                        return Err(Error::Syntax {
                            pos,
                            message: "expected '.' or '/' between components",
                        })
                    }
                }
            }

            let start = pos;
            while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
                pos += 1;
            }
            if pos == start {
                return Err(Error::Syntax {
                    pos,
                    message: "expected a unit symbol",
                });
            }
            let symbol = &s[start..pos];

            let exp_start = pos;
            if pos < bytes.len() && bytes[pos] == b'-' {
                pos += 1;
            }
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
            let exponent: i32 = if pos == exp_start {
                1
            } else {
                s[exp_start..pos].parse().map_err(|_| Error::Syntax {
                    pos: exp_start,
                    message: "invalid exponent",
                })?
            };
            let exponent = if negate { -exponent } else { exponent };

            if !seen.insert(symbol) {
                return Err(Error::DuplicateUnit(symbol.to_string()));
            }
            if exponent != 0 {
                map.0.insert(symbol.to_string(), exponent);
            }
        }

        Ok(map)
    }

    /// Render the map in normal form: symbols in ascending order joined by
    /// `.`, exponent 1 elided. The empty map renders as `1`.
    pub fn format(&self) -> String {
        if self.0.is_empty() {
            return "1".to_string();
        }
        let mut out = String::new();
        for (symbol, exponent) in self.iter() {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(symbol);
            if exponent != 1 {
                out.push_str(&exponent.to_string());
            }
        }
        out
    }
}
