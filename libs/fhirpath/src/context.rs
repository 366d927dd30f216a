//! Evaluation context
//!
//! The context is immutable along a call chain; iteration constructs clone
//! it and push a new frame with `$this`, `$index` and (for `aggregate`)
//! `$total` bound. Nested aggregates therefore never observe each other's
//! accumulator.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::value::{Collection, Value};

/// Built-in external constants available without host configuration.
const UCUM_URL: &str = "http://unitsofmeasure.org";
const SCT_URL: &str = "http://snomed.info/sct";
const LOINC_URL: &str = "http://loinc.org";

#[derive(Clone)]
pub struct Context {
    /// Input collection the current expression applies to.
    pub focus: Collection,
    /// `$this` inside an iteration frame.
    pub this: Option<Value>,
    /// `$index` inside an iteration frame.
    pub index: Option<usize>,
    /// `$total` inside an `aggregate` frame.
    pub total: Option<Collection>,
    /// The evaluation root (`$resource`, `%resource`, `%context`).
    pub resource: Collection,
    /// Host-supplied variables; an explicit `None` value is an empty
    /// collection, not an error.
    variables: Arc<HashMap<String, Option<Value>>>,
}

impl Context {
    pub fn new(resource: Collection, variables: Arc<HashMap<String, Option<Value>>>) -> Self {
        Self {
            focus: resource.clone(),
            this: None,
            index: None,
            total: None,
            resource,
            variables,
        }
    }

    /// Same frame over a different input collection.
    pub fn with_focus(&self, focus: Collection) -> Self {
        let mut ctx = self.clone();
        ctx.focus = focus;
        ctx
    }

    /// Iteration frame: `$this` and `$index` bound, focus narrowed to the
    /// single item.
    pub fn iteration(&self, item: Value, index: usize) -> Self {
        let mut ctx = self.clone();
        ctx.focus = Collection::singleton(item.clone());
        ctx.this = Some(item);
        ctx.index = Some(index);
        ctx
    }

    /// Aggregate frame: additionally binds `$total`.
    pub fn with_total(mut self, total: Collection) -> Self {
        self.total = Some(total);
        self
    }

    /// Resolve `%name`: host variables first, then the built-in constants.
    pub fn variable(&self, name: &str) -> Result<Collection> {
        if let Some(entry) = self.variables.get(name) {
            return Ok(match entry {
                Some(value) => Collection::singleton(value.clone()),
                None => Collection::empty(),
            });
        }
        match name {
            "context" | "resource" => Ok(self.resource.clone()),
            "ucum" => Ok(Collection::singleton(Value::string(UCUM_URL))),
            "sct" => Ok(Collection::singleton(Value::string(SCT_URL))),
            "loinc" => Ok(Collection::singleton(Value::string(LOINC_URL))),
            _ => Err(Error::Resolution(format!("unknown variable '%{name}'"))),
        }
    }
}
