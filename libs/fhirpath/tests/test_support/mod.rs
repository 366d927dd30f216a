#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use lumen_fhirpath::{Collection, Engine, JsonAdapter, Value, Variables};
use rust_decimal::Decimal;

/// Evaluate a resource-free expression.
pub fn eval(expression: &str) -> Collection {
    Engine::default()
        .evaluate(expression, None, &Variables::new())
        .unwrap_or_else(|e| panic!("'{expression}' failed: {e}"))
}

/// Evaluate with host variables.
pub fn eval_with_vars(expression: &str, variables: &Variables) -> Collection {
    Engine::default()
        .evaluate(expression, None, variables)
        .unwrap_or_else(|e| panic!("'{expression}' failed: {e}"))
}

/// Evaluate against a JSON resource through the reference adapter.
pub fn eval_on(resource: &serde_json::Value, expression: &str) -> Collection {
    let (adapter, root) = JsonAdapter::from_json(resource).expect("valid resource");
    let engine = Engine::new(Arc::new(adapter));
    engine
        .evaluate(expression, Some(root), &Variables::new())
        .unwrap_or_else(|e| panic!("'{expression}' failed: {e}"))
}

pub fn error_of(expression: &str) -> lumen_fhirpath::Error {
    Engine::default()
        .evaluate(expression, None, &Variables::new())
        .expect_err("expected an error")
}

pub fn integers(values: &[i64]) -> Collection {
    Collection::from_values(values.iter().copied().map(Value::integer).collect())
}

pub fn strings(values: &[&str]) -> Collection {
    Collection::from_values(values.iter().map(|s| Value::string(*s)).collect())
}

pub fn booleans(values: &[bool]) -> Collection {
    Collection::from_values(values.iter().copied().map(Value::boolean).collect())
}

pub fn decimal(text: &str) -> Value {
    Value::decimal(Decimal::from_str(text).unwrap())
}
