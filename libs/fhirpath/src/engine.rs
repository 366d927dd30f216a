//! Public engine API
//!
//! The engine is a pure synchronous function from `(expression, context)` to
//! a collection: no I/O, no timers, no mutable state. The AST returned by
//! [`Engine::parse`] is immutable and can be shared across threads and
//! re-evaluated with [`Engine::evaluate_ast`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::ResourceAdapter;
use crate::ast::Expr;
use crate::context::Context;
use crate::error::Result;
use crate::evaluator::Evaluator;
use crate::parser;
use crate::value::{Collection, ElementHandle, Value};

/// Default significant digits for decimal arithmetic.
const DEFAULT_PRECISION: u32 = 15;

pub type Variables = HashMap<String, Option<Value>>;

pub struct Engine {
    adapter: Arc<dyn ResourceAdapter>,
    precision: u32,
}

impl Engine {
    pub fn new(adapter: Arc<dyn ResourceAdapter>) -> Self {
        Self {
            adapter,
            precision: DEFAULT_PRECISION,
        }
    }

    /// Override the significant-digit precision of decimal arithmetic.
    pub fn with_precision(mut self, digits: u32) -> Self {
        self.precision = digits;
        self
    }

    /// Parse an expression to a reusable AST.
    pub fn parse(&self, expression: &str) -> Result<Expr> {
        parser::parse(expression)
    }

    /// Parse and evaluate in one step.
    pub fn evaluate(
        &self,
        expression: &str,
        resource: Option<ElementHandle>,
        variables: &Variables,
    ) -> Result<Collection> {
        let ast = self.parse(expression)?;
        self.evaluate_ast(&ast, resource, variables)
    }

    /// Evaluate a pre-parsed AST.
    pub fn evaluate_ast(
        &self,
        ast: &Expr,
        resource: Option<ElementHandle>,
        variables: &Variables,
    ) -> Result<Collection> {
        tracing::debug!(target: "fhirpath", "evaluating expression");
        let root = match resource {
            Some(handle) => Collection::singleton(Value::element(handle)),
            None => Collection::empty(),
        };
        let ctx = Context::new(root, Arc::new(variables.clone()));
        let evaluator = Evaluator::new(self.adapter.as_ref(), self.precision);
        evaluator.eval(ast, &ctx)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Arc::new(crate::adapter::EmptyAdapter))
    }
}
