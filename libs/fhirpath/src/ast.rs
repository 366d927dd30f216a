//! Abstract syntax tree for FHIRPath expressions
//!
//! One tagged enum mirroring the grammar: literal terms, path and invocation
//! steps, the indexer, and one binary/unary node per operator family. Lambda
//! arguments (`where`, `select`, `aggregate`, ...) are plain subtrees; the
//! evaluator re-evaluates them per element with `$this`/`$index`/`$total`
//! bound, so no closure representation is needed.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use rust_decimal::Decimal;

use crate::value::{DatePrecision, DateTimePrecision, TimePrecision};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `{}` and `{a, b}` collection literals; `{}` is the empty collection.
    Collection(Vec<Expr>),
    Boolean(bool),
    Integer(i64),
    Long(i64),
    Decimal(Decimal),
    StringLit(String),
    Date(NaiveDate, DatePrecision),
    DateTime(DateTime<FixedOffset>, DateTimePrecision, Option<i32>),
    Time(NaiveTime, TimePrecision),
    Quantity { value: Decimal, unit: String },

    /// Bare name resolved against the focus (type name or child step).
    Identifier(String),
    /// Backtick-quoted name; always a child step, never a keyword.
    DelimitedIdentifier(String),
    /// `%name` in any of its three written forms.
    Variable(String),

    This,
    Index,
    Total,
    ResourceRef,

    /// `receiver.name`
    Path { receiver: Box<Expr>, name: String },
    /// `receiver.function(args)`; `receiver` is `None` for a bare call.
    Invocation {
        receiver: Option<Box<Expr>>,
        function: String,
        args: Vec<Expr>,
    },
    /// `receiver[index]`
    Indexer { receiver: Box<Expr>, index: Box<Expr> },

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `expr is Type` / `expr as Type`
    TypeOp {
        op: TypeOperator,
        operand: Box<Expr>,
        type_specifier: TypeSpecifier,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // multiplicative
    Mul,
    Div,
    IntDiv,
    Mod,
    // additive
    Add,
    Sub,
    Concat,
    // union
    Union,
    // comparison
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    // equality
    Equal,
    NotEqual,
    Equivalent,
    NotEquivalent,
    // membership
    In,
    Contains,
    // boolean
    And,
    Or,
    Xor,
    Implies,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeOperator {
    Is,
    As,
}

/// Type specifier from a qualified identifier: `Integer`, `System.Integer`,
/// `FHIR.Patient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpecifier {
    pub namespace: Option<String>,
    pub name: String,
}

impl TypeSpecifier {
    pub fn new(mut parts: Vec<String>) -> Self {
        let name = parts.pop().unwrap_or_default();
        let namespace = if parts.is_empty() {
            None
        } else {
            Some(parts.join("."))
        };
        Self { namespace, name }
    }

    pub fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}.{}", self.name),
            None => self.name.clone(),
        }
    }
}
