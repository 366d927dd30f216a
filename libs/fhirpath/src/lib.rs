#![forbid(unsafe_code)]

//! Embeddable FHIRPath expression engine.
//!
//! The pipeline is `text -> Lexer -> Parser -> AST -> Evaluator`, a plain
//! tree walk with no compilation step. Every evaluation returns an ordered
//! [`Collection`] of [`Value`]s; hosts reach their resource trees through
//! the [`ResourceAdapter`] capability trait.
//!
//! ```
//! use lumen_fhirpath::Engine;
//!
//! let engine = Engine::default();
//! let result = engine
//!     .evaluate("(10 | 20 | 30).where($this > 15)", None, &Default::default())
//!     .unwrap();
//! assert_eq!(result.len(), 2);
//! ```

pub mod adapter;
pub mod ast;
pub mod context;
pub mod engine;
pub mod error;
mod evaluator;
pub mod json;
pub mod lexer;
pub mod parser;
mod registry;
mod temporal;
pub mod token;
pub mod value;

pub use adapter::{EmptyAdapter, ResourceAdapter};
pub use ast::Expr;
pub use engine::{Engine, Variables};
pub use error::{Error, Result};
pub use json::JsonAdapter;
pub use value::{Collection, ElementHandle, Value};
