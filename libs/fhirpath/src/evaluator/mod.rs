//! Tree-walking evaluator
//!
//! Reduces an AST to a [`Collection`] against a [`Context`]. Operators live
//! in [`operators`]; the function library is organised by family under
//! [`functions`]. The walk owns nothing mutable: frames are cloned contexts,
//! and the resource tree is reached only through the [`ResourceAdapter`].

pub(crate) mod functions;
pub(crate) mod operators;

use crate::adapter::ResourceAdapter;
use crate::ast::Expr;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::registry::{self, FunctionId};
use crate::value::{Collection, Value};

pub(crate) struct Evaluator<'a> {
    pub adapter: &'a dyn ResourceAdapter,
    /// Significant digits kept by decimal arithmetic.
    pub precision: u32,
}

impl<'a> Evaluator<'a> {
    pub fn new(adapter: &'a dyn ResourceAdapter, precision: u32) -> Self {
        Self { adapter, precision }
    }

    pub fn eval(&self, expr: &Expr, ctx: &Context) -> Result<Collection> {
        match expr {
            Expr::Collection(elements) => {
                let mut out = Collection::empty();
                for element in elements {
                    out.extend(self.eval(element, ctx)?);
                }
                Ok(out)
            }
            Expr::Boolean(b) => Ok(Collection::singleton(Value::boolean(*b))),
            Expr::Integer(i) => Ok(Collection::singleton(Value::integer(*i))),
            Expr::Long(i) => Ok(Collection::singleton(Value::long(*i))),
            Expr::Decimal(d) => Ok(Collection::singleton(Value::decimal(*d))),
            Expr::StringLit(s) => Ok(Collection::singleton(Value::string(s.as_str()))),
            Expr::Date(value, precision) => {
                Ok(Collection::singleton(Value::date(*value, *precision)))
            }
            Expr::DateTime(value, precision, offset) => Ok(Collection::singleton(
                Value::datetime(*value, *precision, *offset),
            )),
            Expr::Time(value, precision) => {
                Ok(Collection::singleton(Value::time(*value, *precision)))
            }
            Expr::Quantity { value, unit } => Ok(Collection::singleton(Value::quantity(
                *value,
                unit.as_str(),
            ))),

            Expr::Identifier(name) => Ok(self.resolve_name(name, ctx, true)),
            Expr::DelimitedIdentifier(name) => Ok(self.resolve_name(name, ctx, false)),
            Expr::Variable(name) => ctx.variable(name),

            Expr::This => Ok(match &ctx.this {
                Some(value) => Collection::singleton(value.clone()),
                None => ctx.focus.clone(),
            }),
            Expr::Index => match ctx.index {
                Some(index) => Ok(Collection::singleton(Value::integer(index as i64))),
                None => Err(Error::Resolution(
                    "$index is only defined inside an iteration".into(),
                )),
            },
            Expr::Total => match &ctx.total {
                Some(total) => Ok(total.clone()),
                None => Err(Error::Resolution(
                    "$total is only defined inside aggregate()".into(),
                )),
            },
            Expr::ResourceRef => Ok(ctx.resource.clone()),

            Expr::Path { receiver, name } => {
                let input = self.eval(receiver, ctx)?;
                Ok(self.path_step(&input, name))
            }
            Expr::Invocation {
                receiver,
                function,
                args,
            } => {
                let input = match receiver {
                    Some(receiver) => self.eval(receiver, ctx)?,
                    None => ctx.focus.clone(),
                };
                self.call(function, input, args, ctx)
            }
            Expr::Indexer { receiver, index } => {
                let input = self.eval(receiver, ctx)?;
                let index = self.eval(index, ctx)?;
                let Some(i) = index.as_integer("indexer")? else {
                    return Ok(Collection::empty());
                };
                if i < 0 {
                    return Ok(Collection::empty());
                }
                Ok(match input.get(i as usize) {
                    Some(value) => Collection::singleton(value.clone()),
                    None => Collection::empty(),
                })
            }

            Expr::Unary { op, operand } => {
                let operand = self.eval(operand, ctx)?;
                operators::unary(*op, &operand)
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left, ctx)?;
                let right = self.eval(right, ctx)?;
                operators::binary(self, *op, left, right)
            }
            Expr::TypeOp {
                op,
                operand,
                type_specifier,
            } => {
                let input = self.eval(operand, ctx)?;
                functions::types::eval_type_op(self, *op, &input, type_specifier)
            }
        }
    }

    /// A bare name: a leading-uppercase name matching an element's type
    /// keeps the element (`Patient.name` on a Patient resource); everything
    /// else is a child step.
    fn resolve_name(&self, name: &str, ctx: &Context, allow_type_match: bool) -> Collection {
        let mut out = Collection::empty();
        let type_like =
            allow_type_match && name.chars().next().map(char::is_uppercase).unwrap_or(false);
        for value in ctx.focus.iter() {
            if let Value::Element(handle) = value {
                if type_like && self.adapter.is_type(handle, name) {
                    out.push(value.clone());
                } else {
                    out.extend(self.adapter.children(handle, name));
                }
            }
        }
        out
    }

    /// `input.name`: child lookup on elements, empty on everything else.
    fn path_step(&self, input: &Collection, name: &str) -> Collection {
        let mut out = Collection::empty();
        for value in input.iter() {
            if let Value::Element(handle) = value {
                out.extend(self.adapter.children(handle, name));
            }
        }
        out
    }

    fn call(
        &self,
        name: &str,
        input: Collection,
        args: &[Expr],
        ctx: &Context,
    ) -> Result<Collection> {
        let Some(spec) = registry::lookup(name) else {
            return Err(Error::Resolution(format!("unknown function '{name}()'")));
        };
        if args.len() < spec.min_args || args.len() > spec.max_args {
            return Err(Error::Arity(format!(
                "{name}() takes {} to {} arguments, found {}",
                spec.min_args,
                spec.max_args,
                args.len()
            )));
        }

        if spec.expression_args {
            return self.call_with_expressions(spec.id, input, args, ctx);
        }

        // Ordinary arguments evaluate against the function's input, so
        // `'abc'.substring(length() - 1)` sees the string as its focus.
        let arg_ctx = ctx.with_focus(input.clone());
        let mut evaluated = Vec::with_capacity(args.len());
        for arg in args {
            evaluated.push(self.eval(arg, &arg_ctx)?);
        }
        self.dispatch(spec.id, spec.name, input, &evaluated)
    }

    /// Functions whose arguments stay as ASTs: lambda criteria, lazy
    /// branches and type specifiers.
    fn call_with_expressions(
        &self,
        id: FunctionId,
        input: Collection,
        args: &[Expr],
        ctx: &Context,
    ) -> Result<Collection> {
        use self::functions::*;

        match id {
            registry::WHERE => filtering::where_func(self, &input, &args[0], ctx),
            registry::SELECT => filtering::select_func(self, &input, &args[0], ctx),
            registry::REPEAT => filtering::repeat_func(self, &input, &args[0], ctx),
            registry::OF_TYPE => {
                let specifier = types::specifier_from_expr(&args[0])?;
                types::of_type(self, &input, &specifier)
            }
            registry::IS_FN => {
                let specifier = types::specifier_from_expr(&args[0])?;
                types::eval_type_op(self, crate::ast::TypeOperator::Is, &input, &specifier)
            }
            registry::AS_FN => {
                let specifier = types::specifier_from_expr(&args[0])?;
                types::eval_type_op(self, crate::ast::TypeOperator::As, &input, &specifier)
            }
            registry::EXISTS => existence::exists(self, &input, args.first(), ctx),
            registry::ALL => existence::all(self, &input, &args[0], ctx),
            registry::AGGREGATE => {
                aggregate::aggregate(self, &input, &args[0], args.get(1), ctx)
            }
            registry::SORT => utility::sort(self, input, args.first(), ctx),
            registry::IIF => utility::iif(self, &input, &args[0], &args[1], args.get(2), ctx),
            _ => Err(Error::Resolution(format!(
                "function id {id} has no expression-argument form"
            ))),
        }
    }

    /// Functions over already-evaluated arguments, dispatched by numeric id
    /// grouped in family ranges.
    fn dispatch(
        &self,
        id: FunctionId,
        name: &'static str,
        input: Collection,
        args: &[Collection],
    ) -> Result<Collection> {
        use self::functions::*;

        match id {
            registry::NOT => utility::not_func(&input),
            registry::TRACE => utility::trace(input, &args[0]),

            registry::EMPTY => existence::empty(&input),
            registry::ALL_TRUE => existence::all_true(&input),
            registry::ANY_TRUE => existence::any_true(&input),
            registry::ALL_FALSE => existence::all_false(&input),
            registry::ANY_FALSE => existence::any_false(&input),
            registry::SUBSET_OF => existence::subset_of(&input, &args[0]),
            registry::SUPERSET_OF => existence::superset_of(&input, &args[0]),
            registry::COUNT => existence::count(&input),
            registry::DISTINCT => existence::distinct(&input),
            registry::IS_DISTINCT => existence::is_distinct(&input),

            registry::SINGLE => subsetting::single(input),
            registry::FIRST => subsetting::first(input),
            registry::LAST => subsetting::last(input),
            registry::TAIL => subsetting::tail(input),
            registry::SKIP => subsetting::skip(input, &args[0]),
            registry::TAKE => subsetting::take(input, &args[0]),
            registry::INTERSECT => subsetting::intersect(&input, &args[0]),
            registry::EXCLUDE => subsetting::exclude(&input, &args[0]),

            registry::INDEX_OF => string::index_of(&input, &args[0]),
            registry::SUBSTRING => string::substring(&input, &args[0], args.get(1)),
            registry::STARTS_WITH => string::starts_with(&input, &args[0]),
            registry::ENDS_WITH => string::ends_with(&input, &args[0]),
            registry::CONTAINS_STR => string::contains_str(&input, &args[0]),
            registry::UPPER => string::upper(&input),
            registry::LOWER => string::lower(&input),
            registry::REPLACE => string::replace(&input, &args[0], &args[1]),
            registry::MATCHES => string::matches(&input, &args[0]),
            registry::REPLACE_MATCHES => string::replace_matches(&input, &args[0], &args[1]),
            registry::LENGTH => string::length(&input),
            registry::TO_CHARS => string::to_chars(&input),

            registry::ABS => math::abs(&input),
            registry::CEILING => math::ceiling(&input),
            registry::EXP => math::exp(&input),
            registry::FLOOR => math::floor(&input),
            registry::LN => math::ln(&input),
            registry::LOG => math::log(&input, &args[0]),
            registry::POWER => math::power(&input, &args[0]),
            registry::ROUND => math::round(&input, args.first()),
            registry::SQRT => math::sqrt(&input),
            registry::TRUNCATE => math::truncate(&input),

            registry::TO_BOOLEAN => conversion::to_boolean(&input),
            registry::CONVERTS_TO_BOOLEAN => conversion::converts_to_boolean(&input),
            registry::TO_INTEGER => conversion::to_integer(&input),
            registry::CONVERTS_TO_INTEGER => conversion::converts_to_integer(&input),
            registry::TO_DECIMAL => conversion::to_decimal(&input),
            registry::CONVERTS_TO_DECIMAL => conversion::converts_to_decimal(&input),
            registry::TO_STRING => conversion::to_string(&input),
            registry::CONVERTS_TO_STRING => conversion::converts_to_string(&input),
            registry::TO_DATE => conversion::to_date(&input),
            registry::CONVERTS_TO_DATE => conversion::converts_to_date(&input),
            registry::TO_DATETIME => conversion::to_datetime(&input),
            registry::CONVERTS_TO_DATETIME => conversion::converts_to_datetime(&input),
            registry::TO_TIME => conversion::to_time(&input),
            registry::CONVERTS_TO_TIME => conversion::converts_to_time(&input),
            registry::TO_QUANTITY => conversion::to_quantity(&input),
            registry::CONVERTS_TO_QUANTITY => conversion::converts_to_quantity(&input),

            registry::TYPE_FN => types::type_of(self, &input),

            _ => Err(Error::Resolution(format!(
                "function '{name}' (id {id}) is not dispatchable"
            ))),
        }
    }
}
