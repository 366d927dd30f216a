//! Property-based tests using QuickCheck

mod test_support;

use quickcheck::{QuickCheck, TestResult};
use test_support::eval;

use lumen_fhirpath::{Collection, Engine, Value, Variables};

fn eval_ok(expression: &str) -> Option<Collection> {
    Engine::default()
        .evaluate(expression, None, &Variables::new())
        .ok()
}

#[test]
fn prop_integer_addition_commutes() {
    fn prop(a: i32, b: i32) -> bool {
        let left = eval(&format!("{a} + {b}"));
        let right = eval(&format!("{b} + {a}"));
        left == right
    }
    QuickCheck::new()
        .tests(200)
        .quickcheck(prop as fn(i32, i32) -> bool);
}

#[test]
fn prop_integer_multiplication_commutes() {
    fn prop(a: i16, b: i16) -> bool {
        let left = eval(&format!("{a} * {b}"));
        let right = eval(&format!("{b} * {a}"));
        left == right
    }
    QuickCheck::new()
        .tests(200)
        .quickcheck(prop as fn(i16, i16) -> bool);
}

#[test]
fn prop_addition_identity() {
    fn prop(a: i32) -> bool {
        eval(&format!("{a} + 0")) == Collection::singleton(Value::integer(a as i64))
    }
    QuickCheck::new().tests(200).quickcheck(prop as fn(i32) -> bool);
}

#[test]
fn prop_equality_reflexive() {
    fn prop(a: i32) -> bool {
        eval(&format!("{a} = {a}")) == Collection::singleton(Value::boolean(true))
    }
    QuickCheck::new().tests(200).quickcheck(prop as fn(i32) -> bool);
}

#[test]
fn prop_double_negation() {
    fn prop(a: i32) -> bool {
        eval(&format!("-(-({a}))")) == Collection::singleton(Value::integer(a as i64))
    }
    QuickCheck::new().tests(200).quickcheck(prop as fn(i32) -> bool);
}

#[test]
fn prop_string_length_counts_code_points() {
    fn prop(s: String) -> TestResult {
        if s.contains('\'') || s.contains('\\') || s.chars().any(|c| c.is_control()) {
            return TestResult::discard();
        }
        let Some(result) = eval_ok(&format!("'{s}'.length()")) else {
            return TestResult::discard();
        };
        TestResult::from_bool(
            result == Collection::singleton(Value::integer(s.chars().count() as i64)),
        )
    }
    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(String) -> TestResult);
}

#[test]
fn prop_division_by_zero_is_empty() {
    fn prop(a: i32) -> bool {
        eval(&format!("{a} / 0")).is_empty()
            && eval(&format!("{a} div 0")).is_empty()
            && eval(&format!("{a} mod 0")).is_empty()
    }
    QuickCheck::new().tests(100).quickcheck(prop as fn(i32) -> bool);
}

#[test]
fn prop_empty_propagation() {
    fn prop(a: i32, op_index: u8) -> bool {
        let ops = ["+", "-", "*", "/", "div", "mod", "<", "<=", ">", ">=", "=", "!="];
        let op = ops[op_index as usize % ops.len()];
        eval(&format!("{{}} {op} {a}")).is_empty() && eval(&format!("{a} {op} {{}}")).is_empty()
    }
    QuickCheck::new()
        .tests(200)
        .quickcheck(prop as fn(i32, u8) -> bool);
}

#[test]
fn prop_kleene_not_involution() {
    // not(not(x)) = x over the three-valued domain.
    for literal in ["true", "false", "{}"] {
        assert_eq!(
            eval(&format!("({literal}).not().not()")),
            eval(literal),
            "not involution failed for {literal}"
        );
    }
}

#[test]
fn prop_union_idempotent_under_count() {
    fn prop(values: Vec<i16>) -> TestResult {
        if values.is_empty() || values.len() > 8 {
            return TestResult::discard();
        }
        let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        let union = rendered.join(" | ");
        let doubled = format!("({union}) | ({union})");
        TestResult::from_bool(
            eval(&format!("({union}).count()")) == eval(&format!("({doubled}).count()")),
        )
    }
    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Vec<i16>) -> TestResult);
}
