//! Operator and function-library semantics through the engine.

mod test_support;

use test_support::*;

use lumen_fhirpath::{Collection, Error};

// Three-valued logic

#[test]
fn kleene_and() {
    assert_eq!(eval("true and true"), booleans(&[true]));
    assert_eq!(eval("true and false"), booleans(&[false]));
    assert_eq!(eval("true and {}"), Collection::empty());
    assert_eq!(eval("false and {}"), booleans(&[false]));
    assert_eq!(eval("{} and {}"), Collection::empty());
}

#[test]
fn kleene_or() {
    assert_eq!(eval("false or true"), booleans(&[true]));
    assert_eq!(eval("true or {}"), booleans(&[true]));
    assert_eq!(eval("false or {}"), Collection::empty());
}

#[test]
fn kleene_xor() {
    assert_eq!(eval("true xor false"), booleans(&[true]));
    assert_eq!(eval("true xor true"), booleans(&[false]));
    assert_eq!(eval("true xor {}"), Collection::empty());
}

#[test]
fn kleene_implies() {
    assert_eq!(eval("false implies {}"), booleans(&[true]));
    assert_eq!(eval("true implies {}"), Collection::empty());
    assert_eq!(eval("{} implies true"), booleans(&[true]));
    assert_eq!(eval("{} implies false"), Collection::empty());
}

#[test]
fn not_is_involutory() {
    assert_eq!(eval("true.not().not()"), booleans(&[true]));
    assert_eq!(eval("false.not().not()"), booleans(&[false]));
    assert_eq!(eval("{}.not()"), Collection::empty());
}

// Empty propagation

#[test]
fn empty_propagates_through_arithmetic() {
    for op in ["+", "-", "*", "/", "div", "mod"] {
        assert_eq!(eval(&format!("{{}} {op} 1")), Collection::empty(), "{op}");
        assert_eq!(eval(&format!("1 {op} {{}}")), Collection::empty(), "{op}");
    }
}

#[test]
fn empty_propagates_through_comparison() {
    for op in ["<", "<=", ">", ">=", "=", "!="] {
        assert_eq!(eval(&format!("{{}} {op} 1")), Collection::empty(), "{op}");
        assert_eq!(eval(&format!("1 {op} {{}}")), Collection::empty(), "{op}");
    }
}

// Equality and equivalence

#[test]
fn equality_is_strict() {
    assert_eq!(eval("'Abc' = 'abc'"), booleans(&[false]));
    assert_eq!(eval("'Abc' ~ 'abc'"), booleans(&[true]));
    assert_eq!(eval("1 = 1.0"), booleans(&[true]));
    assert_eq!(eval("'a' != 'b'"), booleans(&[true]));
    assert_eq!(eval("'a' !~ 'A'"), booleans(&[false]));
}

#[test]
fn collection_equality_is_ordered() {
    assert_eq!(eval("(1 | 2) = (1 | 2)"), booleans(&[true]));
    assert_eq!(eval("(1 | 2) = (2 | 1)"), booleans(&[false]));
    assert_eq!(eval("(1 | 2) ~ (2 | 1)"), booleans(&[true]));
    assert_eq!(eval("(1 | 2) = (1 | 2 | 3)"), booleans(&[false]));
}

#[test]
fn empty_equivalence_is_true() {
    assert_eq!(eval("{} ~ {}"), booleans(&[true]));
    assert_eq!(eval("{} ~ 1"), booleans(&[false]));
}

#[test]
fn partial_precision_dates() {
    assert_eq!(eval("@2015 = @2015-06"), Collection::empty());
    assert_eq!(eval("@2014 < @2015-06"), booleans(&[true]));
    assert_eq!(eval("@2015-06 = @2015-06"), booleans(&[true]));
    // Equivalence over differing precisions is decidedly false.
    assert_eq!(eval("@2015 ~ @2015-06"), booleans(&[false]));
}

#[test]
fn datetime_timezone_normalisation() {
    assert_eq!(
        eval("@2015-02-04T14:00:00+02:00 = @2015-02-04T12:00:00Z"),
        booleans(&[true])
    );
}

#[test]
fn string_comparison_by_code_point() {
    assert_eq!(eval("'abc' < 'abd'"), booleans(&[true]));
    assert_eq!(eval("'ABC' < 'abc'"), booleans(&[true]));
}

// Membership and union

#[test]
fn membership() {
    assert_eq!(eval("2 in (1 | 2 | 3)"), booleans(&[true]));
    assert_eq!(eval("5 in (1 | 2 | 3)"), booleans(&[false]));
    assert_eq!(eval("(1 | 2 | 3) contains 2"), booleans(&[true]));
    assert_eq!(eval("{} in (1 | 2)"), Collection::empty());
}

#[test]
fn union_deduplicates() {
    assert_eq!(eval("1 | 2 | 1"), integers(&[1, 2]));
    assert_eq!(eval("(1 | 2).count()"), integers(&[2]));
}

// Existence family

#[test]
fn existence_functions() {
    assert_eq!(eval("{}.empty()"), booleans(&[true]));
    assert_eq!(eval("(1 | 2).empty()"), booleans(&[false]));
    assert_eq!(eval("(1 | 2).exists()"), booleans(&[true]));
    assert_eq!(eval("(1 | 2).exists($this > 1)"), booleans(&[true]));
    assert_eq!(eval("(1 | 2).exists($this > 5)"), booleans(&[false]));
    assert_eq!(eval("(1 | 2).all($this > 0)"), booleans(&[true]));
    assert_eq!(eval("{}.all($this > 0)"), booleans(&[true]));
    assert_eq!(eval("(1 | 2 | 3).count()"), integers(&[3]));
}

#[test]
fn boolean_folds() {
    assert_eq!(eval("(true | false).allTrue()"), booleans(&[false]));
    assert_eq!(eval("(false | true).anyTrue()"), booleans(&[true]));
}

#[test]
fn boolean_folds_on_literals() {
    assert_eq!(eval("{}.allTrue()"), booleans(&[true]));
    assert_eq!(eval("{}.anyTrue()"), booleans(&[false]));
    assert_eq!(eval("(false | true).anyFalse()"), booleans(&[true]));
    assert_eq!(eval("(false).allFalse()"), booleans(&[true]));
}

#[test]
fn subset_and_superset() {
    assert_eq!(eval("(1 | 2).subsetOf(1 | 2 | 3)"), booleans(&[true]));
    assert_eq!(eval("(1 | 4).subsetOf(1 | 2 | 3)"), booleans(&[false]));
    assert_eq!(eval("{}.subsetOf(1 | 2)"), booleans(&[true]));
    assert_eq!(eval("(1 | 2 | 3).supersetOf(1 | 2)"), booleans(&[true]));
}

#[test]
fn distinctness() {
    assert_eq!(eval("(1 | 2).isDistinct()"), booleans(&[true]));
    assert_eq!(eval("{1, 1, 2}.isDistinct()"), booleans(&[false]));
    assert_eq!(eval("{1, 1, 2}.distinct()"), integers(&[1, 2]));
}

// Subsetting family

#[test]
fn subsetting_functions() {
    assert_eq!(eval("(1 | 2 | 3).first()"), integers(&[1]));
    assert_eq!(eval("(1 | 2 | 3).last()"), integers(&[3]));
    assert_eq!(eval("(1 | 2 | 3).tail()"), integers(&[2, 3]));
    assert_eq!(eval("(1 | 2 | 3).skip(1)"), integers(&[2, 3]));
    assert_eq!(eval("(1 | 2 | 3).skip(-1)"), integers(&[1, 2, 3]));
    assert_eq!(eval("(1 | 2 | 3).take(2)"), integers(&[1, 2]));
    assert_eq!(eval("(1 | 2 | 3).take(0)"), Collection::empty());
    assert_eq!(eval("{}.first()"), Collection::empty());
}

#[test]
fn single_requires_singleton() {
    assert_eq!(eval("(1).single()"), integers(&[1]));
    assert_eq!(eval("{}.single()"), Collection::empty());
    assert!(matches!(
        error_of("(1 | 2).single()"),
        Error::Singleton(_)
    ));
}

#[test]
fn intersect_and_exclude() {
    assert_eq!(eval("(1 | 2 | 3).intersect(2 | 3 | 4)"), integers(&[2, 3]));
    assert_eq!(eval("(1 | 2 | 3).exclude(2)"), integers(&[1, 3]));
    assert_eq!(eval("{1, 2, 1}.exclude(2)"), integers(&[1, 1]));
}

// Projection

#[test]
fn select_flattens_projections() {
    assert_eq!(eval("(1 | 2).select($this * 10)"), integers(&[10, 20]));
    assert_eq!(eval("(1 | 2).select({})"), Collection::empty());
}

#[test]
fn select_sees_index() {
    assert_eq!(eval("(5 | 6 | 7).select($index)"), integers(&[0, 1, 2]));
}

#[test]
fn repeat_reaches_fixed_point() {
    // Integer division walks 8 -> 4 -> 2 -> 1 -> 0, then stays at 0.
    assert_eq!(eval("(8).repeat($this div 2)"), integers(&[4, 2, 1, 0]));
}

// Strings

#[test]
fn string_functions() {
    assert_eq!(eval("'hello'.length()"), integers(&[5]));
    assert_eq!(eval("'hello'.upper()"), strings(&["HELLO"]));
    assert_eq!(eval("'HELLO'.lower()"), strings(&["hello"]));
    assert_eq!(eval("'hello'.indexOf('ll')"), integers(&[2]));
    assert_eq!(eval("'hello'.indexOf('x')"), integers(&[-1]));
    assert_eq!(eval("'hello'.substring(1, 3)"), strings(&["ell"]));
    assert_eq!(eval("'hello'.substring(9)"), Collection::empty());
    assert_eq!(eval("'hello'.startsWith('he')"), booleans(&[true]));
    assert_eq!(eval("'hello'.endsWith('lo')"), booleans(&[true]));
    assert_eq!(eval("'hello'.contains('ell')"), booleans(&[true]));
    assert_eq!(eval("'hello'.replace('l', 'L')"), strings(&["heLLo"]));
    assert_eq!(eval("'abc'.toChars()"), strings(&["a", "b", "c"]));
}

#[test]
fn string_functions_respect_code_points() {
    assert_eq!(eval("'héllo'.length()"), integers(&[5]));
    assert_eq!(eval("'héllo'.substring(1, 1)"), strings(&["é"]));
    assert_eq!(eval("'héllo'.indexOf('l')"), integers(&[2]));
}

#[test]
fn regex_functions() {
    assert_eq!(eval("'hello'.matches('h.*o')"), booleans(&[true]));
    assert_eq!(eval("'hello'.matches('^x')"), booleans(&[false]));
    assert_eq!(
        eval("'hello world'.replaceMatches('o', '0')"),
        strings(&["hell0 w0rld"])
    );
    assert!(matches!(error_of("'a'.matches('[')"), Error::Type(_)));
}

#[test]
fn concatenation() {
    assert_eq!(eval("'a' + 'b'"), strings(&["ab"]));
    assert_eq!(eval("'a' & 'b'"), strings(&["ab"]));
    // `+` propagates empty, `&` treats it as the empty string.
    assert_eq!(eval("'a' + {}"), Collection::empty());
    assert_eq!(eval("'a' & {}"), strings(&["a"]));
    assert_eq!(eval("{} & {}"), strings(&[""]));
}

// Math

#[test]
fn math_functions() {
    assert_eq!(eval("(-5).abs()"), integers(&[5]));
    assert_eq!(eval("(-5.5).abs()"), Collection::singleton(decimal("5.5")));
    assert_eq!(eval("(3.7).ceiling()"), integers(&[4]));
    assert_eq!(eval("(-3.7).ceiling()"), integers(&[-3]));
    assert_eq!(eval("(3.7).floor()"), integers(&[3]));
    assert_eq!(eval("(-3.7).floor()"), integers(&[-4]));
    assert_eq!(eval("(3.7).truncate()"), integers(&[3]));
    assert_eq!(eval("(-3.7).truncate()"), integers(&[-3]));
    assert_eq!(eval("(1.55).round(1)"), Collection::singleton(decimal("1.6")));
    assert_eq!(eval("(-1.55).round(1)"), Collection::singleton(decimal("-1.6")));
    assert_eq!(eval("(2.5).round()"), Collection::singleton(decimal("3")));
    assert_eq!(eval("16.sqrt()"), Collection::singleton(decimal("4")));
    assert_eq!(eval("(-1).sqrt()"), Collection::empty());
    assert_eq!(eval("2.power(10)"), integers(&[1024]));
    assert_eq!(eval("(-1).power(0.5)"), Collection::empty());
}

#[test]
fn arithmetic_widening() {
    assert_eq!(eval("1 + 2"), integers(&[3]));
    assert_eq!(eval("1 + 2.5"), Collection::singleton(decimal("3.5")));
    assert_eq!(eval("2 * 3.5"), Collection::singleton(decimal("7.0")));
    assert_eq!(eval("5.5 div 0.7"), integers(&[7]));
    assert_eq!(eval("5.5 mod 0.7"), Collection::singleton(decimal("0.6")));
}

#[test]
fn decimal_precision_limit() {
    // 1 / 3 rounds half away from zero at 15 significant digits.
    assert_eq!(
        eval("1 / 3"),
        Collection::singleton(decimal("0.333333333333333"))
    );
    assert_eq!(
        eval("2 / 3"),
        Collection::singleton(decimal("0.666666666666667"))
    );
}

// Conversions

#[test]
fn conversions() {
    assert_eq!(eval("'42'.toInteger()"), integers(&[42]));
    assert_eq!(eval("'x'.toInteger()"), Collection::empty());
    assert_eq!(eval("'42'.convertsToInteger()"), booleans(&[true]));
    assert_eq!(eval("'x'.convertsToInteger()"), booleans(&[false]));
    assert_eq!(eval("'3.14'.toDecimal()"), Collection::singleton(decimal("3.14")));
    assert_eq!(eval("true.toInteger()"), integers(&[1]));
    assert_eq!(eval("'true'.toBoolean()"), booleans(&[true]));
    assert_eq!(eval("1.toString()"), strings(&["1"]));
    assert_eq!(eval("(1.5).toString()"), strings(&["1.5"]));
    assert_eq!(eval("true.toString()"), strings(&["true"]));
}

#[test]
fn temporal_conversions() {
    assert_eq!(eval("'2015-02-04'.toDate() = @2015-02-04"), booleans(&[true]));
    assert_eq!(eval("'2015'.toDate().toString()"), strings(&["2015"]));
    assert_eq!(
        eval("'2015-02-04T14:34:28Z'.convertsToDateTime()"),
        booleans(&[true])
    );
    assert_eq!(eval("'14:34'.toTime() = @T14:34"), booleans(&[true]));
    assert_eq!(eval("@2015-02-04T14:34:28Z.toString()"), strings(&["2015-02-04T14:34:28Z"]));
}

#[test]
fn quantity_conversions() {
    assert_eq!(
        eval("'4 days'.toQuantity() = 4 days"),
        booleans(&[true])
    );
    assert_eq!(
        eval(r"'5.4 \'mg\''.toQuantity().toString()"),
        strings(&["5.4 'mg'"])
    );
    assert_eq!(eval("3.toQuantity().toString()"), strings(&["3 '1'"]));
}

// Types

#[test]
fn type_operators() {
    assert_eq!(eval("1 is Integer"), booleans(&[true]));
    assert_eq!(eval("1 is System.Integer"), booleans(&[true]));
    assert_eq!(eval("1 is Decimal"), booleans(&[false]));
    assert_eq!(eval("1.5 is Decimal"), booleans(&[true]));
    assert_eq!(eval("'x' is String"), booleans(&[true]));
    assert_eq!(eval("@2015 is Date"), booleans(&[true]));
    assert_eq!(eval("(1 | 1) is Integer"), booleans(&[true]));
    assert_eq!(eval("1 as Integer"), integers(&[1]));
    assert_eq!(eval("1 as String"), Collection::empty());
    assert_eq!(eval("{} is Integer"), Collection::empty());
}

#[test]
fn of_type_filters() {
    assert_eq!(eval("(1 | 'a' | 2.5 | 2).ofType(Integer)"), integers(&[1, 2]));
    assert_eq!(eval("(1 | 'a').ofType(String)"), strings(&["a"]));
}

#[test]
fn type_function() {
    assert_eq!(eval("1.type()"), strings(&["System.Integer"]));
    assert_eq!(eval("'x'.type()"), strings(&["System.String"]));
}

#[test]
fn unknown_system_type_is_resolution_error() {
    assert!(matches!(
        error_of("1 is System.Frob"),
        Error::Resolution(_)
    ));
}

// Errors

#[test]
fn unknown_function_is_resolution_error() {
    assert!(matches!(error_of("1.frobnicate()"), Error::Resolution(_)));
}

#[test]
fn wrong_arity_is_arity_error() {
    assert!(matches!(error_of("(1 | 2).count(3)"), Error::Arity(_)));
    assert!(matches!(error_of("'a'.substring()"), Error::Arity(_)));
}

#[test]
fn type_mismatch_is_type_error() {
    assert!(matches!(error_of("'a' + 1"), Error::Type(_)));
    assert!(matches!(error_of("'a' < 1"), Error::Type(_)));
}

#[test]
fn multi_item_boolean_operand_is_singleton_error() {
    assert!(matches!(
        error_of("(1 | 2) and true"),
        Error::Singleton(_)
    ));
}

// Sorting

#[test]
fn sort_orders_values() {
    assert_eq!(eval("(3 | 1 | 2).sort()"), integers(&[1, 2, 3]));
    assert_eq!(eval("('b' | 'a').sort()"), strings(&["a", "b"]));
    assert_eq!(eval("(1 | 2 | 3).sort(0 - $this)"), integers(&[3, 2, 1]));
}
