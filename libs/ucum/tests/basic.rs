use lumen_ucum::{canonicalize, CalendarMapping, CanonicalQuantity, UnitMap};
use rust_decimal::Decimal;
use std::cmp::Ordering;

fn canon(value: Decimal, unit: &str) -> CanonicalQuantity {
    canonicalize(value, unit, CalendarMapping::Equality).unwrap()
}

#[test]
fn parse_format_normalises() {
    // Formatting sorts symbols and switches quotient form to negative exponents.
    let m = UnitMap::parse("'m/s'").unwrap();
    assert_eq!(m.format(), "m.s-1");
    assert_eq!(UnitMap::parse(&m.format()).unwrap(), m);

    let m = UnitMap::parse("s-2.kg").unwrap();
    assert_eq!(m.format(), "kg.s-2");
}

#[test]
fn velocity_times_time_is_distance() {
    let v = canon(Decimal::new(5, 0), "m/s");
    let t = canon(Decimal::new(20, 0), "s");
    let d = v.mul(&t).unwrap();
    assert_eq!(d.value, Decimal::new(100, 0));
    assert_eq!(d.unit_string(), "m");
}

#[test]
fn kilometers_per_hour() {
    let q = canon(Decimal::new(36, 0), "km/h");
    // 36 km/h is 36_000 m per 3600 s, canonicalised as 10 m.s-1.
    assert_eq!(q.unit_string(), "m.s-1");
    assert_eq!(q.value, Decimal::new(10, 0));
}

#[test]
fn duration_ordering_across_units() {
    let day = canon(Decimal::ONE, "d");
    let hours = canon(Decimal::new(25, 0), "h");
    assert_eq!(day.compare(&hours), Some(Ordering::Less));
}

#[test]
fn gram_meter_product_from_prefixed_inputs() {
    let kg = canon(Decimal::ONE, "kg");
    let m = canon(Decimal::new(2, 0), "m");
    let product = kg.mul(&m).unwrap();
    assert_eq!(product.value, Decimal::new(2_000, 0));
    assert_eq!(product.unit_string(), "g.m");
}

#[test]
fn calendar_year_is_equivalence_only() {
    let calendar = canon(Decimal::ONE, "year");
    let definite = canon(Decimal::ONE, "a");
    assert_eq!(calendar.compare(&definite), None);

    let calendar =
        canonicalize(Decimal::ONE, "year", CalendarMapping::Equivalence).unwrap();
    let definite =
        canonicalize(Decimal::ONE, "a", CalendarMapping::Equivalence).unwrap();
    assert_eq!(calendar.compare(&definite), Some(Ordering::Equal));
}
