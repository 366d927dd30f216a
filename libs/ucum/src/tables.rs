//! Static UCUM tables: SI prefixes and the base/derived unit subset needed
//! for FHIRPath quantity semantics.
//!
//! Derived units map to a single base unit with a scalar and a power, so
//! `h` becomes `s` scaled by 3600 and `L` becomes `m3` scaled by 10^-3.
//! Composite derived units (`W`, `Pa`, ...) are intentionally absent and
//! pass through canonicalisation untouched.

use phf::{phf_map, phf_set};
use rust_decimal::Decimal;

/// SI prefix symbol to decimal power of ten (yotta down to yocto).
pub static PREFIXES: phf::Map<&'static str, i32> = phf_map! {
    "Y" => 24,
    "Z" => 21,
    "E" => 18,
    "P" => 15,
    "T" => 12,
    "G" => 9,
    "M" => 6,
    "k" => 3,
    "h" => 2,
    "da" => 1,
    "d" => -1,
    "c" => -2,
    "m" => -3,
    "u" => -6,
    "n" => -9,
    "p" => -12,
    "f" => -15,
    "a" => -18,
    "z" => -21,
    "y" => -24,
};

/// UCUM base unit symbols.
pub static BASE_UNITS: phf::Set<&'static str> = phf_set! {
    "m", "s", "g", "rad", "K", "C", "cd", "mol",
};

/// A derived unit expressed over a single base unit.
///
/// `factor()` is `mantissa * 10^-scale`; an occurrence with exponent `e`
/// contributes `factor^e` to the value and `power * e` to the base exponent.
pub struct DerivedUnit {
    mantissa: i64,
    scale: u32,
    pub base: &'static str,
    pub power: i32,
}

impl DerivedUnit {
    pub fn factor(&self) -> Decimal {
        Decimal::new(self.mantissa, self.scale)
    }
}

/// Single-base derived units, including the definite durations used by
/// calendar mapping (`a` is the Julian year, `mo` one twelfth of it).
pub static DERIVED_UNITS: phf::Map<&'static str, DerivedUnit> = phf_map! {
    "min" => DerivedUnit { mantissa: 60, scale: 0, base: "s", power: 1 },
    "h" => DerivedUnit { mantissa: 3_600, scale: 0, base: "s", power: 1 },
    "d" => DerivedUnit { mantissa: 86_400, scale: 0, base: "s", power: 1 },
    "wk" => DerivedUnit { mantissa: 604_800, scale: 0, base: "s", power: 1 },
    "a" => DerivedUnit { mantissa: 31_557_600, scale: 0, base: "s", power: 1 },
    "mo" => DerivedUnit { mantissa: 2_629_800, scale: 0, base: "s", power: 1 },
    "t" => DerivedUnit { mantissa: 1_000_000, scale: 0, base: "g", power: 1 },
    "L" => DerivedUnit { mantissa: 1, scale: 3, base: "m", power: 3 },
    "l" => DerivedUnit { mantissa: 1, scale: 3, base: "m", power: 3 },
    "ar" => DerivedUnit { mantissa: 100, scale: 0, base: "m", power: 2 },
};

/// 10^exponent as a `Decimal`, if representable.
pub(crate) fn pow10(exponent: i32) -> Option<Decimal> {
    match exponent {
        0 => Some(Decimal::ONE),
        1..=28 => {
            let mut v = 1i128;
            for _ in 0..exponent {
                v *= 10;
            }
            Some(Decimal::from_i128_with_scale(v, 0))
        }
        -28..=-1 => Some(Decimal::new(1, exponent.unsigned_abs())),
        _ => None,
    }
}

/// `base^exponent` with checked arithmetic (small exponents only).
pub(crate) fn pow_decimal(base: Decimal, exponent: i32) -> Option<Decimal> {
    if exponent == 0 {
        return Some(Decimal::ONE);
    }
    let mut acc = Decimal::ONE;
    for _ in 0..exponent.unsigned_abs() {
        acc = acc.checked_mul(base)?;
    }
    if exponent < 0 {
        Decimal::ONE.checked_div(acc)
    } else {
        Some(acc)
    }
}
