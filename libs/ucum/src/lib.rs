#![forbid(unsafe_code)]

//! UCUM unit algebra for FHIRPath quantities.
//!
//! Units are exponent maps over UCUM symbols; quantities canonicalise to a
//! scaled value over base units so that `1 'kg'` and `1000 'g'` share a
//! comparable shape. The tables cover the UCUM essence subset FHIRPath
//! needs; composite derived units are deliberately not decomposed.

mod error;
mod quantity;
mod tables;
mod unit;

pub use error::{Error, Result};
pub use quantity::{canonicalize, is_calendar_unit, CalendarMapping, CanonicalQuantity};
pub use unit::UnitMap;
