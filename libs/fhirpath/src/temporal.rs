//! Partial-precision temporal comparison and parsing.
//!
//! Dates, datetimes and times carry a precision tag; comparing two values
//! walks their components from the most significant down to the coarser of
//! the two precisions. A difference inside that window decides the result;
//! agreement through the window with unequal precisions is undecidable and
//! surfaces as an empty collection.

use std::cmp::Ordering;

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike, Utc,
};

use crate::value::{DatePrecision, DateTimePrecision, TimePrecision, Value};

/// View a Date or DateTime value as a UTC instant plus precision.
pub(crate) fn as_datetime(value: &Value) -> Option<(DateTime<Utc>, DateTimePrecision)> {
    match value {
        Value::Date { value, precision } => {
            let dt = Utc.from_utc_datetime(&value.and_hms_opt(0, 0, 0)?);
            let precision = match precision {
                DatePrecision::Year => DateTimePrecision::Year,
                DatePrecision::Month => DateTimePrecision::Month,
                DatePrecision::Day => DateTimePrecision::Day,
            };
            Some((dt, precision))
        }
        Value::DateTime {
            value, precision, ..
        } => Some((value.with_timezone(&Utc), *precision)),
        _ => None,
    }
}

fn datetime_components(dt: DateTime<Utc>) -> [i64; 7] {
    [
        dt.year() as i64,
        dt.month() as i64,
        dt.day() as i64,
        dt.hour() as i64,
        dt.minute() as i64,
        dt.second() as i64,
        (dt.nanosecond() / 1_000_000) as i64,
    ]
}

fn datetime_depth(precision: DateTimePrecision) -> usize {
    match precision {
        DateTimePrecision::Year => 1,
        DateTimePrecision::Month => 2,
        DateTimePrecision::Day => 3,
        DateTimePrecision::Hour => 4,
        DateTimePrecision::Minute => 5,
        DateTimePrecision::Second => 6,
        DateTimePrecision::Millisecond => 7,
    }
}

fn time_components(t: NaiveTime) -> [i64; 4] {
    [
        t.hour() as i64,
        t.minute() as i64,
        t.second() as i64,
        (t.nanosecond() / 1_000_000) as i64,
    ]
}

fn time_depth(precision: TimePrecision) -> usize {
    match precision {
        TimePrecision::Hour => 1,
        TimePrecision::Minute => 2,
        TimePrecision::Second => 3,
        TimePrecision::Millisecond => 4,
    }
}

fn partial_compare(a: &[i64], b: &[i64], depth: usize, same_precision: bool) -> Option<Ordering> {
    for i in 0..depth {
        match a[i].cmp(&b[i]) {
            Ordering::Equal => continue,
            other => return Some(other),
        }
    }
    if same_precision {
        Some(Ordering::Equal)
    } else {
        None
    }
}

pub(crate) fn datetime_compare(
    a: DateTime<Utc>,
    ap: DateTimePrecision,
    b: DateTime<Utc>,
    bp: DateTimePrecision,
) -> Option<Ordering> {
    let depth = datetime_depth(ap).min(datetime_depth(bp));
    partial_compare(
        &datetime_components(a),
        &datetime_components(b),
        depth,
        ap == bp,
    )
}

pub(crate) fn datetime_equals(
    a: DateTime<Utc>,
    ap: DateTimePrecision,
    b: DateTime<Utc>,
    bp: DateTimePrecision,
) -> Option<bool> {
    datetime_compare(a, ap, b, bp).map(|ord| ord == Ordering::Equal)
}

pub(crate) fn time_compare(
    a: NaiveTime,
    ap: TimePrecision,
    b: NaiveTime,
    bp: TimePrecision,
) -> Option<Ordering> {
    let depth = time_depth(ap).min(time_depth(bp));
    partial_compare(&time_components(a), &time_components(b), depth, ap == bp)
}

pub(crate) fn time_equals(
    a: NaiveTime,
    ap: TimePrecision,
    b: NaiveTime,
    bp: TimePrecision,
) -> Option<bool> {
    time_compare(a, ap, b, bp).map(|ord| ord == Ordering::Equal)
}

/// Parse `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
pub(crate) fn parse_date(input: &str) -> Option<(NaiveDate, DatePrecision)> {
    let s = input.trim();
    let mut parts = s.split('-');
    let year: i32 = parse_exact(parts.next()?, 4)?;
    let Some(month_str) = parts.next() else {
        return Some((NaiveDate::from_ymd_opt(year, 1, 1)?, DatePrecision::Year));
    };
    let month: u32 = parse_exact(month_str, 2)?;
    let Some(day_str) = parts.next() else {
        return Some((NaiveDate::from_ymd_opt(year, month, 1)?, DatePrecision::Month));
    };
    let day: u32 = parse_exact(day_str, 2)?;
    if parts.next().is_some() {
        return None;
    }
    Some((NaiveDate::from_ymd_opt(year, month, day)?, DatePrecision::Day))
}

/// Parse `HH`, `HH:MM`, `HH:MM:SS` or `HH:MM:SS.fff`.
pub(crate) fn parse_time(input: &str) -> Option<(NaiveTime, TimePrecision)> {
    let s = input.trim();
    let (main, frac) = match s.split_once('.') {
        Some((main, frac)) => (main, Some(frac)),
        None => (s, None),
    };

    let mut parts = main.split(':');
    let hour: u32 = parse_exact(parts.next()?, 2)?;
    let (minute, second, precision) = match (parts.next(), parts.next()) {
        (None, _) => (0, 0, TimePrecision::Hour),
        (Some(m), None) => (parse_exact(m, 2)?, 0, TimePrecision::Minute),
        (Some(m), Some(sec)) => {
            let precision = if frac.is_some() {
                TimePrecision::Millisecond
            } else {
                TimePrecision::Second
            };
            (parse_exact(m, 2)?, parse_exact(sec, 2)?, precision)
        }
    };
    if parts.next().is_some() {
        return None;
    }

    let millis: u32 = match frac {
        Some(digits) if precision == TimePrecision::Millisecond => {
            let head: String = digits.chars().take(3).collect();
            if head.is_empty() || !head.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            format!("{head:0<3}").parse().ok()?
        }
        Some(_) => return None,
        None => 0,
    };

    let time = NaiveTime::from_hms_milli_opt(hour, minute, second, millis)?;
    Some((time, precision))
}

/// Parse a datetime string: a date, optionally `T` plus time plus timezone.
pub(crate) fn parse_datetime(
    input: &str,
) -> Option<(DateTime<FixedOffset>, DateTimePrecision, Option<i32>)> {
    let s = input.trim();
    let (date_part, rest) = match s.split_once('T') {
        Some((date_part, rest)) => (date_part, Some(rest)),
        None => (s, None),
    };

    let (date, date_precision) = parse_date(date_part)?;
    let date_time_precision = match date_precision {
        DatePrecision::Year => DateTimePrecision::Year,
        DatePrecision::Month => DateTimePrecision::Month,
        DatePrecision::Day => DateTimePrecision::Day,
    };

    let Some(rest) = rest.filter(|r| !r.is_empty()) else {
        let naive = date.and_hms_opt(0, 0, 0)?;
        let offset = FixedOffset::east_opt(0)?;
        return Some((
            offset.from_local_datetime(&naive).single()?,
            date_time_precision,
            None,
        ));
    };

    let (time_part, timezone_offset) = split_timezone(rest)?;
    let (time, time_precision) = parse_time(time_part)?;
    let precision = match time_precision {
        TimePrecision::Hour => DateTimePrecision::Hour,
        TimePrecision::Minute => DateTimePrecision::Minute,
        TimePrecision::Second => DateTimePrecision::Second,
        TimePrecision::Millisecond => DateTimePrecision::Millisecond,
    };

    let naive = date.and_time(time);
    let offset = FixedOffset::east_opt(timezone_offset.unwrap_or(0))?;
    Some((
        offset.from_local_datetime(&naive).single()?,
        precision,
        timezone_offset,
    ))
}

/// Split a trailing timezone designator off a time string.
pub(crate) fn split_timezone(rest: &str) -> Option<(&str, Option<i32>)> {
    if let Some(stripped) = rest.strip_suffix('Z') {
        return Some((stripped, Some(0)));
    }
    if let Some(pos) = rest.rfind(['+', '-']) {
        let (time, tz) = rest.split_at(pos);
        let sign = if tz.starts_with('-') { -1 } else { 1 };
        let digits = &tz[1..];
        let (hours, minutes) = digits.split_once(':')?;
        let hours: i32 = parse_exact(hours, 2)?;
        let minutes: i32 = parse_exact(minutes, 2)?;
        return Some((time, Some(sign * (hours * 3600 + minutes * 60))));
    }
    Some((rest, None))
}

fn parse_exact<T: std::str::FromStr>(s: &str, len: usize) -> Option<T> {
    if s.len() != len || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_partial_dates() {
        assert_eq!(
            parse_date("2015"),
            Some((
                NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
                DatePrecision::Year
            ))
        );
        assert_eq!(
            parse_date("2015-02"),
            Some((
                NaiveDate::from_ymd_opt(2015, 2, 1).unwrap(),
                DatePrecision::Month
            ))
        );
        assert_eq!(
            parse_date("2015-02-04"),
            Some((
                NaiveDate::from_ymd_opt(2015, 2, 4).unwrap(),
                DatePrecision::Day
            ))
        );
        assert_eq!(parse_date("2015-13"), None);
        assert_eq!(parse_date("15-02-04"), None);
    }

    #[test]
    fn parse_times() {
        assert_eq!(
            parse_time("14:30:05.25"),
            Some((
                NaiveTime::from_hms_milli_opt(14, 30, 5, 250).unwrap(),
                TimePrecision::Millisecond
            ))
        );
        assert_eq!(
            parse_time("14"),
            Some((
                NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
                TimePrecision::Hour
            ))
        );
        assert_eq!(parse_time("25:00"), None);
    }

    #[test]
    fn parse_datetime_with_offset() {
        let (dt, precision, offset) = parse_datetime("2015-02-04T14:34:28+02:00").unwrap();
        assert_eq!(precision, DateTimePrecision::Second);
        assert_eq!(offset, Some(7200));
        assert_eq!(dt.with_timezone(&Utc).hour(), 12);
    }

    #[test]
    fn same_precision_decides() {
        let (a, ap) = (
            Utc.with_ymd_and_hms(2015, 2, 4, 0, 0, 0).unwrap(),
            DateTimePrecision::Day,
        );
        let (b, bp) = (
            Utc.with_ymd_and_hms(2015, 2, 5, 0, 0, 0).unwrap(),
            DateTimePrecision::Day,
        );
        assert_eq!(datetime_compare(a, ap, b, bp), Some(Ordering::Less));
        assert_eq!(datetime_equals(a, ap, a, ap), Some(true));
    }

    #[test]
    fn mixed_precision_decides_when_prefix_differs() {
        // 2016 (year precision) vs 2015-06 (month precision): years differ.
        let a = Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2015, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(
            datetime_compare(a, DateTimePrecision::Year, b, DateTimePrecision::Month),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn mixed_precision_undecidable_on_shared_prefix() {
        // 2015 (year) vs 2015-06 (month): equal through the year.
        let a = Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2015, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(
            datetime_compare(a, DateTimePrecision::Year, b, DateTimePrecision::Month),
            None
        );
        assert_eq!(
            datetime_equals(a, DateTimePrecision::Year, b, DateTimePrecision::Month),
            None
        );
    }

    #[test]
    fn time_partial_precision() {
        let a = NaiveTime::from_hms_opt(14, 30, 0).unwrap();
        let b = NaiveTime::from_hms_opt(14, 30, 59).unwrap();
        assert_eq!(
            time_compare(a, TimePrecision::Minute, b, TimePrecision::Second),
            None
        );
        assert_eq!(
            time_compare(a, TimePrecision::Second, b, TimePrecision::Second),
            Some(Ordering::Less)
        );
    }
}
