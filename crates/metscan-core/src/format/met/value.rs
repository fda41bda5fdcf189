use time::{Date, Month, PrimitiveDateTime, Time};

use super::error::ValueError;
use super::grammar::FieldKind;
use crate::record::FieldValue;

/// Digits of a normalized fractional-seconds field.
const MICROSECOND_DIGITS: usize = 6;

impl FieldKind {
    /// Parse a value text with the parser this kind selects.
    ///
    /// # Examples
    /// ```
    /// use metscan_core::{FieldKind, FieldValue};
    ///
    /// let value = FieldKind::FloatVec(2).parse("0.5 -1.25").unwrap();
    /// assert_eq!(value, FieldValue::FloatVec(vec![0.5, -1.25]));
    /// assert!(FieldKind::Int.parse("12a").is_err());
    /// ```
    pub fn parse(self, text: &str) -> Result<FieldValue, ValueError> {
        match self {
            FieldKind::Int => parse_int(text).map(FieldValue::Int),
            FieldKind::Float => parse_float(text).map(FieldValue::Float),
            FieldKind::Text => Ok(FieldValue::Text(text.to_string())),
            FieldKind::Location => {
                parse_location(text).map(|(latitude, longitude)| FieldValue::Location {
                    latitude,
                    longitude,
                })
            }
            FieldKind::FloatVec(count) => {
                parse_fixed_vector(text, count, parse_float).map(FieldValue::FloatVec)
            }
            FieldKind::IntVec(count) => {
                parse_fixed_vector(text, count, parse_int).map(FieldValue::IntVec)
            }
            FieldKind::JoinedDateTime => parse_joined_datetime(text).map(FieldValue::DateTime),
        }
    }

    /// Whether `value` has the shape this kind produces.
    pub fn accepts(self, value: &FieldValue) -> bool {
        match (self, value) {
            (FieldKind::Int, FieldValue::Int(_))
            | (FieldKind::Float, FieldValue::Float(_))
            | (FieldKind::Text, FieldValue::Text(_))
            | (FieldKind::Location, FieldValue::Location { .. })
            | (FieldKind::JoinedDateTime, FieldValue::DateTime(_)) => true,
            (FieldKind::FloatVec(count), FieldValue::FloatVec(values)) => values.len() == count,
            (FieldKind::IntVec(count), FieldValue::IntVec(values)) => values.len() == count,
            _ => false,
        }
    }
}

pub fn parse_int(text: &str) -> Result<i64, ValueError> {
    text.trim()
        .parse()
        .map_err(|_| ValueError::NotInteger(text.to_string()))
}

pub fn parse_float(text: &str) -> Result<f64, ValueError> {
    text.trim()
        .parse()
        .map_err(|_| ValueError::NotNumber(text.to_string()))
}

/// Parse `LAT,LONG`.
pub fn parse_location(text: &str) -> Result<(f64, f64), ValueError> {
    let mut parts = text.split(',');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(latitude), Some(longitude), None) => {
            Ok((parse_float(latitude)?, parse_float(longitude)?))
        }
        _ => Err(ValueError::Separator { separator: ',' }),
    }
}

/// Parse exactly `count` whitespace-separated values of one type.
pub fn parse_fixed_vector<T>(
    text: &str,
    count: usize,
    parse: fn(&str) -> Result<T, ValueError>,
) -> Result<Vec<T>, ValueError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() != count {
        return Err(ValueError::Arity {
            expected: count,
            actual: tokens.len(),
        });
    }
    tokens.into_iter().map(parse).collect()
}

/// Parse `YYYY/MM/DD_HH:MM:SS[.ffffff]`.
pub fn parse_joined_datetime(text: &str) -> Result<PrimitiveDateTime, ValueError> {
    let mut parts = text.split('_');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(date), Some(time), None) => parse_datetime(date, time),
        _ => Err(ValueError::Separator { separator: '_' }),
    }
}

/// Parse a `YYYY/MM/DD` date token and a `HH:MM:SS[.ffffff]` time token.
///
/// The fractional part is right-padded with zeros (or truncated) to six
/// digits before it is read as microseconds, so `.5` is 500000 us.
///
/// # Examples
/// ```
/// use metscan_core::parse_datetime;
///
/// let ts = parse_datetime("2024/03/01", "12:30:45.123").unwrap();
/// assert_eq!(ts.microsecond(), 123_000);
/// ```
pub fn parse_datetime(date: &str, time: &str) -> Result<PrimitiveDateTime, ValueError> {
    let [year, month, day] = split_exact::<3>(date, '/')?;
    let [hour, minute, seconds] = split_exact::<3>(time, ':')?;
    let (second, fraction) = match seconds.split_once('.') {
        Some((second, fraction)) => (second, Some(fraction)),
        None => (seconds, None),
    };

    let microsecond = match fraction {
        Some(fraction) => parse_microseconds(fraction)?,
        None => 0,
    };
    let month: u8 = parse_component(month, "month")?;
    let month = Month::try_from(month).map_err(|err| ValueError::DateTime(err.to_string()))?;
    let date = Date::from_calendar_date(
        parse_component(year, "year")?,
        month,
        parse_component(day, "day")?,
    )
    .map_err(|err| ValueError::DateTime(err.to_string()))?;
    let time = Time::from_hms_micro(
        parse_component(hour, "hour")?,
        parse_component(minute, "minute")?,
        parse_component(second, "second")?,
        microsecond,
    )
    .map_err(|err| ValueError::DateTime(err.to_string()))?;

    Ok(PrimitiveDateTime::new(date, time))
}

fn parse_microseconds(fraction: &str) -> Result<u32, ValueError> {
    let digits: String = fraction
        .chars()
        .chain(std::iter::repeat('0'))
        .take(MICROSECOND_DIGITS)
        .collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValueError::DateTime(format!(
            "invalid fractional seconds {fraction:?}"
        )));
    }
    digits
        .parse()
        .map_err(|_| ValueError::DateTime(format!("invalid fractional seconds {fraction:?}")))
}

fn parse_component<T: std::str::FromStr>(text: &str, name: &str) -> Result<T, ValueError> {
    text.trim()
        .parse()
        .map_err(|_| ValueError::DateTime(format!("invalid {name} {text:?}")))
}

fn split_exact<const N: usize>(text: &str, separator: char) -> Result<[&str; N], ValueError> {
    let parts: Vec<&str> = text.split(separator).collect();
    parts.try_into().map_err(|parts: Vec<&str>| {
        ValueError::DateTime(format!(
            "expected {N} '{separator}'-separated parts in {text:?}, got {}",
            parts.len()
        ))
    })
}

pub fn format_date(value: &PrimitiveDateTime) -> String {
    format!(
        "{:04}/{:02}/{:02}",
        value.year(),
        u8::from(value.month()),
        value.day()
    )
}

pub fn format_time(value: &PrimitiveDateTime) -> String {
    let base = format!(
        "{:02}:{:02}:{:02}",
        value.hour(),
        value.minute(),
        value.second()
    );
    match value.microsecond() {
        0 => base,
        micros => format!("{base}.{micros:06}"),
    }
}

pub fn format_joined_datetime(value: &PrimitiveDateTime) -> String {
    format!("{}_{}", format_date(value), format_time(value))
}
