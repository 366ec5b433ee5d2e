//! Time, date and date-time fields.
//!
//! All values are naive. Unix timestamps are read as UTC, and date-time
//! strings carrying an offset are normalized to UTC.

use crate::checks::{Bounds, bound_methods, check_one_of};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use cleaned_core::{ConversionError, Field, FieldOptions, ValidationError, Value};

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];
const DATE_FORMAT: &str = "%Y-%m-%d";

fn parse_time(s: &str) -> Result<NaiveTime, ConversionError> {
    let mut last = None;
    for format in TIME_FORMATS {
        match NaiveTime::parse_from_str(s, format) {
            Ok(time) => return Ok(time),
            Err(e) => last = Some(e),
        }
    }
    Err(last.map_or_else(|| ConversionError::invalid("empty time"), Into::into))
}

/// Parses an ISO date-time, an RFC 3339 timestamp or a bare ISO date.
fn parse_datetime(s: &str) -> Result<NaiveDateTime, ConversionError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }
    let date = NaiveDate::parse_from_str(s, DATE_FORMAT)?;
    Ok(date.and_time(NaiveTime::default()))
}

fn from_timestamp(seconds: f64) -> Result<NaiveDateTime, ConversionError> {
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9) as u32;
    if !whole.is_finite() || whole < i64::MIN as f64 || whole >= i64::MAX as f64 {
        return Err(ConversionError::invalid(format!("{} is not a timestamp", seconds)));
    }
    DateTime::from_timestamp(whole as i64, nanos)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| ConversionError::invalid(format!("{} is out of range", seconds)))
}

/// A time-of-day field.
///
/// Accepts times, the time part of date-times, midnight for dates and
/// `HH:MM[:SS[.f]]` strings.
#[derive(Debug, Clone, Default)]
pub struct TimeField {
    bounds: Bounds<NaiveTime>,
    one_of: Option<Vec<NaiveTime>>,
    options: FieldOptions<NaiveTime>,
}

impl TimeField {
    /// Creates an unbounded time field.
    pub fn new() -> Self {
        Default::default()
    }

    bound_methods!(NaiveTime);
}

impl Field for TimeField {
    type Output = NaiveTime;

    fn kind(&self) -> &'static str {
        "TimeField"
    }

    fn convert(&self, raw: &Value) -> Result<NaiveTime, ConversionError> {
        match raw {
            Value::Time(t) => Ok(*t),
            Value::DateTime(dt) => Ok(dt.time()),
            Value::Date(_) => Ok(NaiveTime::default()),
            Value::Str(s) => parse_time(s.trim()),
            other => Err(ConversionError::unexpected("time", other)),
        }
    }

    fn validate(&self, value: &NaiveTime) -> Result<(), ValidationError> {
        self.bounds
            .check(value)
            .and_then(|()| check_one_of(value, self.one_of.as_deref()))
            .map_err(|v| self.validation_error(value, v.message, v.code))
    }

    fn options(&self) -> &FieldOptions<NaiveTime> {
        &self.options
    }

    fn options_mut(&mut self) -> &mut FieldOptions<NaiveTime> {
        &mut self.options
    }
}

/// A calendar date field.
#[derive(Debug, Clone, Default)]
pub struct DateField {
    bounds: Bounds<NaiveDate>,
    one_of: Option<Vec<NaiveDate>>,
    options: FieldOptions<NaiveDate>,
}

impl DateField {
    /// Creates an unbounded date field.
    pub fn new() -> Self {
        Default::default()
    }

    bound_methods!(NaiveDate);
}

impl Field for DateField {
    type Output = NaiveDate;

    fn kind(&self) -> &'static str {
        "DateField"
    }

    fn convert(&self, raw: &Value) -> Result<NaiveDate, ConversionError> {
        match raw {
            Value::Date(d) => Ok(*d),
            Value::DateTime(dt) => Ok(dt.date()),
            Value::Int(i) => Ok(from_timestamp(*i as f64)?.date()),
            Value::Float(f) => Ok(from_timestamp(*f)?.date()),
            Value::Str(s) => {
                let s = s.trim();
                match NaiveDate::parse_from_str(s, DATE_FORMAT) {
                    Ok(date) => Ok(date),
                    Err(_) => Ok(parse_datetime(s)?.date()),
                }
            }
            other => Err(ConversionError::unexpected("date", other)),
        }
    }

    fn validate(&self, value: &NaiveDate) -> Result<(), ValidationError> {
        self.bounds
            .check(value)
            .and_then(|()| check_one_of(value, self.one_of.as_deref()))
            .map_err(|v| self.validation_error(value, v.message, v.code))
    }

    fn options(&self) -> &FieldOptions<NaiveDate> {
        &self.options
    }

    fn options_mut(&mut self) -> &mut FieldOptions<NaiveDate> {
        &mut self.options
    }
}

/// A date-time field.
#[derive(Debug, Clone, Default)]
pub struct DatetimeField {
    bounds: Bounds<NaiveDateTime>,
    one_of: Option<Vec<NaiveDateTime>>,
    options: FieldOptions<NaiveDateTime>,
}

impl DatetimeField {
    /// Creates an unbounded date-time field.
    pub fn new() -> Self {
        Default::default()
    }

    bound_methods!(NaiveDateTime);
}

impl Field for DatetimeField {
    type Output = NaiveDateTime;

    fn kind(&self) -> &'static str {
        "DatetimeField"
    }

    fn convert(&self, raw: &Value) -> Result<NaiveDateTime, ConversionError> {
        match raw {
            Value::DateTime(dt) => Ok(*dt),
            Value::Date(d) => Ok(d.and_time(NaiveTime::default())),
            Value::Int(i) => from_timestamp(*i as f64),
            Value::Float(f) => from_timestamp(*f),
            Value::Str(s) => parse_datetime(s.trim()),
            other => Err(ConversionError::unexpected("datetime", other)),
        }
    }

    fn validate(&self, value: &NaiveDateTime) -> Result<(), ValidationError> {
        self.bounds
            .check(value)
            .and_then(|()| check_one_of(value, self.one_of.as_deref()))
            .map_err(|v| self.validation_error(value, v.message, v.code))
    }

    fn options(&self) -> &FieldOptions<NaiveDateTime> {
        &self.options
    }

    fn options_mut(&mut self) -> &mut FieldOptions<NaiveDateTime> {
        &mut self.options
    }
}
