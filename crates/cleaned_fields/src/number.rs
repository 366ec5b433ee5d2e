//! Numeric fields.

use crate::checks::{Bounds, bound_methods, check_one_of};
use cleaned_core::{ConversionError, Field, FieldOptions, ValidationError, Value};

/// A 64-bit integer field.
///
/// Floats are truncated toward zero, booleans count as 0 or 1 and strings
/// are parsed after trimming.
#[derive(Debug, Clone, Default)]
pub struct IntField {
    bounds: Bounds<i64>,
    one_of: Option<Vec<i64>>,
    options: FieldOptions<i64>,
}

impl IntField {
    /// Creates an unbounded integer field.
    pub fn new() -> Self {
        Default::default()
    }

    bound_methods!(i64);
}

impl Field for IntField {
    type Output = i64;

    fn kind(&self) -> &'static str {
        "IntField"
    }

    fn convert(&self, raw: &Value) -> Result<i64, ConversionError> {
        match raw {
            Value::Int(i) => Ok(*i),
            Value::Bool(b) => Ok(i64::from(*b)),
            Value::Float(f) => {
                let truncated = f.trunc();
                // i64::MAX rounds up to 2^63 as a float, so the upper check is exclusive
                if !truncated.is_finite()
                    || truncated < i64::MIN as f64
                    || truncated >= i64::MAX as f64
                {
                    return Err(ConversionError::invalid(format!(
                        "{} does not fit in an integer",
                        f
                    )));
                }
                Ok(truncated as i64)
            }
            Value::Str(s) => Ok(s.trim().parse()?),
            other => Err(ConversionError::unexpected("int64", other)),
        }
    }

    fn validate(&self, value: &i64) -> Result<(), ValidationError> {
        self.bounds
            .check(value)
            .and_then(|()| check_one_of(value, self.one_of.as_deref()))
            .map_err(|v| self.validation_error(value, v.message, v.code))
    }

    fn options(&self) -> &FieldOptions<i64> {
        &self.options
    }

    fn options_mut(&mut self) -> &mut FieldOptions<i64> {
        &mut self.options
    }
}

/// A 64-bit float field.
#[derive(Debug, Clone, Default)]
pub struct FloatField {
    bounds: Bounds<f64>,
    one_of: Option<Vec<f64>>,
    options: FieldOptions<f64>,
}

impl FloatField {
    /// Creates an unbounded float field.
    pub fn new() -> Self {
        Default::default()
    }

    bound_methods!(f64);
}

impl Field for FloatField {
    type Output = f64;

    fn kind(&self) -> &'static str {
        "FloatField"
    }

    fn convert(&self, raw: &Value) -> Result<f64, ConversionError> {
        match raw {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            Value::Bool(b) => Ok(f64::from(u8::from(*b))),
            Value::Str(s) => Ok(s.trim().parse()?),
            other => Err(ConversionError::unexpected("float64", other)),
        }
    }

    fn validate(&self, value: &f64) -> Result<(), ValidationError> {
        self.bounds
            .check(value)
            .and_then(|()| check_one_of(value, self.one_of.as_deref()))
            .map_err(|v| self.validation_error(value, v.message, v.code))
    }

    fn options(&self) -> &FieldOptions<f64> {
        &self.options
    }

    fn options_mut(&mut self) -> &mut FieldOptions<f64> {
        &mut self.options
    }
}
