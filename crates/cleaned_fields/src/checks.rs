//! Checks shared by the concrete fields.
//!
//! - Bounds: `lt`, `lte`, `gt`, `gte` on ordered values
//! - Length: exact, minimum and maximum size
//! - One-of: membership in an explicit allow-list
//!
//! Each check reports only its first violation. Fields hand it to
//! [`Field::validation_error`](cleaned_core::Field::validation_error), which
//! builds the error that is actually reported.

use cleaned_core::{ErrorCode, Value};

/// A failed check, before a field turns it into a validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Default message
    pub message: String,
    /// Failure code
    pub code: ErrorCode,
}

impl Violation {
    /// Creates a violation.
    pub fn new(message: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

/// Comparison bounds of an ordered field.
#[derive(Debug, Clone)]
pub struct Bounds<T> {
    /// Exclusive upper bound
    pub lt: Option<T>,
    /// Inclusive upper bound
    pub lte: Option<T>,
    /// Exclusive lower bound
    pub gt: Option<T>,
    /// Inclusive lower bound
    pub gte: Option<T>,
}

impl<T> Default for Bounds<T> {
    fn default() -> Self {
        Self {
            lt: None,
            lte: None,
            gt: None,
            gte: None,
        }
    }
}

impl<T: PartialOrd + Clone + Into<Value>> Bounds<T> {
    /// Checks `value` against every configured bound, in `lt, lte, gt, gte` order.
    pub fn check(&self, value: &T) -> Result<(), Violation> {
        if let Some(lt) = &self.lt
            && value >= lt
        {
            return Err(Violation::new(
                format!("The value must be less than {}.", show(lt)),
                ErrorCode::Lt,
            ));
        }
        if let Some(lte) = &self.lte
            && value > lte
        {
            return Err(Violation::new(
                format!("The value must be less than or equal to {}.", show(lte)),
                ErrorCode::Lte,
            ));
        }
        if let Some(gt) = &self.gt
            && value <= gt
        {
            return Err(Violation::new(
                format!("The value must be greater than {}.", show(gt)),
                ErrorCode::Gt,
            ));
        }
        if let Some(gte) = &self.gte
            && value < gte
        {
            return Err(Violation::new(
                format!("The value must be greater than or equal to {}.", show(gte)),
                ErrorCode::Gte,
            ));
        }
        Ok(())
    }
}

/// Size limits of a string or container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Length {
    /// Exact size
    pub length: Option<usize>,
    /// Minimum size
    pub min_length: Option<usize>,
    /// Maximum size
    pub max_length: Option<usize>,
}

impl Length {
    /// Checks a size against the configured limits.
    pub fn check(&self, len: usize) -> Result<(), Violation> {
        if let Some(length) = self.length
            && len != length
        {
            return Err(Violation::new(
                format!("The length of the value must be equal to {}.", length),
                ErrorCode::Length,
            ));
        }
        if let Some(min) = self.min_length
            && len < min
        {
            return Err(Violation::new(
                format!("The length of the value must be longer than or equal to {}.", min),
                ErrorCode::MinLength,
            ));
        }
        if let Some(max) = self.max_length
            && len > max
        {
            return Err(Violation::new(
                format!("The length of the value must be shorter than or equal to {}.", max),
                ErrorCode::MaxLength,
            ));
        }
        Ok(())
    }
}

/// Checks membership in `allowed`, if an allow-list is configured.
pub fn check_one_of<T>(value: &T, allowed: Option<&[T]>) -> Result<(), Violation>
where
    T: PartialEq + Clone + Into<Value>,
{
    let Some(allowed) = allowed else {
        return Ok(());
    };
    if allowed.contains(value) {
        return Ok(());
    }

    let listed: Vec<String> = allowed.iter().map(|v| show(v).to_string()).collect();
    Err(Violation::new(
        format!("The value must be one of {}.", listed.join(", ")),
        ErrorCode::OneOf,
    ))
}

fn show<T: Clone + Into<Value>>(value: &T) -> Value {
    value.clone().into()
}

/// Builder methods for [`Bounds`] and the one-of list of an ordered field.
macro_rules! bound_methods {
    ($ty:ty) => {
        /// Requires values strictly less than `bound`.
        pub fn lt(mut self, bound: $ty) -> Self {
            self.bounds.lt = Some(bound);
            self
        }

        /// Requires values less than or equal to `bound`.
        pub fn lte(mut self, bound: $ty) -> Self {
            self.bounds.lte = Some(bound);
            self
        }

        /// Requires values strictly greater than `bound`.
        pub fn gt(mut self, bound: $ty) -> Self {
            self.bounds.gt = Some(bound);
            self
        }

        /// Requires values greater than or equal to `bound`.
        pub fn gte(mut self, bound: $ty) -> Self {
            self.bounds.gte = Some(bound);
            self
        }

        /// Restricts values to `allowed`.
        pub fn one_of<I: IntoIterator<Item = $ty>>(mut self, allowed: I) -> Self {
            self.one_of = Some(allowed.into_iter().collect());
            self
        }
    };
}

/// Builder methods for [`Length`].
macro_rules! length_methods {
    () => {
        /// Requires exactly `length` elements.
        pub fn length(mut self, length: usize) -> Self {
            self.length.length = Some(length);
            self
        }

        /// Requires at least `min` elements.
        pub fn min_length(mut self, min: usize) -> Self {
            self.length.min_length = Some(min);
            self
        }

        /// Requires at most `max` elements.
        pub fn max_length(mut self, max: usize) -> Self {
            self.length.max_length = Some(max);
            self
        }
    };
}

pub(crate) use bound_methods;
pub(crate) use length_methods;

#[cfg(test)]
mod tests {
    use super::*;
    use cleaned_core::{ConversionError, Field, FieldOptions, Raw, ValidationError};
    use pretty_assertions::assert_eq;

    /// Percentage with its own wording for failed checks.
    struct Percent {
        bounds: Bounds<i64>,
        options: FieldOptions<i64>,
    }

    impl Field for Percent {
        type Output = i64;

        fn kind(&self) -> &'static str {
            "Percent"
        }

        fn convert(&self, raw: &Value) -> Result<i64, ConversionError> {
            raw.as_int()
                .ok_or_else(|| ConversionError::unexpected("int64", raw))
        }

        fn validate(&self, value: &i64) -> Result<(), ValidationError> {
            self.bounds
                .check(value)
                .map_err(|v| self.validation_error(value, v.message, v.code))
        }

        fn options(&self) -> &FieldOptions<i64> {
            &self.options
        }

        fn options_mut(&mut self) -> &mut FieldOptions<i64> {
            &mut self.options
        }

        fn validation_error(
            &self,
            value: &i64,
            _message: String,
            code: ErrorCode,
        ) -> ValidationError {
            ValidationError::new(format!("{value}% is not a percentage"), code)
        }
    }

    #[test]
    fn test_violation_reported_through_field_hook() {
        let field = Percent {
            bounds: Bounds {
                gte: Some(0),
                lte: Some(100),
                ..Bounds::default()
            },
            options: FieldOptions::default(),
        };

        let raw = Value::Int(120);
        let err = field.clean(Raw::Given(&raw)).unwrap_err();
        assert_eq!(err.items()[0].message, "120% is not a percentage");
        assert_eq!(err.to_flat_codes(), vec![ErrorCode::Lte]);

        let raw = Value::Int(50);
        assert_eq!(field.clean(Raw::Given(&raw)).unwrap(), 50);
    }

    #[test]
    fn test_bounds_first_violation_only() {
        let bounds = Bounds {
            lt: Some(10),
            lte: Some(5),
            gt: None,
            gte: None,
        };

        assert_eq!(
            bounds.check(&20i64).unwrap_err(),
            Violation::new("The value must be less than 10.", ErrorCode::Lt)
        );
        assert_eq!(bounds.check(&7i64).unwrap_err().code, ErrorCode::Lte);
        assert!(bounds.check(&5i64).is_ok());
    }

    #[test]
    fn test_bounds_lower() {
        let bounds = Bounds {
            gt: Some(0.0),
            gte: Some(1.5),
            ..Bounds::default()
        };

        assert_eq!(
            bounds.check(&0.0).unwrap_err().message,
            "The value must be greater than 0.0."
        );
        assert_eq!(bounds.check(&1.0).unwrap_err().code, ErrorCode::Gte);
        assert!(bounds.check(&1.5).is_ok());
    }

    #[test]
    fn test_length() {
        let length = Length {
            length: None,
            min_length: Some(2),
            max_length: Some(3),
        };

        assert_eq!(length.check(1).unwrap_err().code, ErrorCode::MinLength);
        assert_eq!(length.check(4).unwrap_err().code, ErrorCode::MaxLength);
        assert!(length.check(2).is_ok());

        let exact = Length {
            length: Some(1),
            ..Length::default()
        };
        assert_eq!(
            exact.check(2).unwrap_err().message,
            "The length of the value must be equal to 1."
        );
    }

    #[test]
    fn test_one_of() {
        let allowed = vec!["a".to_string(), "b".to_string()];

        assert!(check_one_of(&"a".to_string(), Some(allowed.as_slice())).is_ok());
        assert!(check_one_of(&"z".to_string(), None).is_ok());

        assert_eq!(
            check_one_of(&"z".to_string(), Some(allowed.as_slice())).unwrap_err(),
            Violation::new("The value must be one of a, b.", ErrorCode::OneOf)
        );
    }
}
