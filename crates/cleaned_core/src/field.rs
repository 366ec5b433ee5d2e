//! The field contract.
//!
//! A [`Field`] turns one raw input value into a typed, validated value. The
//! provided [`Field::clean`] drives the fixed pipeline (absent check and
//! default, `convert`, `validate`); implementors only describe how to
//! convert and what to check.

use crate::{ConversionError, ErrorCode, Raw, ValidationError, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Value used when the input key is absent.
pub enum DefaultValue<T> {
    /// Returned as-is
    Static(T),
    /// Invoked once per absent input
    Producer(Arc<dyn Fn() -> T + Send + Sync>),
}

impl<T: Clone> DefaultValue<T> {
    fn produce(&self) -> T {
        match self {
            DefaultValue::Static(value) => value.clone(),
            DefaultValue::Producer(produce) => produce(),
        }
    }
}

impl<T: Clone> Clone for DefaultValue<T> {
    fn clone(&self) -> Self {
        match self {
            DefaultValue::Static(value) => DefaultValue::Static(value.clone()),
            DefaultValue::Producer(produce) => DefaultValue::Producer(Arc::clone(produce)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for DefaultValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Static(value) => f.debug_tuple("Static").field(value).finish(),
            DefaultValue::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

/// Options shared by every field: default and descriptive metadata.
#[derive(Debug, Clone)]
pub struct FieldOptions<T> {
    /// Value used for absent input
    pub default: Option<DefaultValue<T>>,

    /// Short human label
    pub label: String,

    /// Longer description
    pub desc: String,
}

impl<T> Default for FieldOptions<T> {
    fn default() -> Self {
        Self {
            default: None,
            label: String::new(),
            desc: String::new(),
        }
    }
}

/// Conversion and validation of one value.
///
/// # Example
///
/// ```rust
/// use cleaned_core::{ConversionError, Field, FieldOptions, Raw, ValidationError, Value};
///
/// struct Upper {
///     options: FieldOptions<String>,
/// }
///
/// impl Field for Upper {
///     type Output = String;
///
///     fn kind(&self) -> &'static str {
///         "Upper"
///     }
///
///     fn convert(&self, raw: &Value) -> Result<String, ConversionError> {
///         raw.as_str()
///             .map(str::to_uppercase)
///             .ok_or_else(|| ConversionError::unexpected("string", raw))
///     }
///
///     fn validate(&self, _value: &String) -> Result<(), ValidationError> {
///         Ok(())
///     }
///
///     fn options(&self) -> &FieldOptions<String> {
///         &self.options
///     }
///
///     fn options_mut(&mut self) -> &mut FieldOptions<String> {
///         &mut self.options
///     }
/// }
///
/// let field = Upper { options: FieldOptions::default() }.default("NONE".to_string());
/// assert_eq!(field.clean(Raw::Given(&Value::from("abc"))).unwrap(), "ABC");
/// assert_eq!(field.clean(Raw::Undefined).unwrap(), "NONE");
/// ```
pub trait Field: Send + Sync + 'static {
    /// Cleaned value type
    type Output: Clone + Into<Value> + Send + Sync + 'static;

    /// Name used in messages, e.g. `IntField`.
    fn kind(&self) -> &'static str;

    /// Coerces a supplied raw value.
    fn convert(&self, raw: &Value) -> Result<Self::Output, ConversionError>;

    /// Checks a converted value.
    fn validate(&self, value: &Self::Output) -> Result<(), ValidationError>;

    /// Default and metadata.
    fn options(&self) -> &FieldOptions<Self::Output>;

    /// Mutable access used by the fluent modifiers.
    fn options_mut(&mut self) -> &mut FieldOptions<Self::Output>;

    /// Runs the full pipeline on one input.
    ///
    /// Absent input yields the default (neither converted nor validated) or
    /// a `required` failure. Supplied input is converted, then validated.
    fn clean(&self, raw: Raw<'_>) -> Result<Self::Output, ValidationError> {
        run_pipeline(self, raw)
    }

    /// Failure for absent input without a default.
    fn required_error(&self) -> ValidationError {
        ValidationError::new("This field is required", ErrorCode::Required)
    }

    /// Failure for a value `convert` could not handle.
    fn conversion_error(&self, raw: &Value, _cause: &ConversionError) -> ValidationError {
        ValidationError::new(
            format!("Failed to convert `{}` for {}", raw, self.kind()),
            ErrorCode::Conversion,
        )
    }

    /// Failure for a converted value that did not pass a check.
    ///
    /// Every check of the built-in fields reports through this hook, so a
    /// field can reword or recode its validation failures in one place.
    fn validation_error(
        &self,
        _value: &Self::Output,
        message: String,
        code: ErrorCode,
    ) -> ValidationError {
        ValidationError::new(message, code)
    }

    /// Sets a static default for absent input.
    fn default(mut self, value: Self::Output) -> Self
    where
        Self: Sized,
    {
        self.options_mut().default = Some(DefaultValue::Static(value));
        self
    }

    /// Sets a producer invoked for each absent input.
    fn default_with<P>(mut self, produce: P) -> Self
    where
        Self: Sized,
        P: Fn() -> Self::Output + Send + Sync + 'static,
    {
        self.options_mut().default = Some(DefaultValue::Producer(Arc::new(produce)));
        self
    }

    /// Sets the label and description.
    fn describe(mut self, label: impl Into<String>, desc: impl Into<String>) -> Self
    where
        Self: Sized,
    {
        let options = self.options_mut();
        options.label = label.into();
        options.desc = desc.into();
        self
    }

    /// The label set by [`describe`](Field::describe).
    fn label(&self) -> &str {
        &self.options().label
    }

    /// The description set by [`describe`](Field::describe).
    fn desc(&self) -> &str {
        &self.options().desc
    }

    /// Wraps the field so null is accepted and absent input means null.
    fn opt(self) -> OptionalField<Self>
    where
        Self: Sized,
    {
        OptionalField::new(self, true)
    }

    /// Like [`opt`](Field::opt), choosing whether absent input means null.
    fn opt_with(self, omissible: bool) -> OptionalField<Self>
    where
        Self: Sized,
    {
        OptionalField::new(self, omissible)
    }
}

/// Default-or-required for absent input, then `convert` and `validate`.
fn run_pipeline<F: Field + ?Sized>(field: &F, raw: Raw<'_>) -> Result<F::Output, ValidationError> {
    let value = match raw {
        Raw::Undefined => {
            return match &field.options().default {
                Some(default) => Ok(default.produce()),
                None => Err(field.required_error()),
            };
        }
        Raw::Given(value) => value,
    };

    let converted = match field.convert(value) {
        Ok(converted) => converted,
        Err(ConversionError::Rejected(error)) => return Err(error),
        Err(cause) => {
            debug!(field = field.kind(), value = %value, cause = %cause, "conversion failed");
            return Err(field.conversion_error(value, &cause));
        }
    };

    field.validate(&converted)?;
    Ok(converted)
}

/// A field accepting null in addition to the wrapped field's values.
pub struct OptionalField<F: Field> {
    field: F,
    omissible: bool,
    options: FieldOptions<Option<F::Output>>,
}

impl<F: Field> OptionalField<F> {
    /// Wraps `field`, carrying over its metadata and default.
    pub fn new(field: F, omissible: bool) -> Self {
        let inner = field.options();
        let default = inner.default.as_ref().map(|default| match default {
            DefaultValue::Static(value) => DefaultValue::Static(Some(value.clone())),
            DefaultValue::Producer(produce) => {
                let produce = Arc::clone(produce);
                DefaultValue::Producer(Arc::new(move || Some(produce())))
            }
        });
        let options = FieldOptions {
            default,
            label: inner.label.clone(),
            desc: inner.desc.clone(),
        };

        Self {
            field,
            omissible,
            options,
        }
    }

    /// The wrapped field.
    pub fn inner(&self) -> &F {
        &self.field
    }

    /// Whether absent input is treated as null.
    pub fn is_omissible(&self) -> bool {
        self.omissible
    }
}

impl<F: Field> Field for OptionalField<F> {
    type Output = Option<F::Output>;

    fn kind(&self) -> &'static str {
        self.field.kind()
    }

    fn clean(&self, raw: Raw<'_>) -> Result<Self::Output, ValidationError> {
        if raw.is_undefined() && self.omissible {
            return Ok(None);
        }
        run_pipeline(self, raw)
    }

    fn required_error(&self) -> ValidationError {
        self.field.required_error()
    }

    fn conversion_error(&self, raw: &Value, cause: &ConversionError) -> ValidationError {
        self.field.conversion_error(raw, cause)
    }

    fn convert(&self, raw: &Value) -> Result<Self::Output, ConversionError> {
        if raw.is_null() {
            return Ok(None);
        }
        self.field.convert(raw).map(Some)
    }

    fn validate(&self, value: &Self::Output) -> Result<(), ValidationError> {
        match value {
            Some(value) => self.field.validate(value),
            None => Ok(()),
        }
    }

    fn options(&self) -> &FieldOptions<Self::Output> {
        &self.options
    }

    fn options_mut(&mut self) -> &mut FieldOptions<Self::Output> {
        &mut self.options
    }
}

/// Descriptive metadata of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo<'a> {
    /// Name used in messages
    pub kind: &'static str,
    /// Field label
    pub label: &'a str,
    /// Field description
    pub desc: &'a str,
}

/// Object-safe form of [`Field`] used by record types.
pub trait DynField: Send + Sync {
    /// Cleans one input into a stored value.
    fn clean_value(&self, raw: Raw<'_>) -> Result<Value, ValidationError>;

    /// Kind, label and description.
    fn info(&self) -> FieldInfo<'_>;

    /// Access to the concrete field type.
    fn as_any(&self) -> &dyn Any;
}

impl<F: Field> DynField for F {
    fn clean_value(&self, raw: Raw<'_>) -> Result<Value, ValidationError> {
        self.clean(raw).map(Into::into)
    }

    fn info(&self) -> FieldInfo<'_> {
        FieldInfo {
            kind: self.kind(),
            label: self.label(),
            desc: self.desc(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Minimal integer field for engine tests.
    pub(crate) struct Num {
        max: Option<i64>,
        options: FieldOptions<i64>,
    }

    impl Num {
        pub(crate) fn new() -> Self {
            Self {
                max: None,
                options: FieldOptions::default(),
            }
        }

        pub(crate) fn max(mut self, max: i64) -> Self {
            self.max = Some(max);
            self
        }
    }

    impl Field for Num {
        type Output = i64;

        fn kind(&self) -> &'static str {
            "Num"
        }

        fn convert(&self, raw: &Value) -> Result<i64, ConversionError> {
            match raw {
                Value::Int(i) => Ok(*i),
                Value::Str(s) => Ok(s.trim().parse()?),
                other => Err(ConversionError::unexpected("int64", other)),
            }
        }

        fn validate(&self, value: &i64) -> Result<(), ValidationError> {
            match self.max {
                Some(max) if *value > max => Err(self.validation_error(
                    value,
                    format!("The value must be less than or equal to {}.", max),
                    ErrorCode::Lte,
                )),
                _ => Ok(()),
            }
        }

        fn options(&self) -> &FieldOptions<i64> {
            &self.options
        }

        fn options_mut(&mut self) -> &mut FieldOptions<i64> {
            &mut self.options
        }
    }

    #[test]
    fn test_required() {
        let err = Num::new().clean(Raw::Undefined).unwrap_err();
        assert_eq!(err.to_flat_codes(), vec![ErrorCode::Required]);
    }

    #[test]
    fn test_static_default_not_validated() {
        let field = Num::new().max(1).default(100);
        assert_eq!(field.clean(Raw::Undefined).unwrap(), 100);
    }

    #[test]
    fn test_producer_default_called_once() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let field = Num::new().max(1).default_with(|| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            7
        });

        assert_eq!(field.clean(Raw::Undefined).unwrap(), 7);
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_conversion_failure() {
        let raw = Value::from("abc");
        let err = Num::new().clean(Raw::Given(&raw)).unwrap_err();

        assert_eq!(err.to_flat_codes(), vec![ErrorCode::Conversion]);
        assert_eq!(err.items()[0].message, "Failed to convert `abc` for Num");
    }

    #[test]
    fn test_validation_failure() {
        let raw = Value::from(2);
        let err = Num::new().max(1).clean(Raw::Given(&raw)).unwrap_err();
        assert_eq!(err.to_flat_codes(), vec![ErrorCode::Lte]);

        let raw = Value::from("1");
        assert_eq!(Num::new().max(1).clean(Raw::Given(&raw)).unwrap(), 1);
    }

    /// Rewords every failure of the wrapped [`Num`].
    struct Terse(Num);

    impl Field for Terse {
        type Output = i64;

        fn kind(&self) -> &'static str {
            "Terse"
        }

        fn convert(&self, raw: &Value) -> Result<i64, ConversionError> {
            self.0.convert(raw)
        }

        fn validate(&self, value: &i64) -> Result<(), ValidationError> {
            self.0
                .validate(value)
                .map_err(|err| self.validation_error(value, err.to_string(), ErrorCode::Lte))
        }

        fn options(&self) -> &FieldOptions<i64> {
            self.0.options()
        }

        fn options_mut(&mut self) -> &mut FieldOptions<i64> {
            self.0.options_mut()
        }

        fn required_error(&self) -> ValidationError {
            ValidationError::message("missing")
        }

        fn conversion_error(&self, raw: &Value, _cause: &ConversionError) -> ValidationError {
            ValidationError::new(format!("not a number: {raw}"), ErrorCode::Conversion)
        }

        fn validation_error(
            &self,
            value: &i64,
            _message: String,
            code: ErrorCode,
        ) -> ValidationError {
            ValidationError::new(format!("{value} is too big"), code)
        }
    }

    #[test]
    fn test_overridden_error_hooks() {
        let field = Terse(Num::new().max(1));

        let err = field.clean(Raw::Undefined).unwrap_err();
        assert_eq!(err.items()[0].message, "missing");
        assert_eq!(err.items()[0].code, None);

        let raw = Value::from("x");
        let err = field.clean(Raw::Given(&raw)).unwrap_err();
        assert_eq!(err.items()[0].message, "not a number: x");

        let raw = Value::from(5);
        let err = field.clean(Raw::Given(&raw)).unwrap_err();
        assert_eq!(err.items()[0].message, "5 is too big");
        assert_eq!(err.to_flat_codes(), vec![ErrorCode::Lte]);
    }

    #[test]
    fn test_optional_uses_inner_hooks() {
        let field = Terse(Num::new()).opt_with(false);

        let err = field.clean(Raw::Undefined).unwrap_err();
        assert_eq!(err.items()[0].message, "missing");

        let raw = Value::from("x");
        let err = field.clean(Raw::Given(&raw)).unwrap_err();
        assert_eq!(err.items()[0].message, "not a number: x");
        assert_eq!(field.clean(Raw::Given(&Value::Null)).unwrap(), None);
    }

    #[test]
    fn test_describe() {
        let field = Num::new().describe("Age", "Age in years");
        assert_eq!(field.label(), "Age");
        assert_eq!(field.desc(), "Age in years");

        let optional = field.opt();
        assert_eq!(optional.label(), "Age");
    }

    #[test]
    fn test_optional_null_short_circuits() {
        let field = Num::new().max(1).opt();
        assert_eq!(field.clean(Raw::Given(&Value::Null)).unwrap(), None);
        assert_eq!(field.convert(&Value::Null).unwrap(), None);

        let raw = Value::from(5);
        assert!(field.clean(Raw::Given(&raw)).is_err());
    }

    #[test]
    fn test_optional_absent() {
        assert_eq!(Num::new().opt().clean(Raw::Undefined).unwrap(), None);

        let strict = Num::new().opt_with(false);
        let err = strict.clean(Raw::Undefined).unwrap_err();
        assert_eq!(err.to_flat_codes(), vec![ErrorCode::Required]);

        let with_default = Num::new().default(3).opt_with(false);
        assert_eq!(with_default.clean(Raw::Undefined).unwrap(), Some(3));

        let explicit = Num::new().opt_with(false).default(None);
        assert_eq!(explicit.clean(Raw::Undefined).unwrap(), None);
    }

    #[test]
    fn test_dyn_field() {
        let field: Arc<dyn DynField> = Arc::new(Num::new().opt());
        let raw = Value::from("4");

        assert_eq!(field.clean_value(Raw::Given(&raw)).unwrap(), Value::Int(4));
        assert_eq!(field.clean_value(Raw::Undefined).unwrap(), Value::Null);
        assert_eq!(field.info().kind, "Num");
    }
}
