//! Enumerations.

use cleaned_core::{ConversionError, Field, FieldOptions, ValidationError, Value};
use std::marker::PhantomData;

/// A closed set of named variants, each backed by a value.
///
/// Implementors also convert into [`Value`]; storing the variant name keeps
/// a cleaned record re-offerable as input.
///
/// ```rust
/// use cleaned_core::Value;
/// use cleaned_fields::Choice;
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Level {
///     Low,
///     High,
/// }
///
/// impl Choice for Level {
///     fn variants() -> &'static [Self] {
///         &[Level::Low, Level::High]
///     }
///
///     fn name(&self) -> &'static str {
///         match self {
///             Level::Low => "Low",
///             Level::High => "High",
///         }
///     }
///
///     fn value(&self) -> Value {
///         match self {
///             Level::Low => Value::Int(1),
///             Level::High => Value::Int(10),
///         }
///     }
/// }
///
/// impl From<Level> for Value {
///     fn from(level: Level) -> Value {
///         Value::from(level.name())
///     }
/// }
///
/// assert_eq!(Level::from_name("High"), Some(Level::High));
/// ```
pub trait Choice: Copy + PartialEq + Into<Value> + Send + Sync + 'static {
    /// Every variant, in declaration order.
    fn variants() -> &'static [Self];

    /// The variant name.
    fn name(&self) -> &'static str;

    /// The value backing the variant.
    fn value(&self) -> Value;

    /// Looks a variant up by name.
    fn from_name(name: &str) -> Option<Self> {
        Self::variants().iter().copied().find(|v| v.name() == name)
    }

    /// Looks a variant up by its backing value.
    fn from_backing(value: &Value) -> Option<Self> {
        Self::variants().iter().copied().find(|v| v.value() == *value)
    }
}

/// A field selecting one variant of a [`Choice`].
///
/// A string equal to a variant name selects it; any other input is matched
/// against the backing values.
#[derive(Debug, Clone)]
pub struct EnumField<E: Choice> {
    options: FieldOptions<E>,
    choice: PhantomData<E>,
}

impl<E: Choice> EnumField<E> {
    /// Creates a field over the variants of `E`.
    pub fn new() -> Self {
        Self {
            options: FieldOptions::default(),
            choice: PhantomData,
        }
    }
}

impl<E: Choice> Default for EnumField<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Choice> Field for EnumField<E> {
    type Output = E;

    fn kind(&self) -> &'static str {
        "EnumField"
    }

    fn convert(&self, raw: &Value) -> Result<E, ConversionError> {
        if let Some(name) = raw.as_str()
            && let Some(variant) = E::from_name(name)
        {
            return Ok(variant);
        }
        E::from_backing(raw).ok_or_else(|| {
            let names: Vec<&str> = E::variants().iter().map(Choice::name).collect();
            ConversionError::invalid(format!(
                "`{}` is none of {}",
                raw,
                names.join(", ")
            ))
        })
    }

    fn validate(&self, _value: &E) -> Result<(), ValidationError> {
        Ok(())
    }

    fn options(&self) -> &FieldOptions<E> {
        &self.options
    }

    fn options_mut(&mut self) -> &mut FieldOptions<E> {
        &mut self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cleaned_core::{ErrorCode, Raw};
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Color {
        Red,
        Green,
    }

    impl Choice for Color {
        fn variants() -> &'static [Self] {
            &[Color::Red, Color::Green]
        }

        fn name(&self) -> &'static str {
            match self {
                Color::Red => "Red",
                Color::Green => "Green",
            }
        }

        fn value(&self) -> Value {
            match self {
                Color::Red => Value::from("r"),
                Color::Green => Value::from("g"),
            }
        }
    }

    impl From<Color> for Value {
        fn from(color: Color) -> Value {
            Value::from(color.name())
        }
    }

    fn clean(raw: impl Into<Value>) -> Result<Color, cleaned_core::ValidationError> {
        EnumField::<Color>::new().clean(Raw::Given(&raw.into()))
    }

    #[test]
    fn test_by_name_then_value() {
        assert_eq!(clean("Red").unwrap(), Color::Red);
        assert_eq!(clean("g").unwrap(), Color::Green);
        assert_eq!(clean(Color::Green).unwrap(), Color::Green);
    }

    #[test]
    fn test_unknown() {
        let err = clean("blue").unwrap_err();
        assert_eq!(err.to_flat_codes(), vec![ErrorCode::Conversion]);
        assert_eq!(err.items()[0].message, "Failed to convert `blue` for EnumField");
    }

    #[test]
    fn test_stored_by_name() {
        let stored: Value = clean("r").unwrap().into();
        assert_eq!(stored, Value::from("Red"));
    }
}
