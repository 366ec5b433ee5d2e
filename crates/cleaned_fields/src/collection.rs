//! Container fields and the either-or field.
//!
//! Containers accept their native value kind or a JSON document in a
//! string. Element failures are collected for every element before the
//! container fails, and are passed through unchanged as the field's error.

use crate::checks::{Length, length_methods};
use crate::text::StrField;
use cleaned_core::{
    ConversionError, ErrorItem, Field, FieldOptions, Map, Raw, ValidationError, Value,
};
use std::borrow::Cow;
use std::collections::BTreeSet;
use tracing::trace;

/// Parses string input as JSON, passing any other value through.
fn decode_json(raw: &Value) -> Result<Cow<'_, Value>, ConversionError> {
    match raw {
        Value::Str(s) => {
            let json: serde_json::Value = serde_json::from_str(s)?;
            Ok(Cow::Owned(Value::from(json)))
        }
        other => Ok(Cow::Borrowed(other)),
    }
}

fn elements<'a>(raw: &'a Value, expected: &'static str) -> Result<Vec<&'a Value>, ConversionError> {
    match raw {
        Value::List(items) => Ok(items.iter().collect()),
        Value::Set(items) => Ok(items.iter().collect()),
        other => Err(ConversionError::unexpected(expected, other)),
    }
}

/// A list of values cleaned by one element field.
///
/// Element failures are nested under their index.
#[derive(Debug, Clone)]
pub struct ListField<F: Field> {
    value: F,
    length: Length,
    options: FieldOptions<Vec<F::Output>>,
}

impl<F: Field> ListField<F> {
    /// Creates a list field cleaning each element with `value`.
    pub fn new(value: F) -> Self {
        Self {
            value,
            length: Length::default(),
            options: FieldOptions::default(),
        }
    }

    length_methods!();
}

impl<F: Field> Field for ListField<F> {
    type Output = Vec<F::Output>;

    fn kind(&self) -> &'static str {
        "ListField"
    }

    fn convert(&self, raw: &Value) -> Result<Vec<F::Output>, ConversionError> {
        let raw = decode_json(raw)?;
        let items = elements(&raw, "list")?;

        let mut result = Vec::with_capacity(items.len());
        let mut errors = ValidationError::default();
        for (index, item) in items.into_iter().enumerate() {
            match self.value.clean(Raw::Given(item)) {
                Ok(value) => result.push(value),
                Err(error) => errors.insert_nested(index.to_string(), error),
            }
        }

        if !errors.is_empty() {
            trace!(failed = errors.nested_len(), "list elements rejected");
            return Err(errors.into());
        }
        Ok(result)
    }

    fn validate(&self, value: &Vec<F::Output>) -> Result<(), ValidationError> {
        self.length
            .check(value.len())
            .map_err(|v| self.validation_error(value, v.message, v.code))
    }

    fn options(&self) -> &FieldOptions<Self::Output> {
        &self.options
    }

    fn options_mut(&mut self) -> &mut FieldOptions<Self::Output> {
        &mut self.options
    }
}

/// A set of unique values cleaned by one element field.
///
/// Duplicates (after cleaning) are merged. Element failures are flattened
/// into a single list of items.
#[derive(Debug, Clone)]
pub struct SetField<F: Field> {
    value: F,
    length: Length,
    options: FieldOptions<BTreeSet<Value>>,
}

impl<F: Field> SetField<F> {
    /// Creates a set field cleaning each element with `value`.
    pub fn new(value: F) -> Self {
        Self {
            value,
            length: Length::default(),
            options: FieldOptions::default(),
        }
    }

    length_methods!();
}

impl<F: Field> Field for SetField<F> {
    type Output = BTreeSet<Value>;

    fn kind(&self) -> &'static str {
        "SetField"
    }

    fn convert(&self, raw: &Value) -> Result<BTreeSet<Value>, ConversionError> {
        let raw = decode_json(raw)?;
        let items = elements(&raw, "set")?;

        let mut result = BTreeSet::new();
        let mut failures: Vec<ErrorItem> = Vec::new();
        for item in items {
            match self.value.clean(Raw::Given(item)) {
                Ok(value) => {
                    result.insert(value.into());
                }
                Err(error) => failures.extend(error.flat_items().into_iter().cloned()),
            }
        }

        if !failures.is_empty() {
            trace!(failed = failures.len(), "set elements rejected");
            return Err(ValidationError::from_items(failures).into());
        }
        Ok(result)
    }

    fn validate(&self, value: &BTreeSet<Value>) -> Result<(), ValidationError> {
        self.length
            .check(value.len())
            .map_err(|v| self.validation_error(value, v.message, v.code))
    }

    fn options(&self) -> &FieldOptions<BTreeSet<Value>> {
        &self.options
    }

    fn options_mut(&mut self) -> &mut FieldOptions<BTreeSet<Value>> {
        &mut self.options
    }
}

/// A mapping whose keys and values are each cleaned by a field.
///
/// Keys default to a non-blank, single-line [`StrField`]. Failures are
/// nested per entry: a value failure under the cleaned key, and a key
/// failure under `"{raw key}:key"`. When a key fails, the value field is
/// also run on the raw key, and its failure is filed under `"{raw key}"`.
#[derive(Debug, Clone)]
pub struct DictField<V: Field, K: Field = StrField> {
    value: V,
    key: K,
    length: Length,
    options: FieldOptions<Map>,
}

impl<V: Field> DictField<V> {
    /// Creates a dictionary field with string keys.
    pub fn new(value: V) -> Self {
        DictField::with_key(value, StrField::new(false).multiline(false))
    }
}

impl<V: Field, K: Field> DictField<V, K> {
    /// Creates a dictionary field with keys cleaned by `key`.
    pub fn with_key(value: V, key: K) -> Self {
        Self {
            value,
            key,
            length: Length::default(),
            options: FieldOptions::default(),
        }
    }

    length_methods!();
}

impl<V: Field, K: Field> Field for DictField<V, K> {
    type Output = Map;

    fn kind(&self) -> &'static str {
        "DictField"
    }

    fn convert(&self, raw: &Value) -> Result<Map, ConversionError> {
        let raw = decode_json(raw)?;
        let entries = match raw.as_ref() {
            Value::Map(entries) => entries,
            other => return Err(ConversionError::unexpected("map", other)),
        };

        let mut result = Map::new();
        let mut errors = ValidationError::default();
        for (raw_key, raw_value) in entries {
            match self.key.clean(Raw::Given(raw_key)) {
                Ok(key) => {
                    let key: Value = key.into();
                    match self.value.clean(Raw::Given(raw_value)) {
                        Ok(value) => {
                            result.insert(key, value.into());
                        }
                        Err(error) => errors.insert_nested(key.to_string(), error),
                    }
                }
                Err(error) => {
                    errors.insert_nested(format!("{}:key", raw_key), error);
                    if let Err(error) = self.value.clean(Raw::Given(raw_key)) {
                        errors.insert_nested(raw_key.to_string(), error);
                    }
                }
            }
        }

        if !errors.is_empty() {
            trace!(failed = errors.nested_len(), "dictionary entries rejected");
            return Err(errors.into());
        }
        Ok(result)
    }

    fn validate(&self, value: &Map) -> Result<(), ValidationError> {
        self.length
            .check(value.len())
            .map_err(|v| self.validation_error(value, v.message, v.code))
    }

    fn options(&self) -> &FieldOptions<Map> {
        &self.options
    }

    fn options_mut(&mut self) -> &mut FieldOptions<Map> {
        &mut self.options
    }
}

/// Accepts whatever the first of two fields accepts.
///
/// The second field is tried only when the first one fails.
#[derive(Debug, Clone)]
pub struct EitherField<A: Field, B: Field> {
    first: A,
    second: B,
    options: FieldOptions<Value>,
}

impl<A: Field, B: Field> EitherField<A, B> {
    /// Creates a field trying `first`, then `second`.
    pub fn new(first: A, second: B) -> Self {
        Self {
            first,
            second,
            options: FieldOptions::default(),
        }
    }
}

impl<A: Field, B: Field> Field for EitherField<A, B> {
    type Output = Value;

    fn kind(&self) -> &'static str {
        "EitherField"
    }

    fn convert(&self, raw: &Value) -> Result<Value, ConversionError> {
        if let Ok(value) = self.first.clean(Raw::Given(raw)) {
            return Ok(value.into());
        }
        if let Ok(value) = self.second.clean(Raw::Given(raw)) {
            return Ok(value.into());
        }
        Err(ConversionError::invalid(format!(
            "Either {} and {} can not handle `{}`.",
            self.first.kind(),
            self.second.kind(),
            raw
        )))
    }

    fn validate(&self, _value: &Value) -> Result<(), ValidationError> {
        Ok(())
    }

    fn options(&self) -> &FieldOptions<Value> {
        &self.options
    }

    fn options_mut(&mut self) -> &mut FieldOptions<Value> {
        &mut self.options
    }
}
