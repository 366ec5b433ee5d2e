//! Fields holding whole records.

use cleaned_core::{
    ConversionError, Field, FieldOptions, Map, Record, RecordType, TaggedUnion, ValidationError,
    Value,
};
use std::fmt;
use std::sync::Arc;

type Resolve = Arc<dyn Fn() -> RecordType + Send + Sync>;

/// Where a [`NestedField`] gets its record type from.
#[derive(Clone)]
pub enum NestedSource {
    /// A fixed record type
    Record(RecordType),
    /// A tagged union of record types
    Union(TaggedUnion),
    /// A record type resolved on first use, for self-referencing types
    Lazy(Resolve),
}

impl fmt::Debug for NestedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NestedSource::Record(ty) => f.debug_tuple("Record").field(&ty.name()).finish(),
            NestedSource::Union(union) => f
                .debug_tuple("Union")
                .field(&union.discriminator())
                .finish(),
            NestedSource::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

impl From<RecordType> for NestedSource {
    fn from(ty: RecordType) -> Self {
        NestedSource::Record(ty)
    }
}

impl From<TaggedUnion> for NestedSource {
    fn from(union: TaggedUnion) -> Self {
        NestedSource::Union(union)
    }
}

/// A field whose value is a record.
///
/// Accepts a mapping, an existing record (its stored data is offered
/// again) or a JSON object in a string. Failures of the inner construction
/// are passed through as-is, so they nest under this field's name.
///
/// Self-referencing types resolve lazily:
///
/// ```rust,ignore
/// static NODE: OnceLock<RecordType> = OnceLock::new();
///
/// fn node() -> RecordType {
///     NODE.get_or_init(|| {
///         RecordType::builder("Node")
///             .field("value", IntField::new())
///             .field("next", NestedField::lazy(node).opt())
///             .build()
///             .unwrap()
///     })
///     .clone()
/// }
/// ```
#[derive(Debug, Clone)]
pub struct NestedField {
    source: NestedSource,
    options: FieldOptions<Record>,
}

impl NestedField {
    /// Creates a nested field over a record type or tagged union.
    pub fn new(source: impl Into<NestedSource>) -> Self {
        Self {
            source: source.into(),
            options: FieldOptions::default(),
        }
    }

    /// Creates a nested field whose type is resolved when first cleaned.
    pub fn lazy<R>(resolve: R) -> Self
    where
        R: Fn() -> RecordType + Send + Sync + 'static,
    {
        Self::new(NestedSource::Lazy(Arc::new(resolve)))
    }

    /// The configured source.
    pub fn source(&self) -> &NestedSource {
        &self.source
    }

    fn construct(&self, input: &Map) -> Result<Record, ValidationError> {
        match &self.source {
            NestedSource::Record(ty) => ty.construct_map(input),
            NestedSource::Union(union) => union.construct_map(input),
            NestedSource::Lazy(resolve) => resolve().construct_map(input),
        }
    }
}

impl Field for NestedField {
    type Output = Record;

    fn kind(&self) -> &'static str {
        "NestedField"
    }

    fn convert(&self, raw: &Value) -> Result<Record, ConversionError> {
        let record = match raw {
            Value::Map(map) => self.construct(map)?,
            Value::Record(record) => self.construct(&record.to_map())?,
            Value::Str(s) => {
                let json: serde_json::Value = serde_json::from_str(s)?;
                match Value::from(json) {
                    Value::Map(map) => self.construct(&map)?,
                    other => return Err(ConversionError::unexpected("map", &other)),
                }
            }
            other => return Err(ConversionError::unexpected("map", other)),
        };
        Ok(record)
    }

    fn validate(&self, _value: &Record) -> Result<(), ValidationError> {
        Ok(())
    }

    fn options(&self) -> &FieldOptions<Record> {
        &self.options
    }

    fn options_mut(&mut self) -> &mut FieldOptions<Record> {
        &mut self.options
    }
}
