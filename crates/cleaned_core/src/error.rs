//! Error types for record cleaning.
//!
//! This module defines the structured validation error returned by a failed
//! construction, the closed set of conversion failures a field may report,
//! and the errors raised while defining record types and unions.

use crate::Value;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use thiserror::Error;

/// Result type for cleaning operations.
pub type Result<T, E = ValidationError> = std::result::Result<T, E>;

/// Machine-readable code attached to a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Value absent and no default configured
    Required,
    /// Raw value could not be coerced to the field's type
    Conversion,
    /// String failed the non-blank requirement
    Blank,
    /// String failed a regex match
    Pattern,
    /// Value must be less than a bound
    Lt,
    /// Value must be less than or equal to a bound
    Lte,
    /// Value must be greater than a bound
    Gt,
    /// Value must be greater than or equal to a bound
    Gte,
    /// Size must equal a bound
    Length,
    /// Size must be at least a bound
    MinLength,
    /// Size must be at most a bound
    MaxLength,
    /// Value not in an explicit allow-set
    OneOf,
}

impl ErrorCode {
    /// Returns the wire name of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Required => "required",
            ErrorCode::Conversion => "conversion",
            ErrorCode::Blank => "blank",
            ErrorCode::Pattern => "pattern",
            ErrorCode::Lt => "lt",
            ErrorCode::Lte => "lte",
            ErrorCode::Gt => "gt",
            ErrorCode::Gte => "gte",
            ErrorCode::Length => "length",
            ErrorCode::MinLength => "min_length",
            ErrorCode::MaxLength => "max_length",
            ErrorCode::OneOf => "one_of",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single failure message.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ErrorItem {
    /// Human-readable message
    pub message: String,

    /// Failure code, `None` for messages raised by domain constraints
    pub code: Option<ErrorCode>,
}

impl ErrorItem {
    /// Creates an item with a code.
    pub fn new(message: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            code: Some(code),
        }
    }

    /// Creates an item without a code.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }
}

/// Structured validation failure.
///
/// Holds the failures of one level (`items`) and the failures of named
/// children (`nested`), so a failed record construction can describe every
/// invalid field at once:
///
/// ```rust
/// use cleaned_core::{ErrorCode, ValidationError};
///
/// let mut error = ValidationError::default();
/// error.insert_nested("age", ValidationError::new("This field is required", ErrorCode::Required));
/// error.push_message("Passwords do not match");
///
/// assert!(!error.is_empty());
/// assert_eq!(error.to_flat_codes(), vec![ErrorCode::Required]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Error)]
#[error("{}", self.summary())]
pub struct ValidationError {
    items: Vec<ErrorItem>,
    nested: Vec<(String, ValidationError)>,
}

impl ValidationError {
    /// Creates an error with one coded item.
    pub fn new(message: impl Into<String>, code: ErrorCode) -> Self {
        Self::from_items(vec![ErrorItem::new(message, code)])
    }

    /// Creates an error with one item carrying no code.
    pub fn message(message: impl Into<String>) -> Self {
        Self::from_items(vec![ErrorItem::message(message)])
    }

    /// Creates an error from a flat list of items.
    pub fn from_items(items: Vec<ErrorItem>) -> Self {
        Self {
            items,
            nested: Vec::new(),
        }
    }

    /// Creates an error keyed by child name.
    pub fn from_nested<K, I>(nested: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ValidationError)>,
    {
        let mut error = Self::default();
        for (key, child) in nested {
            error.insert_nested(key, child);
        }
        error
    }

    /// Adds an item at this level.
    pub fn push(&mut self, item: ErrorItem) {
        self.items.push(item);
    }

    /// Adds a code-less item at this level.
    pub fn push_message(&mut self, message: impl Into<String>) {
        self.items.push(ErrorItem::message(message));
    }

    /// Files a child error under `key`, merging with an existing entry.
    pub fn insert_nested(&mut self, key: impl Into<String>, child: ValidationError) {
        let key = key.into();
        match self.nested.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => existing.merge(child),
            None => self.nested.push((key, child)),
        }
    }

    /// Merges another error into this one at the same level.
    pub fn merge(&mut self, other: ValidationError) {
        self.items.extend(other.items);
        for (key, child) in other.nested {
            self.insert_nested(key, child);
        }
    }

    /// Returns true if no failure is recorded at any depth.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.nested.iter().all(|(_, child)| child.is_empty())
    }

    /// Failures recorded at this level.
    pub fn items(&self) -> &[ErrorItem] {
        &self.items
    }

    /// Child errors in insertion order.
    pub fn nested(&self) -> impl Iterator<Item = (&str, &ValidationError)> {
        self.nested.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of child entries.
    pub fn nested_len(&self) -> usize {
        self.nested.len()
    }

    /// Looks up a child error by key.
    pub fn get(&self, key: &str) -> Option<&ValidationError> {
        self.nested.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns true if a child error exists under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// All items, depth-first, items before nested, in insertion order.
    pub fn flat_items(&self) -> Vec<&ErrorItem> {
        let mut out = Vec::new();
        self.collect_items(&mut out);
        out
    }

    fn collect_items<'a>(&'a self, out: &mut Vec<&'a ErrorItem>) {
        out.extend(self.items.iter());
        for (_, child) in &self.nested {
            child.collect_items(out);
        }
    }

    /// All codes, in the order of [`flat_items`](Self::flat_items); code-less items are skipped.
    pub fn to_flat_codes(&self) -> Vec<ErrorCode> {
        self.flat_items().into_iter().filter_map(|i| i.code).collect()
    }

    fn summary(&self) -> String {
        let mut parts: Vec<String> = self.items.iter().map(|i| i.message.clone()).collect();
        for (key, child) in &self.nested {
            parts.push(format!("{}: {}", key, child.summary()));
        }
        if parts.is_empty() {
            "validation failed".to_string()
        } else {
            parts.join("; ")
        }
    }
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        struct Nested<'a>(&'a [(String, ValidationError)]);

        impl Serialize for Nested<'_> {
            fn serialize<S: Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (k, v) in self.0 {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("items", &self.items)?;
        map.serialize_entry("nested", &Nested(&self.nested))?;
        map.end()
    }
}

/// Expected failures of a field's `convert` step.
///
/// Only these are reinterpreted as a `conversion` validation failure; any
/// other failure inside a converter is a bug and panics.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// Input kind not accepted by the field
    #[error("expected {expected}, found {found}")]
    UnexpectedType {
        /// Accepted kind
        expected: &'static str,
        /// Kind that was supplied
        found: &'static str,
    },

    /// Integer parse failure
    #[error("invalid integer: {0}")]
    Int(#[from] std::num::ParseIntError),

    /// Float parse failure
    #[error("invalid float: {0}")]
    Float(#[from] std::num::ParseFloatError),

    /// Date/time parse failure
    #[error("invalid date/time: {0}")]
    Temporal(#[from] chrono::ParseError),

    /// JSON-encoded input could not be parsed
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Byte input is not UTF-8
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Any other reason the value cannot be represented
    #[error("{0}")]
    Invalid(String),

    /// The converter already produced a structured failure
    #[error(transparent)]
    Rejected(#[from] ValidationError),
}

impl ConversionError {
    /// Creates an unexpected-type error for `value`.
    pub fn unexpected(expected: &'static str, value: &Value) -> Self {
        Self::UnexpectedType {
            expected,
            found: value.type_name(),
        }
    }

    /// Creates a free-text conversion error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid(reason.into())
    }
}

/// Errors raised while defining record types and unions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// A name is declared twice (own or inherited)
    #[error("'{name}' is declared more than once in record '{record}'")]
    DuplicateName {
        /// Record type being built
        record: String,
        /// Offending name
        name: String,
    },

    /// A property depends on a name not declared before it
    #[error("property '{property}' of record '{record}' depends on unknown name '{dependency}'")]
    UnknownDependency {
        /// Record type being built
        record: String,
        /// Property declaring the dependency
        property: String,
        /// Missing dependency
        dependency: String,
    },

    /// A property is attached to a field that does not exist
    #[error("property '{property}' of record '{record}' is attached to unknown field '{field}'")]
    UnknownField {
        /// Record type being built
        record: String,
        /// Attached property
        property: String,
        /// Missing field
        field: String,
    },

    /// A tag field declares an unusable set of tags
    #[error("tag field '{field}' of record '{record}' is invalid: {reason}")]
    InvalidTags {
        /// Record type being built
        record: String,
        /// Tag field name
        field: String,
        /// What is wrong with the tag set
        reason: String,
    },

    /// A union member lacks a tag field under the discriminator name
    #[error("record '{record}' has no tag field named '{discriminator}'")]
    MissingDiscriminator {
        /// Member record type
        record: String,
        /// Union discriminator
        discriminator: String,
    },

    /// Two union members claim the same tag
    #[error("tag '{tag}' is used by both '{first}' and '{second}'")]
    DuplicateTag {
        /// Shared tag
        tag: String,
        /// Record type that declared it first
        first: String,
        /// Record type that declared it again
        second: String,
    },

    /// The fallback tag is not mapped by any member
    #[error("fallback tag '{0}' is not declared by any member")]
    UnknownFallback(String),

    /// A union was defined without members
    #[error("a tagged union needs at least one member")]
    EmptyUnion,
}
