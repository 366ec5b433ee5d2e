//! String and boolean fields.

use crate::checks::{Length, check_one_of, length_methods};
use cleaned_core::{ConversionError, ErrorCode, Field, FieldOptions, ValidationError, Value};
use regex::{NoExpand, Regex};
use std::sync::LazyLock;

static LINEBREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\r\n|\r|\n").unwrap_or_else(|e| panic!("invalid linebreak pattern: {e}"))
});

/// A string field.
///
/// Scalars are rendered to text, surrounding whitespace is stripped and
/// line breaks are collapsed, unless configured otherwise. Blankness must
/// be decided up front: a blank value in a blankable field skips every
/// other check.
///
/// ```rust
/// use cleaned_core::{Field, Raw, Value};
/// use cleaned_fields::StrField;
///
/// let field = StrField::new(false).max_length(5);
/// let raw = Value::from("  a\nb ");
/// assert_eq!(field.clean(Raw::Given(&raw)).unwrap(), "a b");
/// ```
#[derive(Debug, Clone)]
pub struct StrField {
    blank: bool,
    strip: bool,
    multiline: bool,
    linebreak_replacement: String,
    pattern: Option<Regex>,
    length: Length,
    one_of: Option<Vec<String>>,
    options: FieldOptions<String>,
}

impl StrField {
    /// Creates a string field; `blank` allows whitespace-only values.
    pub fn new(blank: bool) -> Self {
        Self {
            blank,
            strip: true,
            multiline: false,
            linebreak_replacement: " ".to_string(),
            pattern: None,
            length: Length::default(),
            one_of: None,
            options: FieldOptions::default(),
        }
    }

    /// Whether surrounding whitespace is removed (default on).
    pub fn strip(mut self, strip: bool) -> Self {
        self.strip = strip;
        self
    }

    /// Whether line breaks are kept (default off).
    pub fn multiline(mut self, multiline: bool) -> Self {
        self.multiline = multiline;
        self
    }

    /// Text replacing each line break of a single-line value.
    pub fn linebreak_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.linebreak_replacement = replacement.into();
        self
    }

    /// Requires values to match `pattern` at their start.
    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Restricts values to `allowed`.
    pub fn one_of<I, S>(mut self, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.one_of = Some(allowed.into_iter().map(Into::into).collect());
        self
    }

    length_methods!();

    /// Whether whitespace-only values are accepted.
    pub fn is_blankable(&self) -> bool {
        self.blank
    }
}

impl Field for StrField {
    type Output = String;

    fn kind(&self) -> &'static str {
        "StrField"
    }

    fn convert(&self, raw: &Value) -> Result<String, ConversionError> {
        let text = match raw {
            Value::Str(s) => s.clone(),
            Value::Bytes(b) => String::from_utf8(b.clone())?,
            Value::Bool(_)
            | Value::Int(_)
            | Value::Float(_)
            | Value::Date(_)
            | Value::Time(_)
            | Value::DateTime(_) => raw.to_string(),
            other => return Err(ConversionError::unexpected("string", other)),
        };

        let text = if self.strip {
            text.trim().to_string()
        } else {
            text
        };

        if self.multiline {
            return Ok(text);
        }
        Ok(LINEBREAK
            .replace_all(&text, NoExpand(&self.linebreak_replacement))
            .into_owned())
    }

    fn validate(&self, value: &String) -> Result<(), ValidationError> {
        if value.chars().all(char::is_whitespace) {
            if self.blank {
                return Ok(());
            }
            return Err(self.validation_error(
                value,
                "This field can not be blank.".to_string(),
                ErrorCode::Blank,
            ));
        }

        if let Some(pattern) = &self.pattern
            && !pattern.find(value).is_some_and(|m| m.start() == 0)
        {
            return Err(self.validation_error(
                value,
                format!("The value must match: {}", pattern.as_str()),
                ErrorCode::Pattern,
            ));
        }

        self.length
            .check(value.chars().count())
            .and_then(|()| check_one_of(value, self.one_of.as_deref()))
            .map_err(|v| self.validation_error(value, v.message, v.code))
    }

    fn options(&self) -> &FieldOptions<String> {
        &self.options
    }

    fn options_mut(&mut self) -> &mut FieldOptions<String> {
        &mut self.options
    }
}

/// A boolean field taking the truthiness of any value.
#[derive(Debug, Clone, Default)]
pub struct BoolField {
    options: FieldOptions<bool>,
}

impl BoolField {
    /// Creates a boolean field.
    pub fn new() -> Self {
        Default::default()
    }
}

impl Field for BoolField {
    type Output = bool;

    fn kind(&self) -> &'static str {
        "BoolField"
    }

    fn convert(&self, raw: &Value) -> Result<bool, ConversionError> {
        Ok(raw.is_truthy())
    }

    fn validate(&self, _value: &bool) -> Result<(), ValidationError> {
        Ok(())
    }

    fn options(&self) -> &FieldOptions<bool> {
        &self.options
    }

    fn options_mut(&mut self) -> &mut FieldOptions<bool> {
        &mut self.options
    }
}
