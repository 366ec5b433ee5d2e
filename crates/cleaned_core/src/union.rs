//! Tagged unions: choosing a record type from a discriminator value.

use crate::{
    ConversionError, DefinitionError, ErrorCode, Field, FieldOptions, Map, Record,
    RecordType, ValidationError, Value,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// A string field restricted to a fixed set of tags.
///
/// Used as the discriminator of record types taking part in a
/// [`TaggedUnion`]. The tag set must be non-empty, with unique non-empty
/// tags; this is checked when the owning record type is built.
#[derive(Debug, Clone)]
pub struct TagField {
    tags: Vec<String>,
    options: FieldOptions<String>,
}

impl TagField {
    /// Creates a tag field accepting `tags`.
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
            options: FieldOptions::default(),
        }
    }

    /// Accepted tags in declaration order.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub(crate) fn check(&self) -> Result<(), String> {
        if self.tags.is_empty() {
            return Err("no tags given".to_string());
        }
        let mut seen = BTreeSet::new();
        for tag in &self.tags {
            if tag.is_empty() {
                return Err("tags must not be empty".to_string());
            }
            if !seen.insert(tag.as_str()) {
                return Err(format!("tag `{}` is given more than once", tag));
            }
        }
        Ok(())
    }
}

impl Field for TagField {
    type Output = String;

    fn kind(&self) -> &'static str {
        "TagField"
    }

    fn convert(&self, raw: &Value) -> Result<String, ConversionError> {
        raw.as_str()
            .map(str::to_string)
            .ok_or_else(|| ConversionError::unexpected("string", raw))
    }

    fn validate(&self, value: &String) -> Result<(), ValidationError> {
        if self.tags.contains(value) {
            return Ok(());
        }
        Err(self.validation_error(
            value,
            format!("The value must be one of {}.", self.tags.join(", ")),
            ErrorCode::OneOf,
        ))
    }

    fn options(&self) -> &FieldOptions<String> {
        &self.options
    }

    fn options_mut(&mut self) -> &mut FieldOptions<String> {
        &mut self.options
    }
}

/// Dispatches construction to one of several record types by tag.
///
/// Every member declares a [`TagField`] under the discriminator name; the
/// tag found in the raw input selects the member that constructs the record.
///
/// ```rust,ignore
/// let shape = TaggedUnion::new("type", [circle, square])?.with_fallback("circle")?;
/// let record = shape.construct(json!({"type": "square", "side": 2}))?;
/// ```
#[derive(Debug, Clone)]
pub struct TaggedUnion {
    discriminator: String,
    members: Vec<RecordType>,
    by_tag: BTreeMap<String, usize>,
    fallback: Option<String>,
}

impl TaggedUnion {
    /// Creates a union over `members`, discriminated by `discriminator`.
    ///
    /// Members given more than once are kept once.
    ///
    /// # Errors
    ///
    /// Fails when there are no members, when a member has no tag field under
    /// the discriminator name, or when two members share a tag.
    pub fn new<I>(discriminator: impl Into<String>, members: I) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = RecordType>,
    {
        let discriminator = discriminator.into();
        let mut unique: Vec<RecordType> = Vec::new();
        let mut by_tag: BTreeMap<String, usize> = BTreeMap::new();

        for member in members {
            if unique.iter().any(|known| known.same_type(&member)) {
                continue;
            }

            let tag_field = member
                .field(&discriminator)
                .and_then(|field| field.as_any().downcast_ref::<TagField>())
                .ok_or_else(|| DefinitionError::MissingDiscriminator {
                    record: member.name().to_string(),
                    discriminator: discriminator.clone(),
                })?;

            let index = unique.len();
            for tag in tag_field.tags() {
                if let Some(&first) = by_tag.get(tag) {
                    return Err(DefinitionError::DuplicateTag {
                        tag: tag.clone(),
                        first: unique[first].name().to_string(),
                        second: member.name().to_string(),
                    });
                }
                by_tag.insert(tag.clone(), index);
            }
            unique.push(member);
        }

        if unique.is_empty() {
            return Err(DefinitionError::EmptyUnion);
        }

        Ok(Self {
            discriminator,
            members: unique,
            by_tag,
            fallback: None,
        })
    }

    /// Selects the member used when the discriminator is absent or null.
    ///
    /// # Errors
    ///
    /// Fails when `tag` is not mapped to a member.
    pub fn with_fallback(mut self, tag: impl Into<String>) -> Result<Self, DefinitionError> {
        let tag = tag.into();
        if !self.by_tag.contains_key(&tag) {
            return Err(DefinitionError::UnknownFallback(tag));
        }
        self.fallback = Some(tag);
        Ok(self)
    }

    /// The discriminator key.
    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    /// The fallback tag, if any.
    pub fn fallback(&self) -> Option<&str> {
        self.fallback.as_deref()
    }

    /// Every mapped tag, sorted.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.by_tag.keys().map(String::as_str)
    }

    /// Distinct member types in declaration order.
    pub fn members(&self) -> &[RecordType] {
        &self.members
    }

    /// The member mapped to `tag`.
    pub fn member(&self, tag: &str) -> Option<&RecordType> {
        self.by_tag.get(tag).map(|&index| &self.members[index])
    }

    /// Constructs a record of the member selected by the input's tag.
    ///
    /// # Errors
    ///
    /// Returns a single unnested `one_of` failure when no member matches,
    /// and otherwise exactly the failures of the selected member.
    pub fn construct(&self, input: impl Into<Value>) -> Result<Record, ValidationError> {
        self.construct_value(&input.into())
    }

    /// Like [`construct`](Self::construct), borrowing the input.
    pub fn construct_value(&self, input: &Value) -> Result<Record, ValidationError> {
        match input {
            Value::Map(map) => self.construct_map(map),
            Value::Record(record) => self.construct_map(&record.to_map()),
            other => Err(ValidationError::new(
                format!("Failed to construct a tagged union from a {}", other.type_name()),
                ErrorCode::Conversion,
            )),
        }
    }

    /// Constructs from a raw mapping.
    pub fn construct_map(&self, input: &Map) -> Result<Record, ValidationError> {
        let key = Value::Str(self.discriminator.clone());
        let tag = match input.get(&key) {
            None | Some(Value::Null) => Value::Str(self.fallback.clone().unwrap_or_default()),
            Some(tag) => tag.clone(),
        };

        let Some(member) = tag.as_str().and_then(|tag| self.member(tag)) else {
            debug!(discriminator = %self.discriminator, tag = %tag, "could not determine union member");
            return Err(ValidationError::new(
                format!("Could not determine the type from `{}`", tag),
                ErrorCode::OneOf,
            ));
        };
        debug!(
            discriminator = %self.discriminator,
            tag = %tag,
            record = member.name(),
            "dispatching tagged union"
        );

        let mut input = input.clone();
        input.insert(key, tag);
        member.construct_map(&input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::tests::Num;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn circle() -> RecordType {
        RecordType::builder("Circle")
            .field("type", TagField::new(["circle", "round"]))
            .field("radius", Num::new())
            .build()
            .unwrap()
    }

    fn square() -> RecordType {
        RecordType::builder("Square")
            .field("type", TagField::new(["square"]))
            .field("side", Num::new().max(100))
            .build()
            .unwrap()
    }

    fn shapes() -> TaggedUnion {
        TaggedUnion::new("type", [circle(), square()]).unwrap()
    }

    #[test]
    fn test_dispatch_by_tag() {
        let record = shapes().construct(json!({"type": "square", "side": 4})).unwrap();
        assert_eq!(record.record_type().name(), "Square");
        assert_eq!(record.get_as::<String>("type"), Some("square".to_string()));

        let record = shapes().construct(json!({"type": "round", "radius": 1})).unwrap();
        assert_eq!(record.record_type().name(), "Circle");
    }

    #[test]
    fn test_member_errors_pass_through() {
        let union = shapes();
        let input = json!({"type": "square", "side": 500});

        let via_union = union.construct(input.clone()).unwrap_err();
        let direct = union.member("square").unwrap().construct(input).unwrap_err();
        assert_eq!(via_union, direct);
        assert!(via_union.contains_key("side"));
    }

    #[test]
    fn test_unmapped_tag() {
        let err = shapes().construct(json!({"type": "triangle"})).unwrap_err();
        assert_eq!(err.to_flat_codes(), vec![ErrorCode::OneOf]);
        assert_eq!(err.nested_len(), 0);
        assert_eq!(err.items()[0].message, "Could not determine the type from `triangle`");

        let err = shapes().construct(json!({"type": 3})).unwrap_err();
        assert_eq!(err.nested_len(), 0);
    }

    #[test]
    fn test_fallback() {
        let err = shapes().construct(json!({"radius": 1})).unwrap_err();
        assert_eq!(err.items()[0].message, "Could not determine the type from ``");

        let union = shapes().with_fallback("circle").unwrap();
        let record = union.construct(json!({"type": null, "radius": 2})).unwrap();
        assert_eq!(record.get_as::<String>("type"), Some("circle".to_string()));
    }

    #[test]
    fn test_unknown_fallback() {
        let err = shapes().with_fallback("hexagon").unwrap_err();
        assert_eq!(err, DefinitionError::UnknownFallback("hexagon".to_string()));
    }

    #[test]
    fn test_duplicate_tags_rejected() {
        let other = RecordType::builder("Ring")
            .field("type", TagField::new(["round"]))
            .build()
            .unwrap();

        let err = TaggedUnion::new("type", [circle(), other]).unwrap_err();
        assert_eq!(
            err,
            DefinitionError::DuplicateTag {
                tag: "round".to_string(),
                first: "Circle".to_string(),
                second: "Ring".to_string(),
            }
        );
    }

    #[test]
    fn test_same_member_deduplicated() {
        let circle = circle();
        let union = TaggedUnion::new("type", [circle.clone(), circle, square()]).unwrap();
        assert_eq!(union.members().len(), 2);
        assert_eq!(union.tags().collect::<Vec<_>>(), vec!["circle", "round", "square"]);
    }

    #[test]
    fn test_member_without_tag_field() {
        let plain = RecordType::builder("Plain")
            .field("type", Num::new())
            .build()
            .unwrap();

        let err = TaggedUnion::new("type", [plain]).unwrap_err();
        assert!(matches!(err, DefinitionError::MissingDiscriminator { .. }));
        assert_eq!(
            TaggedUnion::new("type", Vec::new()).unwrap_err(),
            DefinitionError::EmptyUnion
        );
    }

    #[test]
    fn test_invalid_tag_sets() {
        for tags in [vec![], vec![""], vec!["a", "a"]] {
            let err = RecordType::builder("R")
                .field("type", TagField::new(tags))
                .build()
                .unwrap_err();
            assert!(matches!(err, DefinitionError::InvalidTags { .. }));
        }
    }

    #[test]
    fn test_tag_field_one_of() {
        let field = TagField::new(["a", "b"]);
        let raw = Value::from("c");
        let err = field.clean(crate::Raw::Given(&raw)).unwrap_err();
        assert_eq!(err.to_flat_codes(), vec![ErrorCode::OneOf]);
        assert_eq!(err.items()[0].message, "The value must be one of a, b.");
    }
}
