//! Record construction and record instances.
//!
//! Construction runs in two phases. Every field is cleaned first, collecting
//! failures per field name instead of stopping at the first one. Properties
//! then run in declaration order, each only when all of its resolved
//! dependencies produced a value. The result is all-or-nothing: either every
//! failure comes back in one [`ValidationError`], or an immutable [`Record`]
//! is returned.

use crate::schema::Schema;
use crate::{ErrorCode, Map, Raw, RecordType, ValidationError, Value, View};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::{debug, trace};

impl RecordType {
    /// Constructs a record from raw input.
    ///
    /// `input` must be a mapping (or an existing record, whose stored data is
    /// re-offered as input). Keys that are not declared are ignored.
    ///
    /// # Errors
    ///
    /// Returns every field, property and constraint failure at once.
    pub fn construct(&self, input: impl Into<Value>) -> Result<Record, ValidationError> {
        self.construct_value(&input.into())
    }

    /// Like [`construct`](Self::construct), borrowing the input.
    pub fn construct_value(&self, input: &Value) -> Result<Record, ValidationError> {
        match input {
            Value::Map(map) => self.construct_map(map),
            Value::Record(record) => self.construct_map(&record.to_map()),
            other => Err(ValidationError::new(
                format!(
                    "Failed to construct {} from a {}",
                    self.name(),
                    other.type_name()
                ),
                ErrorCode::Conversion,
            )),
        }
    }

    /// Constructs a record from a raw mapping.
    pub fn construct_map(&self, input: &Map) -> Result<Record, ValidationError> {
        let schema = &self.schema;
        let mut values: Vec<Option<Value>> = vec![None; schema.slots.len()];
        let mut errors = ValidationError::default();

        for (index, slot) in schema.fields.iter().enumerate() {
            match slot.field.clean_value(Raw::from(input.get(&slot.key))) {
                Ok(value) => values[index] = Some(value),
                Err(error) => errors.insert_nested(slot.name.clone(), error),
            }
        }

        let offset = schema.fields.len();
        for (index, slot) in schema.properties.iter().enumerate() {
            let present = slot
                .requires
                .iter()
                .filter(|name| schema.slots.get(*name).is_some_and(|&s| values[s].is_some()))
                .count();
            if present < slot.requires.len() {
                trace!(
                    record = %schema.name,
                    property = %slot.name,
                    missing = slot.requires.len() - present,
                    "skipping property with missing dependencies"
                );
                continue;
            }

            let view = View {
                record: &schema.name,
                property: &slot.name,
                allowed: &slot.requires,
                slots: &schema.slots,
                values: &values,
            };
            match (slot.property.compute)(&view) {
                Ok(value) => values[offset + index] = Some(value),
                Err(error) => match slot.property.error_key() {
                    Some(key) => errors.insert_nested(key, error),
                    None => errors.merge(error),
                },
            }
        }

        if !errors.is_empty() {
            debug!(
                record = %schema.name,
                failed = errors.nested_len(),
                unnested = errors.items().len(),
                "construction failed"
            );
            return Err(errors);
        }

        let stored = schema
            .stored
            .iter()
            .map(|name| {
                schema
                    .slots
                    .get(name)
                    .and_then(|&slot| values[slot].take())
                    .unwrap_or(Value::Null)
            })
            .collect();
        trace!(record = %schema.name, "constructed");

        Ok(Record {
            record_type: self.clone(),
            values: stored,
        })
    }
}

/// An immutable, fully cleaned record.
///
/// Holds a value for every field and every computed property whose
/// dependencies were satisfied. Changing a record means constructing a new
/// one, see [`Record::replace`].
#[derive(Clone)]
pub struct Record {
    record_type: RecordType,
    values: Arc<[Value]>,
}

impl Record {
    fn schema(&self) -> &Schema {
        &self.record_type.schema
    }

    /// The type this record was constructed by.
    pub fn record_type(&self) -> &RecordType {
        &self.record_type
    }

    /// Returns the stored value for a field or computed property.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema()
            .stored_index
            .get(name)
            .map(|&index| &self.values[index])
    }

    /// Returns a stored value as a Rust value.
    pub fn get_as<T: crate::FromValue>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(T::from_value)
    }

    /// Iterates over stored names and values in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema()
            .stored
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Snapshot of the stored data in declaration order.
    pub fn to_dict(&self) -> Vec<(String, Value)> {
        self.iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    /// The stored data as a raw mapping.
    pub fn to_map(&self) -> Map {
        self.iter()
            .map(|(name, value)| (Value::from(name), value.clone()))
            .collect()
    }

    /// The stored data as a value that can be offered as raw input.
    pub fn to_input(&self) -> Value {
        Value::Map(self.to_map())
    }

    /// Constructs a new record from this one's field values overlaid with `updates`.
    ///
    /// `self` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns the failures of the new construction.
    pub fn replace(&self, updates: impl Into<Value>) -> Result<Record, ValidationError> {
        let mut input: Map = self
            .schema()
            .fields
            .iter()
            .filter_map(|slot| self.get(&slot.name).map(|v| (slot.key.clone(), v.clone())))
            .collect();

        match updates.into() {
            Value::Map(updates) => input.extend(updates),
            other => {
                return Err(ValidationError::new(
                    format!("Failed to update {} from a {}", self.schema().name, other.type_name()),
                    ErrorCode::Conversion,
                ));
            }
        }
        self.record_type.construct_map(&input)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.schema().name == other.schema().name && self.iter().eq(other.iter())
    }
}

impl Eq for Record {}

impl PartialOrd for Record {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Record {
    fn cmp(&self, other: &Self) -> Ordering {
        self.schema()
            .name
            .cmp(&other.schema().name)
            .then_with(|| self.iter().cmp(other.iter()))
    }
}

impl Hash for Record {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.schema().name.hash(state);
        for (name, value) in self.iter() {
            name.hash(state);
            value.hash(state);
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} (", self.schema().name)?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        f.write_str(")>")
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(&self.schema().name);
        for (name, value) in self.iter() {
            s.field(name, value);
        }
        s.finish()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::tests::Num;
    use crate::{Field, cleaned_property, constraint, on_field};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    fn pair() -> RecordType {
        RecordType::builder("Pair")
            .field("a", Num::new().max(10))
            .field("b", Num::new().max(10))
            .build()
            .unwrap()
    }

    #[test]
    fn test_construct_success() {
        let record = pair().construct(json!({"a": 1, "b": "2", "extra": true})).unwrap();

        assert_eq!(record.get("a"), Some(&Value::Int(1)));
        assert_eq!(record.get_as::<i64>("b"), Some(2));
        assert_eq!(record.get("extra"), None);
        assert_eq!(record.to_string(), "<Pair (a: 1, b: 2)>");
    }

    #[test]
    fn test_all_fields_attempted() {
        let err = pair().construct(json!({"a": 11})).unwrap_err();

        assert!(err.items().is_empty());
        assert_eq!(err.get("a").unwrap().to_flat_codes(), vec![ErrorCode::Lte]);
        assert_eq!(err.get("b").unwrap().to_flat_codes(), vec![ErrorCode::Required]);

        let err = pair().construct(json!({"a": 1})).unwrap_err();
        assert!(!err.contains_key("a"));
        assert!(err.contains_key("b"));
    }

    #[test]
    fn test_non_mapping_input() {
        let err = pair().construct(5).unwrap_err();
        assert_eq!(err.to_flat_codes(), vec![ErrorCode::Conversion]);
        assert_eq!(err.nested_len(), 0);
    }

    #[test]
    fn test_property_gated_on_dependencies() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let ty = RecordType::builder("R")
            .field("x", Num::new())
            .field("y", Num::new())
            .property(
                "p",
                cleaned_property(["x", "y"], |_| {
                    CALLS.fetch_add(1, AtomicOrdering::SeqCst);
                    Err::<i64, _>(ValidationError::message("never"))
                }),
            )
            .build()
            .unwrap();

        let err = ty.construct(json!({"x": "bad", "y": 1})).unwrap_err();
        assert_eq!(err.nested().map(|(k, _)| k).collect::<Vec<_>>(), vec!["x"]);
        assert!(err.items().is_empty());

        let err = ty.construct(json!({"x": 1, "y": "bad"})).unwrap_err();
        assert_eq!(err.nested().map(|(k, _)| k).collect::<Vec<_>>(), vec!["y"]);
        assert_eq!(CALLS.load(AtomicOrdering::SeqCst), 0);
    }

    #[test]
    fn test_property_value_stored() {
        let ty = RecordType::builder("R")
            .field("x", Num::new())
            .field("y", Num::new().default(5))
            .property(
                "sum",
                cleaned_property(["x", "y"], |v| {
                    Ok(v.get_as::<i64>("x") + v.get_as::<i64>("y"))
                }),
            )
            .build()
            .unwrap();

        let record = ty.construct(json!({"x": 1})).unwrap();
        assert_eq!(
            record.to_dict(),
            vec![
                ("x".to_string(), Value::Int(1)),
                ("y".to_string(), Value::Int(5)),
                ("sum".to_string(), Value::Int(6)),
            ]
        );
    }

    #[test]
    fn test_unnested_and_keyed_failures() {
        let ty = RecordType::builder("Range")
            .field("start", Num::new())
            .field("end", Num::new())
            .property(
                "ordered",
                on_field("end").constraint(["start"], |v| {
                    if v.get_as::<i64>("end") < v.get_as::<i64>("start") {
                        return Err(ValidationError::message("end must not precede start"));
                    }
                    Ok(())
                }),
            )
            .property(
                "short",
                constraint(["start", "end"], |v| {
                    if v.get_as::<i64>("end") - v.get_as::<i64>("start") > 10 {
                        return Err(ValidationError::message("range too long"));
                    }
                    Ok(())
                }),
            )
            .build()
            .unwrap();

        let err = ty.construct(json!({"start": 5, "end": 1})).unwrap_err();
        assert!(err.items().is_empty());
        assert_eq!(err.get("end").unwrap().items()[0].code, None);

        let err = ty.construct(json!({"start": 0, "end": 20})).unwrap_err();
        assert_eq!(err.items()[0].message, "range too long");
        assert_eq!(err.nested_len(), 0);

        let record = ty.construct(json!({"start": 0, "end": 3})).unwrap();
        assert_eq!(record.get("ordered"), None);
        assert_eq!(record.get("short"), None);
    }

    #[test]
    fn test_failed_property_gates_dependents() {
        let ty = RecordType::builder("R")
            .field("x", Num::new())
            .property(
                "half",
                cleaned_property(["x"], |v| {
                    let x = v.get_as::<i64>("x");
                    if x % 2 != 0 {
                        return Err(ValidationError::message("odd"));
                    }
                    Ok(x / 2)
                }),
            )
            .property(
                "quarter",
                cleaned_property(["half"], |v| Ok(v.get_as::<i64>("half") / 2)),
            )
            .build()
            .unwrap();

        let err = ty.construct(json!({"x": 3})).unwrap_err();
        assert_eq!(err.items().len(), 1);

        let record = ty.construct(json!({"x": 8})).unwrap();
        assert_eq!(record.get_as::<i64>("quarter"), Some(2));
    }

    #[test]
    #[should_panic(expected = "without declaring it as a dependency")]
    fn test_undeclared_access_panics() {
        let ty = RecordType::builder("R")
            .field("x", Num::new())
            .field("y", Num::new())
            .property("p", cleaned_property(["x"], |v| Ok(v.get_as::<i64>("y"))))
            .build()
            .unwrap();

        let _ = ty.construct(json!({"x": 1, "y": 2}));
    }

    #[test]
    fn test_equality_and_round_trip() {
        let ty = pair();
        let first = ty.construct(json!({"a": 1, "b": 2})).unwrap();
        let second = ty.construct(first.clone()).unwrap();

        assert_eq!(first, second);
        assert_ne!(first, ty.construct(json!({"a": 1, "b": 3})).unwrap());
    }

    #[test]
    fn test_replace_builds_new_instance() {
        let original = pair().construct(json!({"a": 1, "b": 2})).unwrap();

        let updated = original.replace(json!({"b": 3})).unwrap();
        assert_eq!(updated.get_as::<i64>("b"), Some(3));
        assert_eq!(original.get_as::<i64>("b"), Some(2));

        let err = original.replace(json!({"a": 50})).unwrap_err();
        assert!(err.contains_key("a"));
    }

    #[test]
    fn test_snapshot_is_independent() {
        let record = pair().construct(json!({"a": 1, "b": 2})).unwrap();
        let mut snapshot = record.to_dict();
        snapshot[0].1 = Value::Int(100);

        assert_eq!(record.get_as::<i64>("a"), Some(1));
    }

    #[test]
    fn test_serialize_in_declaration_order() {
        let record = pair().construct(json!({"b": 2, "a": 1})).unwrap();
        let text = serde_json::to_string(&record).unwrap();
        assert_eq!(text, r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn test_optional_field_in_record() {
        let ty = RecordType::builder("R")
            .field("a", Num::new().opt())
            .build()
            .unwrap();

        let record = ty.construct(json!({})).unwrap();
        assert_eq!(record.get("a"), Some(&Value::Null));
        assert_eq!(record.get_as::<Option<i64>>("a"), Some(None));
    }
}
