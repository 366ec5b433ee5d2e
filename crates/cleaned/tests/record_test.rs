//! End-to-end record construction through the public API.
//!
//! Covers partial-failure aggregation, defaults, optional fields,
//! inheritance, replacement and serialization.

use cleaned::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;

fn person() -> RecordType {
    RecordType::builder("Person")
        .field("name", Str::new(false).max_length(10))
        .field("age", Int::new().gte(0).lte(150))
        .field("email", Str::new(false).opt())
        .field("tags", List::new(Str::new(false)).default(Vec::new()))
        .build()
        .unwrap()
}

#[test]
fn test_every_field_failure_is_reported() {
    let err = person()
        .construct(json!({"name": "", "age": 200, "tags": [" ", "ok", ""]}))
        .unwrap_err();

    assert!(err.items().is_empty());
    assert_eq!(err.nested().map(|(k, _)| k).collect::<Vec<_>>(), vec!["name", "age", "tags"]);
    assert_eq!(err.get("name").unwrap().to_flat_codes(), vec![ErrorCode::Blank]);
    assert_eq!(err.get("age").unwrap().to_flat_codes(), vec![ErrorCode::Lte]);

    let tags = err.get("tags").unwrap();
    assert_eq!(tags.nested().map(|(k, _)| k).collect::<Vec<_>>(), vec!["0", "2"]);
    assert_eq!(
        err.to_flat_codes(),
        vec![ErrorCode::Blank, ErrorCode::Lte, ErrorCode::Blank, ErrorCode::Blank]
    );
}

#[test]
fn test_defaults_and_optional() {
    let record = person().construct(json!({"name": "Ada", "age": "36"})).unwrap();

    assert_eq!(record.get_as::<i64>("age"), Some(36));
    assert_eq!(record.get("email"), Some(&Value::Null));
    assert_eq!(record.get_as::<Vec<String>>("tags"), Some(vec![]));
    assert_eq!(
        record.to_string(),
        "<Person (name: Ada, age: 36, email: null, tags: [])>"
    );
}

#[test]
fn test_explicit_null_needs_optional() {
    let err = person()
        .construct(json!({"name": "Ada", "age": null}))
        .unwrap_err();
    assert_eq!(err.get("age").unwrap().to_flat_codes(), vec![ErrorCode::Conversion]);

    let record = person()
        .construct(json!({"name": "Ada", "age": 1, "email": null}))
        .unwrap();
    assert_eq!(record.get("email"), Some(&Value::Null));
}

#[test]
fn test_non_mapping_input() {
    let err = person().construct(json!([1, 2])).unwrap_err();

    assert_eq!(err.to_flat_codes(), vec![ErrorCode::Conversion]);
    assert_eq!(err.nested_len(), 0);
}

#[test]
fn test_inheritance() {
    let employee = RecordType::builder("Employee")
        .extends(&person())
        .field("salary", Float::new().gt(0.0))
        .build()
        .unwrap();

    assert_eq!(
        employee.field_names().collect::<Vec<_>>(),
        vec!["name", "age", "email", "tags", "salary"]
    );

    let err = employee.construct(json!({"name": "Bob", "age": 40})).unwrap_err();
    assert_eq!(err.nested().map(|(k, _)| k).collect::<Vec<_>>(), vec!["salary"]);

    let duplicate = RecordType::builder("Broken")
        .extends(&person())
        .field("age", Int::new())
        .build()
        .unwrap_err();
    assert!(matches!(duplicate, DefinitionError::DuplicateName { .. }));
}

#[test]
fn test_replace_and_round_trip() {
    let original = person().construct(json!({"name": "Ada", "age": 36})).unwrap();

    let older = original.replace(json!({"age": 37})).unwrap();
    assert_eq!(older.get_as::<i64>("age"), Some(37));
    assert_eq!(original.get_as::<i64>("age"), Some(36));
    assert_eq!(older.get_as::<String>("name").as_deref(), Some("Ada"));

    let err = original.replace(json!({"age": -1})).unwrap_err();
    assert_eq!(err.get("age").unwrap().to_flat_codes(), vec![ErrorCode::Gte]);

    let again = person().construct(original.to_input()).unwrap();
    assert_eq!(again, original);
}

#[test]
fn test_serialize() {
    let record = person()
        .construct(json!({"name": "Ada", "age": 36, "tags": ["x"]}))
        .unwrap();

    assert_eq!(
        serde_json::to_value(&record).unwrap(),
        json!({"name": "Ada", "age": 36, "email": null, "tags": ["x"]})
    );

    let err = person().construct(json!({"age": "old"})).unwrap_err();
    assert_eq!(
        serde_json::to_value(&err).unwrap(),
        json!({
            "items": [],
            "nested": {
                "name": {"items": [{"message": "This field is required", "code": "required"}], "nested": {}},
                "age": {"items": [{"message": "Failed to convert `old` for IntField", "code": "conversion"}], "nested": {}}
            }
        })
    );
}

#[test]
fn test_producer_default_runs_per_construction() {
    use std::sync::atomic::{AtomicI64, Ordering};
    static NEXT: AtomicI64 = AtomicI64::new(1);

    let ticket = RecordType::builder("Ticket")
        .field("id", Int::new().default_with(|| NEXT.fetch_add(1, Ordering::SeqCst)))
        .build()
        .unwrap();

    let first = ticket.construct(json!({})).unwrap();
    let second = ticket.construct(json!({})).unwrap();
    let given = ticket.construct(json!({"id": 99})).unwrap();

    assert_eq!(first.get_as::<i64>("id"), Some(1));
    assert_eq!(second.get_as::<i64>("id"), Some(2));
    assert_eq!(given.get_as::<i64>("id"), Some(99));
}
