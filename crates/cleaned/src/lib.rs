//! # Cleaned
//!
//! Declarative validation and normalization of untyped records.
//!
//! Describe a record as typed fields with checks, then construct it from
//! raw input (a `serde_json` document, or any [`Value`] mapping). The result
//! is either an immutable [`Record`] or a [`ValidationError`] listing every
//! problem at once, nested by field name.
//!
//! ## Example
//!
//! ```rust
//! use cleaned::prelude::*;
//! use serde_json::json;
//!
//! let signup = RecordType::builder("Signup")
//!     .field("name", Str::new(false).max_length(20))
//!     .field("age", Int::new().gte(0).opt())
//!     .field("password", Str::new(false).min_length(8))
//!     .field("confirm", Str::new(false))
//!     .property(
//!         "matching",
//!         on_field("confirm").constraint(["password"], |v| {
//!             if v.get_as::<String>("confirm") != v.get_as::<String>("password") {
//!                 return Err(ValidationError::message("Passwords do not match"));
//!             }
//!             Ok(())
//!         }),
//!     )
//!     .build()?;
//!
//! let record = signup.construct(json!({
//!     "name": " Ada ",
//!     "password": "correct horse",
//!     "confirm": "correct horse",
//! }))?;
//! assert_eq!(record.get_as::<String>("name").as_deref(), Some("Ada"));
//! assert_eq!(record.get("age"), Some(&Value::Null));
//!
//! let error = signup
//!     .construct(json!({"name": "", "password": "short", "confirm": "other"}))
//!     .unwrap_err();
//! assert_eq!(error.get("name").unwrap().to_flat_codes(), vec![ErrorCode::Blank]);
//! assert_eq!(error.get("password").unwrap().to_flat_codes(), vec![ErrorCode::MinLength]);
//! assert!(!error.contains_key("confirm"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The `matching` constraint is skipped above: `password` failed, so the
//! comparison has nothing valid to compare against.

pub use cleaned_core::*;
pub use cleaned_fields::*;

/// Text field.
pub type Str = StrField;
/// Boolean field.
pub type Bool = BoolField;
/// Integer field.
pub type Int = IntField;
/// Float field.
pub type Float = FloatField;
/// Time-of-day field.
pub type Time = TimeField;
/// Date field.
pub type Date = DateField;
/// Date-time field.
pub type Datetime = DatetimeField;
/// Either-or field.
pub type Either<A, B> = EitherField<A, B>;
/// List field.
pub type List<F> = ListField<F>;
/// Set field.
pub type Set<F> = SetField<F>;
/// Dictionary field.
pub type Dict<V, K = StrField> = DictField<V, K>;
/// Record-valued field.
pub type Nested = NestedField;
/// Enumeration field.
pub type Enum<E> = EnumField<E>;
/// Discriminator field of a tagged union.
pub type Tag = TagField;

/// Everything needed to declare and construct records.
pub mod prelude {
    pub use crate::{
        Bool, Choice, Date, Datetime, DefinitionError, Dict, Either, Enum, ErrorCode, Field,
        Float, Int, List, Nested, Raw, Record, RecordType, Set, Str, Tag, TaggedUnion, Time,
        ValidationError, Value, cleaned_property, constraint, on_field,
    };
}
