//! # Cleaned Core
//!
//! The cleaning engine behind `cleaned`.
//!
//! Callers describe a record as named, typed fields plus computed properties
//! and constraints. Constructing a record converts raw untyped input into
//! validated values, or fails with one structured error describing every
//! problem in the input.
//!
//! ## Key Concepts
//!
//! - **Field**: converts and validates one raw value, with an optional default
//! - **RecordType**: an ordered set of fields and properties, built once
//! - **Record**: an immutable, fully cleaned instance
//! - **Property**: a value or check derived from already cleaned names
//! - **ValidationError**: nested failures keyed by field name
//! - **TaggedUnion**: picks a record type from a discriminator value
//!
//! ## Example
//!
//! ```rust
//! use cleaned_core::{RecordType, TagField, ValidationError, constraint};
//! use serde_json::json;
//!
//! let kind = RecordType::builder("Kind")
//!     .field("kind", TagField::new(["a", "b"]))
//!     .property("not_b", constraint(["kind"], |v| {
//!         if v.get_as::<String>("kind") == "b" {
//!             return Err(ValidationError::message("b is reserved"));
//!         }
//!         Ok(())
//!     }))
//!     .build()
//!     .unwrap();
//!
//! let record = kind.construct(json!({"kind": "a"})).unwrap();
//! assert_eq!(record.get_as::<String>("kind").as_deref(), Some("a"));
//!
//! let error = kind.construct(json!({"kind": "b"})).unwrap_err();
//! assert_eq!(error.items()[0].message, "b is reserved");
//! ```

mod error;
mod field;
mod property;
mod record;
mod schema;
mod sentinel;
mod union;
mod value;

pub use error::*;
pub use field::*;
pub use property::*;
pub use record::*;
pub use schema::*;
pub use sentinel::*;
pub use union::*;
pub use value::*;
