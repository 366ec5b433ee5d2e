//! # Cleaned Fields
//!
//! Concrete [`Field`](cleaned_core::Field) implementations:
//!
//! - Text: [`StrField`], [`BoolField`]
//! - Numbers: [`IntField`], [`FloatField`]
//! - Time: [`TimeField`], [`DateField`], [`DatetimeField`]
//! - Containers: [`ListField`], [`SetField`], [`DictField`]
//! - Composition: [`EitherField`], [`NestedField`], [`EnumField`]
//!
//! Ordered fields take `lt`, `lte`, `gt`, `gte` and `one_of` checks;
//! strings and containers take `length`, `min_length` and `max_length`.
//!
//! ## Example
//!
//! ```rust
//! use cleaned_core::{Field, Raw, Value};
//! use cleaned_fields::{IntField, ListField};
//!
//! let field = ListField::new(IntField::new().gte(0)).max_length(3);
//! let raw = Value::from("[1, 2, 3]");
//! assert_eq!(field.clean(Raw::Given(&raw)).unwrap(), vec![1, 2, 3]);
//! ```

mod checks;
mod choice;
mod collection;
mod nested;
mod number;
mod temporal;
mod text;

pub use checks::{Bounds, Length, Violation, check_one_of};
pub use choice::*;
pub use collection::*;
pub use nested::*;
pub use number::*;
pub use temporal::*;
pub use text::*;
