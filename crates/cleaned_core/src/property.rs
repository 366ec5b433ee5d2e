//! Computed properties and constraints.
//!
//! A property is a function of the partially built record, evaluated after
//! every field has been cleaned. It only sees the names it declares as
//! dependencies, and it is skipped entirely when one of them is missing.

use crate::{FromValue, ValidationError, Value};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

type Compute = Arc<dyn Fn(&View<'_>) -> Result<Value, ValidationError> + Send + Sync>;

/// Whether a property's result is kept on the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// The result is stored under the property's name
    Computed,
    /// Only the failure matters; nothing is stored
    Constraint,
}

/// A derived value or check declared on a record type.
#[derive(Clone)]
pub struct Property {
    pub(crate) kind: PropertyKind,
    pub(crate) dependencies: Vec<String>,
    pub(crate) error_key: Option<String>,
    pub(crate) compute: Compute,
}

impl Property {
    /// Computed or constraint.
    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    /// Names of the declared dependencies, in declaration order.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Key under which failures are filed, if attached to a field.
    pub fn error_key(&self) -> Option<&str> {
        self.error_key.as_deref()
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("kind", &self.kind)
            .field("dependencies", &self.dependencies)
            .field("error_key", &self.error_key)
            .finish_non_exhaustive()
    }
}

fn names<I, S>(deps: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    deps.into_iter().map(Into::into).collect()
}

fn computed<T, F>(dependencies: Vec<String>, error_key: Option<String>, f: F) -> Property
where
    T: Into<Value>,
    F: Fn(&View<'_>) -> Result<T, ValidationError> + Send + Sync + 'static,
{
    Property {
        kind: PropertyKind::Computed,
        dependencies,
        error_key,
        compute: Arc::new(move |view| f(view).map(Into::into)),
    }
}

fn checked<F>(dependencies: Vec<String>, error_key: Option<String>, f: F) -> Property
where
    F: Fn(&View<'_>) -> Result<(), ValidationError> + Send + Sync + 'static,
{
    Property {
        kind: PropertyKind::Constraint,
        dependencies,
        error_key,
        compute: Arc::new(move |view| f(view).map(|()| Value::Null)),
    }
}

/// Declares a computed property over `deps`.
///
/// Failures surface unnested on the record's own error list.
///
/// ```rust
/// use cleaned_core::{cleaned_property, PropertyKind};
///
/// let total = cleaned_property(["price", "quantity"], |v| {
///     Ok(v.get_as::<i64>("price") * v.get_as::<i64>("quantity"))
/// });
/// assert_eq!(total.kind(), PropertyKind::Computed);
/// assert_eq!(total.dependencies(), ["price", "quantity"]);
/// ```
pub fn cleaned_property<I, S, T, F>(deps: I, f: F) -> Property
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    T: Into<Value>,
    F: Fn(&View<'_>) -> Result<T, ValidationError> + Send + Sync + 'static,
{
    computed(names(deps), None, f)
}

/// Declares a constraint over `deps`; failures surface unnested.
pub fn constraint<I, S, F>(deps: I, f: F) -> Property
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    F: Fn(&View<'_>) -> Result<(), ValidationError> + Send + Sync + 'static,
{
    checked(names(deps), None, f)
}

/// Starts a property attached to a field.
///
/// The field becomes the first dependency and failures are filed under its
/// name.
pub fn on_field(name: impl Into<String>) -> FieldRef {
    FieldRef { name: name.into() }
}

/// A field name to attach properties to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    name: String,
}

impl FieldRef {
    /// The referenced field.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn dependencies<I, S>(&self, deps: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut all = vec![self.name.clone()];
        all.extend(names(deps));
        all
    }

    /// Computed property depending on this field and `deps`.
    pub fn cleaned_property<I, S, T, F>(&self, deps: I, f: F) -> Property
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        T: Into<Value>,
        F: Fn(&View<'_>) -> Result<T, ValidationError> + Send + Sync + 'static,
    {
        computed(self.dependencies(deps), Some(self.name.clone()), f)
    }

    /// Constraint depending on this field and `deps`.
    pub fn constraint<I, S, F>(&self, deps: I, f: F) -> Property
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&View<'_>) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        checked(self.dependencies(deps), Some(self.name.clone()), f)
    }
}

/// The record as seen by one property body.
///
/// Only declared dependencies are readable; reading any other name is a
/// bug in the property and panics.
pub struct View<'a> {
    pub(crate) record: &'a str,
    pub(crate) property: &'a str,
    pub(crate) allowed: &'a BTreeSet<String>,
    pub(crate) slots: &'a HashMap<String, usize>,
    pub(crate) values: &'a [Option<Value>],
}

impl View<'_> {
    /// Returns the value of a declared dependency.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not a declared dependency of the property.
    pub fn get(&self, name: &str) -> &Value {
        if !self.allowed.contains(name) {
            if self.slots.contains_key(name) {
                panic!(
                    "property '{}' of record '{}' read '{}' without declaring it as a dependency",
                    self.property, self.record, name
                );
            }
            panic!("record '{}' has no field or property named '{}'", self.record, name);
        }
        match self.slots.get(name).and_then(|&slot| self.values[slot].as_ref()) {
            Some(value) => value,
            None => panic!(
                "dependency '{}' of property '{}' has no value",
                name, self.property
            ),
        }
    }

    /// Returns a declared dependency as a Rust value.
    ///
    /// # Panics
    ///
    /// Panics on undeclared access or if the value has a different shape.
    pub fn get_as<T: FromValue>(&self, name: &str) -> T {
        let value = self.get(name);
        match T::from_value(value) {
            Some(typed) => typed,
            None => panic!(
                "'{}' holds a {} that cannot be read as {}",
                name,
                value.type_name(),
                std::any::type_name::<T>()
            ),
        }
    }

    /// Names readable by this property.
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }
}
