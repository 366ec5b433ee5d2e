//! Record type definitions.
//!
//! A [`RecordType`] is built once by a [`RecordBuilder`]: inherited
//! declarations first, then its own fields and properties. Every name is
//! checked for uniqueness and every property dependency is resolved at
//! build time, so construction never has to look anything up lazily.

use crate::{DefinitionError, DynField, Field, Property, PropertyKind, TagField, Value};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

pub(crate) struct FieldSlot {
    pub(crate) name: String,
    pub(crate) key: Value,
    pub(crate) field: Arc<dyn DynField>,
}

pub(crate) struct PropertySlot {
    pub(crate) name: String,
    pub(crate) property: Property,
    /// Direct and transitive dependency names, resolved at build time
    pub(crate) requires: BTreeSet<String>,
}

pub(crate) struct Schema {
    pub(crate) name: String,
    pub(crate) fields: Vec<FieldSlot>,
    pub(crate) properties: Vec<PropertySlot>,
    /// Working-data slot per name: fields first, then properties
    pub(crate) slots: HashMap<String, usize>,
    /// Names kept on a constructed record, in declaration order
    pub(crate) stored: Vec<String>,
    pub(crate) stored_index: HashMap<String, usize>,
}

/// A record type: an ordered set of fields plus computed properties.
///
/// Cloning is cheap and clones share identity.
///
/// # Example
///
/// ```rust,ignore
/// let point = RecordType::builder("Point")
///     .field("x", IntField::new())
///     .field("y", IntField::new().default(0))
///     .property("sum", cleaned_property(["x", "y"], |v| {
///         Ok(v.get_as::<i64>("x") + v.get_as::<i64>("y"))
///     }))
///     .build()?;
/// ```
#[derive(Clone)]
pub struct RecordType {
    pub(crate) schema: Arc<Schema>,
}

impl RecordType {
    /// Starts a new record type definition.
    pub fn builder(name: impl Into<String>) -> RecordBuilder {
        RecordBuilder::new(name)
    }

    /// The record type name.
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.schema.fields.iter().map(|slot| slot.name.as_str())
    }

    /// Property and constraint names in declaration order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.schema.properties.iter().map(|slot| slot.name.as_str())
    }

    /// Names stored on constructed records, in order.
    pub fn stored_names(&self) -> impl Iterator<Item = &str> {
        self.schema.stored.iter().map(String::as_str)
    }

    /// Looks up a declared field.
    pub fn field(&self, name: &str) -> Option<&dyn DynField> {
        self.schema
            .fields
            .iter()
            .find(|slot| slot.name == name)
            .map(|slot| slot.field.as_ref())
    }

    /// Looks up a declared property or constraint.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.schema
            .properties
            .iter()
            .find(|slot| slot.name == name)
            .map(|slot| &slot.property)
    }

    /// Resolved dependency names of a property.
    pub fn requirements(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.schema
            .properties
            .iter()
            .find(|slot| slot.name == name)
            .map(|slot| &slot.requires)
    }

    /// Returns true if both handles refer to the same definition.
    pub fn same_type(&self, other: &RecordType) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema)
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.schema.name)
            .field("fields", &self.field_names().collect::<Vec<_>>())
            .field("properties", &self.property_names().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for creating a [`RecordType`].
pub struct RecordBuilder {
    name: String,
    bases: Vec<RecordType>,
    fields: Vec<(String, Arc<dyn DynField>)>,
    properties: Vec<(String, Property)>,
}

impl RecordBuilder {
    /// Creates a builder for a record type called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bases: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Inherits every field and property of `base`, ahead of own declarations.
    pub fn extends(mut self, base: &RecordType) -> Self {
        self.bases.push(base.clone());
        self
    }

    /// Declares a field.
    pub fn field(mut self, name: impl Into<String>, field: impl Field) -> Self {
        self.fields.push((name.into(), Arc::new(field)));
        self
    }

    /// Declares a computed property or constraint.
    pub fn property(mut self, name: impl Into<String>, property: Property) -> Self {
        self.properties.push((name.into(), property));
        self
    }

    /// Builds the record type.
    ///
    /// # Errors
    ///
    /// Returns a [`DefinitionError`] for duplicate names, unresolvable
    /// dependencies, properties attached to unknown fields, or invalid tag
    /// fields.
    pub fn build(self) -> Result<RecordType, DefinitionError> {
        let record = self.name;
        let duplicate = |name: &str| DefinitionError::DuplicateName {
            record: record.clone(),
            name: name.to_string(),
        };

        let mut fields: Vec<(String, Arc<dyn DynField>)> = Vec::new();
        let mut properties: Vec<(String, Property)> = Vec::new();
        let mut seen: BTreeSet<String> = BTreeSet::new();

        for base in &self.bases {
            for slot in &base.schema.fields {
                if seen.insert(slot.name.clone()) {
                    fields.push((slot.name.clone(), Arc::clone(&slot.field)));
                } else if !fields
                    .iter()
                    .any(|(n, f)| *n == slot.name && Arc::ptr_eq(f, &slot.field))
                {
                    return Err(duplicate(&slot.name));
                }
            }
            for slot in &base.schema.properties {
                if seen.insert(slot.name.clone()) {
                    properties.push((slot.name.clone(), slot.property.clone()));
                } else if !properties.iter().any(|(n, p)| {
                    *n == slot.name && Arc::ptr_eq(&p.compute, &slot.property.compute)
                }) {
                    return Err(duplicate(&slot.name));
                }
            }
        }

        for (name, field) in self.fields {
            if !seen.insert(name.clone()) {
                return Err(duplicate(&name));
            }
            fields.push((name, field));
        }
        for (name, property) in self.properties {
            if !seen.insert(name.clone()) {
                return Err(duplicate(&name));
            }
            properties.push((name, property));
        }

        for (name, field) in &fields {
            if let Some(tag) = field.as_any().downcast_ref::<TagField>() {
                tag.check().map_err(|reason| DefinitionError::InvalidTags {
                    record: record.clone(),
                    field: name.clone(),
                    reason,
                })?;
            }
        }

        let field_names: BTreeSet<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
        let mut resolved: Vec<PropertySlot> = Vec::with_capacity(properties.len());

        for (name, property) in properties {
            if let Some(key) = property.error_key()
                && !field_names.contains(key)
            {
                return Err(DefinitionError::UnknownField {
                    record: record.clone(),
                    property: name,
                    field: key.to_string(),
                });
            }

            let mut requires = BTreeSet::new();
            for dep in property.dependencies() {
                if field_names.contains(dep.as_str()) {
                    requires.insert(dep.clone());
                } else if let Some(earlier) = resolved.iter().find(|slot| slot.name == *dep) {
                    requires.insert(dep.clone());
                    requires.extend(earlier.requires.iter().cloned());
                } else {
                    return Err(DefinitionError::UnknownDependency {
                        record: record.clone(),
                        property: name,
                        dependency: dep.clone(),
                    });
                }
            }

            resolved.push(PropertySlot {
                name,
                property,
                requires,
            });
        }

        let fields: Vec<FieldSlot> = fields
            .into_iter()
            .map(|(name, field)| FieldSlot {
                key: Value::Str(name.clone()),
                name,
                field,
            })
            .collect();

        let slots: HashMap<String, usize> = fields
            .iter()
            .map(|slot| slot.name.clone())
            .chain(resolved.iter().map(|slot| slot.name.clone()))
            .enumerate()
            .map(|(index, name)| (name, index))
            .collect();

        let stored: Vec<String> = fields
            .iter()
            .map(|slot| slot.name.clone())
            .chain(
                resolved
                    .iter()
                    .filter(|slot| slot.property.kind() == PropertyKind::Computed)
                    .map(|slot| slot.name.clone()),
            )
            .collect();
        let stored_index = stored
            .iter()
            .enumerate()
            .map(|(index, name)| (name.clone(), index))
            .collect();

        Ok(RecordType {
            schema: Arc::new(Schema {
                name: record,
                fields,
                properties: resolved,
                slots,
                stored,
                stored_index,
            }),
        })
    }
}
