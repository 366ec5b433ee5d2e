//! The "no value supplied" marker.

use crate::Value;

/// Raw input for one key, distinguishing "absent" from an explicit null.
///
/// `Raw::Undefined` is the only way to say that nothing was supplied;
/// `Raw::Given(&Value::Null)` is a supplied null. Cleaned records never
/// store `Undefined`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Raw<'a> {
    /// No value was supplied for the key
    Undefined,
    /// A value (possibly null) was supplied
    Given(&'a Value),
}

impl<'a> Raw<'a> {
    /// Returns true for the absent marker.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Raw::Undefined)
    }

    /// Returns true for a supplied null.
    pub fn is_null(&self) -> bool {
        matches!(self, Raw::Given(Value::Null))
    }

    /// Returns the supplied value, if any.
    pub fn value(&self) -> Option<&'a Value> {
        match self {
            Raw::Undefined => None,
            Raw::Given(v) => Some(v),
        }
    }
}

impl<'a> From<Option<&'a Value>> for Raw<'a> {
    fn from(value: Option<&'a Value>) -> Self {
        value.map_or(Raw::Undefined, Raw::Given)
    }
}

impl<'a> From<&'a Value> for Raw<'a> {
    fn from(value: &'a Value) -> Self {
        Raw::Given(value)
    }
}
