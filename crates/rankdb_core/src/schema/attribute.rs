use std::fmt;

use serde::{Deserialize, Serialize};

use crate::values::DataType;

/// A named, typed column of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub datatype: DataType,
}

impl Attribute {
    pub fn new(name: impl Into<String>, datatype: DataType) -> Self {
        Attribute {
            name: name.into(),
            datatype,
        }
    }

    /// Name-only equality, ignoring the domain.
    ///
    /// Used by join collision detection, where two attributes with the same
    /// name are a collision even when their domains differ.
    pub fn name_eq(&self, other: &Attribute) -> bool {
        self.name == other.name
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.datatype)
    }
}
