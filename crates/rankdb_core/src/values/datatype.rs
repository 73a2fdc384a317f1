use std::fmt;

use serde::{Deserialize, Serialize};

/// Scalar domain tag for an attribute.
///
/// The engine supports a closed set of domains; unknown domains are rejected
/// at the schema boundary rather than at use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Bool,
    Int32,
    Int64,
    Float64,
    Utf8,
    /// Calendar date without a time component.
    Date,
}

impl DataType {
    /// Whether values of this domain have an ordering usable by `<`/`>`
    /// comparisons. `Bool` supports equality only.
    pub fn is_comparable(&self) -> bool {
        !matches!(self, DataType::Bool)
    }

    /// Whether the domain is numeric, which the linear similarity family
    /// requires.
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int32 | DataType::Int64 | DataType::Float64)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::Bool => "BOOL",
            DataType::Int32 => "INT32",
            DataType::Int64 => "INT64",
            DataType::Float64 => "FLOAT64",
            DataType::Utf8 => "UTF8",
            DataType::Date => "DATE",
        };
        write!(f, "{s}")
    }
}
