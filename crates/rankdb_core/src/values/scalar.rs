use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use rankdb_error::{ErrorKind, RankError, Result};
use serde::{Deserialize, Serialize};

use crate::values::DataType;

/// Totally ordered, NaN-free float payload for [`ScalarValue::Float64`].
///
/// NaN is rejected at construction so that value equality (the table dedup
/// key) and ordering comparisons never hit a partial case.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct TotalF64(f64);

impl TotalF64 {
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() {
            return Err(RankError::new(
                ErrorKind::TypeSchemaMismatch,
                "NaN is not a valid FLOAT64 value",
            ));
        }
        Ok(TotalF64(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl PartialEq for TotalF64 {
    fn eq(&self, other: &Self) -> bool {
        f64::total_cmp(&self.0, &other.0).is_eq()
    }
}

impl Eq for TotalF64 {}

impl PartialOrd for TotalF64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(f64::total_cmp(&self.0, &other.0))
    }
}

impl Ord for TotalF64 {
    fn cmp(&self, other: &Self) -> Ordering {
        f64::total_cmp(&self.0, &other.0)
    }
}

impl Hash for TotalF64 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state)
    }
}

/// An owned scalar value of one of the supported domains.
///
/// Ordering is only meaningful within a single domain; condition validation
/// guarantees the engine never compares values across domains.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScalarValue {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float64(TotalF64),
    Utf8(String),
    Date(NaiveDate),
}

impl ScalarValue {
    /// Construct a FLOAT64 value, rejecting NaN.
    pub fn float64(value: f64) -> Result<Self> {
        Ok(ScalarValue::Float64(TotalF64::new(value)?))
    }

    pub fn datatype(&self) -> DataType {
        match self {
            ScalarValue::Bool(_) => DataType::Bool,
            ScalarValue::Int32(_) => DataType::Int32,
            ScalarValue::Int64(_) => DataType::Int64,
            ScalarValue::Float64(_) => DataType::Float64,
            ScalarValue::Utf8(_) => DataType::Utf8,
            ScalarValue::Date(_) => DataType::Date,
        }
    }

    pub fn try_as_bool(&self) -> Result<bool> {
        match self {
            ScalarValue::Bool(v) => Ok(*v),
            other => Err(type_mismatch(DataType::Bool, other)),
        }
    }

    pub fn try_as_i32(&self) -> Result<i32> {
        match self {
            ScalarValue::Int32(v) => Ok(*v),
            other => Err(type_mismatch(DataType::Int32, other)),
        }
    }

    pub fn try_as_i64(&self) -> Result<i64> {
        match self {
            ScalarValue::Int64(v) => Ok(*v),
            other => Err(type_mismatch(DataType::Int64, other)),
        }
    }

    pub fn try_as_f64(&self) -> Result<f64> {
        match self {
            ScalarValue::Float64(v) => Ok(v.value()),
            other => Err(type_mismatch(DataType::Float64, other)),
        }
    }

    pub fn try_as_str(&self) -> Result<&str> {
        match self {
            ScalarValue::Utf8(v) => Ok(v),
            other => Err(type_mismatch(DataType::Utf8, other)),
        }
    }

    pub fn try_as_date(&self) -> Result<NaiveDate> {
        match self {
            ScalarValue::Date(v) => Ok(*v),
            other => Err(type_mismatch(DataType::Date, other)),
        }
    }

    /// Numeric reading of the value, if the domain is numeric.
    pub fn numeric_value(&self) -> Option<f64> {
        match self {
            ScalarValue::Int32(v) => Some(*v as f64),
            ScalarValue::Int64(v) => Some(*v as f64),
            ScalarValue::Float64(v) => Some(v.value()),
            _ => None,
        }
    }
}

fn type_mismatch(want: DataType, got: &ScalarValue) -> RankError {
    RankError::new(ErrorKind::TypeSchemaMismatch, "unexpected value type")
        .with_field("want", want)
        .with_field("got", got.datatype())
}

impl From<bool> for ScalarValue {
    fn from(v: bool) -> Self {
        ScalarValue::Bool(v)
    }
}

impl From<i32> for ScalarValue {
    fn from(v: i32) -> Self {
        ScalarValue::Int32(v)
    }
}

impl From<i64> for ScalarValue {
    fn from(v: i64) -> Self {
        ScalarValue::Int64(v)
    }
}

impl From<&str> for ScalarValue {
    fn from(v: &str) -> Self {
        ScalarValue::Utf8(v.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(v: String) -> Self {
        ScalarValue::Utf8(v)
    }
}

impl From<NaiveDate> for ScalarValue {
    fn from(v: NaiveDate) -> Self {
        ScalarValue::Date(v)
    }
}

impl TryFrom<f64> for ScalarValue {
    type Error = RankError;

    fn try_from(v: f64) -> Result<Self> {
        ScalarValue::float64(v)
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Bool(v) => write!(f, "{v}"),
            ScalarValue::Int32(v) => write!(f, "{v}"),
            ScalarValue::Int64(v) => write!(f, "{v}"),
            ScalarValue::Float64(v) => write!(f, "{}", v.value()),
            ScalarValue::Utf8(v) => write!(f, "{v}"),
            ScalarValue::Date(v) => write!(f, "{v}"),
        }
    }
}
