use std::fmt;
use std::sync::Arc;

use rankdb_error::{ErrorKind, RankError, Result};

use crate::degree::Degree;
use crate::schema::Schema;
use crate::values::ScalarValue;

/// One graded tuple: typed values in schema order plus a membership degree.
///
/// Structurally immutable; [`Record::set`] and [`Record::with_degree`] return
/// new records. Construction checks arity and per-slot domain, so a `Record`
/// always agrees with its schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    schema: Arc<Schema>,
    values: Vec<ScalarValue>,
    degree: Degree,
}

impl Record {
    pub fn try_new(
        schema: Arc<Schema>,
        values: Vec<ScalarValue>,
        degree: Degree,
    ) -> Result<Self> {
        if values.len() != schema.len() {
            return Err(RankError::new(
                ErrorKind::TypeSchemaMismatch,
                "record arity does not match schema",
            )
            .with_field("schema", schema.len())
            .with_field("values", values.len()));
        }
        for (idx, ((name, datatype), value)) in schema.iter().zip(&values).enumerate() {
            if value.datatype() != datatype {
                return Err(RankError::new(
                    ErrorKind::TypeSchemaMismatch,
                    "record value does not match attribute domain",
                )
                .with_field("attribute", name)
                .with_field("index", idx)
                .with_field("want", datatype)
                .with_field("got", value.datatype()));
            }
        }

        Ok(Record {
            schema,
            values,
            degree,
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn degree(&self) -> Degree {
        self.degree
    }

    pub fn values(&self) -> &[ScalarValue] {
        &self.values
    }

    /// Consume the record, yielding its value vector.
    pub fn into_values(self) -> Vec<ScalarValue> {
        self.values
    }

    pub fn value(&self, name: &str) -> Result<&ScalarValue> {
        let idx = self.schema.index_of(name).ok_or_else(|| {
            RankError::new(ErrorKind::AttributeNotInSchema, "no such attribute")
                .with_field("attribute", name.to_string())
                .with_field("schema", self.schema.as_ref())
        })?;
        Ok(&self.values[idx])
    }

    pub fn value_at(&self, idx: usize) -> Option<&ScalarValue> {
        self.values.get(idx)
    }

    /// New record with one binding replaced, same degree.
    pub fn set(&self, name: &str, value: ScalarValue) -> Result<Record> {
        let idx = self.schema.index_of(name).ok_or_else(|| {
            RankError::new(ErrorKind::AttributeNotInSchema, "no such attribute")
                .with_field("attribute", name.to_string())
                .with_field("schema", self.schema.as_ref())
        })?;
        // The existing slot already satisfies the schema's domain.
        let datatype = self.values[idx].datatype();
        if value.datatype() != datatype {
            return Err(RankError::new(
                ErrorKind::TypeSchemaMismatch,
                "replacement value does not match attribute domain",
            )
            .with_field("attribute", name.to_string())
            .with_field("want", datatype)
            .with_field("got", value.datatype()));
        }

        let mut values = self.values.clone();
        values[idx] = value;
        Ok(Record {
            schema: self.schema.clone(),
            values,
            degree: self.degree,
        })
    }

    /// Copy of the record at a different degree.
    pub fn with_degree(&self, degree: Degree) -> Record {
        Record {
            schema: self.schema.clone(),
            values: self.values.clone(),
            degree,
        }
    }

    /// Value equality ignoring degree: the dedup key semantics used by
    /// union, intersection and the fixpoint merge.
    pub fn no_rank_eq(&self, other: &Record) -> bool {
        self.schema == other.schema && self.values == other.values
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (idx, value) in self.values.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, "): {}", self.degree)
    }
}
