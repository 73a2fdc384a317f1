use std::fmt;
use std::sync::Arc;

use rankdb_error::{ErrorKind, RankError, Result};
use tracing::debug;

use crate::conditions::Similarity;
use crate::degree::Degree;
use crate::lattice::Lattice;
use crate::records::{Record, Table};
use crate::schema::Schema;

/// Eager degree recomputation with an arbitrary caller closure.
///
/// The generic escape hatch for predicates not expressible in the condition
/// tree. The closure must be pure and is re-invoked freely; its result
/// replaces the record's degree outright (combine with the old degree inside
/// the closure if that is the intent). Every record passes through,
/// zero-degree ones included.
pub struct Restrict {
    func: Arc<dyn Fn(&Record) -> Degree + Send + Sync>,
}

impl Restrict {
    pub fn new(func: impl Fn(&Record) -> Degree + Send + Sync + 'static) -> Self {
        Restrict {
            func: Arc::new(func),
        }
    }

    pub(crate) fn apply(&self, record: &Record) -> Record {
        record.with_degree((self.func)(record))
    }

    pub fn execute(&self, input: &Table) -> Result<Table> {
        let mut out = Table::new(input.schema().clone());
        for record in input.iter() {
            out.push(self.apply(&record))?;
        }
        debug!(rows = out.len(), "restrict");
        Ok(out)
    }
}

impl fmt::Debug for Restrict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Restrict").finish_non_exhaustive()
    }
}

/// Eager whole-record transform.
///
/// Applies an arbitrary record function, declaring the output schema up
/// front. The closure is opaque, so records disagreeing with the declared
/// schema only surface at execute time, as `TableRecordSchemaMismatch`.
pub struct MapRecords {
    output_schema: Arc<Schema>,
    func: Arc<dyn Fn(&Record) -> Record + Send + Sync>,
}

impl MapRecords {
    pub fn new(
        output_schema: Arc<Schema>,
        func: impl Fn(&Record) -> Record + Send + Sync + 'static,
    ) -> Self {
        MapRecords {
            output_schema,
            func: Arc::new(func),
        }
    }

    pub fn output_schema(&self) -> &Arc<Schema> {
        &self.output_schema
    }

    pub(crate) fn apply(&self, record: &Record) -> Result<Record> {
        let out = (self.func)(record);
        if *out.schema().as_ref() != *self.output_schema {
            return Err(RankError::new(
                ErrorKind::TableRecordSchemaMismatch,
                "mapped record disagrees with the declared output schema",
            )
            .with_field("declared", self.output_schema.as_ref())
            .with_field("got", out.schema().as_ref()));
        }
        Ok(out)
    }

    pub fn execute(&self, input: &Table) -> Result<Table> {
        let mut out = Table::new(self.output_schema.clone());
        for record in input.iter() {
            out.push(self.apply(&record)?)?;
        }
        debug!(rows = out.len(), "map_records");
        Ok(out)
    }
}

impl fmt::Debug for MapRecords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapRecords")
            .field("output_schema", &self.output_schema)
            .finish_non_exhaustive()
    }
}

/// Same-row similarity restriction.
///
/// Recomputes each record's degree as
/// `lattice.product(degree, similarity(attr_a, attr_b))`, comparing two
/// attributes within one tuple rather than across tuples. Zero-degree
/// results are dropped, matching selection.
#[derive(Debug)]
pub struct SimilarityRestrict {
    schema: Arc<Schema>,
    attr_a: String,
    attr_b: String,
    similarity: Similarity,
    lattice: Lattice,
}

impl SimilarityRestrict {
    pub fn try_new(
        schema: Arc<Schema>,
        attr_a: impl Into<String>,
        attr_b: impl Into<String>,
        similarity: Similarity,
        lattice: Lattice,
    ) -> Result<Self> {
        let attr_a = attr_a.into();
        let attr_b = attr_b.into();

        let dt_a = schema.datatype(&attr_a).ok_or_else(|| {
            RankError::new(ErrorKind::AttributeNotInSchema, "no such attribute")
                .with_field("attribute", attr_a.clone())
                .with_field("schema", schema.as_ref())
        })?;
        let dt_b = schema.datatype(&attr_b).ok_or_else(|| {
            RankError::new(ErrorKind::AttributeNotInSchema, "no such attribute")
                .with_field("attribute", attr_b.clone())
                .with_field("schema", schema.as_ref())
        })?;
        if dt_a != dt_b {
            return Err(RankError::new(
                ErrorKind::ComparisonDomainMismatch,
                "similarity restriction compares attributes of different domains",
            )
            .with_field("left", attr_a)
            .with_field("left_domain", dt_a)
            .with_field("right", attr_b)
            .with_field("right_domain", dt_b));
        }

        Ok(SimilarityRestrict {
            schema,
            attr_a,
            attr_b,
            similarity,
            lattice,
        })
    }

    pub(crate) fn apply(&self, record: &Record) -> Degree {
        let similarity = match (record.value(&self.attr_a), record.value(&self.attr_b)) {
            (Ok(a), Ok(b)) => self.similarity.eval(a, b),
            _ => Degree::ZERO,
        };
        self.lattice.product(record.degree(), similarity)
    }

    pub fn execute(&self, input: &Table) -> Result<Table> {
        if *input.schema().as_ref() != *self.schema {
            return Err(RankError::new(
                ErrorKind::SchemaNotEqual,
                "input table schema does not match the restriction's schema",
            )
            .with_field("expected", self.schema.as_ref())
            .with_field("got", input.schema().as_ref()));
        }

        let mut out = Table::new(self.schema.clone());
        for record in input.iter() {
            let degree = self.apply(&record);
            if degree.is_zero() {
                continue;
            }
            out.push(record.with_degree(degree))?;
        }
        debug!(input = input.len(), output = out.len(), "similarity_restrict");
        Ok(out)
    }
}
