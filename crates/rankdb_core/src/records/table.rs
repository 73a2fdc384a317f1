use std::sync::Arc;

use ahash::RandomState;
use indexmap::IndexMap;
use rankdb_error::{ErrorKind, RankError, Result};

use crate::degree::Degree;
use crate::lattice::Lattice;
use crate::records::Record;
use crate::schema::Schema;
use crate::values::ScalarValue;

/// A materialized graded relation with set semantics.
///
/// Internally a map from the no-rank value key to the record's degree, kept
/// in insertion order. This makes the merge invariant used by union and the
/// fixpoint engine a first-class operation rather than a side effect of
/// record equality.
#[derive(Debug, Clone)]
pub struct Table {
    schema: Arc<Schema>,
    rows: IndexMap<Vec<ScalarValue>, Degree, RandomState>,
}

impl Table {
    pub fn new(schema: Arc<Schema>) -> Self {
        Table {
            schema,
            rows: IndexMap::with_hasher(RandomState::new()),
        }
    }

    /// Materialize a table from records, applying `push` semantics per
    /// record.
    pub fn try_from_records(
        schema: Arc<Schema>,
        records: impl IntoIterator<Item = Record>,
    ) -> Result<Self> {
        let mut table = Table::new(schema);
        for record in records {
            table.push(record)?;
        }
        Ok(table)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn check_schema(&self, record: &Record) -> Result<()> {
        if *record.schema().as_ref() != *self.schema {
            return Err(RankError::new(
                ErrorKind::TableRecordSchemaMismatch,
                "record schema does not match table schema",
            )
            .with_field("table", self.schema.as_ref())
            .with_field("record", record.schema().as_ref()));
        }
        Ok(())
    }

    /// Insert a record. A no-rank duplicate keeps the larger of the two
    /// degrees.
    pub fn push(&mut self, record: Record) -> Result<()> {
        self.check_schema(&record)?;
        let degree = record.degree();
        let entry = self.rows.entry(record.into_values()).or_insert(degree);
        if *entry < degree {
            *entry = degree;
        }
        Ok(())
    }

    /// Merge a record under the lattice's supremum, the dedup rule shared by
    /// union and the fixpoint engine. Degrees never shrink.
    ///
    /// Returns whether the table changed: the key was new, or its degree
    /// strictly increased.
    pub fn merge(&mut self, record: Record, lattice: Lattice) -> Result<bool> {
        self.check_schema(&record)?;
        let degree = record.degree();
        match self.rows.entry(record.into_values()) {
            indexmap::map::Entry::Occupied(mut entry) => {
                let merged = lattice.supremum(*entry.get(), degree);
                if merged > *entry.get() {
                    entry.insert(merged);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(degree);
                Ok(true)
            }
        }
    }

    /// Full-equality membership, degree included.
    pub fn contains(&self, record: &Record) -> bool {
        record.schema().as_ref() == self.schema.as_ref()
            && self.rows.get(record.values()) == Some(&record.degree())
    }

    /// Membership by value key, degree ignored.
    pub fn contains_no_rank(&self, record: &Record) -> bool {
        record.schema().as_ref() == self.schema.as_ref()
            && self.rows.contains_key(record.values())
    }

    /// Stored record that is no-rank-equal to the given one.
    pub fn find_no_rank(&self, record: &Record) -> Option<Record> {
        if record.schema().as_ref() != self.schema.as_ref() {
            return None;
        }
        self.rows
            .get_key_value(record.values())
            .map(|(values, &degree)| self.rebuild(values.clone(), degree))
    }

    /// Drop rows whose degree is exactly zero.
    pub fn retain_nonzero(&mut self) {
        self.rows.retain(|_, degree| !degree.is_zero());
    }

    /// Iterate records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = Record> + '_ {
        self.rows
            .iter()
            .map(|(values, &degree)| self.rebuild(values.clone(), degree))
    }

    pub fn records(&self) -> Vec<Record> {
        self.iter().collect()
    }

    fn rebuild(&self, values: Vec<ScalarValue>, degree: Degree) -> Record {
        // Rows were validated on the way in, so this cannot fail. Going
        // through try_new anyway keeps the invariant in one place.
        debug_assert_eq!(values.len(), self.schema.len());
        Record::try_new(self.schema.clone(), values, degree)
            .unwrap_or_else(|_| unreachable!("table row disagrees with table schema"))
    }
}

impl PartialEq for Table {
    /// Set equality: same schema, same rows at the same degrees, order
    /// ignored.
    fn eq(&self, other: &Self) -> bool {
        *self.schema == *other.schema && self.rows == other.rows
    }
}

impl Eq for Table {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Attribute;
    use crate::values::DataType;

    fn schema() -> Arc<Schema> {
        Arc::new(
            Schema::try_new([
                Attribute::new("a", DataType::Int64),
                Attribute::new("b", DataType::Utf8),
            ])
            .unwrap(),
        )
    }

    fn record(schema: &Arc<Schema>, a: i64, b: &str, degree: f64) -> Record {
        Record::try_new(
            schema.clone(),
            vec![a.into(), b.into()],
            Degree::new(degree).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn push_dedups_keeping_max_degree() {
        let schema = schema();
        let mut table = Table::new(schema.clone());
        table.push(record(&schema, 1, "foo", 0.5)).unwrap();
        table.push(record(&schema, 1, "foo", 0.25)).unwrap();
        table.push(record(&schema, 1, "foo", 0.75)).unwrap();

        assert_eq!(1, table.len());
        let stored = table.records().pop().unwrap();
        assert_eq!(Degree::new(0.75).unwrap(), stored.degree());
    }

    #[test]
    fn push_rejects_foreign_schema() {
        let mut table = Table::new(schema());
        let other = Arc::new(Schema::try_new([Attribute::new("a", DataType::Int64)]).unwrap());
        let rec = Record::try_new(other, vec![1_i64.into()], Degree::ONE).unwrap();

        let err = table.push(rec).unwrap_err();
        assert_eq!(ErrorKind::TableRecordSchemaMismatch, err.kind());
    }

    #[test]
    fn merge_reports_change() {
        let schema = schema();
        let mut table = Table::new(schema.clone());

        // New key.
        assert!(
            table
                .merge(record(&schema, 1, "foo", 0.5), Lattice::Godel)
                .unwrap()
        );
        // Smaller degree contributes nothing.
        assert!(
            !table
                .merge(record(&schema, 1, "foo", 0.25), Lattice::Godel)
                .unwrap()
        );
        // Equal degree contributes nothing either.
        assert!(
            !table
                .merge(record(&schema, 1, "foo", 0.5), Lattice::Godel)
                .unwrap()
        );
        // Larger degree raises the stored one.
        assert!(
            table
                .merge(record(&schema, 1, "foo", 0.75), Lattice::Godel)
                .unwrap()
        );
        assert_eq!(1, table.len());
    }

    #[test]
    fn lukasiewicz_merge_sums() {
        let schema = schema();
        let mut table = Table::new(schema.clone());
        table
            .merge(record(&schema, 1, "foo", 0.5), Lattice::Lukasiewicz)
            .unwrap();
        table
            .merge(record(&schema, 1, "foo", 0.25), Lattice::Lukasiewicz)
            .unwrap();

        let stored = table.records().pop().unwrap();
        assert_eq!(Degree::new(0.75).unwrap(), stored.degree());
    }

    #[test]
    fn membership_variants() {
        let schema = schema();
        let mut table = Table::new(schema.clone());
        table.push(record(&schema, 1, "foo", 0.5)).unwrap();

        let same = record(&schema, 1, "foo", 0.5);
        let weaker = record(&schema, 1, "foo", 0.25);
        let missing = record(&schema, 2, "bar", 0.5);

        assert!(table.contains(&same));
        assert!(!table.contains(&weaker));
        assert!(table.contains_no_rank(&weaker));
        assert!(!table.contains_no_rank(&missing));

        let found = table.find_no_rank(&weaker).unwrap();
        assert_eq!(Degree::new(0.5).unwrap(), found.degree());
    }

    #[test]
    fn retain_nonzero_drops_absent_rows() {
        let schema = schema();
        let mut table = Table::new(schema.clone());
        table.push(record(&schema, 1, "foo", 0.0)).unwrap();
        table.push(record(&schema, 2, "bar", 0.5)).unwrap();

        table.retain_nonzero();
        assert_eq!(1, table.len());
        assert!(table.contains_no_rank(&record(&schema, 2, "bar", 0.5)));
    }
}
