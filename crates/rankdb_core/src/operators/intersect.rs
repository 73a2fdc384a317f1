use std::sync::Arc;

use rankdb_error::{ErrorKind, RankError, Result};
use tracing::debug;

use crate::lattice::Lattice;
use crate::records::Table;
use crate::schema::Schema;

/// Eager graded intersection.
///
/// Inputs must share one schema. The output holds the records no-rank-present
/// in both inputs, each at the lattice infimum of its two degrees: present in
/// both, to the weaker degree.
#[derive(Debug)]
pub struct Intersect {
    schema: Arc<Schema>,
    lattice: Lattice,
}

impl Intersect {
    pub fn try_new(
        left_schema: &Arc<Schema>,
        right_schema: &Arc<Schema>,
        lattice: Lattice,
    ) -> Result<Self> {
        if *left_schema != *right_schema {
            return Err(RankError::new(
                ErrorKind::SchemaNotEqual,
                "intersection requires equal schemas",
            )
            .with_field("left", left_schema.as_ref())
            .with_field("right", right_schema.as_ref()));
        }
        Ok(Intersect {
            schema: left_schema.clone(),
            lattice,
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn check_input(&self, got: &Schema) -> Result<()> {
        if *self.schema != *got {
            return Err(RankError::new(
                ErrorKind::SchemaNotEqual,
                "input table schema does not match the intersection's schema",
            )
            .with_field("expected", self.schema.as_ref())
            .with_field("got", got));
        }
        Ok(())
    }

    pub fn execute(&self, left: &Table, right: &Table) -> Result<Table> {
        self.check_input(left.schema())?;
        self.check_input(right.schema())?;

        let mut out = Table::new(self.schema.clone());
        for record in left.iter() {
            let Some(other) = right.find_no_rank(&record) else {
                continue;
            };
            let degree = self.lattice.infimum(record.degree(), other.degree());
            if degree.is_zero() {
                continue;
            }
            out.push(record.with_degree(degree))?;
        }

        debug!(
            left = left.len(),
            right = right.len(),
            output = out.len(),
            "intersect"
        );
        Ok(out)
    }
}
