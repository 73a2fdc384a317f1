use std::sync::Arc;

use rankdb_error::{ErrorKind, RankError, Result};
use tracing::debug;

use crate::lattice::Lattice;
use crate::records::Table;
use crate::schema::Schema;

/// Eager graded union.
///
/// Inputs must share one schema. Every record of both inputs appears in the
/// output; a record no-rank-present in both is merged once at the lattice
/// supremum of its two degrees.
#[derive(Debug)]
pub struct Union {
    schema: Arc<Schema>,
    lattice: Lattice,
}

impl Union {
    pub fn try_new(
        left_schema: &Arc<Schema>,
        right_schema: &Arc<Schema>,
        lattice: Lattice,
    ) -> Result<Self> {
        if *left_schema != *right_schema {
            return Err(RankError::new(
                ErrorKind::SchemaNotEqual,
                "union requires equal schemas",
            )
            .with_field("left", left_schema.as_ref())
            .with_field("right", right_schema.as_ref()));
        }
        Ok(Union {
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
                "input table schema does not match the union's schema",
            )
            .with_field("expected", self.schema.as_ref())
            .with_field("got", got));
        }
        Ok(())
    }

    pub fn execute(&self, left: &Table, right: &Table) -> Result<Table> {
        self.check_input(left.schema())?;
        self.check_input(right.schema())?;

        let mut out = left.clone();
        for record in right.iter() {
            out.merge(record, self.lattice)?;
        }

        debug!(
            left = left.len(),
            right = right.len(),
            output = out.len(),
            "union"
        );
        Ok(out)
    }
}
