use std::sync::Arc;

use rankdb_error::{ErrorKind, RankError, Result};
use tracing::debug;

use crate::conditions::SelectCondition;
use crate::lattice::Lattice;
use crate::records::Table;
use crate::schema::Schema;

/// Eager graded selection.
///
/// Output schema equals the input schema; each record's degree becomes
/// `lattice.product(record.degree, condition.eval(record))`. Records whose
/// resulting degree is zero are filtered during materialization.
#[derive(Debug)]
pub struct Select {
    schema: Arc<Schema>,
    condition: SelectCondition,
    lattice: Lattice,
}

impl Select {
    pub fn try_new(
        schema: Arc<Schema>,
        condition: SelectCondition,
        lattice: Lattice,
    ) -> Result<Self> {
        condition.validate(&schema)?;
        Ok(Select {
            schema,
            condition,
            lattice,
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn execute(&self, input: &Table) -> Result<Table> {
        if *input.schema().as_ref() != *self.schema {
            return Err(RankError::new(
                ErrorKind::SchemaNotEqual,
                "input table schema does not match the selection's schema",
            )
            .with_field("expected", self.schema.as_ref())
            .with_field("got", input.schema().as_ref()));
        }

        let mut out = Table::new(self.schema.clone());
        for record in input.iter() {
            let degree = self
                .lattice
                .product(record.degree(), self.condition.eval(&record, self.lattice));
            if degree.is_zero() {
                continue;
            }
            out.push(record.with_degree(degree))?;
        }

        debug!(input = input.len(), output = out.len(), "select");
        Ok(out)
    }
}
