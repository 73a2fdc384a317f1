use std::sync::Arc;

use rankdb_error::{ErrorKind, RankError, Result};
use tracing::debug;

use crate::conditions::OnCondition;
use crate::degree::Degree;
use crate::lattice::Lattice;
use crate::records::{Record, Table};
use crate::schema::Schema;

/// Eager θ-join.
///
/// Nested loop over (left, right) record pairs. Per pair, the on-conditions'
/// degrees are combined with the lattice product, then combined with both
/// input degrees; zero-degree pairs are dropped. Name collisions between the
/// input schemas get `left.`/`right.` prefixes in the output.
#[derive(Debug)]
pub struct Join {
    left_schema: Arc<Schema>,
    right_schema: Arc<Schema>,
    output_schema: Arc<Schema>,
    conditions: Vec<OnCondition>,
    lattice: Lattice,
}

impl Join {
    pub fn try_new(
        left_schema: Arc<Schema>,
        right_schema: Arc<Schema>,
        conditions: Vec<OnCondition>,
        lattice: Lattice,
    ) -> Result<Self> {
        if conditions.is_empty() {
            return Err(RankError::new(
                ErrorKind::EmptyJoinCondition,
                "join requires at least one on-condition; use cross() for a crossjoin",
            ));
        }
        if !left_schema.is_joinable_with(&right_schema) {
            return Err(RankError::new(
                ErrorKind::SchemaNotJoinable,
                "schemas disagree on the domain of a shared attribute name",
            )
            .with_field("left", left_schema.as_ref())
            .with_field("right", right_schema.as_ref()));
        }
        for condition in &conditions {
            condition.validate(&left_schema, &right_schema)?;
        }
        let output_schema = Arc::new(Schema::join_prefixed(&left_schema, &right_schema)?);

        Ok(Join {
            left_schema,
            right_schema,
            output_schema,
            conditions,
            lattice,
        })
    }

    /// Crossjoin: the degenerate single always-true condition.
    pub fn cross(
        left_schema: Arc<Schema>,
        right_schema: Arc<Schema>,
        lattice: Lattice,
    ) -> Result<Self> {
        Join::try_new(left_schema, right_schema, vec![OnCondition::True], lattice)
    }

    pub fn output_schema(&self) -> &Arc<Schema> {
        &self.output_schema
    }

    /// Combined degree for one record pair, zero when the pair is dropped.
    pub(crate) fn pair_degree(&self, left: &Record, right: &Record) -> Degree {
        let mut combined = Degree::ONE;
        for condition in &self.conditions {
            combined = self
                .lattice
                .product(combined, condition.eval(left, right, self.lattice));
        }
        self.lattice.product(
            self.lattice.product(left.degree(), right.degree()),
            combined,
        )
    }

    /// Output record for one pair at the given degree.
    pub(crate) fn pair_record(&self, left: &Record, right: &Record, degree: Degree) -> Record {
        let mut values = Vec::with_capacity(left.values().len() + right.values().len());
        values.extend(left.values().iter().cloned());
        values.extend(right.values().iter().cloned());
        // The output schema is the concatenation of the validated inputs.
        Record::try_new(self.output_schema.clone(), values, degree)
            .unwrap_or_else(|_| unreachable!("joined record disagrees with join schema"))
    }

    fn check_input(&self, side: &str, expected: &Schema, got: &Schema) -> Result<()> {
        if *expected != *got {
            return Err(RankError::new(
                ErrorKind::SchemaNotEqual,
                "input table schema does not match the join's bound schema",
            )
            .with_field("side", side.to_string())
            .with_field("expected", expected)
            .with_field("got", got));
        }
        Ok(())
    }

    pub fn execute(&self, left: &Table, right: &Table) -> Result<Table> {
        self.check_input("left", &self.left_schema, left.schema())?;
        self.check_input("right", &self.right_schema, right.schema())?;

        let mut out = Table::new(self.output_schema.clone());
        for l in left.iter() {
            for r in right.iter() {
                let degree = self.pair_degree(&l, &r);
                if degree.is_zero() {
                    continue;
                }
                out.push(self.pair_record(&l, &r, degree))?;
            }
        }

        debug!(
            left = left.len(),
            right = right.len(),
            output = out.len(),
            "join"
        );
        Ok(out)
    }
}
