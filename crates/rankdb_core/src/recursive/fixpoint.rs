use std::fmt;
use std::sync::Arc;

use rankdb_error::{ErrorKind, RankError, Result};
use tracing::debug;

use crate::lattice::Lattice;
use crate::records::{Record, Table};
use crate::schema::Schema;

/// How the next frontier is chosen from the records that changed the
/// accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frontier {
    /// Re-expand every changed record (semi-naive fixpoint). Termination is
    /// the caller's responsibility: the body must eventually stop improving
    /// the accumulator, typically via a strict inequality on a monotone key.
    Unrestricted,
    /// Re-expand only the K highest-degree changed records, ties broken by
    /// discovery order. Bounds memory and work per step at the cost of
    /// completeness.
    TopK(usize),
}

/// Graded transitive closure of a caller-supplied relational pipeline.
///
/// Starting from a seed relation, repeatedly applies `body` to the current
/// frontier and merges the result into the accumulator under the lattice
/// supremum. A record counts as new only if the merge raised its degree;
/// degrees never shrink across iterations. The loop stops when a step
/// changes nothing.
#[derive(Debug, Clone)]
pub struct Recursion {
    lattice: Lattice,
    frontier: Frontier,
    /// Hard stop for bodies that never converge; `None` trusts the caller.
    iteration_limit: Option<usize>,
}

impl Recursion {
    pub fn new(lattice: Lattice, frontier: Frontier) -> Self {
        Recursion {
            lattice,
            frontier,
            iteration_limit: None,
        }
    }

    pub fn with_iteration_limit(mut self, limit: usize) -> Self {
        self.iteration_limit = Some(limit);
        self
    }

    pub fn lattice(&self) -> Lattice {
        self.lattice
    }

    /// Run the fixpoint loop. `body` maps a frontier relation to the next
    /// batch of discovered records; its output schema must equal the seed's.
    ///
    /// An empty seed returns an empty result without invoking `body`.
    pub fn execute<F>(&self, seed: &Table, body: F) -> Result<Table>
    where
        F: Fn(&Table) -> Result<Table>,
    {
        let mut accumulated = seed.clone();
        if seed.is_empty() {
            return Ok(accumulated);
        }

        let mut frontier = seed.clone();
        let mut iteration = 0_usize;

        loop {
            if let Some(limit) = self.iteration_limit
                && iteration >= limit
            {
                return Err(RankError::new(
                    ErrorKind::IterationLimitExceeded,
                    "recursion did not converge within the iteration limit",
                )
                .with_field("limit", limit));
            }
            iteration += 1;

            let step = body(&frontier)?;
            if *step.schema().as_ref() != *seed.schema().as_ref() {
                return Err(RankError::new(
                    ErrorKind::SchemaNotEqual,
                    "body produced records outside the seed's schema",
                )
                .with_field("seed", seed.schema().as_ref())
                .with_field("body", step.schema().as_ref()));
            }

            // Records whose merge raised the accumulator, carrying their
            // merged (authoritative) degree.
            let mut changed = Vec::new();
            for record in step.iter() {
                if accumulated.merge(record.clone(), self.lattice)? {
                    let merged = accumulated
                        .find_no_rank(&record)
                        .map(|r| r.degree())
                        .unwrap_or(record.degree());
                    changed.push(record.with_degree(merged));
                }
            }

            debug!(
                iteration,
                frontier = frontier.len(),
                step = step.len(),
                changed = changed.len(),
                "fixpoint iteration"
            );

            if changed.is_empty() {
                return Ok(accumulated);
            }

            if let Frontier::TopK(k) = self.frontier {
                // Stable by descending degree, so ties keep discovery order.
                changed.sort_by(|a, b| b.degree().cmp(&a.degree()));
                changed.truncate(k);
            }
            frontier = Table::try_from_records(seed.schema().clone(), changed)?;
            if frontier.is_empty() {
                // TopK(0) truncates everything away.
                return Ok(accumulated);
            }
        }
    }
}

/// Fixpoint closure with a per-seed interpretation stage.
///
/// Runs the shared loop once per seed record, tags the reachable set with
/// its seed, and applies a caller-supplied post-transform before the
/// per-seed results are supremum-merged into the final relation. Closure
/// computation and interpretation of the closure stay factored apart, so one
/// loop supports different final shapes.
pub struct TransformedRecursion {
    recursion: Recursion,
    output_schema: Arc<Schema>,
    transform: Arc<dyn Fn(&Record, Table) -> Result<Table> + Send + Sync>,
}

impl TransformedRecursion {
    /// `output_schema` declares the transform's result schema up front;
    /// transformed tables disagreeing with it fail with `SchemaNotEqual`.
    pub fn new(
        recursion: Recursion,
        output_schema: Arc<Schema>,
        transform: impl Fn(&Record, Table) -> Result<Table> + Send + Sync + 'static,
    ) -> Self {
        TransformedRecursion {
            recursion,
            output_schema,
            transform: Arc::new(transform),
        }
    }

    pub fn execute<F>(&self, seed: &Table, body: F) -> Result<Table>
    where
        F: Fn(&Table) -> Result<Table>,
    {
        let mut out = Table::new(self.output_schema.clone());
        for seed_record in seed.iter() {
            let single =
                Table::try_from_records(seed.schema().clone(), [seed_record.clone()])?;
            let reachable = self.recursion.execute(&single, &body)?;
            let transformed = (self.transform)(&seed_record, reachable)?;
            if *transformed.schema().as_ref() != *self.output_schema {
                return Err(RankError::new(
                    ErrorKind::SchemaNotEqual,
                    "transform produced records outside the declared output schema",
                )
                .with_field("declared", self.output_schema.as_ref())
                .with_field("got", transformed.schema().as_ref()));
            }
            for record in transformed.iter() {
                out.merge(record, self.recursion.lattice())?;
            }
        }
        Ok(out)
    }
}

impl fmt::Debug for TransformedRecursion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformedRecursion")
            .field("recursion", &self.recursion)
            .field("output_schema", &self.output_schema)
            .finish_non_exhaustive()
    }
}
