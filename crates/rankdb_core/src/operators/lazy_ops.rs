//! Lazy counterparts of the relational operators.
//!
//! Each implements [`RecordSource`], computing one output record per `next()`
//! call. Semantics match the eager operators exactly; only the buffering
//! differs. The binary operators buffer their right input in full on first
//! pull (the smaller side belongs on the right) and stream the left.

use std::fmt;
use std::sync::Arc;

use ahash::RandomState;
use indexmap::IndexMap;
use rankdb_error::{ErrorKind, RankError, Result};
use tracing::trace;

use crate::conditions::{OnCondition, SelectCondition};
use crate::degree::Degree;
use crate::lattice::Lattice;
use crate::operators::join::Join;
use crate::operators::lazy::RecordSource;
use crate::operators::project::{Project, Projection};
use crate::records::Record;
use crate::schema::Schema;
use crate::values::ScalarValue;

/// Lazy graded selection: skips zero-degree records inside `next()`.
#[derive(Debug)]
pub struct LazySelect<S: RecordSource> {
    source: S,
    condition: SelectCondition,
    lattice: Lattice,
}

impl<S: RecordSource> LazySelect<S> {
    pub fn try_new(source: S, condition: SelectCondition, lattice: Lattice) -> Result<Self> {
        condition.validate(source.schema())?;
        Ok(LazySelect {
            source,
            condition,
            lattice,
        })
    }
}

impl<S: RecordSource> RecordSource for LazySelect<S> {
    fn schema(&self) -> &Arc<Schema> {
        self.source.schema()
    }

    fn next(&mut self) -> Option<Record> {
        loop {
            let record = self.source.next()?;
            let degree = self
                .lattice
                .product(record.degree(), self.condition.eval(&record, self.lattice));
            if degree.is_zero() {
                continue;
            }
            return Some(record.with_degree(degree));
        }
    }

    fn restart(&mut self) {
        self.source.restart();
    }
}

/// Lazy projection: one reshaped record per upstream record, duplicates
/// streamed through unmerged.
#[derive(Debug)]
pub struct LazyProject<S: RecordSource> {
    source: S,
    project: Project,
}

impl<S: RecordSource> LazyProject<S> {
    pub fn try_new(source: S, projection: Projection) -> Result<Self> {
        let project = Project::try_new(source.schema().clone(), projection)?;
        Ok(LazyProject { source, project })
    }
}

impl<S: RecordSource> RecordSource for LazyProject<S> {
    fn schema(&self) -> &Arc<Schema> {
        self.project.output_schema()
    }

    fn next(&mut self) -> Option<Record> {
        self.source.next().map(|record| self.project.apply(&record))
    }

    fn restart(&mut self) {
        self.source.restart();
    }
}

/// Lazy θ-join: buffers the right side on first pull, streams the left.
#[derive(Debug)]
pub struct LazyJoin<L: RecordSource, R: RecordSource> {
    join: Join,
    left: L,
    right: R,
    right_buf: Vec<Record>,
    right_primed: bool,
    current_left: Option<Record>,
    right_pos: usize,
}

impl<L: RecordSource, R: RecordSource> LazyJoin<L, R> {
    pub fn try_new(
        left: L,
        right: R,
        conditions: Vec<OnCondition>,
        lattice: Lattice,
    ) -> Result<Self> {
        let join = Join::try_new(
            left.schema().clone(),
            right.schema().clone(),
            conditions,
            lattice,
        )?;
        Ok(LazyJoin {
            join,
            left,
            right,
            right_buf: Vec::new(),
            right_primed: false,
            current_left: None,
            right_pos: 0,
        })
    }

    fn prime_right(&mut self) {
        if self.right_primed {
            return;
        }
        while let Some(record) = self.right.next() {
            self.right_buf.push(record);
        }
        self.right_primed = true;
        trace!(rows = self.right_buf.len(), "lazy join buffered right side");
    }
}

impl<L: RecordSource, R: RecordSource> RecordSource for LazyJoin<L, R> {
    fn schema(&self) -> &Arc<Schema> {
        self.join.output_schema()
    }

    fn next(&mut self) -> Option<Record> {
        self.prime_right();
        loop {
            if self.current_left.is_none() {
                self.current_left = self.left.next();
                self.right_pos = 0;
            }
            let left = self.current_left.as_ref()?;

            while self.right_pos < self.right_buf.len() {
                let right = &self.right_buf[self.right_pos];
                self.right_pos += 1;
                let degree = self.join.pair_degree(left, right);
                if !degree.is_zero() {
                    return Some(self.join.pair_record(left, right, degree));
                }
            }
            self.current_left = None;
        }
    }

    fn restart(&mut self) {
        self.left.restart();
        self.current_left = None;
        self.right_pos = 0;
        // The buffered right side is kept; the upstream right source is not
        // touched again.
    }
}

/// Buffered right-side row: degree plus whether a left record already merged
/// with it.
type RightRows = IndexMap<Vec<ScalarValue>, (Degree, bool), RandomState>;

/// Lazy graded union: streams the left input merging against the buffered
/// right side, then emits the right records no left record matched.
pub struct LazyUnion<L: RecordSource, R: RecordSource> {
    schema: Arc<Schema>,
    lattice: Lattice,
    left: L,
    right: R,
    right_rows: RightRows,
    right_primed: bool,
    /// Phase-2 cursor into `right_rows`.
    drain_pos: usize,
}

impl<L: RecordSource, R: RecordSource> LazyUnion<L, R> {
    pub fn try_new(left: L, right: R, lattice: Lattice) -> Result<Self> {
        if *left.schema().as_ref() != *right.schema().as_ref() {
            return Err(RankError::new(
                ErrorKind::SchemaNotEqual,
                "union requires equal schemas",
            )
            .with_field("left", left.schema().as_ref())
            .with_field("right", right.schema().as_ref()));
        }
        let schema = left.schema().clone();
        Ok(LazyUnion {
            schema,
            lattice,
            left,
            right,
            right_rows: IndexMap::with_hasher(RandomState::new()),
            right_primed: false,
            drain_pos: 0,
        })
    }

    fn prime_right(&mut self) {
        if self.right_primed {
            return;
        }
        while let Some(record) = self.right.next() {
            let degree = record.degree();
            match self.right_rows.entry(record.into_values()) {
                indexmap::map::Entry::Occupied(mut entry) => {
                    let merged = self.lattice.supremum(entry.get().0, degree);
                    entry.get_mut().0 = merged;
                }
                indexmap::map::Entry::Vacant(entry) => {
                    entry.insert((degree, false));
                }
            }
        }
        self.right_primed = true;
        trace!(rows = self.right_rows.len(), "lazy union buffered right side");
    }

    fn rebuild(&self, values: Vec<ScalarValue>, degree: Degree) -> Record {
        Record::try_new(self.schema.clone(), values, degree)
            .unwrap_or_else(|_| unreachable!("buffered row disagrees with union schema"))
    }
}

impl<L: RecordSource, R: RecordSource> RecordSource for LazyUnion<L, R> {
    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn next(&mut self) -> Option<Record> {
        self.prime_right();

        if let Some(record) = self.left.next() {
            return Some(match self.right_rows.get_mut(record.values()) {
                Some((degree, consumed)) => {
                    *consumed = true;
                    let merged = self.lattice.supremum(record.degree(), *degree);
                    record.with_degree(merged)
                }
                None => record,
            });
        }

        // Left is exhausted; emit the right records nothing merged with.
        while self.drain_pos < self.right_rows.len() {
            let (values, &(degree, consumed)) = self
                .right_rows
                .get_index(self.drain_pos)
                .map(|(k, v)| (k.clone(), v))?;
            self.drain_pos += 1;
            if !consumed {
                return Some(self.rebuild(values, degree));
            }
        }
        None
    }

    fn restart(&mut self) {
        self.left.restart();
        self.drain_pos = 0;
        for (_, (_, consumed)) in self.right_rows.iter_mut() {
            *consumed = false;
        }
    }
}

impl<L: RecordSource, R: RecordSource> fmt::Debug for LazyUnion<L, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyUnion")
            .field("schema", &self.schema)
            .field("lattice", &self.lattice)
            .finish_non_exhaustive()
    }
}

/// Lazy graded intersection: buffers the right side's degrees by key, then
/// streams left records present on both sides at the infimum degree.
pub struct LazyIntersect<L: RecordSource, R: RecordSource> {
    schema: Arc<Schema>,
    lattice: Lattice,
    left: L,
    right: R,
    right_rows: IndexMap<Vec<ScalarValue>, Degree, RandomState>,
    right_primed: bool,
}

impl<L: RecordSource, R: RecordSource> LazyIntersect<L, R> {
    pub fn try_new(left: L, right: R, lattice: Lattice) -> Result<Self> {
        if *left.schema().as_ref() != *right.schema().as_ref() {
            return Err(RankError::new(
                ErrorKind::SchemaNotEqual,
                "intersection requires equal schemas",
            )
            .with_field("left", left.schema().as_ref())
            .with_field("right", right.schema().as_ref()));
        }
        let schema = left.schema().clone();
        Ok(LazyIntersect {
            schema,
            lattice,
            left,
            right,
            right_rows: IndexMap::with_hasher(RandomState::new()),
            right_primed: false,
        })
    }

    fn prime_right(&mut self) {
        if self.right_primed {
            return;
        }
        while let Some(record) = self.right.next() {
            let degree = record.degree();
            let entry = self
                .right_rows
                .entry(record.into_values())
                .or_insert(degree);
            if *entry < degree {
                *entry = degree;
            }
        }
        self.right_primed = true;
    }
}

impl<L: RecordSource, R: RecordSource> RecordSource for LazyIntersect<L, R> {
    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn next(&mut self) -> Option<Record> {
        self.prime_right();
        loop {
            let record = self.left.next()?;
            let Some(&right_degree) = self.right_rows.get(record.values()) else {
                continue;
            };
            let degree = self.lattice.infimum(record.degree(), right_degree);
            if degree.is_zero() {
                continue;
            }
            return Some(record.with_degree(degree));
        }
    }

    fn restart(&mut self) {
        self.left.restart();
    }
}

impl<L: RecordSource, R: RecordSource> fmt::Debug for LazyIntersect<L, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyIntersect")
            .field("schema", &self.schema)
            .field("lattice", &self.lattice)
            .finish_non_exhaustive()
    }
}

/// Lazy degree recomputation; every record passes through, zero degrees
/// included, matching the eager [`super::Restrict`].
pub struct LazyRestrict<S: RecordSource> {
    source: S,
    func: Arc<dyn Fn(&Record) -> Degree + Send + Sync>,
}

impl<S: RecordSource> LazyRestrict<S> {
    pub fn new(source: S, func: impl Fn(&Record) -> Degree + Send + Sync + 'static) -> Self {
        LazyRestrict {
            source,
            func: Arc::new(func),
        }
    }
}

impl<S: RecordSource> RecordSource for LazyRestrict<S> {
    fn schema(&self) -> &Arc<Schema> {
        self.source.schema()
    }

    fn next(&mut self) -> Option<Record> {
        self.source
            .next()
            .map(|record| record.with_degree((self.func)(&record)))
    }

    fn restart(&mut self) {
        self.source.restart();
    }
}

impl<S: RecordSource> fmt::Debug for LazyRestrict<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyRestrict").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::{on, select, Similarity};
    use crate::operators::lazy::TableScan;
    use crate::operators::{Intersect, Select, Union};
    use crate::records::Table;
    use crate::schema::Attribute;
    use crate::values::DataType;

    fn ab_schema() -> Arc<Schema> {
        Arc::new(
            Schema::try_new([
                Attribute::new("a", DataType::Int64),
                Attribute::new("b", DataType::Utf8),
            ])
            .unwrap(),
        )
    }

    fn ab_table(rows: &[(i64, &str, f64)]) -> Table {
        let schema = ab_schema();
        Table::try_from_records(
            schema.clone(),
            rows.iter().map(|(a, b, d)| {
                Record::try_new(
                    schema.clone(),
                    vec![(*a).into(), (*b).into()],
                    Degree::new(*d).unwrap(),
                )
                .unwrap()
            }),
        )
        .unwrap()
    }

    fn collect(mut source: impl RecordSource) -> Vec<Record> {
        let mut out = Vec::new();
        while let Some(record) = source.next() {
            out.push(record);
        }
        out
    }

    fn materialize(source: impl RecordSource) -> Table {
        let schema = source.schema().clone();
        Table::try_from_records(schema, collect(source)).unwrap()
    }

    #[test]
    fn lazy_select_agrees_with_eager() {
        let input = ab_table(&[(1, "foo", 1.0), (2, "bar", 0.5), (3, "baz", 0.25)]);
        let condition = select::gt_eq("a", 2_i64);

        let eager = Select::try_new(ab_schema(), condition.clone(), Lattice::Godel)
            .unwrap()
            .execute(&input)
            .unwrap();
        let lazy = materialize(
            LazySelect::try_new(TableScan::new(&input), condition, Lattice::Godel).unwrap(),
        );

        assert_eq!(eager, lazy);
    }

    #[test]
    fn lazy_select_skips_inside_next() {
        let input = ab_table(&[(1, "foo", 1.0), (2, "bar", 1.0), (3, "baz", 1.0)]);
        let mut select = LazySelect::try_new(
            TableScan::new(&input),
            select::eq("a", 3_i64),
            Lattice::Godel,
        )
        .unwrap();

        // First pull already skips the two non-matching records.
        let record = select.next().unwrap();
        assert_eq!(
            &ScalarValue::from(3_i64),
            record.value("a").unwrap()
        );
        assert!(select.next().is_none());
    }

    #[test]
    fn lazy_project_streams_duplicates() {
        let input = ab_table(&[(1, "foo", 0.25), (2, "foo", 0.75)]);
        let target = Schema::try_new([Attribute::new("b", DataType::Utf8)]).unwrap();
        let project =
            LazyProject::try_new(TableScan::new(&input), Projection::Subschema(target)).unwrap();

        // Unlike eager materialization, both records come through.
        let records = collect(project);
        assert_eq!(2, records.len());
    }

    #[test]
    fn lazy_join_agrees_with_eager() {
        let left = ab_table(&[(1, "foo", 1.0), (2, "bar", 0.5)]);
        let right = ab_table(&[(1, "foo", 1.0), (2, "baz", 0.75), (3, "qux", 1.0)]);

        let eager = crate::operators::Join::try_new(
            ab_schema(),
            ab_schema(),
            vec![on::eq("a", "a")],
            Lattice::Goguen,
        )
        .unwrap()
        .execute(&left, &right)
        .unwrap();

        let lazy = materialize(
            LazyJoin::try_new(
                TableScan::new(&left),
                TableScan::new(&right),
                vec![on::eq("a", "a")],
                Lattice::Goguen,
            )
            .unwrap(),
        );

        assert_eq!(eager, lazy);
    }

    #[test]
    fn lazy_join_restart_reuses_right_buffer() {
        let left = ab_table(&[(1, "foo", 1.0)]);
        let right = ab_table(&[(1, "x", 1.0)]);

        let mut join = LazyJoin::try_new(
            TableScan::new(&left),
            TableScan::new(&right),
            vec![on::eq("a", "a")],
            Lattice::Godel,
        )
        .unwrap();

        assert_eq!(1, collect_by_ref(&mut join).len());
        join.restart();
        assert_eq!(1, collect_by_ref(&mut join).len());
    }

    fn collect_by_ref(source: &mut impl RecordSource) -> Vec<Record> {
        let mut out = Vec::new();
        while let Some(record) = source.next() {
            out.push(record);
        }
        out
    }

    #[test]
    fn lazy_union_agrees_with_eager() {
        let left = ab_table(&[(1, "foo", 0.25), (2, "bar", 1.0)]);
        let right = ab_table(&[(1, "foo", 0.5), (3, "baz", 0.75)]);

        let eager = Union::try_new(left.schema(), right.schema(), Lattice::Godel)
            .unwrap()
            .execute(&left, &right)
            .unwrap();
        let lazy = materialize(
            LazyUnion::try_new(
                TableScan::new(&left),
                TableScan::new(&right),
                Lattice::Godel,
            )
            .unwrap(),
        );

        assert_eq!(eager, lazy);
    }

    #[test]
    fn lazy_union_emits_unmatched_right_records_last() {
        let left = ab_table(&[(1, "foo", 0.25)]);
        let right = ab_table(&[(1, "foo", 0.5), (3, "baz", 0.75)]);

        let records = collect(
            LazyUnion::try_new(
                TableScan::new(&left),
                TableScan::new(&right),
                Lattice::Godel,
            )
            .unwrap(),
        );

        assert_eq!(2, records.len());
        assert_eq!(Degree::new(0.5).unwrap(), records[0].degree());
        assert_eq!(
            &ScalarValue::from(3_i64),
            records[1].value("a").unwrap()
        );
    }

    #[test]
    fn lazy_intersect_agrees_with_eager() {
        let left = ab_table(&[(1, "foo", 0.25), (2, "bar", 1.0)]);
        let right = ab_table(&[(1, "foo", 0.5), (3, "baz", 0.75)]);

        let eager = Intersect::try_new(left.schema(), right.schema(), Lattice::Godel)
            .unwrap()
            .execute(&left, &right)
            .unwrap();
        let lazy = materialize(
            LazyIntersect::try_new(
                TableScan::new(&left),
                TableScan::new(&right),
                Lattice::Godel,
            )
            .unwrap(),
        );

        assert_eq!(eager, lazy);
    }

    #[test]
    fn lazy_restrict_passes_zero_degrees() {
        let input = ab_table(&[(1, "foo", 1.0), (2, "bar", 0.5)]);
        let restrict = LazyRestrict::new(TableScan::new(&input), |_| Degree::ZERO);

        let records = collect(restrict);
        assert_eq!(2, records.len());
        assert!(records.iter().all(|r| r.degree().is_zero()));
    }

    #[test]
    fn lazy_union_rejects_unequal_schemas() {
        let left = ab_table(&[]);
        let other_schema =
            Arc::new(Schema::try_new([Attribute::new("a", DataType::Int64)]).unwrap());
        let other = Table::new(other_schema);

        let err = LazyUnion::try_new(
            TableScan::new(&left),
            TableScan::new(&other),
            Lattice::Godel,
        )
        .unwrap_err();
        assert_eq!(ErrorKind::SchemaNotEqual, err.kind());
    }

    #[test]
    fn similarity_conditions_work_lazily() {
        let input = ab_table(&[(1, "kitten", 1.0), (2, "zzz", 1.0)]);
        let select = LazySelect::try_new(
            TableScan::new(&input),
            select::similar("b", "kitten", Similarity::text()),
            Lattice::Godel,
        )
        .unwrap();

        let records = collect(select);
        assert_eq!(1, records.len());
        assert_eq!(Degree::ONE, records[0].degree());
    }
}
