use rankdb_error::{ErrorKind, RankError, Result};

use crate::conditions::{ComparisonOperator, Similarity};
use crate::degree::Degree;
use crate::lattice::Lattice;
use crate::records::Record;
use crate::schema::Schema;
use crate::values::DataType;

/// Condition tree evaluated against a (left, right) record pair.
///
/// Same shape as [`super::SelectCondition`], but each comparison leaf names
/// one attribute on each join side. `True` is the always-satisfied condition
/// a crossjoin degenerates to.
#[derive(Debug, Clone)]
pub enum OnCondition {
    Compare {
        left: String,
        op: ComparisonOperator,
        right: String,
    },
    Similar {
        left: String,
        right: String,
        similarity: Similarity,
    },
    Not(Box<OnCondition>),
    Or(Box<OnCondition>, Box<OnCondition>),
    ProductAnd(Box<OnCondition>, Box<OnCondition>),
    InfimumAnd(Box<OnCondition>, Box<OnCondition>),
    True,
}

impl OnCondition {
    /// Check that each leaf's attributes exist on their respective sides
    /// with agreeing, appropriately comparable domains.
    pub fn validate(&self, left_schema: &Schema, right_schema: &Schema) -> Result<()> {
        match self {
            OnCondition::Compare { left, op, right } => {
                let (left_dt, right_dt) =
                    resolve_sides(left, right, left_schema, right_schema)?;
                if left_dt != right_dt {
                    return Err(RankError::new(
                        ErrorKind::OnConditionNotApplicable,
                        "join condition compares attributes of different domains",
                    )
                    .with_field("left", left.clone())
                    .with_field("left_domain", left_dt)
                    .with_field("right", right.clone())
                    .with_field("right_domain", right_dt));
                }
                if op.requires_ordering() && !left_dt.is_comparable() {
                    return Err(RankError::new(
                        ErrorKind::NotComparable,
                        "ordering comparison on a domain without an order",
                    )
                    .with_field("left", left.clone())
                    .with_field("domain", left_dt)
                    .with_field("op", *op));
                }
                Ok(())
            }
            OnCondition::Similar { left, right, .. } => {
                let (left_dt, right_dt) =
                    resolve_sides(left, right, left_schema, right_schema)?;
                if left_dt != right_dt {
                    return Err(RankError::new(
                        ErrorKind::OnConditionNotApplicable,
                        "join condition compares attributes of different domains",
                    )
                    .with_field("left", left.clone())
                    .with_field("left_domain", left_dt)
                    .with_field("right", right.clone())
                    .with_field("right_domain", right_dt));
                }
                Ok(())
            }
            OnCondition::Not(c) => c.validate(left_schema, right_schema),
            OnCondition::Or(a, b)
            | OnCondition::ProductAnd(a, b)
            | OnCondition::InfimumAnd(a, b) => {
                a.validate(left_schema, right_schema)?;
                b.validate(left_schema, right_schema)
            }
            OnCondition::True => Ok(()),
        }
    }

    /// Degree to which the record pair satisfies the condition. Total; a
    /// missing attribute evaluates to 0 (ruled out by validation).
    pub fn eval(&self, left: &Record, right: &Record, lattice: Lattice) -> Degree {
        match self {
            OnCondition::Compare {
                left: left_attr,
                op,
                right: right_attr,
            } => match (left.value(left_attr), right.value(right_attr)) {
                (Ok(l), Ok(r)) => {
                    if op.matches(l.cmp(r)) {
                        Degree::ONE
                    } else {
                        Degree::ZERO
                    }
                }
                _ => Degree::ZERO,
            },
            OnCondition::Similar {
                left: left_attr,
                right: right_attr,
                similarity,
            } => match (left.value(left_attr), right.value(right_attr)) {
                (Ok(l), Ok(r)) => similarity.eval(l, r),
                _ => Degree::ZERO,
            },
            OnCondition::Not(c) => {
                Degree::saturating(1.0 - c.eval(left, right, lattice).value())
            }
            OnCondition::Or(a, b) => lattice.supremum(
                a.eval(left, right, lattice),
                b.eval(left, right, lattice),
            ),
            OnCondition::ProductAnd(a, b) => lattice.product(
                a.eval(left, right, lattice),
                b.eval(left, right, lattice),
            ),
            OnCondition::InfimumAnd(a, b) => lattice.infimum(
                a.eval(left, right, lattice),
                b.eval(left, right, lattice),
            ),
            OnCondition::True => Degree::ONE,
        }
    }
}

fn resolve_sides(
    left: &str,
    right: &str,
    left_schema: &Schema,
    right_schema: &Schema,
) -> Result<(DataType, DataType)> {
    let left_dt = left_schema.datatype(left).ok_or_else(|| {
        RankError::new(
            ErrorKind::OnConditionNotApplicable,
            "join condition references an attribute missing from the left schema",
        )
        .with_field("attribute", left.to_string())
        .with_field("schema", left_schema)
    })?;
    let right_dt = right_schema.datatype(right).ok_or_else(|| {
        RankError::new(
            ErrorKind::OnConditionNotApplicable,
            "join condition references an attribute missing from the right schema",
        )
        .with_field("attribute", right.to_string())
        .with_field("schema", right_schema)
    })?;
    Ok((left_dt, right_dt))
}

// Constructor helpers, `on::eq("a", "a")` style.

pub fn compare(
    left: impl Into<String>,
    op: ComparisonOperator,
    right: impl Into<String>,
) -> OnCondition {
    OnCondition::Compare {
        left: left.into(),
        op,
        right: right.into(),
    }
}

pub fn eq(left: impl Into<String>, right: impl Into<String>) -> OnCondition {
    compare(left, ComparisonOperator::Eq, right)
}

pub fn lt(left: impl Into<String>, right: impl Into<String>) -> OnCondition {
    compare(left, ComparisonOperator::Lt, right)
}

pub fn lt_eq(left: impl Into<String>, right: impl Into<String>) -> OnCondition {
    compare(left, ComparisonOperator::LtEq, right)
}

pub fn gt(left: impl Into<String>, right: impl Into<String>) -> OnCondition {
    compare(left, ComparisonOperator::Gt, right)
}

pub fn gt_eq(left: impl Into<String>, right: impl Into<String>) -> OnCondition {
    compare(left, ComparisonOperator::GtEq, right)
}

pub fn similar(
    left: impl Into<String>,
    right: impl Into<String>,
    similarity: Similarity,
) -> OnCondition {
    OnCondition::Similar {
        left: left.into(),
        right: right.into(),
        similarity,
    }
}

pub fn not(c: OnCondition) -> OnCondition {
    OnCondition::Not(Box::new(c))
}

pub fn or(a: OnCondition, b: OnCondition) -> OnCondition {
    OnCondition::Or(Box::new(a), Box::new(b))
}

pub fn product_and(a: OnCondition, b: OnCondition) -> OnCondition {
    OnCondition::ProductAnd(Box::new(a), Box::new(b))
}

pub fn infimum_and(a: OnCondition, b: OnCondition) -> OnCondition {
    OnCondition::InfimumAnd(Box::new(a), Box::new(b))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::schema::Attribute;
    use crate::values::DataType;

    fn left_schema() -> Arc<Schema> {
        Arc::new(
            Schema::try_new([
                Attribute::new("a", DataType::Int64),
                Attribute::new("b", DataType::Utf8),
            ])
            .unwrap(),
        )
    }

    fn right_schema() -> Arc<Schema> {
        Arc::new(
            Schema::try_new([
                Attribute::new("a", DataType::Int64),
                Attribute::new("c", DataType::Utf8),
            ])
            .unwrap(),
        )
    }

    fn left(a: i64, b: &str) -> Record {
        Record::try_new(left_schema(), vec![a.into(), b.into()], Degree::ONE).unwrap()
    }

    fn right(a: i64, c: &str) -> Record {
        Record::try_new(right_schema(), vec![a.into(), c.into()], Degree::ONE).unwrap()
    }

    #[test]
    fn crisp_pair_comparisons() {
        let l = left(3, "foo");
        assert_eq!(
            Degree::ONE,
            eq("a", "a").eval(&l, &right(3, "bar"), Lattice::Godel)
        );
        assert_eq!(
            Degree::ZERO,
            eq("a", "a").eval(&l, &right(4, "bar"), Lattice::Godel)
        );
        assert_eq!(
            Degree::ONE,
            lt("a", "a").eval(&l, &right(4, "bar"), Lattice::Godel)
        );
        assert_eq!(Degree::ONE, OnCondition::True.eval(&l, &right(9, "x"), Lattice::Godel));
    }

    #[test]
    fn similar_pairs_are_graded() {
        let sim = similar("a", "a", Similarity::linear(4.0));
        let got = sim.eval(&left(3, "foo"), &right(4, "bar"), Lattice::Godel);
        assert_eq!(Degree::new(0.75).unwrap(), got);
    }

    #[test]
    fn validate_missing_side_attribute() {
        let err = eq("missing", "a")
            .validate(&left_schema(), &right_schema())
            .unwrap_err();
        assert_eq!(ErrorKind::OnConditionNotApplicable, err.kind());

        let err = eq("a", "missing")
            .validate(&left_schema(), &right_schema())
            .unwrap_err();
        assert_eq!(ErrorKind::OnConditionNotApplicable, err.kind());
    }

    #[test]
    fn validate_domain_mismatch() {
        let err = eq("b", "a")
            .validate(&left_schema(), &right_schema())
            .unwrap_err();
        assert_eq!(ErrorKind::OnConditionNotApplicable, err.kind());
    }

    #[test]
    fn validate_accepts_well_formed_tree() {
        let cond = product_and(eq("a", "a"), similar("b", "c", Similarity::text()));
        assert!(cond.validate(&left_schema(), &right_schema()).is_ok());
    }
}
