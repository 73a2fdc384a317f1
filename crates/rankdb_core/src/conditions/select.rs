use rankdb_error::{ErrorKind, RankError, Result};

use crate::conditions::{ComparisonOperator, Similarity};
use crate::degree::Degree;
use crate::lattice::Lattice;
use crate::records::Record;
use crate::schema::Schema;
use crate::values::ScalarValue;

/// Condition tree evaluated against a single record.
///
/// Comparison leaves are crisp (degree 1 or 0); `Similar` leaves are graded.
/// The conjunction connectives come in two strengths, chosen per node: the
/// lattice's `product` or its `infimum`.
#[derive(Debug, Clone)]
pub enum SelectCondition {
    /// Crisp comparison of an attribute against a constant.
    Compare {
        attr: String,
        op: ComparisonOperator,
        value: ScalarValue,
    },
    /// Graded comparison of an attribute against a constant.
    Similar {
        attr: String,
        value: ScalarValue,
        similarity: Similarity,
    },
    /// Standard negation, `1 - x`.
    Not(Box<SelectCondition>),
    /// Lattice supremum of the children.
    Or(Box<SelectCondition>, Box<SelectCondition>),
    /// Lattice product of the children.
    ProductAnd(Box<SelectCondition>, Box<SelectCondition>),
    /// Lattice infimum of the children.
    InfimumAnd(Box<SelectCondition>, Box<SelectCondition>),
    /// Constant 1.
    True,
}

impl SelectCondition {
    /// Check that every referenced attribute exists in `schema` with a
    /// domain compatible with its use.
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        match self {
            SelectCondition::Compare { attr, op, value } => {
                let datatype = schema.datatype(attr).ok_or_else(|| {
                    RankError::new(
                        ErrorKind::SelectionConditionNotApplicable,
                        "condition references an attribute missing from the schema",
                    )
                    .with_field("attribute", attr.clone())
                    .with_field("schema", schema)
                })?;
                if datatype != value.datatype() {
                    return Err(RankError::new(
                        ErrorKind::ComparisonDomainMismatch,
                        "comparison operands have different domains",
                    )
                    .with_field("attribute", attr.clone())
                    .with_field("attribute_domain", datatype)
                    .with_field("constant_domain", value.datatype()));
                }
                if op.requires_ordering() && !datatype.is_comparable() {
                    return Err(RankError::new(
                        ErrorKind::NotComparable,
                        "ordering comparison on a domain without an order",
                    )
                    .with_field("attribute", attr.clone())
                    .with_field("domain", datatype)
                    .with_field("op", *op));
                }
                Ok(())
            }
            SelectCondition::Similar { attr, value, .. } => {
                let datatype = schema.datatype(attr).ok_or_else(|| {
                    RankError::new(
                        ErrorKind::SelectionConditionNotApplicable,
                        "condition references an attribute missing from the schema",
                    )
                    .with_field("attribute", attr.clone())
                    .with_field("schema", schema)
                })?;
                if datatype != value.datatype() {
                    return Err(RankError::new(
                        ErrorKind::ComparisonDomainMismatch,
                        "similarity operands have different domains",
                    )
                    .with_field("attribute", attr.clone())
                    .with_field("attribute_domain", datatype)
                    .with_field("constant_domain", value.datatype()));
                }
                Ok(())
            }
            SelectCondition::Not(c) => c.validate(schema),
            SelectCondition::Or(a, b)
            | SelectCondition::ProductAnd(a, b)
            | SelectCondition::InfimumAnd(a, b) => {
                a.validate(schema)?;
                b.validate(schema)
            }
            SelectCondition::True => Ok(()),
        }
    }

    /// Degree to which the record satisfies the condition.
    ///
    /// Total: a reference to an attribute the record lacks evaluates to 0.
    /// Validation at operator construction rules that case out.
    pub fn eval(&self, record: &Record, lattice: Lattice) -> Degree {
        match self {
            SelectCondition::Compare { attr, op, value } => match record.value(attr) {
                Ok(bound) => {
                    if op.matches(bound.cmp(value)) {
                        Degree::ONE
                    } else {
                        Degree::ZERO
                    }
                }
                Err(_) => Degree::ZERO,
            },
            SelectCondition::Similar {
                attr,
                value,
                similarity,
            } => match record.value(attr) {
                Ok(bound) => similarity.eval(bound, value),
                Err(_) => Degree::ZERO,
            },
            SelectCondition::Not(c) => Degree::saturating(1.0 - c.eval(record, lattice).value()),
            SelectCondition::Or(a, b) => {
                lattice.supremum(a.eval(record, lattice), b.eval(record, lattice))
            }
            SelectCondition::ProductAnd(a, b) => {
                lattice.product(a.eval(record, lattice), b.eval(record, lattice))
            }
            SelectCondition::InfimumAnd(a, b) => {
                lattice.infimum(a.eval(record, lattice), b.eval(record, lattice))
            }
            SelectCondition::True => Degree::ONE,
        }
    }
}

// Constructor helpers. Conditions read as `select::gt("age", 30.into())`.

pub fn compare(
    attr: impl Into<String>,
    op: ComparisonOperator,
    value: impl Into<ScalarValue>,
) -> SelectCondition {
    SelectCondition::Compare {
        attr: attr.into(),
        op,
        value: value.into(),
    }
}

pub fn eq(attr: impl Into<String>, value: impl Into<ScalarValue>) -> SelectCondition {
    compare(attr, ComparisonOperator::Eq, value)
}

pub fn lt(attr: impl Into<String>, value: impl Into<ScalarValue>) -> SelectCondition {
    compare(attr, ComparisonOperator::Lt, value)
}

pub fn lt_eq(attr: impl Into<String>, value: impl Into<ScalarValue>) -> SelectCondition {
    compare(attr, ComparisonOperator::LtEq, value)
}

pub fn gt(attr: impl Into<String>, value: impl Into<ScalarValue>) -> SelectCondition {
    compare(attr, ComparisonOperator::Gt, value)
}

pub fn gt_eq(attr: impl Into<String>, value: impl Into<ScalarValue>) -> SelectCondition {
    compare(attr, ComparisonOperator::GtEq, value)
}

pub fn similar(
    attr: impl Into<String>,
    value: impl Into<ScalarValue>,
    similarity: Similarity,
) -> SelectCondition {
    SelectCondition::Similar {
        attr: attr.into(),
        value: value.into(),
        similarity,
    }
}

pub fn not(c: SelectCondition) -> SelectCondition {
    SelectCondition::Not(Box::new(c))
}

pub fn or(a: SelectCondition, b: SelectCondition) -> SelectCondition {
    SelectCondition::Or(Box::new(a), Box::new(b))
}

pub fn product_and(a: SelectCondition, b: SelectCondition) -> SelectCondition {
    SelectCondition::ProductAnd(Box::new(a), Box::new(b))
}

pub fn infimum_and(a: SelectCondition, b: SelectCondition) -> SelectCondition {
    SelectCondition::InfimumAnd(Box::new(a), Box::new(b))
}
