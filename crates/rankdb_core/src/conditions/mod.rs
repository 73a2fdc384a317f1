//! Graded condition trees.
//!
//! Selection conditions evaluate against one record, on-conditions against a
//! (left, right) record pair; both always produce a degree in [0, 1].
//! Applicability to a schema is validated when an operator is constructed;
//! evaluation itself does not fail.

pub mod on;
pub mod select;
pub mod similarity;

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use on::OnCondition;
pub use select::SelectCondition;
pub use similarity::Similarity;

/// Crisp comparison operator shared by selection and on-conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    Eq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl ComparisonOperator {
    /// Whether the operator needs an ordered domain. Equality works on any
    /// domain.
    pub fn requires_ordering(&self) -> bool {
        !matches!(self, ComparisonOperator::Eq)
    }

    pub fn matches(&self, ord: Ordering) -> bool {
        match self {
            ComparisonOperator::Eq => ord.is_eq(),
            ComparisonOperator::Lt => ord.is_lt(),
            ComparisonOperator::LtEq => ord.is_le(),
            ComparisonOperator::Gt => ord.is_gt(),
            ComparisonOperator::GtEq => ord.is_ge(),
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComparisonOperator::Eq => "=",
            ComparisonOperator::Lt => "<",
            ComparisonOperator::LtEq => "<=",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::GtEq => ">=",
        };
        write!(f, "{s}")
    }
}
