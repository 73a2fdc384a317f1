//! Residuated-lattice combinators over [0, 1].
//!
//! A lattice family supplies the conjunctive `product` used to combine
//! degrees that must both hold, and the `supremum`/`infimum` pair used for
//! disjunction and duplicate-tuple merging. Callers pick a family once per
//! query; mixing families mid-pipeline is legal but changes semantics.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::degree::Degree;

/// One of the three canonical t-norm/t-conorm families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lattice {
    /// product = min, supremum = max.
    Godel,
    /// product = multiplication, supremum = max.
    Goguen,
    /// product = max(0, a+b-1), supremum = min(1, a+b).
    Lukasiewicz,
}

impl Lattice {
    /// Conjunctive combination: the degree to which both inputs hold.
    pub fn product(&self, a: Degree, b: Degree) -> Degree {
        match self {
            Lattice::Godel => a.min(b),
            Lattice::Goguen => Degree::saturating(a.value() * b.value()),
            Lattice::Lukasiewicz => Degree::saturating(a.value() + b.value() - 1.0),
        }
    }

    /// Disjunctive combination, also the duplicate-merge operator: never
    /// below either input.
    pub fn supremum(&self, a: Degree, b: Degree) -> Degree {
        match self {
            Lattice::Godel | Lattice::Goguen => a.max(b),
            Lattice::Lukasiewicz => Degree::saturating(a.value() + b.value()),
        }
    }

    /// Meet on [0, 1]: min for every family.
    pub fn infimum(&self, a: Degree, b: Degree) -> Degree {
        a.min(b)
    }
}

impl fmt::Display for Lattice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Lattice::Godel => "godel",
            Lattice::Goguen => "goguen",
            Lattice::Lukasiewicz => "lukasiewicz",
        };
        write!(f, "{s}")
    }
}

pub const ALL_LATTICES: [Lattice; 3] = [Lattice::Godel, Lattice::Goguen, Lattice::Lukasiewicz];
