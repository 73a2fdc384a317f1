//! Evaluation core of a graded-truth relational algebra engine.
//!
//! Every record carries a membership degree in [0, 1] instead of a boolean.
//! Relational operators propagate, combine, or recompute that degree under a
//! chosen residuated-lattice algebra ([`lattice::Lattice`]). Operators come
//! in eager (table in, table out) and lazy (pull source in, pull source out)
//! strategies with identical semantics, and a recursive fixpoint engine
//! computes graded closures on top of them.

pub mod conditions;
pub mod degree;
pub mod fmt;
pub mod lattice;
pub mod operators;
pub mod records;
pub mod recursive;
pub mod schema;
pub mod values;
