//! Recursive fixpoint evaluation of graded relations.

pub mod fixpoint;

pub use fixpoint::{Frontier, Recursion, TransformedRecursion};
