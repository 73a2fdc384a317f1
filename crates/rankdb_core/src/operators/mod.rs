//! Relational operators over graded relations.
//!
//! Every operator comes in two strategies with identical semantics:
//!
//! - eager: validated at `try_new`, `execute` consumes materialized tables
//!   and returns an owned table;
//! - lazy: a [`RecordSource`] pulling one record per `next()` from upstream
//!   sources, buffering only what correctness requires.
//!
//! Eager operators drop records whose output degree is exactly zero while
//! materializing; lazy operators skip them inside `next()`. The generic
//! escape hatches ([`Restrict`], [`MapRecords`]) pass every record through
//! untouched since their closures' semantics are opaque to the engine.

pub mod intersect;
pub mod join;
pub mod lazy;
pub mod lazy_ops;
pub mod project;
pub mod restrict;
pub mod select;
pub mod union;

pub use intersect::Intersect;
pub use join::Join;
pub use lazy::{CachedSource, RecordSource, TableScan};
pub use lazy_ops::{LazyIntersect, LazyJoin, LazyProject, LazyRestrict, LazySelect, LazyUnion};
pub use project::{Project, Projection};
pub use restrict::{MapRecords, Restrict, SimilarityRestrict};
pub use select::Select;
pub use union::Union;
