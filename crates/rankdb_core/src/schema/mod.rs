//! Attribute and schema types.

pub mod attribute;
#[allow(clippy::module_inception)]
pub mod schema;

pub use attribute::Attribute;
pub use schema::Schema;
