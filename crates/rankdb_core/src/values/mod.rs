//! Scalar domains and values.

pub mod datatype;
pub mod scalar;

pub use datatype::DataType;
pub use scalar::ScalarValue;
