//! Error types shared across the rankdb crates.
//!
//! All errors produced by the engine are construction-time validation
//! failures. Once an operator or condition has been built, evaluating it
//! does not fail; closures supplied by the caller propagate their own errors
//! through `Result` unchanged.

use std::fmt;

pub type Result<T, E = RankError> = std::result::Result<T, E>;

/// Classifies a validation failure.
///
/// Kinds map one-to-one onto the invariants checked during schema, record,
/// condition and operator construction. They exist so callers (and tests)
/// can match on the failure class without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Schema construction or renaming produced two attributes with the same
    /// name.
    DuplicateAttributeName,
    /// A condition or accessor referenced an attribute the schema does not
    /// contain.
    AttributeNotInSchema,
    /// Projection target is not a subschema of the input.
    NotSubschema,
    /// Operation requires equal schemas on both inputs.
    SchemaNotEqual,
    /// Two schemas disagree on the domain of a shared attribute name.
    SchemaNotJoinable,
    /// A selection condition references attributes missing from the input
    /// schema.
    SelectionConditionNotApplicable,
    /// A join condition references attributes missing from (or mistyped in)
    /// one of the two input schemas.
    OnConditionNotApplicable,
    /// An ordering comparison was requested for a domain without an order.
    NotComparable,
    /// The two sides of a comparison have different domains.
    ComparisonDomainMismatch,
    /// A value's type disagrees with the attribute domain declared by the
    /// schema.
    TypeSchemaMismatch,
    /// A record was inserted into a table with a different schema.
    TableRecordSchemaMismatch,
    /// A degree outside [0, 1], or NaN.
    InvalidDegree,
    /// A join was constructed with no conditions.
    EmptyJoinCondition,
    /// Recursion exceeded its configured iteration limit.
    IterationLimitExceeded,
    /// Anything that doesn't fit the above; typically a wrapped foreign
    /// error.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DuplicateAttributeName => "duplicate attribute name",
            Self::AttributeNotInSchema => "attribute not in schema",
            Self::NotSubschema => "not a subschema",
            Self::SchemaNotEqual => "schemas not equal",
            Self::SchemaNotJoinable => "schemas not joinable",
            Self::SelectionConditionNotApplicable => "selection condition not applicable",
            Self::OnConditionNotApplicable => "join condition not applicable",
            Self::NotComparable => "domain not comparable",
            Self::ComparisonDomainMismatch => "comparison domain mismatch",
            Self::TypeSchemaMismatch => "value type does not match schema",
            Self::TableRecordSchemaMismatch => "record schema does not match table",
            Self::InvalidDegree => "invalid degree",
            Self::EmptyJoinCondition => "join requires at least one condition",
            Self::IterationLimitExceeded => "iteration limit exceeded",
            Self::Internal => "internal error",
        };
        write!(f, "{s}")
    }
}

/// Error type for all fallible operations in the engine.
#[derive(Debug)]
pub struct RankError {
    kind: ErrorKind,
    msg: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Extra key/value context attached at the error site.
    fields: Vec<(&'static str, String)>,
}

impl RankError {
    pub fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        RankError {
            kind,
            msg: msg.into(),
            source: None,
            fields: Vec::new(),
        }
    }

    pub fn with_source(
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        RankError {
            kind,
            msg: msg.into(),
            source: Some(source.into()),
            fields: Vec::new(),
        }
    }

    /// Attach a displayable field to the error.
    pub fn with_field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.fields.push((key, value.to_string()));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for RankError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.msg)?;
        for (key, value) in &self.fields {
            write!(f, "\n  {key}: {value}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RankError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Extends `Result` with methods for wrapping foreign errors.
pub trait ResultExt<T> {
    /// Wrap the error with a static context message.
    fn context(self, msg: &'static str) -> Result<T>;

    /// Wrap the error with a lazily computed context message.
    fn context_fn<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| RankError::with_source(ErrorKind::Internal, msg, e))
    }

    fn context_fn<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| RankError::with_source(ErrorKind::Internal, f(), e))
    }
}
