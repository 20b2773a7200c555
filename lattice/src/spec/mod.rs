//! Request validation against the type registry.

mod field_type;
mod schema;
mod selection;

use displaydoc::Display;
pub use field_type::Cardinality;
pub use field_type::FieldType;
pub(crate) use field_type::InvalidValue;
pub use schema::ObjectType;
pub use schema::Schema;
pub use schema::SchemaBuilder;
pub use schema::SchemaError;
pub(crate) use selection::Selection;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::graphql::OperationKind;

/// Request-shape errors.
///
/// These are detected while validating a request's selection tree against
/// the registry, before any resolver executes; the whole request is
/// rejected without partial execution.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SpecError {
    /// unknown type '{0}'
    UnknownType(String),
    /// cannot query field '{0}' on type '{1}'
    UnknownField(String, String),
    /// field '{0}' of type '{1}' resolves an object type and requires a subselection
    MissingSubselection(String, String),
    /// field '{0}' of type '{1}' is a scalar and does not accept a subselection
    SubselectionOnScalar(String, String),
    /// schema does not declare a root type for '{0}' operations
    MissingRoot(OperationKind),
    /// selection processing recursion limit exceeded
    RecursionLimitExceeded,
}

impl SpecError {
    pub(crate) const fn extension_code(&self) -> &'static str {
        match self {
            SpecError::UnknownType(_) => "UNKNOWN_TYPE",
            SpecError::UnknownField(_, _) => "UNKNOWN_FIELD",
            SpecError::MissingSubselection(_, _) => "MISSING_SUBSELECTION",
            SpecError::SubselectionOnScalar(_, _) => "SUBSELECTION_ON_SCALAR",
            SpecError::MissingRoot(_) => "MISSING_ROOT",
            SpecError::RecursionLimitExceeded => "RECURSION_LIMIT_EXCEEDED",
        }
    }
}
