//! Types related to requests, responses and errors crossing the engine
//! boundary.

mod request;
mod response;

use std::fmt;

pub use request::FieldNode;
pub use request::Request;
pub use response::Response;
use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::ByteString;
use serde_json_bytes::Map as JsonMap;
use serde_json_bytes::Value;

use crate::json_ext::Object;
use crate::json_ext::Path;

/// The two supported root operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    #[default]
    Query,
    Mutation,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Query => write!(f, "query"),
            OperationKind::Mutation => write!(f, "mutation"),
        }
    }
}

/// An error as may be found in the `errors` field of a [`Response`].
///
/// Converted to (or from) JSON with serde.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Error {
    /// The error message.
    pub message: String,

    /// If this is a field error, the JSON path to that field in [`Response::data`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Path>,

    /// Whether the failure voided an ancestor in the response data (`true`)
    /// or was absorbed at the failing field itself (`false`).
    pub fatal: bool,

    /// The optional extensions for this error.
    #[serde(skip_serializing_if = "Object::is_empty")]
    pub extensions: Object,
}

#[buildstructor::buildstructor]
impl Error {
    /// Returns a builder that builds an [`Error`] from its components.
    ///
    /// Builder methods:
    ///
    /// * `.message(impl Into<`[`String`]`>)`
    ///   Required.
    ///   Sets [`Error::message`].
    ///
    /// * `.path(impl Into<`[`Path`]`>)`
    ///   Optional.
    ///   Sets [`Error::path`].
    ///
    /// * `.fatal(bool)`
    ///   Optional, defaults to `false`.
    ///   Sets [`Error::fatal`].
    ///
    /// * `.extension_code(impl Into<`[`String`]`>)`
    ///   Optional.
    ///   Sets the "code" in the extension map. Will be ignored if extensions
    ///   already have this key set.
    ///
    /// * `.extension(impl Into<`[`ByteString`]`>, impl Into<`[`Value`]`>)`
    ///   Optional, may be called multiple times.
    ///   Adds one item to the [`Error::extensions`] map.
    ///
    /// * `.build()`
    ///   Finishes the builder and returns an [`Error`].
    #[builder(visibility = "pub")]
    fn new(
        message: String,
        path: Option<Path>,
        fatal: Option<bool>,
        extension_code: Option<String>,
        // Skip the `Object` type alias in order to use buildstructor's map special-casing
        mut extensions: JsonMap<ByteString, Value>,
    ) -> Self {
        if let Some(code) = extension_code {
            extensions
                .entry("code")
                .or_insert(Value::String(ByteString::from(code)));
        }
        Self {
            message,
            path,
            fatal: fatal.unwrap_or_default(),
            extensions,
        }
    }

    /// Extract the error code from [`Error::extensions`] as a String if it is set.
    pub fn extension_code(&self) -> Option<String> {
        self.extensions.get("code").and_then(|c| match c {
            Value::String(s) => Some(s.as_str().to_owned()),
            Value::Number(n) => Some(n.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) | Value::Bool(_) => None,
        })
    }
}

/// Displays (only) the error message.
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json_bytes::json;

    use super::*;

    #[test]
    fn error_builder_sets_the_extension_code() {
        let error = Error::builder()
            .message("no 'games' record with id 'g9'")
            .path(Path::from("updateGame"))
            .fatal(true)
            .extension_code("NOT_FOUND")
            .build();

        assert_eq!(error.extension_code().as_deref(), Some("NOT_FOUND"));
        assert!(error.fatal);
        assert_eq!(error.path, Some(Path::from("updateGame")));
    }

    #[test]
    fn error_serializes_with_camel_case_and_path_array() {
        let error = Error::builder()
            .message("boom")
            .path(Path::from("games/0/reviews"))
            .extension_code("RESOLVER_ERROR")
            .build();

        assert_eq!(
            serde_json_bytes::to_value(&error).unwrap(),
            json!({
                "message": "boom",
                "path": ["games", 0, "reviews"],
                "fatal": false,
                "extensions": { "code": "RESOLVER_ERROR" },
            })
        );
    }
}
