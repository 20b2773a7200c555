use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::ByteString;
use serde_json_bytes::Map as JsonMap;
use serde_json_bytes::Value;

use super::OperationKind;
use crate::json_ext::Object;

/// A request against the engine.
///
/// A request is not query text: callers hand the engine an already
/// structured tree of selected fields. Validation of that tree against the
/// schema happens before any resolver runs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// The root operation kind.
    #[serde(default)]
    pub operation: OperationKind,

    /// The root selection set.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub selections: Vec<FieldNode>,
}

#[buildstructor::buildstructor]
impl Request {
    /// Returns a builder that builds a [`Request`] from its components.
    ///
    /// Builder methods:
    ///
    /// * `.operation(`[`OperationKind`]`)`
    ///   Optional, defaults to [`OperationKind::Query`].
    ///
    /// * `.selections(impl Into<`[`Vec`]`<`[`FieldNode`]`>>)` /
    ///   `.selection(`[`FieldNode`]`)`
    ///   The root selection set.
    ///
    /// * `.build()`
    #[builder(visibility = "pub")]
    fn new(operation: Option<OperationKind>, selections: Vec<FieldNode>) -> Self {
        Self {
            operation: operation.unwrap_or_default(),
            selections,
        }
    }
}

/// One requested field: a name, its arguments and its nested selection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldNode {
    /// The field name as declared on the traversed type.
    pub name: String,

    /// The field arguments, as a mapping from name to JSON literal.
    #[serde(skip_serializing_if = "Object::is_empty", default)]
    pub arguments: Object,

    /// The nested selection, empty for scalar fields.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub selections: Vec<FieldNode>,
}

#[buildstructor::buildstructor]
impl FieldNode {
    /// Returns a builder that builds a [`FieldNode`] from its components.
    ///
    /// Builder methods:
    ///
    /// * `.name(impl Into<`[`String`]`>)`
    ///   Required.
    ///
    /// * `.arguments(impl Into<`[`serde_json_bytes::Map`]`<`[`ByteString`]`, `[`Value`]`>>)` /
    ///   `.argument(impl Into<`[`ByteString`]`>, impl Into<`[`Value`]`>)`
    ///   Optional.
    ///
    /// * `.selections(impl Into<`[`Vec`]`<`[`FieldNode`]`>>)` /
    ///   `.selection(`[`FieldNode`]`)`
    ///   Optional, empty for scalar fields.
    ///
    /// * `.build()`
    #[builder(visibility = "pub")]
    fn new(
        name: String,
        arguments: JsonMap<ByteString, Value>,
        selections: Vec<FieldNode>,
    ) -> Self {
        Self {
            name,
            arguments,
            selections,
        }
    }
}
