//! Request execution.
//!
//! Walks a validated selection tree, invokes resolvers in dependency
//! order and assembles the response. Sibling fields resolve concurrently;
//! the output always keeps request field order.

pub mod mutation;

use futures::future::BoxFuture;
use futures::future::join_all;
use parking_lot::Mutex;
use serde_json_bytes::Value;

use crate::context::RequestContext;
use crate::graphql::Error;
use crate::graphql::OperationKind;
use crate::graphql::Request;
use crate::graphql::Response;
use crate::json_ext::Object;
use crate::json_ext::Path;
use crate::json_ext::PathElement;
use crate::resolver::ResolverContext;
use crate::resolver::ResolverMap;
use crate::spec::FieldType;
use crate::spec::InvalidValue;
use crate::spec::Schema;
use crate::spec::Selection;
use crate::spec::SpecError;

pub(crate) const ERROR_CODE_NULLABILITY: &str = "NULLABILITY_VIOLATION";

struct ExecutionParameters<'a> {
    resolvers: &'a ResolverMap,
    context: &'a RequestContext,
    errors: Mutex<Vec<Error>>,
}

impl ExecutionParameters<'_> {
    fn record(&self, error: Error) {
        self.errors.lock().push(error);
    }
}

/// Validates and executes one request to completion.
///
/// Request-shape errors reject before any resolver runs and produce a
/// response without `data`; everything else yields a response mirroring
/// the request shape, possibly with null leaves and an error list.
#[tracing::instrument(skip_all, level = "debug", fields(operation = %request.operation))]
pub(crate) async fn execute_request(
    schema: &Schema,
    resolvers: &ResolverMap,
    context: &RequestContext,
    request: &Request,
) -> Response {
    let root_type = match schema.root_type(request.operation) {
        Ok(root_type) => root_type,
        Err(err) => return reject(err),
    };
    let selections = match request
        .selections
        .iter()
        .map(|node| Selection::from_request(node, root_type, schema, 0))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(selections) => selections,
        Err(err) => return reject(err),
    };

    let parameters = ExecutionParameters {
        resolvers,
        context,
        errors: Mutex::new(Vec::new()),
    };
    let result = match request.operation {
        OperationKind::Query => {
            resolve_selection_set(
                &parameters,
                root_type.name(),
                &selections,
                None,
                Path::empty(),
            )
            .await
        }
        OperationKind::Mutation => {
            resolve_serially(&parameters, root_type.name(), &selections).await
        }
    };
    let data = match result {
        Ok(object) => Value::Object(object),
        // A non-null failure with no nullable ancestor voids the response.
        Err(InvalidValue) => Value::Null,
    };

    Response::builder()
        .data(data)
        .errors(parameters.errors.into_inner())
        .build()
}

fn reject(err: SpecError) -> Response {
    tracing::debug!(error = %err, "rejecting request");
    Response::builder()
        .error(
            Error::builder()
                .message(err.to_string())
                .fatal(true)
                .extension_code(err.extension_code())
                .build(),
        )
        .build()
}

/// Resolves every field of one selection level concurrently and assembles
/// the output object in request order.
fn resolve_selection_set<'a, 'v>(
    parameters: &'v ExecutionParameters<'a>,
    type_name: &'v str,
    selections: &'v [Selection],
    parent: Option<&'v Value>,
    path: Path,
) -> BoxFuture<'v, Result<Object, InvalidValue>>
where
    'a: 'v,
{
    Box::pin(async move {
        let results = join_all(selections.iter().map(|selection| {
            resolve_field(
                parameters,
                type_name,
                selection,
                parent,
                path.key(&selection.name),
            )
        }))
        .await;

        let mut output = Object::new();
        for (selection, result) in selections.iter().zip(results) {
            output.insert(selection.name.as_str(), result?);
        }
        Ok(output)
    })
}

/// Root mutation fields run serially in request order so write effects
/// stay deterministic.
async fn resolve_serially(
    parameters: &ExecutionParameters<'_>,
    type_name: &str,
    selections: &[Selection],
) -> Result<Object, InvalidValue> {
    let mut output = Object::new();
    for selection in selections {
        let path = Path::empty().key(&selection.name);
        let value = resolve_field(parameters, type_name, selection, None, path).await?;
        output.insert(selection.name.as_str(), value);
    }
    Ok(output)
}

fn resolve_field<'a, 'v>(
    parameters: &'v ExecutionParameters<'a>,
    parent_type_name: &'v str,
    selection: &'v Selection,
    parent: Option<&'v Value>,
    path: Path,
) -> BoxFuture<'v, Result<Value, InvalidValue>>
where
    'a: 'v,
{
    Box::pin(async move {
        let resolver = parameters
            .resolvers
            .lookup(parent_type_name, &selection.name);
        let result = resolver
            .resolve(ResolverContext {
                parent,
                arguments: &selection.arguments,
                field_name: &selection.name,
                field_type: &selection.field_type,
                context: parameters.context,
            })
            .await;

        match result {
            Ok(value) => {
                complete_value(
                    parameters,
                    &selection.field_type,
                    value,
                    selection.selection_set.as_deref(),
                    path,
                    parent_type_name,
                )
                .await
            }
            Err(err) => {
                let fatal = selection.field_type.is_non_null();
                tracing::debug!(field = %selection.name, error = %err, "resolver failed");
                parameters.record(
                    Error::builder()
                        .message(err.to_string())
                        .path(path)
                        .fatal(fatal)
                        .extension_code(err.extension_code())
                        .build(),
                );
                if fatal {
                    Err(InvalidValue)
                } else {
                    // Localized: the field resolves to null and siblings
                    // keep going.
                    Ok(Value::Null)
                }
            }
        }
    })
}

/// Checks a resolved value against its declared type.
///
/// Invalid or null values are replaced with null and absorbed, because
/// declared types are optional by default. A non-null wrapper instead
/// records the violation and propagates it up until the next nullable
/// boundary.
fn complete_value<'a, 'v>(
    parameters: &'v ExecutionParameters<'a>,
    field_type: &'v FieldType,
    value: Value,
    selections: Option<&'v [Selection]>,
    path: Path,
    parent_type_name: &'v str,
) -> BoxFuture<'v, Result<Value, InvalidValue>>
where
    'a: 'v,
{
    Box::pin(async move {
        match field_type {
            FieldType::NonNull(inner_type) => {
                let completed = complete_value(
                    parameters,
                    inner_type,
                    value,
                    selections,
                    path.clone(),
                    parent_type_name,
                )
                .await?;
                if completed.is_null() {
                    let message = match path.last() {
                        Some(PathElement::Key(key)) => format!(
                            "Cannot return null for non-nullable field {parent_type_name}.{key}"
                        ),
                        Some(PathElement::Index(index)) => format!(
                            "Cannot return null for non-nullable array element of type {inner_type} at index {index}"
                        ),
                        None => {
                            format!("Cannot return null for non-nullable type {inner_type}")
                        }
                    };
                    parameters.record(
                        Error::builder()
                            .message(message)
                            .path(path)
                            .fatal(true)
                            .extension_code(ERROR_CODE_NULLABILITY)
                            .build(),
                    );
                    Err(InvalidValue)
                } else {
                    Ok(completed)
                }
            }

            FieldType::List(inner_type) => match value {
                Value::Array(items) => {
                    // The nested selection resolves independently against
                    // every element.
                    let results =
                        join_all(items.into_iter().enumerate().map(|(index, item)| {
                            complete_value(
                                parameters,
                                inner_type,
                                item,
                                selections,
                                path.index(index),
                                parent_type_name,
                            )
                        }))
                        .await;

                    let mut completed = Vec::with_capacity(results.len());
                    let mut voided = false;
                    for result in results {
                        match result {
                            Ok(value) => completed.push(value),
                            // A failing non-null element voids the whole
                            // list; the list's own nullability is handled
                            // by the wrapping type.
                            Err(InvalidValue) => voided = true,
                        }
                    }
                    if voided {
                        Ok(Value::Null)
                    } else {
                        Ok(Value::Array(completed))
                    }
                }
                _ => Ok(Value::Null),
            },

            FieldType::Named(type_name) => match value {
                Value::Object(_) => {
                    let selections = selections.unwrap_or_default();
                    match resolve_selection_set(
                        parameters,
                        type_name,
                        selections,
                        Some(&value),
                        path,
                    )
                    .await
                    {
                        Ok(object) => Ok(Value::Object(object)),
                        // The object absorbs a failing non-null child by
                        // becoming null itself.
                        Err(InvalidValue) => Ok(Value::Null),
                    }
                }
                _ => Ok(Value::Null),
            },

            // the rest of the possible types just need to validate the
            // expected value
            FieldType::Int => {
                let is_valid_int = value
                    .as_i64()
                    .map(|i| i32::try_from(i).is_ok())
                    .or_else(|| value.as_u64().map(|i| i32::try_from(i).is_ok()))
                    .unwrap_or(false);
                if is_valid_int {
                    Ok(value)
                } else {
                    Ok(Value::Null)
                }
            }
            FieldType::Float => {
                if value.as_f64().is_some() {
                    Ok(value)
                } else {
                    Ok(Value::Null)
                }
            }
            FieldType::Boolean => {
                if value.as_bool().is_some() {
                    Ok(value)
                } else {
                    Ok(Value::Null)
                }
            }
            FieldType::String => {
                if value.as_str().is_some() {
                    Ok(value)
                } else {
                    Ok(Value::Null)
                }
            }
            FieldType::Id => {
                if value.is_string() || value.as_i64().is_some() || value.as_u64().is_some() {
                    Ok(value)
                } else {
                    Ok(Value::Null)
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use serde_json_bytes::json as bjson;

    use super::*;
    use crate::context::MutationLocks;
    use crate::graphql::FieldNode;
    use crate::resolver::Resolver;
    use crate::resolver::ResolverError;
    use crate::resolver::resolver_fn;
    use crate::spec::Schema;
    use crate::store::MemStore;

    struct Slow;

    #[async_trait::async_trait]
    impl Resolver for Slow {
        async fn resolve(&self, _ctx: ResolverContext<'_>) -> Result<Value, ResolverError> {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok(bjson!("slow"))
        }
    }

    fn schema() -> Schema {
        Schema::builder()
            .object_type(
                "Query",
                [
                    ("slow", "String".parse().unwrap()),
                    ("fast", "String".parse().unwrap()),
                    ("broken", "String".parse().unwrap()),
                ],
            )
            .build()
            .unwrap()
    }

    fn context(schema: &Schema) -> RequestContext {
        RequestContext::new(
            Arc::new(MemStore::new()),
            Arc::new(schema.clone()),
            Arc::new(MutationLocks::default()),
        )
    }

    #[tokio::test]
    async fn keys_keep_request_order_whatever_the_completion_order() {
        let schema = schema();
        let mut resolvers = ResolverMap::new();
        resolvers.register("Query", "slow", Slow);
        resolvers.register("Query", "fast", resolver_fn(|_| Ok(bjson!("fast"))));

        let request = serde_json::from_value::<Request>(json!({
            "selections": [ { "name": "slow" }, { "name": "fast" } ],
        }))
        .unwrap();
        let context = context(&schema);
        let response = execute_request(&schema, &resolvers, &context, &request).await;

        assert_eq!(
            serde_json::to_string(&response.data.unwrap()).unwrap(),
            r#"{"slow":"slow","fast":"fast"}"#,
        );
    }

    #[tokio::test]
    async fn a_failing_nullable_sibling_does_not_halt_the_others() {
        let schema = schema();
        let mut resolvers = ResolverMap::new();
        resolvers.register("Query", "fast", resolver_fn(|_| Ok(bjson!("fast"))));
        resolvers.register(
            "Query",
            "broken",
            resolver_fn(|_| Err(ResolverError::Custom("boom".to_string()))),
        );

        let request = serde_json::from_value::<Request>(json!({
            "selections": [ { "name": "broken" }, { "name": "fast" } ],
        }))
        .unwrap();
        let context = context(&schema);
        let response = execute_request(&schema, &resolvers, &context, &request).await;

        assert_eq!(
            response.data,
            Some(bjson!({ "broken": null, "fast": "fast" })),
        );
        assert_eq!(response.errors.len(), 1);
        assert!(!response.errors[0].fatal);
        assert_eq!(response.errors[0].path, Some(crate::json_ext::Path::from("broken")));
    }

    #[tokio::test]
    async fn request_shape_errors_reject_before_any_resolver_runs() {
        use std::sync::atomic::AtomicUsize;
        use std::sync::atomic::Ordering;

        static CALLS: AtomicUsize = AtomicUsize::new(0);

        let schema = schema();
        let mut resolvers = ResolverMap::new();
        resolvers.register(
            "Query",
            "fast",
            resolver_fn(|_| {
                CALLS.fetch_add(1, Ordering::SeqCst);
                Ok(bjson!("fast"))
            }),
        );

        let request = Request::builder()
            .selection(FieldNode::builder().name("fast").build())
            .selection(FieldNode::builder().name("nonsense").build())
            .build();
        let context = context(&schema);
        let response = execute_request(&schema, &resolvers, &context, &request).await;

        assert_eq!(response.data, None);
        assert_eq!(response.errors.len(), 1);
        assert!(response.errors[0].fatal);
        assert_eq!(
            response.errors[0].extension_code().as_deref(),
            Some("UNKNOWN_FIELD"),
        );
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);
    }
}
