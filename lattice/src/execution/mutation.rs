//! Mutation resolvers: write operations applying an input payload to the
//! store before re-entering ordinary field resolution.
//!
//! Each resolver is registered on the mutation root type like any other
//! binding, so whatever object a mutation returns gets its nested fields
//! resolved exactly like a query would.

use async_trait::async_trait;
use serde_json_bytes::Value;

use crate::json_ext::Object;
use crate::resolver::Resolver;
use crate::resolver::ResolverContext;
use crate::resolver::ResolverError;
use crate::spec::Schema;

/// The return contract of a [`DeleteMutation`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeleteReturning {
    /// The remaining full collection, in store order.
    #[default]
    Collection,
    /// The deleted record's last-known value, null when it never existed.
    Record,
}

/// Creates a new record from a whitelisted input payload.
///
/// The store assigns the identity, so two creates with identical payloads
/// produce two records with distinct identifiers: create is not
/// idempotent.
pub struct CreateMutation {
    entity: String,
    input_type: String,
    input_arg: String,
}

impl CreateMutation {
    pub fn new(
        entity: impl Into<String>,
        input_type: impl Into<String>,
        input_arg: impl Into<String>,
    ) -> Self {
        Self {
            entity: entity.into(),
            input_type: input_type.into(),
            input_arg: input_arg.into(),
        }
    }
}

#[async_trait]
impl Resolver for CreateMutation {
    async fn resolve(&self, ctx: ResolverContext<'_>) -> Result<Value, ResolverError> {
        let payload = ctx.required_object_argument(&self.input_arg)?;
        let record = coerce_input(ctx.context.schema(), &self.input_type, payload, false)?;
        tracing::debug!(entity = %self.entity, "creating record");
        Ok(ctx.context.store().insert(&self.entity, record).await?)
    }
}

/// Merges the provided fields into an existing record.
///
/// Holds the per-identifier mutation lock across the read-modify-write.
/// Omitted fields retain their prior values; an absent target surfaces
/// as a field-scoped NotFound error. Idempotent under identical edits.
pub struct UpdateMutation {
    entity: String,
    input_type: String,
    id_arg: String,
    input_arg: String,
}

impl UpdateMutation {
    pub fn new(
        entity: impl Into<String>,
        input_type: impl Into<String>,
        id_arg: impl Into<String>,
        input_arg: impl Into<String>,
    ) -> Self {
        Self {
            entity: entity.into(),
            input_type: input_type.into(),
            id_arg: id_arg.into(),
            input_arg: input_arg.into(),
        }
    }
}

#[async_trait]
impl Resolver for UpdateMutation {
    async fn resolve(&self, ctx: ResolverContext<'_>) -> Result<Value, ResolverError> {
        let id = ctx.required_str_argument(&self.id_arg)?;
        let payload = ctx.required_object_argument(&self.input_arg)?;
        let edits = coerce_input(ctx.context.schema(), &self.input_type, payload, true)?;

        let _guard = ctx.context.lock_record(&self.entity, id).await;
        tracing::debug!(entity = %self.entity, id, "updating record");
        Ok(ctx.context.store().update(&self.entity, id, edits).await?)
    }
}

/// Removes a record by identifier.
///
/// Removing an absent identifier is a no-op, not an error: delete is
/// idempotent.
pub struct DeleteMutation {
    entity: String,
    id_arg: String,
    returning: DeleteReturning,
}

impl DeleteMutation {
    pub fn new(
        entity: impl Into<String>,
        id_arg: impl Into<String>,
        returning: DeleteReturning,
    ) -> Self {
        Self {
            entity: entity.into(),
            id_arg: id_arg.into(),
            returning,
        }
    }
}

#[async_trait]
impl Resolver for DeleteMutation {
    async fn resolve(&self, ctx: ResolverContext<'_>) -> Result<Value, ResolverError> {
        let id = ctx.required_str_argument(&self.id_arg)?;
        let _guard = ctx.context.lock_record(&self.entity, id).await;
        match self.returning {
            DeleteReturning::Record => {
                let last_known = ctx.context.store().lookup_by_id(&self.entity, id).await?;
                let removed = ctx.context.store().remove(&self.entity, id).await?;
                tracing::debug!(entity = %self.entity, id, removed, "deleting record");
                Ok(last_known.unwrap_or(Value::Null))
            }
            DeleteReturning::Collection => {
                let removed = ctx.context.store().remove(&self.entity, id).await?;
                tracing::debug!(entity = %self.entity, id, removed, "deleting record");
                Ok(Value::Array(ctx.context.store().scan(&self.entity).await?))
            }
        }
    }
}

/// Whitelist-based merge of a payload against a declared input type.
///
/// Unknown keys are rejected rather than silently dropped; a partial
/// merge (update) tolerates omitted fields, a full merge (create)
/// requires every non-null field.
fn coerce_input(
    schema: &Schema,
    input_type: &str,
    payload: &Object,
    partial: bool,
) -> Result<Object, ResolverError> {
    let ty = schema
        .input_type(input_type)
        .map_err(|err| ResolverError::Custom(err.to_string()))?;

    for key in payload.keys() {
        if ty.field(key.as_str()).is_none() {
            return Err(ResolverError::UnknownInputField(
                key.as_str().to_string(),
                input_type.to_string(),
            ));
        }
    }

    let mut merged = Object::new();
    for (name, field_type) in ty.fields() {
        match payload.get(name) {
            Some(value) => {
                field_type
                    .validate_input_value(value, schema)
                    .map_err(|_| {
                        ResolverError::InvalidInputValue(
                            name.to_string(),
                            input_type.to_string(),
                        )
                    })?;
                merged.insert(name, value.clone());
            }
            None => {
                if !partial && field_type.is_non_null() {
                    return Err(ResolverError::MissingInputField(
                        name.to_string(),
                        input_type.to_string(),
                    ));
                }
            }
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json_bytes::json;

    use super::*;
    use crate::spec::Schema;

    fn schema() -> Schema {
        Schema::builder()
            .object_type("Query", [("ping", "String".parse().unwrap())])
            .input_type(
                "AddGameInput",
                [
                    ("title", "String!".parse().unwrap()),
                    ("platform", "[String!]!".parse().unwrap()),
                ],
            )
            .input_type(
                "EditGameInput",
                [
                    ("title", "String".parse().unwrap()),
                    ("platform", "[String!]".parse().unwrap()),
                ],
            )
            .build()
            .unwrap()
    }

    fn object(value: serde_json_bytes::Value) -> Object {
        match value {
            serde_json_bytes::Value::Object(object) => object,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn full_merge_requires_every_non_null_field() {
        let schema = schema();
        let err = coerce_input(
            &schema,
            "AddGameInput",
            &object(json!({ "title": "Pikmin" })),
            false,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ResolverError::MissingInputField("platform".to_string(), "AddGameInput".to_string()),
        );
    }

    #[test]
    fn partial_merge_keeps_only_the_provided_keys() {
        let schema = schema();
        let merged = coerce_input(
            &schema,
            "EditGameInput",
            &object(json!({ "title": "Pikmin 4" })),
            true,
        )
        .unwrap();
        assert_eq!(merged, object(json!({ "title": "Pikmin 4" })));
    }

    #[test]
    fn unknown_keys_are_rejected_not_ignored() {
        let schema = schema();
        let err = coerce_input(
            &schema,
            "EditGameInput",
            &object(json!({ "title": "Pikmin 4", "rating": 10 })),
            true,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ResolverError::UnknownInputField("rating".to_string(), "EditGameInput".to_string()),
        );
    }

    #[test]
    fn mistyped_values_are_rejected() {
        let schema = schema();
        let err = coerce_input(
            &schema,
            "AddGameInput",
            &object(json!({ "title": "Pikmin", "platform": "Switch" })),
            false,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ResolverError::InvalidInputValue("platform".to_string(), "AddGameInput".to_string()),
        );
    }
}
