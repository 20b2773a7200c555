//! Store-backed resolvers for root and relational fields.

use async_trait::async_trait;
use serde_json_bytes::Value;

use super::Resolver;
use super::ResolverContext;
use super::ResolverError;

/// Resolves a root collection field to every record of an entity kind, in
/// store order.
pub struct Collection {
    entity: String,
}

impl Collection {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
        }
    }
}

#[async_trait]
impl Resolver for Collection {
    async fn resolve(&self, ctx: ResolverContext<'_>) -> Result<Value, ResolverError> {
        let records = ctx.context.store().scan(&self.entity).await?;
        Ok(Value::Array(records))
    }
}

/// Resolves a root field taking an identifier argument to the matching
/// record, or null when there is none.
pub struct ById {
    entity: String,
    id_arg: String,
}

impl ById {
    pub fn new(entity: impl Into<String>, id_arg: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            id_arg: id_arg.into(),
        }
    }
}

#[async_trait]
impl Resolver for ById {
    async fn resolve(&self, ctx: ResolverContext<'_>) -> Result<Value, ResolverError> {
        let id = ctx.required_str_argument(&self.id_arg)?;
        let record = ctx.context.store().lookup_by_id(&self.entity, id).await?;
        Ok(record.unwrap_or(Value::Null))
    }
}

/// Resolves a one-to-many back-reference: all records whose foreign key
/// equals the parent's id, in store order, possibly empty.
pub struct RelatedMany {
    entity: String,
    foreign_key: String,
}

impl RelatedMany {
    pub fn new(entity: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            foreign_key: foreign_key.into(),
        }
    }
}

#[async_trait]
impl Resolver for RelatedMany {
    async fn resolve(&self, ctx: ResolverContext<'_>) -> Result<Value, ResolverError> {
        let parent_id = ctx
            .parent_object()
            .and_then(|parent| parent.get("id"))
            .cloned()
            .unwrap_or(Value::Null);
        let records = ctx
            .context
            .store()
            .filter_by_foreign_key(&self.entity, &self.foreign_key, &parent_id)
            .await?;
        Ok(Value::Array(records))
    }
}

/// Resolves a single reference through a key field on the parent record.
///
/// When no record matches and the selected field is declared non-null, the
/// resolver fails instead of returning null, so the failure carries a
/// reference error rather than a bare nullability violation.
pub struct RelatedOne {
    entity: String,
    key_field: String,
}

impl RelatedOne {
    pub fn new(entity: impl Into<String>, key_field: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            key_field: key_field.into(),
        }
    }

    fn missing(&self, ctx: &ResolverContext<'_>) -> Result<Value, ResolverError> {
        if ctx.field_type.is_non_null() {
            Err(ResolverError::DanglingReference(
                self.key_field.clone(),
                self.entity.clone(),
            ))
        } else {
            Ok(Value::Null)
        }
    }
}

#[async_trait]
impl Resolver for RelatedOne {
    async fn resolve(&self, ctx: ResolverContext<'_>) -> Result<Value, ResolverError> {
        let key = ctx
            .parent_object()
            .and_then(|parent| parent.get(self.key_field.as_str()))
            .and_then(|key| key.as_str());
        let Some(key) = key else {
            return self.missing(&ctx);
        };
        match ctx.context.store().lookup_by_id(&self.entity, key).await? {
            Some(record) => Ok(record),
            None => self.missing(&ctx),
        }
    }
}
