//! Resolver bindings: the mapping from (type name, field name) to the
//! function producing that field's value.
//!
//! The lookup is two-tier: an explicit binding wins, otherwise the engine
//! falls back to the default resolver that reads the same-named property
//! off the parent value. Plain scalar fields therefore need no explicit
//! resolver, while relational fields register one. This default/override
//! duality is a core contract of the engine, not an implementation detail.

pub mod store;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use displaydoc::Display;
use serde_json_bytes::Value;
use thiserror::Error;

use crate::context::RequestContext;
use crate::json_ext::Object;
use crate::spec::FieldType;
use crate::store::StoreError;

/// A resolver failure while producing a field value.
///
/// Field-scoped: the executor records it on the response and localizes or
/// escalates it according to the field's declared nullability.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResolverError {
    /// {0}
    Store(#[from] StoreError),
    /// required reference via '{0}' has no matching '{1}' record
    DanglingReference(String, String),
    /// missing required argument '{0}'
    MissingArgument(String),
    /// unknown input field '{0}' for input type '{1}'
    UnknownInputField(String, String),
    /// missing required input field '{0}' for input type '{1}'
    MissingInputField(String, String),
    /// invalid value for input field '{0}' of input type '{1}'
    InvalidInputValue(String, String),
    /// {0}
    Custom(String),
}

impl ResolverError {
    pub(crate) fn extension_code(&self) -> &'static str {
        match self {
            ResolverError::Store(StoreError::NotFound(_, _)) => "NOT_FOUND",
            ResolverError::Store(StoreError::UnknownEntity(_)) => "UNKNOWN_ENTITY",
            ResolverError::DanglingReference(_, _) => "DANGLING_REFERENCE",
            ResolverError::MissingArgument(_) => "MISSING_ARGUMENT",
            ResolverError::UnknownInputField(_, _)
            | ResolverError::MissingInputField(_, _)
            | ResolverError::InvalidInputValue(_, _) => "INVALID_INPUT",
            ResolverError::Custom(_) => "RESOLVER_ERROR",
        }
    }
}

/// Everything a resolver gets to see for one field resolution.
pub struct ResolverContext<'a> {
    /// The parent resolution result, or none at the root.
    pub parent: Option<&'a Value>,

    /// The arguments carried by the selected field.
    pub arguments: &'a Object,

    /// The selected field's name.
    pub field_name: &'a str,

    /// The selected field's declared type.
    pub field_type: &'a FieldType,

    /// The request-scoped context.
    pub context: &'a RequestContext,
}

impl ResolverContext<'_> {
    /// The parent value as an object, if there is one.
    pub fn parent_object(&self) -> Option<&Object> {
        self.parent.and_then(|parent| parent.as_object())
    }

    /// A required string argument, e.g. an identifier.
    pub fn required_str_argument(&self, name: &str) -> Result<&str, ResolverError> {
        self.arguments
            .get(name)
            .and_then(|value| value.as_str())
            .ok_or_else(|| ResolverError::MissingArgument(name.to_string()))
    }

    /// A required object argument, e.g. a mutation payload.
    pub fn required_object_argument(&self, name: &str) -> Result<&Object, ResolverError> {
        self.arguments
            .get(name)
            .and_then(|value| value.as_object())
            .ok_or_else(|| ResolverError::MissingArgument(name.to_string()))
    }
}

/// Produces one field's value from its parent, arguments and context.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, ctx: ResolverContext<'_>) -> Result<Value, ResolverError>;
}

/// Wraps a plain function as a [`Resolver`], for computed fields that need
/// no store access.
pub fn resolver_fn<F>(f: F) -> FnResolver<F>
where
    F: Fn(&ResolverContext<'_>) -> Result<Value, ResolverError> + Send + Sync,
{
    FnResolver(f)
}

pub struct FnResolver<F>(F);

#[async_trait]
impl<F> Resolver for FnResolver<F>
where
    F: Fn(&ResolverContext<'_>) -> Result<Value, ResolverError> + Send + Sync,
{
    async fn resolve(&self, ctx: ResolverContext<'_>) -> Result<Value, ResolverError> {
        (self.0)(&ctx)
    }
}

/// The default resolver: reads the same-named property off the parent
/// value. Missing properties resolve to null and are left to the
/// executor's nullability handling.
struct Property;

#[async_trait]
impl Resolver for Property {
    async fn resolve(&self, ctx: ResolverContext<'_>) -> Result<Value, ResolverError> {
        Ok(ctx
            .parent_object()
            .and_then(|parent| parent.get(ctx.field_name))
            .cloned()
            .unwrap_or(Value::Null))
    }
}

/// The resolver registry, keyed by (type name, field name).
///
/// Bindings are registered once at startup; the engine holds the finished
/// map behind an `Arc`, so it stays immutable for the process lifetime.
pub struct ResolverMap {
    resolvers: HashMap<(String, String), Arc<dyn Resolver>>,
    default_resolver: Arc<dyn Resolver>,
}

impl Default for ResolverMap {
    fn default() -> Self {
        Self {
            resolvers: HashMap::new(),
            default_resolver: Arc::new(Property),
        }
    }
}

impl ResolverMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a resolver to (type name, field name), replacing any previous
    /// binding for that field.
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolver: impl Resolver + 'static,
    ) -> &mut Self {
        self.resolvers
            .insert((type_name.into(), field_name.into()), Arc::new(resolver));
        self
    }

    /// The resolver bound to (type name, field name), falling back to the
    /// default property resolver.
    pub fn lookup(&self, type_name: &str, field_name: &str) -> Arc<dyn Resolver> {
        self.resolvers
            .get(&(type_name.to_string(), field_name.to_string()))
            .cloned()
            .unwrap_or_else(|| self.default_resolver.clone())
    }

    /// Whether an explicit binding exists for (type name, field name).
    pub fn contains(&self, type_name: &str, field_name: &str) -> bool {
        self.resolvers
            .contains_key(&(type_name.to_string(), field_name.to_string()))
    }
}
