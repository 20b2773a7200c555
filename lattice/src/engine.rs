//! The engine facade binding a schema, a resolver map and a store.

use std::sync::Arc;

use crate::context::MutationLocks;
use crate::context::RequestContext;
use crate::execution;
use crate::graphql::Request;
use crate::graphql::Response;
use crate::resolver::ResolverMap;
use crate::spec::Schema;
use crate::spec::SchemaError;
use crate::store::DataAccess;

// buildstructor infers collection-builder semantics from a type name's
// suffix (e.g. anything ending in `Map` is treated as a key/value
// collection field). `ResolverMap` is a plain struct, not a generic
// map, so the builder parameter is typed through this alias to avoid
// tripping that heuristic.
type Resolvers = ResolverMap;

/// The query execution engine.
///
/// Built once at startup; schema and resolver bindings are immutable for
/// the process lifetime. Cheap to clone and share across requests.
#[derive(Clone)]
pub struct Engine {
    schema: Arc<Schema>,
    resolvers: Arc<ResolverMap>,
    store: Arc<dyn DataAccess>,
    locks: Arc<MutationLocks>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

#[buildstructor::buildstructor]
impl Engine {
    /// Returns a builder that builds an [`Engine`] from its components.
    ///
    /// Builder methods:
    ///
    /// * `.schema(`[`Schema`]`)`
    ///   Required.
    ///
    /// * `.resolvers(`[`ResolverMap`]`)`
    ///   Required.
    ///
    /// * `.store(`[`Arc`]`<dyn `[`DataAccess`]`>)`
    ///   Required.
    ///
    /// * `.build()`
    ///   Validates the resolver-coverage invariant and returns the engine:
    ///   every field resolving another entity type must have an explicit
    ///   resolver registered, while plain scalar properties ride the
    ///   default property fallback.
    #[builder(visibility = "pub")]
    fn new(
        schema: Schema,
        resolvers: Resolvers,
        store: Arc<dyn DataAccess>,
    ) -> Result<Self, SchemaError> {
        for ty in schema.object_types().values() {
            for (field, field_type) in ty.fields() {
                if field_type.inner_type_name().is_some() && !resolvers.contains(ty.name(), field)
                {
                    return Err(SchemaError::MissingResolver(
                        ty.name().to_string(),
                        field.to_string(),
                    ));
                }
            }
        }

        Ok(Self {
            schema: Arc::new(schema),
            resolvers: Arc::new(resolvers),
            store,
            locks: Default::default(),
        })
    }

    /// Executes one request to completion and returns the aggregated
    /// response.
    pub async fn execute(&self, request: &Request) -> Response {
        let context = RequestContext::new(
            Arc::clone(&self.store),
            Arc::clone(&self.schema),
            Arc::clone(&self.locks),
        );
        execution::execute_request(&self.schema, &self.resolvers, &context, request).await
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::resolver::store::Collection;
    use crate::store::MemStore;

    #[test]
    fn building_fails_without_a_resolver_for_relational_fields() {
        let schema = Schema::builder()
            .object_type(
                "Game",
                [
                    ("id", "ID!".parse().unwrap()),
                    ("title", "String!".parse().unwrap()),
                ],
            )
            .object_type("Query", [("games", "[Game]".parse().unwrap())])
            .build()
            .unwrap();

        let store: Arc<dyn DataAccess> = Arc::new(MemStore::new());
        let err = Engine::builder()
            .schema(schema.clone())
            .resolvers(ResolverMap::new())
            .store(Arc::clone(&store))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingResolver("Query".to_string(), "games".to_string()),
        );

        let mut resolvers = ResolverMap::new();
        resolvers.register("Query", "games", Collection::new("games"));
        assert!(
            Engine::builder()
                .schema(schema)
                .resolvers(resolvers)
                .store(store)
                .build()
                .is_ok()
        );
    }
}
