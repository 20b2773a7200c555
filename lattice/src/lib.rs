//! Lattice is a typed graph query execution engine.
//!
//! The engine accepts a declarative, nested request against a typed
//! schema, resolves each requested field — including relational fields
//! spanning multiple underlying records — and returns a single aggregated
//! result matching the request's shape exactly.
//!
//! The pieces, leaves first:
//!
//! * [`spec`] — the type registry: object types, input types, scalar
//!   kinds and the list/non-null markers on every field, validated at
//!   registration time.
//! * [`store`] — the data access layer contract the engine consumes,
//!   plus an in-memory reference implementation.
//! * [`resolver`] — bindings from (type name, field name) to resolver
//!   functions, with a default fallback reading same-named properties
//!   off the parent value.
//! * [`execution`] — the executors: concurrent sibling resolution,
//!   value completion, non-null propagation and the mutation resolvers.
//! * [`Engine`] — the facade binding the above together.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use lattice::Engine;
//! use lattice::graphql::Request;
//! use lattice::resolver::ResolverMap;
//! use lattice::resolver::store::Collection;
//! use lattice::spec::Schema;
//! use lattice::store::DataAccess;
//! use lattice::store::MemStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = Schema::builder()
//!     .object_type("Game", [
//!         ("id", "ID!".parse()?),
//!         ("title", "String!".parse()?),
//!     ])
//!     .object_type("Query", [("games", "[Game]".parse()?)])
//!     .build()?;
//!
//! let mut resolvers = ResolverMap::new();
//! resolvers.register("Query", "games", Collection::new("games"));
//!
//! let store: Arc<dyn DataAccess> = Arc::new(MemStore::new());
//! let engine = Engine::builder()
//!     .schema(schema)
//!     .resolvers(resolvers)
//!     .store(store)
//!     .build()?;
//!
//! let request: Request = serde_json::from_str(
//!     r#"{ "selections": [ { "name": "games", "selections": [ { "name": "title" } ] } ] }"#,
//! )?;
//! let response = engine.execute(&request).await;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

mod context;
mod engine;
pub mod execution;
pub mod graphql;
pub mod json_ext;
pub mod resolver;
pub mod spec;
pub mod store;

pub use context::Extensions;
pub use context::RequestContext;
pub use engine::Engine;
