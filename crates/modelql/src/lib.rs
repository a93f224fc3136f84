//! # modelql
//!
//! Derives a GraphQL Query/Mutation schema from declared model and resolver
//! classes, without hand-written schema definitions.
//!
//! ## Overview
//!
//! Models declare their primary key, columns and foreign keys; resolvers
//! declare which methods are queries or mutations, what they return, their
//! parameters and the guards that must pass before they run. From these
//! declarations the crate:
//!
//! - compiles an object type and an input type per model, handling self- and
//!   mutually-referencing models
//! - marshals incoming arguments back into model instances, accepting foreign
//!   keys either nested (`{ pet: { id: 7 } }`) or flat (`{ petId: 7 }`)
//! - wires root fields that run the guard chain, marshal arguments and call
//!   the resolver method
//!
//! The result is an `async_graphql::dynamic::Schema`.
//!
//! ## Example
//!
//! ```ignore
//! let mut registry = MetadataRegistry::new();
//! registry
//!     .entity("Pet")
//!     .pk("id", ScalarType::Float)
//!     .column("name", ScalarType::String);
//! registry
//!     .resolver::<PetResolver>("PetResolver")
//!     .query("pets", TypeDescriptor::list_of("Pet"))
//!     .param("ctx", "ResContext")
//!     .handler(|this, args| async move { this.pets(args).await });
//!
//! let mut builder = ModelSchemaBuilder::new(
//!     Arc::new(registry),
//!     |stub: ModelInstance| Some(stub),
//!     SchemaBuilderConfig::default(),
//! );
//! builder
//!     .register_models(["Pet"])
//!     .register_resolvers([ResolverClass::of::<PetResolver>("PetResolver")]);
//!
//! let schema = builder.build_schema().await?;
//! let response = schema
//!     .execute(Request::new("{ pets { id name } }").data(ResContext::default()))
//!     .await;
//! ```
//!
//! ## Modules
//!
//! - [`metadata`] - Model and resolver declarations
//! - [`schema`] - Type compiler and root schema builder
//! - [`marshal`] - Argument marshaling and foreign-key resolution
//! - [`resolvers`] - Root and relation field resolvers, guard chain
//! - [`context`] - Request context handed to guards and resolvers
//! - [`config`] - Configuration options
//! - [`error`] - Error types

pub mod config;
pub mod context;
pub mod error;
pub mod instance;
pub mod marshal;
pub mod metadata;
pub mod resolvers;
pub mod schema;
pub mod telemetry;

// Re-export main types
pub use config::ModelQlConfig;
pub use context::{RequestHandle, ResContext, ResContextBuilder, ResponseHandle};
pub use error::ModelQlError;
pub use instance::ModelInstance;
pub use metadata::{IdColumn, MetadataRegistry, ResolverKind, ScalarType, TypeDescriptor};
pub use resolvers::{ArgValue, CallArgs, ForeignInstanceResolver, Next};
pub use schema::{ModelSchemaBuilder, ResolverClass, RootSchema, SchemaBuilderConfig};

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, ModelQlError>;
