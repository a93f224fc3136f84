//! Schema compilation and assembly.
//!
//! ## Components
//!
//! - [`TypeCompiler`] - compiles model declarations into object and input types
//! - [`ModelSchemaBuilder`] - assembles the Query/Mutation roots from resolvers
//!
//! ## Build process
//!
//! 1. `register_models` compiles the output and input type of each entity
//! 2. `register_resolvers` instantiates resolver classes
//! 3. `build_schema` compiles the remaining return and argument types, builds
//!    root fields per resolver and hands everything to async-graphql

mod builder;
mod compiler;

pub use builder::{ModelSchemaBuilder, ResolverClass, RootSchema, SchemaBuilderConfig};
pub use compiler::{
    CompiledField, CompiledFieldType, CompiledType, PLACEHOLDER_FIELD, TypeCompiler, TypeFlavor,
    TypeHandle,
};
