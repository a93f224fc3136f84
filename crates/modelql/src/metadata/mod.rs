//! Model and resolver declarations.
//!
//! Declarations are recorded in a [`MetadataRegistry`], either through the
//! `declare_*` operations or the chained DSL in [`annotate`].

pub mod annotate;
mod registry;
mod types;

pub use annotate::{MethodDecl, ModelDecl, ResolverDecl};
pub use registry::{
    FieldDescriptor, FieldKind, IdColumn, MetadataRegistry, ModelDescriptor, ParamDescriptor,
    ParamOverride, ResolverDescriptor, ResolverKind, ResolverMethodDescriptor,
};
pub use types::{ScalarType, TypeDescriptor};
