//! Field resolvers for the compiled schema.
//!
//! - `root`: Query/Mutation fields dispatching to resolver methods
//! - `relation`: foreign-key fields on model types
//! - `guard`: the authorization chain run before a resolver method
//! - `args`: marshaled arguments handed to resolver methods

pub mod args;
pub mod guard;
mod relation;
mod root;

pub use args::{ArgValue, CallArgs};
pub use guard::{Guard, GuardChain, GuardOutcome, GuardState, Next, guard};
pub use relation::{DynForeignResolver, ForeignInstanceResolver, RelationField, RelationResolver};
pub use root::{ArgKind, ArgPlan, RootFieldPlan, RootResolver};

use std::any::Any;
use std::sync::Arc;

use async_graphql::Value;
use async_graphql::dynamic::ResolverContext;
use futures_util::future::BoxFuture;

use crate::context::ResContext;

/// A registered resolver class instance.
pub type ResolverInstance = Arc<dyn Any + Send + Sync>;

/// Pending result of a resolver method.
pub type ResolverFuture = BoxFuture<'static, async_graphql::Result<Value>>;

/// Type-erased body of a resolver method.
pub type MethodHandler = Arc<dyn Fn(ResolverInstance, CallArgs) -> ResolverFuture + Send + Sync>;

/// Request context attached to the request, or an empty one.
pub(crate) fn request_context(ctx: &ResolverContext<'_>) -> ResContext {
    ctx.data_opt::<ResContext>().cloned().unwrap_or_default()
}

/// Reads a key from an object value.
pub(crate) fn object_get<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(obj) => obj.get(key),
        _ => None,
    }
}
