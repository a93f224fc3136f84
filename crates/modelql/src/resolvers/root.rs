//! Query and Mutation root field resolver.
//!
//! On each invocation the resolver:
//! 1. runs the method's guard chain, resolving to null on denial
//! 2. marshals supplied arguments by declared parameter name, null for
//!    anything not supplied
//! 3. appends the request context and calls the resolver method

use std::sync::Arc;

use async_graphql::dynamic::{FieldFuture, ResolverContext};
use async_graphql::indexmap::IndexMap;
use async_graphql::{Name, Value};
use tracing::{debug, trace};

use super::args::{ArgValue, CallArgs};
use super::guard::{GuardChain, GuardOutcome};
use super::{MethodHandler, ResolverInstance, request_context};
use crate::marshal::fill;
use crate::metadata::MetadataRegistry;

/// How a declared parameter is marshaled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgKind {
    /// Passed through unchanged.
    Scalar,
    /// Filled into a model instance, element-wise for lists.
    Model { class: String, list: bool },
    /// Neither a scalar nor a compiled input type. Always null.
    Unknown,
}

/// A declared parameter, minus the trailing request context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgPlan {
    pub name: String,
    pub kind: ArgKind,
}

/// Everything a root field needs to dispatch a call.
pub struct RootFieldPlan {
    pub class: String,
    pub method: String,
    /// Declared parameters in order.
    pub args: Vec<ArgPlan>,
    pub guards: GuardChain,
    pub handler: MethodHandler,
    pub instance: ResolverInstance,
    pub registry: Arc<MetadataRegistry>,
}

impl RootFieldPlan {
    /// Marshals supplied arguments into one value per declared parameter.
    #[must_use]
    pub fn marshal_args(&self, supplied: &IndexMap<Name, Value>) -> Vec<ArgValue> {
        self.args
            .iter()
            .map(|arg| self.marshal(&arg.kind, supplied.get(arg.name.as_str())))
            .collect()
    }

    fn marshal(&self, kind: &ArgKind, value: Option<&Value>) -> ArgValue {
        let value = match value {
            None | Some(Value::Null) => return ArgValue::Null,
            Some(value) => value,
        };

        match kind {
            ArgKind::Scalar => ArgValue::Scalar(value.clone()),
            ArgKind::Model { class, list: false } => self.fill_model(value, class),
            ArgKind::Model { class, list: true } => match value {
                Value::List(items) => ArgValue::List(
                    items
                        .iter()
                        .map(|item| self.fill_model(item, class))
                        .collect(),
                ),
                single => ArgValue::List(vec![self.fill_model(single, class)]),
            },
            ArgKind::Unknown => ArgValue::Null,
        }
    }

    fn fill_model(&self, value: &Value, class: &str) -> ArgValue {
        fill(&self.registry, Some(value), Some(class))
            .map(ArgValue::Model)
            .unwrap_or(ArgValue::Null)
    }
}

/// Resolver for Query and Mutation fields.
pub struct RootResolver;

impl RootResolver {
    /// Creates the resolver function for one root field.
    pub fn resolve(
        plan: Arc<RootFieldPlan>,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let plan = Arc::clone(&plan);
            FieldFuture::new(async move {
                let context = request_context(&ctx);

                if let GuardOutcome::Denied { at } = plan.guards.run(&context.req, &context.res) {
                    debug!(
                        class = %plan.class,
                        method = %plan.method,
                        guard = at,
                        "Resolver call denied"
                    );
                    return Ok(None);
                }

                let args = plan.marshal_args(ctx.args.as_index_map());
                trace!(
                    class = %plan.class,
                    method = %plan.method,
                    args = args.len(),
                    "Invoking resolver method"
                );

                let call = CallArgs { args, context };
                let value = (plan.handler)(Arc::clone(&plan.instance), call).await?;
                Ok(match value {
                    Value::Null => None,
                    value => Some(value),
                })
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use async_graphql::value;

    use super::*;
    use crate::metadata::ScalarType;
    use crate::resolvers::ResolverFuture;

    fn plan(args: Vec<ArgPlan>) -> RootFieldPlan {
        let mut registry = MetadataRegistry::new();
        registry
            .entity("Pet")
            .pk("id", ScalarType::Float)
            .column("name", ScalarType::String);

        RootFieldPlan {
            class: "PetResolver".into(),
            method: "pets".into(),
            args,
            guards: GuardChain::default(),
            handler: Arc::new(|_: ResolverInstance, _: CallArgs| -> ResolverFuture {
                Box::pin(async { Ok(Value::Null) })
            }),
            instance: Arc::new(()),
            registry: Arc::new(registry),
        }
    }

    fn arg(name: &str, kind: ArgKind) -> ArgPlan {
        ArgPlan {
            name: name.into(),
            kind,
        }
    }

    fn supplied(value: Value) -> IndexMap<Name, Value> {
        match value {
            Value::Object(obj) => obj,
            _ => IndexMap::new(),
        }
    }

    #[test]
    fn test_missing_arguments_are_padded_with_null() {
        let plan = plan(vec![
            arg("name", ArgKind::Scalar),
            arg("limit", ArgKind::Scalar),
            arg("offset", ArgKind::Scalar),
        ]);

        let args = plan.marshal_args(&supplied(value!({ "name": "Rex" })));
        assert_eq!(
            args,
            [
                ArgValue::Scalar(value!("Rex")),
                ArgValue::Null,
                ArgValue::Null
            ]
        );
    }

    #[test]
    fn test_arguments_follow_declaration_order() {
        let plan = plan(vec![arg("a", ArgKind::Scalar), arg("b", ArgKind::Scalar)]);

        let args = plan.marshal_args(&supplied(value!({ "b": 2, "a": 1 })));
        assert_eq!(
            args,
            [ArgValue::Scalar(value!(1)), ArgValue::Scalar(value!(2))]
        );
    }

    #[test]
    fn test_model_arguments_are_filled() {
        let pet = ArgKind::Model {
            class: "Pet".into(),
            list: false,
        };
        let pets = ArgKind::Model {
            class: "Pet".into(),
            list: true,
        };
        let plan = plan(vec![arg("pet", pet), arg("pets", pets)]);

        let args = plan.marshal_args(&supplied(value!({
            "pet": { "name": "Rex" },
            "pets": [{ "id": 1 }, { "id": 2 }]
        })));

        let pet = args[0].as_model().unwrap();
        assert_eq!(pet.class(), "Pet");
        assert_eq!(pet.get("name"), Some(&value!("Rex")));

        let pets = args[1].as_list().unwrap();
        assert_eq!(pets.len(), 2);
        assert_eq!(pets[1].as_model().and_then(|p| p.get("id")), Some(&value!(2)));
    }

    #[test]
    fn test_unknown_and_null_arguments() {
        let plan = plan(vec![
            arg("when", ArgKind::Unknown),
            arg("name", ArgKind::Scalar),
        ]);

        let args = plan.marshal_args(&supplied(value!({ "when": "today", "name": null })));
        assert_eq!(args, [ArgValue::Null, ArgValue::Null]);
    }
}
