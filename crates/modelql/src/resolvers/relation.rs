//! Foreign-key field resolver.
//!
//! A foreign-key field on a model type does not return the nested value the
//! parent carries. It builds a primary-key-only stub of the related model
//! (see [`resolve_foreign_key`]) and hands it to the
//! [`ForeignInstanceResolver`] supplied when the schema builder was created.
//! That callback is the seam to whatever storage the application uses.

use std::sync::Arc;

use async_graphql::dynamic::{FieldFuture, ResolverContext};
use async_trait::async_trait;
use tracing::trace;

use crate::instance::ModelInstance;
use crate::marshal::resolve_foreign_key;
use crate::metadata::MetadataRegistry;

/// Completes foreign-key stubs into full instances.
#[async_trait]
pub trait ForeignInstanceResolver: Send + Sync {
    /// Resolves a primary-key-only stub. `None` resolves the field to null.
    async fn resolve(&self, stub: ModelInstance) -> Option<ModelInstance>;
}

#[async_trait]
impl<F> ForeignInstanceResolver for F
where
    F: Fn(ModelInstance) -> Option<ModelInstance> + Send + Sync,
{
    async fn resolve(&self, stub: ModelInstance) -> Option<ModelInstance> {
        self(stub)
    }
}

/// Shared foreign-instance resolver.
pub type DynForeignResolver = Arc<dyn ForeignInstanceResolver>;

/// A compiled foreign-key field, as needed at request time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationField {
    /// Class key of the related model.
    pub target: String,
    /// Key the relation is stored under on the parent value.
    pub field_key: String,
    /// Flat id key, when the foreign key declares one.
    pub id_column: Option<String>,
}

/// Resolver for foreign-key fields.
pub struct RelationResolver;

impl RelationResolver {
    /// Creates the resolver function for one foreign-key field.
    ///
    /// Resolution failures are logged by [`resolve_foreign_key`] and the
    /// callback is not invoked for them.
    pub fn resolve(
        registry: Arc<MetadataRegistry>,
        foreign: DynForeignResolver,
        relation: RelationField,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        let relation = Arc::new(relation);
        move |ctx| {
            let registry = Arc::clone(&registry);
            let foreign = Arc::clone(&foreign);
            let relation = Arc::clone(&relation);
            FieldFuture::new(async move {
                let Some(parent) = ctx.parent_value.as_value() else {
                    return Ok(None);
                };

                let Some(stub) = resolve_foreign_key(
                    &registry,
                    &relation.target,
                    parent,
                    &relation.field_key,
                    relation.id_column.as_deref(),
                ) else {
                    return Ok(None);
                };

                trace!(
                    target_class = %relation.target,
                    field = %relation.field_key,
                    "Handing foreign key stub to foreign instance resolver"
                );
                Ok(foreign.resolve(stub).await.map(ModelInstance::into_value))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use async_graphql::Value;

    use super::*;

    #[tokio::test]
    async fn test_closure_is_a_foreign_resolver() {
        let foreign: DynForeignResolver =
            Arc::new(|stub: ModelInstance| Some(stub.with("name", "Rex")));

        let resolved = foreign
            .resolve(ModelInstance::new("Pet").with("id", 7))
            .await
            .unwrap();
        assert_eq!(resolved.get("id"), Some(&Value::from(7)));
        assert_eq!(resolved.get("name"), Some(&Value::from("Rex")));
    }

    #[tokio::test]
    async fn test_unresolved_instance() {
        let foreign: DynForeignResolver = Arc::new(|_: ModelInstance| None);
        assert!(foreign.resolve(ModelInstance::new("Pet")).await.is_none());
    }
}
