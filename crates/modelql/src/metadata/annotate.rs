//! Declaration DSL over [`MetadataRegistry`].
//!
//! Each call appends to the registry exactly like the corresponding
//! `declare_*` operation. The DSL only adds chaining and typed handlers.
//!
//! # Example
//!
//! ```ignore
//! let mut registry = MetadataRegistry::new();
//!
//! registry
//!     .entity("Pet")
//!     .pk("id", ScalarType::Float)
//!     .column("name", ScalarType::String)
//!     .fk_with_id_column("owner", "Person", "ownerId");
//!
//! registry
//!     .resolver::<PetResolver>("PetResolver")
//!     .query("pets", TypeDescriptor::list_of("Pet"))
//!     .param("name", ScalarType::String)
//!     .param("ctx", "ResContext")
//!     .guard(|req, _, next| {
//!         if req.header("authorization").is_some() {
//!             next.proceed();
//!         }
//!     })
//!     .handler(|this, args| async move { this.pets(args).await });
//! ```

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_graphql::{ErrorExtensions, Value};

use super::registry::{FieldKind, IdColumn, MetadataRegistry, ResolverKind};
use super::types::{ScalarType, TypeDescriptor};
use crate::context::{RequestHandle, ResponseHandle};
use crate::error::ModelQlError;
use crate::resolvers::args::CallArgs;
use crate::resolvers::guard::{guard, Next};
use crate::resolvers::{MethodHandler, ResolverFuture, ResolverInstance};

impl MetadataRegistry {
    /// Declares `class` as an entity named after the class key.
    pub fn entity(&mut self, class: &str) -> ModelDecl<'_> {
        self.declare_entity(class, None);
        ModelDecl {
            registry: self,
            class: class.to_string(),
        }
    }

    /// Declares `class` as an entity exposed under `name`.
    pub fn entity_named(&mut self, class: &str, name: &str) -> ModelDecl<'_> {
        self.declare_entity(class, Some(name));
        ModelDecl {
            registry: self,
            class: class.to_string(),
        }
    }

    /// Starts declaring methods of the resolver class `class`, implemented
    /// by the Rust type `R`.
    pub fn resolver<R>(&mut self, class: &str) -> ResolverDecl<'_, R>
    where
        R: Send + Sync + 'static,
    {
        ResolverDecl {
            registry: self,
            class: class.to_string(),
            _resolver: PhantomData,
        }
    }
}

/// Field declarations of one model class.
pub struct ModelDecl<'r> {
    registry: &'r mut MetadataRegistry,
    class: String,
}

impl ModelDecl<'_> {
    pub fn pk(self, field: &str, ty: ScalarType) -> Self {
        self.declare(field, FieldKind::PrimaryKey(ty), None)
    }

    /// Primary key exposed on the wire as `wire_name`.
    pub fn pk_as(self, field: &str, ty: ScalarType, wire_name: &str) -> Self {
        self.declare(field, FieldKind::PrimaryKey(ty), Some(wire_name))
    }

    pub fn column(self, field: &str, ty: ScalarType) -> Self {
        self.declare(field, FieldKind::Column(ty), None)
    }

    /// Column exposed on the wire as `wire_name`.
    pub fn column_as(self, field: &str, ty: ScalarType, wire_name: &str) -> Self {
        self.declare(field, FieldKind::Column(ty), Some(wire_name))
    }

    /// Foreign key to `target`, accepted only in nested form.
    pub fn fk(self, field: &str, target: &str) -> Self {
        self.foreign_key(field, target, None)
    }

    /// Foreign key to `target` that also accepts a flat id under `id_column`.
    pub fn fk_with_id_column(self, field: &str, target: &str, id_column: &str) -> Self {
        self.foreign_key(field, target, Some(IdColumn::Named(id_column.to_string())))
    }

    /// Foreign key to `target` whose flat id key follows the
    /// `<entity><PrimaryKey>` convention, e.g. `petId`.
    pub fn fk_flat(self, field: &str, target: &str) -> Self {
        self.foreign_key(field, target, Some(IdColumn::Conventional))
    }

    fn foreign_key(self, field: &str, target: &str, id_column: Option<IdColumn>) -> Self {
        let kind = FieldKind::ForeignKey {
            target: target.to_string(),
            id_column,
        };
        self.declare(field, kind, None)
    }

    fn declare(self, field: &str, kind: FieldKind, wire_name: Option<&str>) -> Self {
        self.registry.declare_field(&self.class, field, kind, wire_name);
        self
    }
}

/// Method declarations of one resolver class.
pub struct ResolverDecl<'r, R> {
    registry: &'r mut MetadataRegistry,
    class: String,
    _resolver: PhantomData<fn() -> R>,
}

impl<R> ResolverDecl<'_, R>
where
    R: Send + Sync + 'static,
{
    /// Exposes `method` on the Query root.
    pub fn query(&mut self, method: &str, returns: impl Into<TypeDescriptor>) -> MethodDecl<'_, R> {
        self.method(method, ResolverKind::Query, Some(returns.into()))
    }

    /// Exposes `method` on the Mutation root.
    pub fn mutation(
        &mut self,
        method: &str,
        returns: impl Into<TypeDescriptor>,
    ) -> MethodDecl<'_, R> {
        self.method(method, ResolverKind::Mutation, Some(returns.into()))
    }

    /// Declares `method` without a return type.
    ///
    /// The method is kept in the registry but the builder skips it.
    pub fn untyped(&mut self, method: &str, kind: ResolverKind) -> MethodDecl<'_, R> {
        self.method(method, kind, None)
    }

    fn method(
        &mut self,
        method: &str,
        kind: ResolverKind,
        returns: Option<TypeDescriptor>,
    ) -> MethodDecl<'_, R> {
        self.registry
            .declare_resolver_method(&self.class, method, kind, None, returns.clone());
        MethodDecl {
            registry: &mut *self.registry,
            class: &self.class,
            method: method.to_string(),
            kind,
            returns,
            _resolver: PhantomData,
        }
    }
}

/// Declarations of one resolver method.
pub struct MethodDecl<'a, R> {
    registry: &'a mut MetadataRegistry,
    class: &'a str,
    method: String,
    kind: ResolverKind,
    returns: Option<TypeDescriptor>,
    _resolver: PhantomData<fn() -> R>,
}

impl<R> MethodDecl<'_, R>
where
    R: Send + Sync + 'static,
{
    /// Exposes the method under `name` instead of the method name.
    pub fn named(self, name: &str) -> Self {
        self.registry.declare_resolver_method(
            self.class,
            &self.method,
            self.kind,
            Some(name),
            self.returns.clone(),
        );
        self
    }

    /// Appends a parameter to the method signature.
    pub fn param(self, name: &str, ty: impl Into<TypeDescriptor>) -> Self {
        self.registry
            .declare_param(self.class, &self.method, name, ty.into());
        self
    }

    /// Replaces the type of the parameter at `index`.
    pub fn param_override(self, index: usize, ty: impl Into<TypeDescriptor>) -> Self {
        self.registry
            .declare_param_override(self.class, &self.method, index, ty.into());
        self
    }

    /// Adds a guard. Guards declared later run earlier.
    pub fn guard<F>(self, f: F) -> Self
    where
        F: Fn(&RequestHandle, &ResponseHandle, Next<'_>) + Send + Sync + 'static,
    {
        self.registry
            .declare_guard(self.class, &self.method, guard(f));
        self
    }

    /// Binds the method body.
    ///
    /// The resolver instance registered under this class is handed to
    /// `handler` as `Arc<R>`. If it is of another type, the call fails with
    /// a `RESOLVER_MISMATCH` error.
    pub fn handler<H, Fut>(self, handler: H) -> Self
    where
        H: Fn(Arc<R>, CallArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = async_graphql::Result<Value>> + Send + 'static,
    {
        let class = self.class.to_string();
        let bound: MethodHandler = Arc::new(
            move |instance: ResolverInstance, args: CallArgs| -> ResolverFuture {
                match instance.downcast::<R>() {
                    Ok(this) => Box::pin(handler(this, args)),
                    Err(_) => {
                        let err = ModelQlError::resolver_mismatch(class.as_str()).extend();
                        Box::pin(async move { Err(err) })
                    }
                }
            },
        );
        self.registry
            .declare_handler(self.class, &self.method, bound);
        self
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use super::*;
    use crate::context::ResContext;

    struct PetResolver {
        greeting: &'static str,
    }

    #[test]
    fn test_model_declarations() {
        let mut registry = MetadataRegistry::new();
        registry
            .entity_named("PetModel", "Pet")
            .pk_as("id", ScalarType::Float, "key")
            .column("name", ScalarType::String)
            .column_as("species", ScalarType::String, "kind")
            .fk("vet", "Vet")
            .fk_with_id_column("owner", "Person", "personId")
            .fk_flat("clinic", "Clinic");

        let model = registry.model("PetModel").unwrap();
        assert_eq!(model.entity.as_deref(), Some("Pet"));

        let wire: Vec<_> = model.fields.iter().map(|f| f.wire_name.as_str()).collect();
        assert_eq!(wire, ["key", "name", "kind", "vet", "owner", "clinic"]);
        assert_eq!(
            model.field("owner").map(|f| &f.kind),
            Some(&FieldKind::ForeignKey {
                target: "Person".into(),
                id_column: Some(IdColumn::Named("personId".into())),
            })
        );
        assert_eq!(
            model.field("clinic").map(|f| &f.kind),
            Some(&FieldKind::ForeignKey {
                target: "Clinic".into(),
                id_column: Some(IdColumn::Conventional),
            })
        );
    }

    #[test]
    fn test_method_declarations() {
        let mut registry = MetadataRegistry::new();
        {
            let mut resolver = registry.resolver::<PetResolver>("PetResolver");
            resolver
                .query("listPets", TypeDescriptor::list_of("Pet"))
                .named("pets")
                .param("name", ScalarType::String)
                .param("ctx", "ResContext");
            resolver
                .mutation("addPets", "Pet")
                .param("pets", "Object")
                .param_override(0, TypeDescriptor::list_of("Pet"));
            resolver.untyped("helper", ResolverKind::Query);
        }

        let resolver = registry.resolver_descriptor("PetResolver").unwrap();
        let pets = &resolver.methods["listPets"];
        assert_eq!(pets.kind, Some(ResolverKind::Query));
        assert_eq!(pets.exposed_name(), "pets");
        assert_eq!(pets.returns, Some(TypeDescriptor::list_of("Pet")));
        assert_eq!(pets.params.len(), 2);

        let add = &resolver.methods["addPets"];
        assert_eq!(add.kind, Some(ResolverKind::Mutation));
        assert_eq!(add.param_type(0), Some(&TypeDescriptor::list_of("Pet")));

        assert_eq!(resolver.methods["helper"].returns, None);
    }

    #[tokio::test]
    async fn test_handler_downcasts_instance() {
        let mut registry = MetadataRegistry::new();
        registry
            .resolver::<PetResolver>("PetResolver")
            .query("hello", ScalarType::String)
            .handler(|this, _args| async move { Ok(Value::from(this.greeting)) });

        let handler = registry.resolver_descriptor("PetResolver").unwrap().methods["hello"]
            .handler
            .clone()
            .unwrap();
        let args = CallArgs {
            args: Vec::new(),
            context: ResContext::default(),
        };

        let instance: ResolverInstance = Arc::new(PetResolver { greeting: "hi" });
        let value = handler(instance, args.clone()).await.unwrap();
        assert_eq!(value, Value::from("hi"));

        let wrong: Arc<dyn Any + Send + Sync> = Arc::new(42_u8);
        let err = handler(wrong, args).await.unwrap_err();
        assert!(err.message.contains("PetResolver"));
    }
}
