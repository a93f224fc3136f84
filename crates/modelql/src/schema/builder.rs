//! Root schema builder.
//!
//! `ModelSchemaBuilder` compiles registered models, instantiates registered
//! resolver classes and assembles the Query and Mutation roots from their
//! declared methods. The builder uses async-graphql's dynamic schema API to
//! construct the schema at runtime.

use std::sync::Arc;

use async_graphql::dynamic::{Field, FieldFuture, InputValue, Object, Schema, TypeRef};
use async_graphql::{Request, Response, Value};
use futures_util::future::join_all;
use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use super::compiler::{CompiledType, PLACEHOLDER_FIELD, TypeCompiler, TypeFlavor};
use crate::error::ModelQlError;
use crate::metadata::{MetadataRegistry, ResolverKind, ResolverMethodDescriptor, TypeDescriptor};
use crate::resolvers::{
    ArgKind, ArgPlan, DynForeignResolver, ForeignInstanceResolver, GuardChain, ResolverInstance,
    RootFieldPlan, RootResolver,
};

/// Configuration for the schema builder.
#[derive(Debug, Clone)]
pub struct SchemaBuilderConfig {
    /// Maximum query depth allowed.
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    pub max_complexity: usize,

    /// Whether to enable introspection queries.
    pub introspection_enabled: bool,

    /// Prefix of input type names, e.g. `inputPet`.
    pub input_type_prefix: String,

    /// Declared type name of the trailing request context parameter.
    /// Parameters of this type are never exposed as arguments.
    pub context_type_name: String,
}

impl Default for SchemaBuilderConfig {
    fn default() -> Self {
        Self {
            max_depth: 15,
            max_complexity: 500,
            introspection_enabled: true,
            input_type_prefix: "input".to_string(),
            context_type_name: "ResContext".to_string(),
        }
    }
}

/// A resolver class to instantiate when registered.
pub struct ResolverClass {
    class: String,
    construct: Box<dyn FnOnce() -> ResolverInstance + Send>,
}

impl ResolverClass {
    /// Registers `class`, built by `construct` when the class is registered.
    pub fn new<R, F>(class: impl Into<String>, construct: F) -> Self
    where
        R: Send + Sync + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        Self {
            class: class.into(),
            construct: Box::new(move || Arc::new(construct()) as ResolverInstance),
        }
    }

    /// Registers `class` using its `Default` value.
    pub fn of<R>(class: impl Into<String>) -> Self
    where
        R: Default + Send + Sync + 'static,
    {
        Self::new(class, R::default)
    }

    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }
}

/// The assembled Query/Mutation schema.
pub struct RootSchema {
    schema: Schema,
    query_fields: Vec<String>,
    mutation_fields: Vec<String>,
}

impl RootSchema {
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn into_schema(self) -> Schema {
        self.schema
    }

    /// Query field names, in registration order.
    #[must_use]
    pub fn query_fields(&self) -> &[String] {
        &self.query_fields
    }

    /// Mutation field names, in registration order.
    #[must_use]
    pub fn mutation_fields(&self) -> &[String] {
        &self.mutation_fields
    }

    /// Whether the schema has a Mutation root.
    #[must_use]
    pub fn has_mutation(&self) -> bool {
        !self.mutation_fields.is_empty()
    }

    #[must_use]
    pub fn sdl(&self) -> String {
        self.schema.sdl()
    }

    /// Executes a request.
    ///
    /// Attach a [`ResContext`](crate::ResContext) with `Request::data` to pass
    /// request and response handles to guards and resolver methods.
    pub async fn execute(&self, request: impl Into<Request>) -> Response {
        let request: Request = request.into();
        self.schema.execute(request).await
    }
}

/// A root field whose types were resolved before field construction.
struct PreparedField {
    kind: ResolverKind,
    name: String,
    returns: TypeRef,
    arguments: Vec<(String, TypeRef)>,
    plan: Arc<RootFieldPlan>,
}

#[derive(Default)]
struct ResolverFields {
    query: Vec<(String, Field)>,
    mutation: Vec<(String, Field)>,
}

/// Builds a GraphQL schema from model and resolver declarations.
///
/// # Example
///
/// ```ignore
/// let mut builder = ModelSchemaBuilder::new(
///     Arc::new(registry),
///     |stub: ModelInstance| Some(stub),
///     SchemaBuilderConfig::default(),
/// );
///
/// builder
///     .register_models(["Pet", "Person"])
///     .register_resolvers([ResolverClass::of::<PetResolver>("PetResolver")]);
///
/// let schema = builder.build_schema().await?;
/// ```
pub struct ModelSchemaBuilder {
    registry: Arc<MetadataRegistry>,
    compiler: TypeCompiler,
    config: SchemaBuilderConfig,
    models: Vec<String>,
    resolvers: Vec<(String, ResolverInstance)>,
}

impl ModelSchemaBuilder {
    /// Creates a builder. `foreign` completes foreign-key stubs whenever a
    /// relation field is resolved.
    pub fn new(
        registry: Arc<MetadataRegistry>,
        foreign: impl ForeignInstanceResolver + 'static,
        config: SchemaBuilderConfig,
    ) -> Self {
        let foreign: DynForeignResolver = Arc::new(foreign);
        let compiler = TypeCompiler::new(
            Arc::clone(&registry),
            foreign,
            config.input_type_prefix.clone(),
        );
        Self {
            registry,
            compiler,
            config,
            models: Vec::new(),
            resolvers: Vec::new(),
        }
    }

    /// Compiles the output and input types of each entity class.
    ///
    /// Classes that are not entities are skipped.
    pub fn register_models<I, S>(&mut self, models: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for class in models {
            let class = class.as_ref();
            if self.compiler.compile_model(class).is_none() {
                debug!(class, "Not an entity, skipping model registration");
                continue;
            }
            self.compiler.compile_input_model(class);
            self.models.push(class.to_string());
        }
        self
    }

    /// Instantiates and holds each resolver class.
    pub fn register_resolvers<I>(&mut self, resolvers: I) -> &mut Self
    where
        I: IntoIterator<Item = ResolverClass>,
    {
        for resolver in resolvers {
            trace!(class = %resolver.class, "Instantiating resolver");
            let instance = (resolver.construct)();
            self.resolvers.push((resolver.class, instance));
        }
        self
    }

    /// Entity classes registered so far.
    #[must_use]
    pub fn models(&self) -> &[String] {
        &self.models
    }

    #[must_use]
    pub fn compiler(&self) -> &TypeCompiler {
        &self.compiler
    }

    /// The compiled output type of a registered or referenced model.
    ///
    /// # Errors
    ///
    /// Returns `ModelQlError::UnknownModel` if no output type was compiled
    /// for `class`.
    pub fn output_type(&self, class: &str) -> Result<Arc<CompiledType>, ModelQlError> {
        self.compiler
            .lookup(class, TypeFlavor::Output)
            .ok_or_else(|| ModelQlError::UnknownModel(class.to_string()))
    }

    /// Builds the root schema.
    ///
    /// The Mutation root is omitted when no mutation field was produced.
    /// Resolver instances are released afterwards; compiled types are kept.
    ///
    /// # Errors
    ///
    /// Returns `ModelQlError::SchemaBuildFailed` if async-graphql rejects the
    /// assembled schema.
    pub async fn build_schema(&mut self) -> Result<RootSchema, ModelQlError> {
        debug!(
            models = self.models.len(),
            resolvers = self.resolvers.len(),
            "Starting schema build"
        );

        let resolvers = std::mem::take(&mut self.resolvers);
        let prepared: Vec<Vec<PreparedField>> = resolvers
            .into_iter()
            .map(|(class, instance)| self.prepare_resolver(&class, instance))
            .collect();

        let built = join_all(prepared.into_iter().map(build_resolver_fields)).await;

        let mut query_fields = IndexMap::new();
        let mut mutation_fields = IndexMap::new();
        for fields in built {
            merge_fields(&mut query_fields, fields.query, "Query");
            merge_fields(&mut mutation_fields, fields.mutation, "Mutation");
        }

        let query_names: Vec<String> = query_fields.keys().cloned().collect();
        let mutation_names: Vec<String> = mutation_fields.keys().cloned().collect();

        let mut query = Object::new("Query");
        for (_, field) in query_fields {
            query = query.field(field);
        }
        if query_names.is_empty() {
            trace!("No query fields, adding placeholder field");
            query = query.field(Field::new(
                PLACEHOLDER_FIELD,
                TypeRef::named(TypeRef::STRING),
                |_ctx| FieldFuture::new(async { Ok(None::<Value>) }),
            ));
        }

        let has_mutation = !mutation_names.is_empty();
        let mut schema_builder = Schema::build("Query", has_mutation.then_some("Mutation"), None);
        schema_builder = self.compiler.register(schema_builder);
        schema_builder = schema_builder.register(query);

        if has_mutation {
            let mut mutation = Object::new("Mutation");
            for (_, field) in mutation_fields {
                mutation = mutation.field(field);
            }
            schema_builder = schema_builder.register(mutation);
        }

        // Configure limits
        let mut schema_builder = schema_builder.limit_depth(self.config.max_depth);
        schema_builder = schema_builder.limit_complexity(self.config.max_complexity);

        if !self.config.introspection_enabled {
            schema_builder = schema_builder.disable_introspection();
        }

        let schema = schema_builder
            .finish()
            .map_err(|e| ModelQlError::schema_build_failed(e.to_string()))?;

        debug!(
            query_fields = query_names.len(),
            mutation_fields = mutation_names.len(),
            "Schema build complete"
        );

        Ok(RootSchema {
            schema,
            query_fields: query_names,
            mutation_fields: mutation_names,
        })
    }

    /// Resolves return and argument types of every exposed method of one
    /// resolver, compiling the model types they reference.
    fn prepare_resolver(&mut self, class: &str, instance: ResolverInstance) -> Vec<PreparedField> {
        let registry = Arc::clone(&self.registry);
        let Some(resolver) = registry.resolver_descriptor(class) else {
            warn!(class, "Resolver class has no declared methods");
            return Vec::new();
        };

        let mut prepared = Vec::new();
        for method in resolver.methods.values() {
            let Some(kind) = method.kind else {
                continue;
            };
            let name = method.exposed_name();

            let Some(returns) = method.returns.as_ref() else {
                warn!(
                    class,
                    method = %method.method,
                    "No return type declared, skipping field"
                );
                continue;
            };
            let Some(returns) = self.output_type_ref(returns) else {
                warn!(
                    class,
                    method = %method.method,
                    returns = %returns,
                    "Return type is neither a scalar nor an entity, skipping field"
                );
                continue;
            };
            let Some(handler) = method.handler.clone() else {
                warn!(class, method = %method.method, "No handler bound, skipping field");
                continue;
            };

            let (args, arguments) = self.prepare_arguments(class, method);

            trace!(
                class,
                method = %method.method,
                field = name,
                ?kind,
                "Prepared root field"
            );
            prepared.push(PreparedField {
                kind,
                name: name.to_string(),
                returns,
                arguments,
                plan: Arc::new(RootFieldPlan {
                    class: class.to_string(),
                    method: method.method.clone(),
                    args,
                    guards: GuardChain::new(method.guards.clone()),
                    handler,
                    instance: Arc::clone(&instance),
                    registry: Arc::clone(&registry),
                }),
            });
        }
        prepared
    }

    /// Marshaling plans and GraphQL arguments of a method's parameters.
    ///
    /// The request context parameter is dropped. Parameters whose type maps
    /// to neither a scalar nor an input type keep their position in the
    /// plan but are not exposed as arguments.
    fn prepare_arguments(
        &mut self,
        class: &str,
        method: &ResolverMethodDescriptor,
    ) -> (Vec<ArgPlan>, Vec<(String, TypeRef)>) {
        let mut plans = Vec::new();
        let mut arguments = Vec::new();

        for (index, param) in method.params.iter().enumerate() {
            if param
                .ty
                .name
                .eq_ignore_ascii_case(&self.config.context_type_name)
            {
                continue;
            }
            let ty = method.param_type(index).unwrap_or(&param.ty);

            let kind = if let Some(scalar) = ty.as_scalar() {
                arguments.push((param.name.clone(), ty.wrap(scalar.graphql_name())));
                ArgKind::Scalar
            } else if let Some((model, input)) = self.input_type(&ty.name) {
                arguments.push((param.name.clone(), ty.wrap(&input.name)));
                ArgKind::Model {
                    class: model,
                    list: ty.list,
                }
            } else {
                warn!(
                    class,
                    method = %method.method,
                    param = %param.name,
                    ty = %ty,
                    "Parameter type is neither a scalar nor an entity, passing null"
                );
                ArgKind::Unknown
            };

            plans.push(ArgPlan {
                name: param.name.clone(),
                kind,
            });
        }
        (plans, arguments)
    }

    fn output_type_ref(&mut self, returns: &TypeDescriptor) -> Option<TypeRef> {
        if let Some(scalar) = returns.as_scalar() {
            return Some(returns.wrap(scalar.graphql_name()));
        }
        let class = self.registry.find_model(&returns.name)?.class.clone();
        let compiled = self.compiler.compile_model(&class)?;
        Some(returns.wrap(&compiled.name))
    }

    fn input_type(&mut self, name: &str) -> Option<(String, Arc<CompiledType>)> {
        let class = self.registry.find_model(name)?.class.clone();
        let compiled = self.compiler.compile_input_model(&class)?;
        Some((class, compiled))
    }
}

/// Builds the Query and Mutation fields of one resolver.
async fn build_resolver_fields(prepared: Vec<PreparedField>) -> ResolverFields {
    let mut fields = ResolverFields::default();
    for field in prepared {
        let resolver = RootResolver::resolve(field.plan);
        let mut graphql_field = Field::new(&field.name, field.returns, resolver);
        for (name, type_ref) in field.arguments {
            graphql_field = graphql_field.argument(InputValue::new(name, type_ref));
        }

        match field.kind {
            ResolverKind::Query => fields.query.push((field.name, graphql_field)),
            ResolverKind::Mutation => fields.mutation.push((field.name, graphql_field)),
        }
    }
    fields
}

/// Adds fields to a root, the later of two same-named fields winning.
fn merge_fields(
    root: &mut IndexMap<String, Field>,
    fields: Vec<(String, Field)>,
    root_name: &str,
) {
    for (name, field) in fields {
        if root.insert(name.clone(), field).is_some() {
            warn!(
                root = root_name,
                field = %name,
                "Duplicate root field, later declaration wins"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::ModelInstance;
    use crate::metadata::{FieldKind, ScalarType};

    #[derive(Default)]
    struct PetResolver;

    #[derive(Default)]
    struct VetResolver;

    fn registry() -> MetadataRegistry {
        let mut registry = MetadataRegistry::new();
        registry
            .entity("Pet")
            .pk("id", ScalarType::Float)
            .column("name", ScalarType::String);

        let mut pets = registry.resolver::<PetResolver>("PetResolver");
        pets.query("pets", TypeDescriptor::list_of("Pet"))
            .param("name", ScalarType::String)
            .param("ctx", "ResContext")
            .handler(|_, _| async { Ok(Value::List(Vec::new())) });
        pets.query("count", ScalarType::Int)
            .handler(|_, _| async { Ok(Value::from(0)) });
        pets.untyped("broken", ResolverKind::Query);
        registry
    }

    fn builder(registry: MetadataRegistry) -> ModelSchemaBuilder {
        ModelSchemaBuilder::new(
            Arc::new(registry),
            |stub: ModelInstance| Some(stub),
            SchemaBuilderConfig::default(),
        )
    }

    #[test]
    fn test_config_defaults() {
        let config = SchemaBuilderConfig::default();
        assert_eq!(config.max_depth, 15);
        assert_eq!(config.max_complexity, 500);
        assert!(config.introspection_enabled);
        assert_eq!(config.input_type_prefix, "input");
        assert_eq!(config.context_type_name, "ResContext");
    }

    #[test]
    fn test_register_models_skips_non_entities() {
        let mut registry = registry();
        registry.declare_field("Draft", "title", FieldKind::Column(ScalarType::String), None);

        let mut builder = builder(registry);
        builder.register_models(["Pet", "Draft", "Ghost"]);

        assert_eq!(builder.models(), ["Pet"]);
        assert_eq!(builder.output_type("Pet").unwrap().name, "Pet");
        assert!(builder.compiler().lookup("Pet", TypeFlavor::Input).is_some());
        assert!(matches!(
            builder.output_type("Draft"),
            Err(ModelQlError::UnknownModel(_))
        ));
    }

    #[tokio::test]
    async fn test_query_only_schema_has_no_mutation() {
        let mut builder = builder(registry());
        builder
            .register_models(["Pet"])
            .register_resolvers([ResolverClass::of::<PetResolver>("PetResolver")]);

        let schema = builder.build_schema().await.unwrap();
        assert_eq!(schema.query_fields(), ["pets", "count"]);
        assert!(!schema.has_mutation());
        assert!(!schema.sdl().contains("type Mutation"));
    }

    #[tokio::test]
    async fn test_resolvers_are_released_after_build() {
        let mut builder = builder(registry());
        builder.register_resolvers([ResolverClass::of::<PetResolver>("PetResolver")]);
        builder.build_schema().await.unwrap();

        let rebuilt = builder.build_schema().await.unwrap();
        assert!(rebuilt.query_fields().is_empty());
        assert!(rebuilt.sdl().contains(PLACEHOLDER_FIELD));
    }

    #[tokio::test]
    async fn test_later_resolver_wins_duplicate_field() {
        let mut registry = registry();
        registry
            .resolver::<VetResolver>("VetResolver")
            .query("count", ScalarType::Int)
            .handler(|_, _| async { Ok(Value::from(1)) });

        let mut builder = builder(registry);
        builder.register_resolvers([
            ResolverClass::of::<PetResolver>("PetResolver"),
            ResolverClass::of::<VetResolver>("VetResolver"),
        ]);

        let schema = builder.build_schema().await.unwrap();
        assert_eq!(schema.query_fields(), ["pets", "count"]);

        let response = schema.execute("{ count }").await;
        assert!(response.errors.is_empty());
        assert_eq!(
            response.data.into_json().unwrap(),
            serde_json::json!({ "count": 1 })
        );
    }
}
