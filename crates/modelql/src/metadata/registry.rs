//! Declarative metadata store.
//!
//! `MetadataRegistry` records everything model and resolver classes declare
//! about themselves. It is filled during the registration phase (directly or
//! through the annotator DSL in [`super::annotate`]) and then shared
//! read-only behind an `Arc` by the type compiler and the schema builder.
//!
//! No validation happens here. Inconsistent declarations only show up when
//! the compiler or builder reads them.

use std::fmt;

use indexmap::IndexMap;
use tracing::trace;

use super::types::{ScalarType, TypeDescriptor};
use crate::resolvers::{Guard, MethodHandler};

/// How a foreign key may also be addressed by a flat id key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdColumn {
    /// An explicit key name such as `petId`.
    Named(String),
    /// `<lowercased target entity><Capitalized target pk>`, expanded at compile time.
    Conventional,
}

/// Kind of a declared model field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    PrimaryKey(ScalarType),
    Column(ScalarType),
    ForeignKey {
        /// Class key of the related model, resolved when first compiled.
        target: String,
        id_column: Option<IdColumn>,
    },
}

impl FieldKind {
    #[must_use]
    pub fn is_primary_key(&self) -> bool {
        matches!(self, Self::PrimaryKey(_))
    }

    #[must_use]
    pub fn is_foreign_key(&self) -> bool {
        matches!(self, Self::ForeignKey { .. })
    }

    /// Scalar type of a primary key or column.
    #[must_use]
    pub fn scalar(&self) -> Option<ScalarType> {
        match self {
            Self::PrimaryKey(scalar) | Self::Column(scalar) => Some(*scalar),
            Self::ForeignKey { .. } => None,
        }
    }
}

/// A declared model field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name, used as the key on model instances.
    pub name: String,
    /// Name exposed on the wire. Defaults to `name`.
    pub wire_name: String,
    pub kind: FieldKind,
}

/// Declarations collected for one model class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    pub class: String,
    /// Entity name, set once the class is declared as an entity.
    pub entity: Option<String>,
    /// Fields in declaration order.
    pub fields: Vec<FieldDescriptor>,
}

impl ModelDescriptor {
    fn new(class: &str) -> Self {
        Self {
            class: class.to_string(),
            entity: None,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_entity(&self) -> bool {
        self.entity.is_some()
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The primary-key field. When several are declared the last one wins.
    #[must_use]
    pub fn primary_key(&self) -> Option<&FieldDescriptor> {
        self.fields.iter().rev().find(|f| f.kind.is_primary_key())
    }
}

/// Whether a resolver method is exposed on the Query or the Mutation root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolverKind {
    Query,
    Mutation,
}

/// A declared resolver method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDescriptor {
    pub name: String,
    pub ty: TypeDescriptor,
}

/// Replaces the declared type of the parameter at `index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamOverride {
    pub index: usize,
    pub ty: TypeDescriptor,
}

/// Declarations collected for one resolver method.
#[derive(Clone)]
pub struct ResolverMethodDescriptor {
    pub method: String,
    pub kind: Option<ResolverKind>,
    pub name: Option<String>,
    pub returns: Option<TypeDescriptor>,
    pub params: Vec<ParamDescriptor>,
    /// Guards in execution order: the most recently declared one first.
    pub guards: Vec<Guard>,
    pub overrides: Vec<ParamOverride>,
    pub handler: Option<MethodHandler>,
}

impl ResolverMethodDescriptor {
    fn new(method: &str) -> Self {
        Self {
            method: method.to_string(),
            kind: None,
            name: None,
            returns: None,
            params: Vec::new(),
            guards: Vec::new(),
            overrides: Vec::new(),
            handler: None,
        }
    }

    /// Root field name: the declared name, else the method name.
    #[must_use]
    pub fn exposed_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.method)
    }

    /// Effective type of the parameter at `index`, honouring overrides.
    #[must_use]
    pub fn param_type(&self, index: usize) -> Option<&TypeDescriptor> {
        self.overrides
            .iter()
            .rev()
            .find(|o| o.index == index)
            .map(|o| &o.ty)
            .or_else(|| self.params.get(index).map(|p| &p.ty))
    }
}

impl fmt::Debug for ResolverMethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverMethodDescriptor")
            .field("method", &self.method)
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("returns", &self.returns)
            .field("params", &self.params)
            .field("guards", &self.guards.len())
            .field("overrides", &self.overrides)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

/// Declarations collected for one resolver class.
#[derive(Debug, Clone)]
pub struct ResolverDescriptor {
    pub class: String,
    /// Methods in declaration order.
    pub methods: IndexMap<String, ResolverMethodDescriptor>,
}

/// Registry of model and resolver declarations.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    models: IndexMap<String, ModelDescriptor>,
    resolvers: IndexMap<String, ResolverDescriptor>,
}

impl MetadataRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `class` as an entity named `name`, or the class key itself.
    pub fn declare_entity(&mut self, class: &str, name: Option<&str>) {
        let model = self.model_entry(class);
        model.entity = Some(name.unwrap_or(class).to_string());
        trace!(class, entity = ?model.entity, "Declared entity");
    }

    /// Declares a field on `class`.
    ///
    /// Re-declaring a field replaces its kind and wire name but keeps the
    /// position of the first declaration.
    pub fn declare_field(
        &mut self,
        class: &str,
        field: &str,
        kind: FieldKind,
        wire_name: Option<&str>,
    ) {
        let wire_name = wire_name.unwrap_or(field).to_string();
        let model = self.model_entry(class);
        match model.fields.iter_mut().find(|f| f.name == field) {
            Some(existing) => {
                existing.kind = kind;
                existing.wire_name = wire_name;
            }
            None => model.fields.push(FieldDescriptor {
                name: field.to_string(),
                wire_name,
                kind,
            }),
        }
        trace!(class, field, "Declared field");
    }

    /// Declares `method` of `class` as a query or mutation.
    pub fn declare_resolver_method(
        &mut self,
        class: &str,
        method: &str,
        kind: ResolverKind,
        name: Option<&str>,
        returns: Option<TypeDescriptor>,
    ) {
        let descriptor = self.method_entry(class, method);
        descriptor.kind = Some(kind);
        descriptor.name = name.map(str::to_string);
        descriptor.returns = returns;
        trace!(class, method, ?kind, "Declared resolver method");
    }

    /// Adds a guard in front of the guards already declared for `method`.
    pub fn declare_guard(&mut self, class: &str, method: &str, guard: Guard) {
        self.method_entry(class, method).guards.insert(0, guard);
    }

    /// Overrides the type of the parameter at `index`.
    pub fn declare_param_override(
        &mut self,
        class: &str,
        method: &str,
        index: usize,
        ty: TypeDescriptor,
    ) {
        self.method_entry(class, method)
            .overrides
            .push(ParamOverride { index, ty });
    }

    /// Appends a parameter to the declared signature of `method`.
    pub fn declare_param(&mut self, class: &str, method: &str, name: &str, ty: TypeDescriptor) {
        self.method_entry(class, method).params.push(ParamDescriptor {
            name: name.to_string(),
            ty,
        });
    }

    /// Binds the body invoked when `method` is resolved.
    pub fn declare_handler(&mut self, class: &str, method: &str, handler: MethodHandler) {
        self.method_entry(class, method).handler = Some(handler);
    }

    #[must_use]
    pub fn model(&self, class: &str) -> Option<&ModelDescriptor> {
        self.models.get(class)
    }

    /// Looks a model up by class key, ignoring case.
    #[must_use]
    pub fn find_model(&self, class: &str) -> Option<&ModelDescriptor> {
        self.models.get(class).or_else(|| {
            self.models
                .values()
                .find(|m| m.class.eq_ignore_ascii_case(class))
        })
    }

    /// Entity name of `class`, if it was declared as an entity.
    #[must_use]
    pub fn entity_name(&self, class: &str) -> Option<&str> {
        self.models.get(class).and_then(|m| m.entity.as_deref())
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.values()
    }

    #[must_use]
    pub fn resolver_descriptor(&self, class: &str) -> Option<&ResolverDescriptor> {
        self.resolvers.get(class)
    }

    pub fn resolvers(&self) -> impl Iterator<Item = &ResolverDescriptor> {
        self.resolvers.values()
    }

    fn model_entry(&mut self, class: &str) -> &mut ModelDescriptor {
        self.models
            .entry(class.to_string())
            .or_insert_with(|| ModelDescriptor::new(class))
    }

    fn method_entry(&mut self, class: &str, method: &str) -> &mut ResolverMethodDescriptor {
        self.resolvers
            .entry(class.to_string())
            .or_insert_with(|| ResolverDescriptor {
                class: class.to_string(),
                methods: IndexMap::new(),
            })
            .methods
            .entry(method.to_string())
            .or_insert_with(|| ResolverMethodDescriptor::new(method))
    }
}
