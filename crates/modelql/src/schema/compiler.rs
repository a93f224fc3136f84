//! Model type compiler.
//!
//! Turns model declarations into GraphQL object types (for results) and input
//! object types (for arguments).
//!
//! Compiled types live in an arena and reference each other by [`TypeHandle`].
//! A type's slot and memo entry are reserved before its fields are compiled,
//! so a foreign key back to a type still under construction resolves to that
//! type's handle instead of recursing. Self-referential and mutually
//! referential models therefore compile in a single pass.
//!
//! Types are memoized per flavor by lowercased entity name: compiling the
//! same model twice returns the same `Arc<CompiledType>`.

use std::collections::HashMap;
use std::sync::Arc;

use async_graphql::Value;
use async_graphql::dynamic::{
    Field, FieldFuture, InputObject, InputValue, Object, SchemaBuilder, TypeRef,
};
use tracing::{debug, trace, warn};

use crate::marshal::flat_id_key;
use crate::metadata::{FieldKind, MetadataRegistry, ModelDescriptor, ScalarType};
use crate::resolvers::{DynForeignResolver, RelationField, RelationResolver, object_get};

/// Field added to types that would otherwise have none.
pub const PLACEHOLDER_FIELD: &str = "_placeholder";

/// Index of a compiled type in the compiler's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeHandle(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFlavor {
    Output,
    Input,
}

/// Type of a compiled field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompiledFieldType {
    Scalar(ScalarType),
    /// A foreign key. Modeled as a single related object, never a list.
    Relation {
        target: TypeHandle,
        relation: RelationField,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledField {
    /// GraphQL field name (the declared wire name).
    pub name: String,
    /// Key the value is stored under on model instances.
    pub key: String,
    pub ty: CompiledFieldType,
}

/// A compiled object or input object type.
#[derive(Debug, PartialEq, Eq)]
pub struct CompiledType {
    pub handle: TypeHandle,
    /// GraphQL type name.
    pub name: String,
    /// Class key of the model it was compiled from.
    pub class: String,
    pub flavor: TypeFlavor,
    /// Fields in declaration order.
    pub fields: Vec<CompiledField>,
}

impl CompiledType {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&CompiledField> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

/// Compiles and memoizes model types.
pub struct TypeCompiler {
    registry: Arc<MetadataRegistry>,
    foreign: DynForeignResolver,
    input_prefix: String,
    arena: Vec<Option<Arc<CompiledType>>>,
    outputs: HashMap<String, TypeHandle>,
    inputs: HashMap<String, TypeHandle>,
}

impl TypeCompiler {
    /// Creates a compiler. `foreign` completes foreign-key stubs when
    /// relation fields are resolved; `input_prefix` is prepended to entity
    /// names to name input types.
    pub fn new(
        registry: Arc<MetadataRegistry>,
        foreign: DynForeignResolver,
        input_prefix: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            foreign,
            input_prefix: input_prefix.into(),
            arena: Vec::new(),
            outputs: HashMap::new(),
            inputs: HashMap::new(),
        }
    }

    /// Compiles the output type of `class`.
    ///
    /// Returns `None` if `class` was never declared as an entity.
    pub fn compile_model(&mut self, class: &str) -> Option<Arc<CompiledType>> {
        let handle = self.compile(class, TypeFlavor::Output)?;
        self.get(handle)
    }

    /// Compiles the input type of `class`, along with the input types of
    /// every model it references.
    pub fn compile_input_model(&mut self, class: &str) -> Option<Arc<CompiledType>> {
        let handle = self.compile(class, TypeFlavor::Input)?;
        self.get(handle)
    }

    /// The compiled type behind `handle`, once its compilation finished.
    #[must_use]
    pub fn get(&self, handle: TypeHandle) -> Option<Arc<CompiledType>> {
        self.arena.get(handle.0).cloned().flatten()
    }

    /// The already compiled type of `class`, without compiling it.
    #[must_use]
    pub fn lookup(&self, class: &str, flavor: TypeFlavor) -> Option<Arc<CompiledType>> {
        let key = self.registry.entity_name(class)?.to_lowercase();
        self.memo(flavor)
            .get(&key)
            .and_then(|handle| self.get(*handle))
    }

    /// Number of compiled types of both flavors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    fn compile(&mut self, class: &str, flavor: TypeFlavor) -> Option<TypeHandle> {
        let registry = Arc::clone(&self.registry);
        let Some(model) = registry.model(class) else {
            trace!(class, "Class has no declarations, not compiling");
            return None;
        };
        let Some(entity) = model.entity.as_deref() else {
            trace!(class, "Class is not an entity, not compiling");
            return None;
        };

        let key = entity.to_lowercase();
        if let Some(handle) = self.memo(flavor).get(&key) {
            return Some(*handle);
        }

        let handle = TypeHandle(self.arena.len());
        self.arena.push(None);
        self.memo_mut(flavor).insert(key, handle);
        trace!(class, entity, ?flavor, "Compiling model type");

        let mut fields = Vec::with_capacity(model.fields.len());
        for field in &model.fields {
            match &field.kind {
                FieldKind::PrimaryKey(scalar) | FieldKind::Column(scalar) => {
                    fields.push(CompiledField {
                        name: field.wire_name.clone(),
                        key: field.name.clone(),
                        ty: CompiledFieldType::Scalar(*scalar),
                    });
                }
                FieldKind::ForeignKey { target, id_column } => {
                    let Some(target_handle) = self.compile(target, flavor) else {
                        warn!(
                            class,
                            field = %field.name,
                            target_class = %target,
                            "Foreign key target is not a declared entity, omitting field"
                        );
                        continue;
                    };
                    let id_column = id_column
                        .as_ref()
                        .and_then(|col| flat_id_key(&registry, target, col));

                    fields.push(CompiledField {
                        name: field.wire_name.clone(),
                        key: field.name.clone(),
                        ty: CompiledFieldType::Relation {
                            target: target_handle,
                            relation: RelationField {
                                target: target.clone(),
                                field_key: field.name.clone(),
                                id_column: id_column.clone(),
                            },
                        },
                    });

                    if flavor == TypeFlavor::Input
                        && let Some(flat) = id_column
                    {
                        push_flat_id_field(&registry, model, &mut fields, target, flat);
                    }
                }
            }
        }

        let name = match flavor {
            TypeFlavor::Output => entity.to_string(),
            TypeFlavor::Input => format!("{}{}", self.input_prefix, entity),
        };
        debug!(class, name = %name, fields = fields.len(), "Compiled model type");

        self.arena[handle.0] = Some(Arc::new(CompiledType {
            handle,
            name,
            class: class.to_string(),
            flavor,
            fields,
        }));
        Some(handle)
    }

    fn memo(&self, flavor: TypeFlavor) -> &HashMap<String, TypeHandle> {
        match flavor {
            TypeFlavor::Output => &self.outputs,
            TypeFlavor::Input => &self.inputs,
        }
    }

    fn memo_mut(&mut self, flavor: TypeFlavor) -> &mut HashMap<String, TypeHandle> {
        match flavor {
            TypeFlavor::Output => &mut self.outputs,
            TypeFlavor::Input => &mut self.inputs,
        }
    }

    /// Registers every compiled type with the schema builder.
    pub fn register(&self, mut builder: SchemaBuilder) -> SchemaBuilder {
        for ty in self.arena.iter().flatten() {
            builder = match ty.flavor {
                TypeFlavor::Output => builder.register(self.output_object(ty)),
                TypeFlavor::Input => builder.register(self.input_object(ty)),
            };
        }
        builder
    }

    fn output_object(&self, ty: &CompiledType) -> Object {
        let mut object = Object::new(&ty.name);

        for field in &ty.fields {
            match &field.ty {
                CompiledFieldType::Scalar(scalar) => {
                    object = object.field(scalar_field(field, *scalar));
                }
                CompiledFieldType::Relation { target, relation } => {
                    let Some(target) = self.get(*target) else {
                        warn!(
                            type_name = %ty.name,
                            field = %field.name,
                            "Relation target never finished compiling"
                        );
                        continue;
                    };
                    let resolver = RelationResolver::resolve(
                        Arc::clone(&self.registry),
                        Arc::clone(&self.foreign),
                        relation.clone(),
                    );
                    let type_ref = TypeRef::named(&target.name);
                    object = object.field(Field::new(&field.name, type_ref, resolver));
                }
            }
        }

        if ty.fields.is_empty() {
            trace!(type_name = %ty.name, "No fields compiled, adding placeholder field");
            object = object.field(Field::new(
                PLACEHOLDER_FIELD,
                TypeRef::named(TypeRef::STRING),
                |_ctx| FieldFuture::new(async { Ok(None::<Value>) }),
            ));
        }
        object
    }

    fn input_object(&self, ty: &CompiledType) -> InputObject {
        let mut object = InputObject::new(&ty.name);

        for field in &ty.fields {
            let type_ref = match &field.ty {
                CompiledFieldType::Scalar(scalar) => scalar.type_ref(),
                CompiledFieldType::Relation { target, .. } => match self.get(*target) {
                    Some(target) => TypeRef::named(&target.name),
                    None => continue,
                },
            };
            object = object.field(InputValue::new(&field.name, type_ref));
        }

        if ty.fields.is_empty() {
            object = object.field(InputValue::new(
                PLACEHOLDER_FIELD,
                TypeRef::named(TypeRef::STRING),
            ));
        }
        object
    }
}

/// Adds the flat id key of a foreign key as a scalar typed like the
/// target's primary key, unless a field declared anywhere on the model (or
/// an earlier flat id) already uses the name.
fn push_flat_id_field(
    registry: &MetadataRegistry,
    model: &ModelDescriptor,
    fields: &mut Vec<CompiledField>,
    target: &str,
    flat: String,
) {
    let declared = model.fields.iter().any(|f| f.wire_name == flat);
    if declared || fields.iter().any(|f| f.name == flat) {
        trace!(field = %flat, "Flat id key already declared on the model");
        return;
    }
    let Some(scalar) = registry
        .model(target)
        .and_then(|m| m.primary_key())
        .and_then(|pk| pk.kind.scalar())
    else {
        return;
    };
    fields.push(CompiledField {
        name: flat.clone(),
        key: flat,
        ty: CompiledFieldType::Scalar(scalar),
    });
}

fn scalar_field(field: &CompiledField, scalar: ScalarType) -> Field {
    let key = field.key.clone();
    let wire_name = field.name.clone();
    Field::new(&field.name, scalar.type_ref(), move |ctx| {
        let key = key.clone();
        let wire_name = wire_name.clone();
        FieldFuture::new(async move {
            let value = ctx
                .parent_value
                .as_value()
                .and_then(|parent| {
                    object_get(parent, &key).or_else(|| object_get(parent, &wire_name))
                })
                .cloned();
            Ok(value)
        })
    })
}
