//! Request marshaling.
//!
//! Converts wire-format argument values back into [`ModelInstance`]s and
//! resolves foreign keys to primary-key-only stubs.
//!
//! A related model can arrive in two encodings:
//!
//! 1. nested: `{ name: "Ann", pet: { id: 7 } }`
//! 2. flat, when the foreign key declares an id column: `{ name: "Ann", petId: 7 }`
//!
//! No coercion or validation happens here. Scalar types were already
//! matched at the GraphQL boundary.

use async_graphql::Value;
use tracing::{error, trace};

use crate::instance::ModelInstance;
use crate::metadata::{FieldKind, IdColumn, MetadataRegistry};
use crate::resolvers::object_get;

/// Fills an instance of `class` from a raw argument value.
///
/// Returns `None` when either input is absent (a null value counts as
/// absent). Foreign-key fields are filled recursively and set to null when
/// neither encoding carries them. Columns are copied verbatim when present
/// and left unset otherwise.
pub fn fill(
    registry: &MetadataRegistry,
    raw: Option<&Value>,
    class: Option<&str>,
) -> Option<ModelInstance> {
    let (raw, class) = match (raw, class) {
        (Some(Value::Null), _) | (None, _) | (_, None) => return None,
        (Some(raw), Some(class)) => (raw, class),
    };

    let mut instance = ModelInstance::new(class);
    let Some(model) = registry.model(class) else {
        trace!(class, "Filling undeclared model, no fields to copy");
        return Some(instance);
    };

    for field in &model.fields {
        match &field.kind {
            FieldKind::ForeignKey { target, id_column } => {
                let nested = object_get(raw, &field.wire_name)
                    .filter(|v| !matches!(v, Value::Null));
                let related = match nested {
                    Some(nested) => fill(registry, Some(nested), Some(target)),
                    None => id_column
                        .as_ref()
                        .and_then(|col| flat_id_key(registry, target, col))
                        .filter(|key| object_get(raw, key).is_some())
                        .and_then(|key| {
                            let field_key = field.wire_name.as_str();
                            resolve_foreign_key(registry, target, raw, field_key, Some(&key))
                        }),
                };
                instance.set(
                    field.name.clone(),
                    related.map(ModelInstance::into_value).unwrap_or(Value::Null),
                );
            }
            FieldKind::PrimaryKey(_) | FieldKind::Column(_) => {
                if let Some(value) = object_get(raw, &field.wire_name) {
                    instance.set(field.name.clone(), value.clone());
                }
            }
        }
    }

    Some(instance)
}

/// Builds a primary-key-only instance of `target` for a foreign key.
///
/// `parent` is the object holding the relation, `field_key` the key the
/// nested encoding lives under and `id_column` the flat key, if declared.
/// The flat key is tried first. When neither encoding yields an id the
/// failure is logged and `None` is returned.
pub fn resolve_foreign_key(
    registry: &MetadataRegistry,
    target: &str,
    parent: &Value,
    field_key: &str,
    id_column: Option<&str>,
) -> Option<ModelInstance> {
    let Some(pk) = registry.model(target).and_then(|m| m.primary_key()) else {
        error!(
            target_class = target,
            field = field_key,
            "Foreign key target has no primary key"
        );
        return None;
    };

    let flat = id_column
        .and_then(|col| object_get(parent, col))
        .filter(|v| !matches!(v, Value::Null));

    let id = flat.or_else(|| {
        object_get(parent, field_key).and_then(|nested| {
            object_get(nested, &pk.name)
                .or_else(|| object_get(nested, &pk.wire_name))
                .filter(|v| !matches!(v, Value::Null))
        })
    });

    match id {
        Some(id) => {
            trace!(target_class = target, field = field_key, "Resolved foreign key");
            Some(ModelInstance::new(target).with(pk.name.clone(), id.clone()))
        }
        None => {
            error!(
                target_class = target,
                field = field_key,
                id_column = ?id_column,
                "Unable to resolve foreign key: no id in flat or nested form"
            );
            None
        }
    }
}

/// The flat key a foreign key to `target` is addressed by.
///
/// A conventional id column expands to the lowercased target entity name
/// followed by the capitalized primary-key field, e.g. `petId`.
#[must_use]
pub fn flat_id_key(registry: &MetadataRegistry, target: &str, id_column: &IdColumn) -> Option<String> {
    match id_column {
        IdColumn::Named(name) => Some(name.clone()),
        IdColumn::Conventional => {
            let model = registry.model(target)?;
            let pk = model.primary_key()?;
            let entity = model.entity.as_deref().unwrap_or(target);
            Some(format!("{}{}", entity.to_lowercase(), capitalize_first(&pk.name)))
        }
    }
}

/// Capitalizes the first character of a string.
pub(crate) fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
    }
}
