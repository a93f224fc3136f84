//! Dynamic model instances.
//!
//! A [`ModelInstance`] is an instance of a declared model class: a class key
//! plus an ordered map of field values. Instances are what the request
//! marshaler produces from arguments, what foreign-key resolution hands to
//! the foreign-instance resolver, and what resolver methods usually return.
//!
//! Values are stored as GraphQL values. A nested model is stored as an
//! object value; [`ModelInstance::nested`] turns it back into an instance.

use async_graphql::{Name, Value};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use crate::error::ModelQlError;

#[derive(Debug, Clone, PartialEq)]
pub struct ModelInstance {
    class: String,
    values: IndexMap<String, Value>,
}

impl ModelInstance {
    /// Creates an instance of `class` with no fields set.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            values: IndexMap::new(),
        }
    }

    /// Builds an instance from an object value. Returns `None` for anything
    /// but an object.
    pub fn from_value(class: impl Into<String>, value: &Value) -> Option<Self> {
        match value {
            Value::Object(obj) => Some(Self {
                class: class.into(),
                values: obj
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            }),
            _ => None,
        }
    }

    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Whether `field` has been assigned, even if to null.
    #[must_use]
    pub fn is_set(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(field.into(), value.into());
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// The related instance stored under `field`, read as an instance of `class`.
    #[must_use]
    pub fn nested(&self, field: &str, class: &str) -> Option<ModelInstance> {
        self.get(field)
            .and_then(|value| Self::from_value(class, value))
    }

    /// Assigned field names, in assignment order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Converts the instance into an object value keyed by field name.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(
            self.values
                .into_iter()
                .map(|(k, v)| (Name::new(k), v))
                .collect(),
        )
    }

    /// Deserializes the instance into a typed struct.
    ///
    /// # Errors
    ///
    /// Returns `ModelQlError::Deserialize` if the values do not fit `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ModelQlError> {
        let json = self.clone().into_value().into_json()?;
        Ok(serde_json::from_value(json)?)
    }
}

impl From<ModelInstance> for Value {
    fn from(instance: ModelInstance) -> Self {
        instance.into_value()
    }
}
