//! Scalar and type descriptors used by declarations.
//!
//! Column and primary-key declarations carry a [`ScalarType`]. Resolver
//! return types and parameters are described by a [`TypeDescriptor`], which
//! names either a scalar or a model class, optionally wrapped in a list.

use std::fmt;

use async_graphql::dynamic::TypeRef;

/// Built-in scalars a declared field or descriptor can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    Float,
    Boolean,
    Int,
    Id,
}

impl ScalarType {
    /// Looks up a scalar by declared type name.
    ///
    /// The lookup is case-insensitive. `number` maps to `Float`, matching the
    /// way untyped numeric model fields are exposed.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "string" => Some(Self::String),
            "number" | "float" => Some(Self::Float),
            "boolean" | "bool" => Some(Self::Boolean),
            "int" | "integer" => Some(Self::Int),
            "id" => Some(Self::Id),
            _ => None,
        }
    }

    /// Name of the GraphQL built-in scalar.
    #[must_use]
    pub fn graphql_name(self) -> &'static str {
        match self {
            Self::String => TypeRef::STRING,
            Self::Float => TypeRef::FLOAT,
            Self::Boolean => TypeRef::BOOLEAN,
            Self::Int => TypeRef::INT,
            Self::Id => TypeRef::ID,
        }
    }

    /// Nullable type reference for this scalar.
    #[must_use]
    pub fn type_ref(self) -> TypeRef {
        TypeRef::named(self.graphql_name())
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.graphql_name())
    }
}

/// Declared type of a resolver return value or parameter.
///
/// `name` is either a scalar name understood by [`ScalarType::from_name`]
/// or a model class key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    pub name: String,
    pub list: bool,
}

impl TypeDescriptor {
    /// A single value of the named scalar or model.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            list: false,
        }
    }

    /// A list of the named scalar or model.
    pub fn list_of(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            list: true,
        }
    }

    pub fn scalar(scalar: ScalarType) -> Self {
        Self::named(scalar.graphql_name())
    }

    /// The scalar this descriptor names, if any.
    #[must_use]
    pub fn as_scalar(&self) -> Option<ScalarType> {
        ScalarType::from_name(&self.name)
    }

    /// Wraps a named type reference in a list when the descriptor is a list.
    #[must_use]
    pub fn wrap(&self, type_name: &str) -> TypeRef {
        if self.list {
            TypeRef::named_list(type_name)
        } else {
            TypeRef::named(type_name)
        }
    }
}

impl From<ScalarType> for TypeDescriptor {
    fn from(scalar: ScalarType) -> Self {
        Self::scalar(scalar)
    }
}

impl From<&str> for TypeDescriptor {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.list {
            write!(f, "[{}]", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_lookup_is_case_insensitive() {
        assert_eq!(ScalarType::from_name("string"), Some(ScalarType::String));
        assert_eq!(ScalarType::from_name("String"), Some(ScalarType::String));
        assert_eq!(ScalarType::from_name("Number"), Some(ScalarType::Float));
        assert_eq!(ScalarType::from_name("boolean"), Some(ScalarType::Boolean));
        assert_eq!(ScalarType::from_name("Int"), Some(ScalarType::Int));
        assert_eq!(ScalarType::from_name("ID"), Some(ScalarType::Id));
        assert_eq!(ScalarType::from_name("Pet"), None);
        assert_eq!(ScalarType::from_name("Date"), None);
    }

    #[test]
    fn test_descriptor_scalar_round() {
        let descriptor = TypeDescriptor::scalar(ScalarType::Float);
        assert_eq!(descriptor.as_scalar(), Some(ScalarType::Float));
        assert!(!descriptor.list);

        let models = TypeDescriptor::list_of("Pet");
        assert_eq!(models.as_scalar(), None);
        assert_eq!(models.to_string(), "[Pet]");
    }
}
