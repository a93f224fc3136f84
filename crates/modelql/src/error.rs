//! Error types for schema construction.
//!
//! Most failures while compiling declarations are not errors:
//! they are logged and degrade to an omitted or null field, so a schema can
//! always be assembled. The variants here cover what remains.

use async_graphql::ErrorExtensions;
use thiserror::Error;

/// Errors raised by the crate.
#[derive(Debug, Error)]
pub enum ModelQlError {
    /// The target type system rejected the assembled schema.
    #[error("Failed to build GraphQL schema: {0}")]
    SchemaBuildFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A class key that was never declared as an entity.
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// A resolver handler was bound for a different resolver type than the
    /// instance registered under its class.
    #[error("Resolver {class} does not match the type its handlers were declared for")]
    ResolverMismatch { class: String },

    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl ModelQlError {
    /// Create a new SchemaBuildFailed error
    pub fn schema_build_failed(message: impl Into<String>) -> Self {
        Self::SchemaBuildFailed(message.into())
    }

    /// Create a new ResolverMismatch error
    pub fn resolver_mismatch(class: impl Into<String>) -> Self {
        Self::ResolverMismatch {
            class: class.into(),
        }
    }

    /// Returns the error code for GraphQL error extensions.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SchemaBuildFailed(_) => "SCHEMA_BUILD_FAILED",
            Self::InvalidConfig(_) | Self::ConfigParse(_) => "INVALID_CONFIG",
            Self::UnknownModel(_) => "UNKNOWN_MODEL",
            Self::ResolverMismatch { .. } => "RESOLVER_MISMATCH",
            Self::Deserialize(_) => "DESERIALIZE_ERROR",
        }
    }
}

impl ErrorExtensions for ModelQlError {
    fn extend(&self) -> async_graphql::Error {
        let code = self.error_code();
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", code))
    }
}
