//! Error types for schema_evolve

use thiserror::Error;

/// Result type for schema_evolve operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for schema_evolve
#[derive(Error, Debug)]
pub enum Error {
    #[error("Schema '{name}' is duplicated")]
    DuplicateSchemaError { name: String },

    #[error("Schema '{name}', which extends '{extend}', must declare an alias")]
    MissingAliasError { name: String, extend: String },

    #[error("Schema '{alias}' is duplicated, check whether a schema uses the same name as this alias")]
    DuplicateAliasError { alias: String },

    #[error("Schema '{key}' could not find its parent schema '{extend}'")]
    ParentNotFoundError { key: String, extend: String },

    #[error("No base schema found for '{name}': every fragment extends another one")]
    NoRootError { name: String },

    #[error("Schema '{name}' has more than one base fragment: {roots:?}")]
    AmbiguousRootError { name: String, roots: Vec<String> },

    #[error("Schema '{name}' has more than one fragment extending '{parent}': {children:?}")]
    BranchingInheritanceError {
        name: String,
        parent: String,
        children: Vec<String>,
    },

    #[error("Change record for '{table}.{field}' ended up with no keys")]
    EmptyChangeRecordError { table: String, field: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Load error: {0}")]
    LoadError(String),

    #[error("No schema found in the model directories")]
    NoSchemaFound,

    #[error("Schema validation failed:\n{}", .0.join("\n"))]
    ValidationError(Vec<String>),

    #[error("Schema revision '{0}' does not exist")]
    RevisionNotFound(u32),

    #[error("Operation canceled")]
    OperationCanceled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// Whether this is a user-initiated abort rather than a failure
    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::OperationCanceled)
    }
}

/// Convert Serde JSON errors to schema_evolve errors
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::SerializationError(error.to_string())
    }
}

/// Convert YAML errors to schema_evolve errors
impl From<serde_yaml::Error> for Error {
    fn from(error: serde_yaml::Error) -> Self {
        Error::SerializationError(error.to_string())
    }
}

/// Convert TOML deserialization errors to schema_evolve errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::ConfigError(error.to_string())
    }
}
