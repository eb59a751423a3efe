use std::path::PathBuf;
use thiserror::Error;

/// Modelgen error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    ConfigValidation(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Schema error in {path}: {message}")]
    SchemaParse { path: PathBuf, message: String },

    #[error("Invalid module path: {0:?}")]
    InvalidModulePath(String),

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    /// A scalar attribute whose value type cannot be resolved. Aborts the run.
    #[error("Could not infer value type for {entity}.{attribute}")]
    Extraction { entity: String, attribute: String },

    /// A generated schema name was already registered in this run.
    #[error("Schema name generated twice: {0}")]
    DuplicateName(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for modelgen operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a config validation error
    pub fn config_validation(msg: impl Into<String>) -> Self {
        Error::ConfigValidation(msg.into())
    }

    /// Create a schema parse error
    pub fn schema(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::SchemaParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an extraction error
    pub fn extraction(entity: impl Into<String>, attribute: impl Into<String>) -> Self {
        Error::Extraction {
            entity: entity.into(),
            attribute: attribute.into(),
        }
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }
}
