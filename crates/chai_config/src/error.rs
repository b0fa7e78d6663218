//! Error types for project layout loading and validation.

/// Errors that can occur when loading, editing or validating a project layout.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading or writing the layout file.
    #[error("failed to access project layout: {0}")]
    IoError(#[from] std::io::Error),

    /// The layout file content could not be parsed.
    #[error("failed to parse project layout: {0}")]
    ParseError(String),

    /// The layout could not be serialized for writing.
    #[error("failed to write project layout: {0}")]
    SerializeError(String),

    /// No layout exists for the named project.
    #[error("unknown project '{0}'")]
    UnknownProject(String),

    /// A required field is missing or empty.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A value to remove is not present in the field.
    #[error("'{value}' is not listed in {field}")]
    ValueNotFound {
        /// The field that was searched.
        field: String,
        /// The value that was not found.
        value: String,
    },

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}
