/// Unified error type for the projection engine
/// Unmapped members and incompatible pairings are NOT errors (they go to the
/// diagnostics sink); only configuration problems and row-access failures land here.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// Target type cannot be constructed without arguments.
    /// Raised once per shape, before any row is read, and cached.
    #[error("Type '{target}' has no parameterless constructor")]
    MissingConstructor {
        target: String,
    },

    /// A row value could not be converted into the member's type
    #[error("Conversion error: {message}")]
    Conversion {
        message: String,
        from: Option<String>,
        to: Option<String>,
    },

    /// Typed getter called against a column whose declared type does not support it
    #[error("Unsupported read of column {ordinal}: requested {requested}, column is {declared}")]
    UnsupportedType {
        ordinal: usize,
        requested: String,
        declared: String,
    },

    /// Failure reported by the row source itself
    #[error("Row access error: {message}")]
    RowAccess {
        message: String,
        ordinal: Option<usize>,
    },

    /// Internal errors: should never happen, indicates bug
    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },

    /// Configuration loading / validation errors
    #[error("Config error: {message}")]
    Config {
        message: String,
        path: Option<String>,
    },
}

impl ProjectionError {
    pub fn missing_constructor(target: impl Into<String>) -> Self {
        Self::MissingConstructor {
            target: target.into(),
        }
    }

    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion {
            message: message.into(),
            from: None,
            to: None,
        }
    }

    pub fn conversion_between(
        message: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self::Conversion {
            message: message.into(),
            from: Some(from.into()),
            to: Some(to.into()),
        }
    }

    pub fn unsupported(
        ordinal: usize,
        requested: impl Into<String>,
        declared: impl Into<String>,
    ) -> Self {
        Self::UnsupportedType {
            ordinal,
            requested: requested.into(),
            declared: declared.into(),
        }
    }

    pub fn row_access(message: impl Into<String>) -> Self {
        Self::RowAccess {
            message: message.into(),
            ordinal: None,
        }
    }

    pub fn row_access_at(message: impl Into<String>, ordinal: usize) -> Self {
        Self::RowAccess {
            message: message.into(),
            ordinal: Some(ordinal),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    pub fn config_with_path(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// True for errors that describe the target type itself rather than a row
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingConstructor { .. } | Self::Config { .. })
    }
}

impl From<anyhow::Error> for ProjectionError {
    fn from(err: anyhow::Error) -> Self {
        Self::Config {
            message: format!("{:#}", err),
            path: None,
        }
    }
}

impl From<std::io::Error> for ProjectionError {
    fn from(err: std::io::Error) -> Self {
        Self::Config {
            message: err.to_string(),
            path: None,
        }
    }
}

/// Result type alias for projection operations
pub type ProjectionResult<T> = Result<T, ProjectionError>;
