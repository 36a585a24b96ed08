//! Error types for jobly

use http::StatusCode;
use thiserror::Error;

/// Result type alias for jobly operations
pub type JoblyResult<T> = Result<T, JoblyError>;

/// Error types for fragment building, authorization and data access
#[derive(Debug, Error)]
pub enum JoblyError {
    /// A partial update was requested with nothing to update
    #[error("No data")]
    NoUpdatableFields,

    /// A filter key has no entry in the caller's name table
    #[error("Unknown filter: {key}")]
    UnknownFilter { key: String },

    /// A value that cannot be bound as a scalar parameter
    #[error("Unsupported value for '{field}': {message}")]
    UnsupportedValue { field: String, message: String },

    /// Authorization gate rejected the request
    #[error("Unauthorized")]
    Unauthorized,

    /// Caller supplied an invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Invalid configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Token could not be issued
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl JoblyError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create an error for a value that cannot be bound
    pub fn unsupported(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnsupportedValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is an authorization failure
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// HTTP status an outer layer should answer with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NoUpdatableFields
            | Self::UnknownFilter { .. }
            | Self::UnsupportedValue { .. }
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UniqueViolation(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Parse a tokio_postgres error into a more specific JoblyError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            if db_err.code().code() == "23505" {
                let constraint = db_err.constraint().unwrap_or("unknown");
                return Self::UniqueViolation(format!("{}: {}", constraint, db_err.message()));
            }
        }
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for JoblyError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
