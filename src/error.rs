use thiserror::Error;

/// unitrack application error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error")]
    Internal,
}

impl Error {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// True for errors caused by the caller rather than by the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. }
                | Self::Validation(_)
                | Self::Conflict(_)
                | Self::NotFound { .. }
                | Self::Unauthorized
                | Self::InvalidCredentials
                | Self::Forbidden(_)
        )
    }
}

/// Attaches a field name to validation failures of newtype constructors.
pub trait FieldContext<T> {
    fn field(self, name: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> FieldContext<T> for std::result::Result<T, E> {
    fn field(self, name: &str) -> Result<T> {
        self.map_err(|e| Error::invalid_input(name, e.to_string()))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_context_names_the_field() {
        let parsed: std::result::Result<u8, String> = Err("too long".to_string());
        let err = parsed.field("username").unwrap_err();
        assert_eq!(err.to_string(), "Invalid username: too long");
    }

    #[test]
    fn client_errors_are_classified() {
        assert!(Error::Unauthorized.is_client_error());
        assert!(Error::not_found("student").is_client_error());
        assert!(!Error::Internal.is_client_error());
    }
}
