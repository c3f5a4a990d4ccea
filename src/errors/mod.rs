//! # Error Handling
//!
//! Errors that escape kvtree as `Err`. Expected runtime outcomes (disabled
//! backend, missing nodes or keys, unexpected HTTP statuses, transport failures)
//! never show up here: they are reported through [`crate::KvResult`]. What is
//! left are caller bugs (invalid paths) and setup problems (configuration).

/// Custom result type for kvtree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for kvtree
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Invalid argument passed by the caller, e.g. a path not starting with '/'
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// Transport setup errors (building the HTTP client, parsing the address)
    #[error("Transport error: {0}")]
    Transport(String),
}

impl Error {
    /// Create a new invalid argument error
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or_else(|| e.code.to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::validation(format!("Validation failed: {}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = Error::invalid_argument("Paths must always start with '/'");
        assert!(matches!(error, Error::InvalidArgument(_)));
        assert_eq!(error.to_string(), "Invalid argument: Paths must always start with '/'");

        let error = Error::config("VAULT_ADDR missing");
        assert_eq!(error.to_string(), "Configuration error: VAULT_ADDR missing");
    }

    #[test]
    fn test_validation_error() {
        let error = Error::validation_field("must not contain '/'", "mount_name");
        if let Error::Validation { field, .. } = error {
            assert_eq!(field, Some("mount_name".to_string()));
        } else {
            panic!("expected validation error");
        }
    }
}
