//! Error types for the timesheet core

use thiserror::Error;

/// Result type alias using the timesheet Error
pub type Result<T> = std::result::Result<T, Error>;

/// Timesheet error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Input errors (E001-E099)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Could not parse {0}")]
    Parse(String),

    // Lookup errors (E100-E199)
    #[error("{count} {entity} records match '{key}'; expected at most one.")]
    Ambiguous {
        entity: &'static str,
        key: String,
        count: usize,
    },

    // Capability errors (E200-E299)
    #[error("{0} is not supported yet.")]
    Unsupported(&'static str),

    // Persistence errors (E400-E499)
    #[error("Persistence error: {0}")]
    PersistenceError(#[from] sqlx::Error),

    #[error("Storage constraint violated: {0}")]
    ConstraintViolation(String),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "E001",
            Self::Parse(_) => "E002",
            Self::Ambiguous { .. } => "E100",
            Self::Unsupported(_) => "E200",
            Self::PersistenceError(_) => "E400",
            Self::ConstraintViolation(_) => "E401",
            Self::ConfigError(_) => "E600",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Ambiguous { entity, .. } => Some(format!("timesheet {}s list", entity)),
            Self::PersistenceError(_) => Some("timesheet doctor".to_string()),
            Self::ConfigError(_) => Some("timesheet config list".to_string()),
            _ => None,
        }
    }

    /// Whether the error came from the storage layer
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::PersistenceError(_) | Self::ConstraintViolation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_error() {
        let error = Error::InvalidArgument("project code is required".to_string());
        assert_eq!(error.code(), "E001");
        assert_eq!(error.suggestion(), None);
        assert!(error.to_string().contains("project code is required"));
        assert!(!error.is_persistence());
    }

    #[test]
    fn test_ambiguous_error() {
        let error = Error::Ambiguous {
            entity: "project",
            key: "ABC".to_string(),
            count: 2,
        };
        assert_eq!(error.code(), "E100");
        assert_eq!(error.suggestion(), Some("timesheet projects list".to_string()));
        assert!(error.to_string().contains("ABC"));
        assert!(error.to_string().starts_with('2'));
    }

    #[test]
    fn test_unsupported_error() {
        let error = Error::Unsupported("Deleting a project");
        assert_eq!(error.code(), "E200");
        assert_eq!(error.to_string(), "Deleting a project is not supported yet.");
    }

    #[test]
    fn test_persistence_errors() {
        let error = Error::PersistenceError(sqlx::Error::RowNotFound);
        assert_eq!(error.code(), "E400");
        assert!(error.is_persistence());
        assert_eq!(error.suggestion(), Some("timesheet doctor".to_string()));

        let error = Error::ConstraintViolation("no identity".to_string());
        assert_eq!(error.code(), "E401");
        assert!(error.is_persistence());
    }

    #[test]
    fn test_io_error() {
        let error = Error::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));
        assert_eq!(error.code(), "E9999");
    }

    #[test]
    fn test_all_error_codes_unique() {
        let codes = vec![
            Error::InvalidArgument("test".to_string()).code(),
            Error::Parse("test".to_string()).code(),
            Error::Ambiguous {
                entity: "project",
                key: "test".to_string(),
                count: 2,
            }
            .code(),
            Error::Unsupported("test").code(),
            Error::PersistenceError(sqlx::Error::RowNotFound).code(),
            Error::ConstraintViolation("test".to_string()).code(),
            Error::ConfigError("test".to_string()).code(),
            Error::Other("test".to_string()).code(),
        ];

        let unique: std::collections::HashSet<_> = codes.into_iter().collect();
        assert_eq!(unique.len(), 8);
    }
}
