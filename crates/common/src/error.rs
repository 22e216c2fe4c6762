//! Error types for trustmod.

use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
///
/// The first group of variants are expected business outcomes the caller
/// maps to user-facing messages. The second group are infrastructure
/// failures and never describe a rule violation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AppError {
    // === Moderation outcomes ===
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Report already claimed by {0}")]
    AlreadyClaimed(String),

    #[error("Caller does not hold the claim on this report")]
    NotClaimHolder,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    // === Infrastructure ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the stable error code for callers.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::InvalidTransition(_) => "INVALID_TRANSITION",
            Self::AlreadyClaimed(_) => "ALREADY_CLAIMED",
            Self::NotClaimHolder => "NOT_CLAIM_HOLDER",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error comes from infrastructure rather than a
    /// business rule, and should be logged at error level.
    #[must_use]
    pub const fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Config(_) | Self::Internal(_)
        )
    }

    /// Log this error at the level matching its kind.
    pub fn log(&self) {
        let code = self.error_code();
        if self.is_infrastructure() {
            tracing::error!(error = %self, code = code, "Infrastructure error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Moderation request rejected");
        }
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::AlreadyClaimed("admin1".to_string()).error_code(),
            "ALREADY_CLAIMED"
        );
        assert_eq!(AppError::NotClaimHolder.error_code(), "NOT_CLAIM_HOLDER");
        assert_eq!(
            AppError::InvalidTransition("x".to_string()).error_code(),
            "INVALID_TRANSITION"
        );
    }

    #[test]
    fn test_business_errors_are_not_infrastructure() {
        assert!(!AppError::Unauthorized("x".to_string()).is_infrastructure());
        assert!(!AppError::NotFound("x".to_string()).is_infrastructure());
        assert!(!AppError::NotClaimHolder.is_infrastructure());
        assert!(AppError::Database("down".to_string()).is_infrastructure());
    }

    #[test]
    fn test_already_claimed_names_holder() {
        let err = AppError::AlreadyClaimed("admin1".to_string());
        assert_eq!(err.error_code(), "ALREADY_CLAIMED");
        assert_eq!(err.to_string(), "Report already claimed by admin1");
    }
}
