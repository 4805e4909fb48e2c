//! # Errors
//!
//! Centralized error handling for the contact service.
//! `AppError` covers infrastructure and admin operations, `SubmissionError`
//! is the terminal outcome of a failed public submission.

use crate::models::SubmissionStatus;
use crate::validation::FieldError;
use thiserror::Error;

/// The primary error type for admin and infrastructure operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Commune, Template)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., missing field, malformed email)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Security/Auth failure (e.g., bad nonce, invalid admin credentials)
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Infrastructure failure (e.g., DB down, SMTP unreachable)
    #[error("internal service error: {0}")]
    Internal(String),

    /// Malformed import payload
    #[error("import error: {0}")]
    Import(String),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// A specialized Result type for contact-service logic.
pub type Result<T> = std::result::Result<T, AppError>;

/// Why a submission did not reach the town hall.
///
/// Every variant is terminal for the current attempt and is audited before
/// it reaches the caller. The `Display` text is operator-facing; what the
/// citizen sees comes from [`SubmissionError::user_message`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("validation failed: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("unknown commune '{0}'")]
    UnknownCommune(String),

    #[error("commune '{slug}' has an invalid destination address '{address}'")]
    InvalidDestination { slug: String, address: String },

    #[error("message blocked by the forbidden-word filter")]
    Blocked,

    #[error("delivery failed: {0}")]
    Delivery(String),
}

impl SubmissionError {
    /// The message returned to the citizen. Never echoes registry contents
    /// or the matched forbidden term.
    pub fn user_message(&self) -> String {
        match self {
            SubmissionError::Validation(errors) => join_field_errors(errors),
            SubmissionError::UnknownCommune(_) => "Unknown commune.".to_string(),
            SubmissionError::InvalidDestination { .. } => {
                "This commune cannot be contacted at the moment.".to_string()
            }
            SubmissionError::Blocked => {
                "Your message contains a disallowed term. Please rephrase it.".to_string()
            }
            SubmissionError::Delivery(_) => {
                "An error occurred while sending the email.".to_string()
            }
        }
    }

    /// Status written to the audit record for this outcome.
    pub fn status(&self) -> SubmissionStatus {
        match self {
            SubmissionError::Blocked => SubmissionStatus::Blocked,
            _ => SubmissionStatus::Error,
        }
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_joined_into_one_message() {
        let err = SubmissionError::Validation(vec![FieldError::MissingCommune, FieldError::MissingEmail]);
        assert_eq!(
            err.user_message(),
            "Please choose a commune. Please enter your email address."
        );
        assert_eq!(err.status(), SubmissionStatus::Error);
    }

    #[test]
    fn blocked_message_is_generic() {
        let err = SubmissionError::Blocked;
        assert_eq!(err.status(), SubmissionStatus::Blocked);
        assert!(err.user_message().contains("disallowed term"));
    }

    #[test]
    fn unknown_commune_does_not_leak_the_identifier() {
        let err = SubmissionError::UnknownCommune("secret-village".into());
        assert!(!err.user_message().contains("secret-village"));
    }
}
