use thiserror::Error;

use crate::requests::RequestStatus;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("not authenticated")]
    Unauthenticated,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found")]
    NotFound,
    #[error("conflict")]
    Conflict,
    #[error("operation is not allowed while the request is {current}")]
    InvalidStatus { current: RequestStatus },
    #[error("request cannot move from {from} to {to}")]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },
    #[error("request is already {current}")]
    IllegalState { current: RequestStatus },
    #[error("a response message is required")]
    MessageRequired,
    #[error("file is empty")]
    EmptyFile,
    #[error("file of {size_bytes} bytes exceeds the maximum of {max_bytes} bytes")]
    FileTooLarge { size_bytes: u64, max_bytes: u64 },
    #[error("file type {0} is not allowed")]
    InvalidFileType(String),
    #[error("no contact email could be resolved for the adopter")]
    AdopterEmailNotFound,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("announce failed: {0}")]
    SideEffect(String),
}

impl DomainError {
    /// Stable key for caller-side message lookup and localization; the
    /// engine itself stays language-agnostic.
    pub fn message_key(&self) -> &'static str {
        match self {
            DomainError::Unauthenticated => "unauthenticated",
            DomainError::Forbidden(_) => "forbidden",
            DomainError::NotFound => "not_found",
            DomainError::Conflict => "conflict",
            DomainError::InvalidStatus { .. } => "invalid_status",
            DomainError::InvalidTransition { .. } => "invalid_transition",
            DomainError::IllegalState { .. } => "illegal_state",
            DomainError::MessageRequired => "message_required",
            DomainError::EmptyFile => "empty_file",
            DomainError::FileTooLarge { .. } => "file_too_large",
            DomainError::InvalidFileType(_) => "invalid_file_type",
            DomainError::AdopterEmailNotFound => "adopter_email_not_found",
            DomainError::Validation(_) => "validation_error",
            DomainError::SideEffect(_) => "announce_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_keys_are_stable() {
        assert_eq!(DomainError::Unauthenticated.message_key(), "unauthenticated");
        assert_eq!(DomainError::MessageRequired.message_key(), "message_required");
        assert_eq!(
            DomainError::InvalidStatus {
                current: RequestStatus::InReview
            }
            .message_key(),
            "invalid_status"
        );
        assert_eq!(
            DomainError::FileTooLarge {
                size_bytes: 10,
                max_bytes: 5
            }
            .message_key(),
            "file_too_large"
        );
    }
}
