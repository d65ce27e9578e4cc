use domain::{DomainError, ErrorBody, RepositoryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl ApplicationError {
    pub fn protocol(message: impl Into<String>) -> Self {
        ApplicationError::Protocol(message.into())
    }

    /// 线上使用的稳定错误码
    pub fn code(&self) -> &'static str {
        match self {
            ApplicationError::Domain(DomainError::Validation { .. }) => "VALIDATION_ERROR",
            ApplicationError::Domain(DomainError::Conflict { .. }) => "CONFLICT",
            ApplicationError::Domain(DomainError::MessageNotFound(_)) => "NOT_FOUND",
            ApplicationError::Domain(DomainError::NotJoined)
            | ApplicationError::Domain(DomainError::AlreadyJoined { .. })
            | ApplicationError::Protocol(_) => "PROTOCOL_ERROR",
            ApplicationError::Repository(RepositoryError::NotFound) => "NOT_FOUND",
            ApplicationError::Repository(RepositoryError::Conflict) => "CONFLICT",
            ApplicationError::Repository(RepositoryError::Storage { .. }) => "STORAGE_ERROR",
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}
