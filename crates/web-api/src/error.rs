use application::ApplicationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        use application::ApplicationError as AppErr;
        use domain::{DomainError, RepositoryError};

        let status = match &error {
            AppErr::Domain(DomainError::Validation { .. }) => StatusCode::BAD_REQUEST,
            AppErr::Domain(DomainError::Conflict { .. }) => StatusCode::CONFLICT,
            AppErr::Domain(DomainError::MessageNotFound(_)) => StatusCode::NOT_FOUND,
            AppErr::Domain(DomainError::NotJoined)
            | AppErr::Domain(DomainError::AlreadyJoined { .. })
            | AppErr::Protocol(_) => StatusCode::BAD_REQUEST,
            AppErr::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            AppErr::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            AppErr::Repository(RepositoryError::Storage { .. }) => {
                tracing::error!(error = %error, "storage failure while serving request");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        ApiError::new(status, error.code(), error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
