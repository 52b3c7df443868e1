use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use perfumery_core::errors::{ApplicationError, DomainError, InterfaceError};
use perfumery_db::RepositoryError;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    pub correlation_id: String,
}

/// Error returned by catalog handlers. Store failures are logged with their
/// correlation id and reach the client only as a generic message.
#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            InterfaceError::InvalidId { .. } | InterfaceError::BadRequest { .. } => {
                StatusCode::BAD_REQUEST
            }
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn rejected_body(rejection: JsonRejection) -> Self {
        DomainError::Validation(format!("invalid request body: {}", rejection.body_text())).into()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(value: ApplicationError) -> Self {
        Self(value.into_interface(new_correlation_id()))
    }
}

impl From<DomainError> for ApiError {
    fn from(value: DomainError) -> Self {
        ApplicationError::from(value).into()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(value: RepositoryError) -> Self {
        ApplicationError::Persistence(value.to_string()).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let interface = self.0;

        if interface.is_internal() {
            error!(
                event_name = "catalog.request.failed",
                correlation_id = %interface.correlation_id(),
                error = %interface,
                "catalog request failed"
            );
        } else {
            warn!(
                event_name = "catalog.request.rejected",
                correlation_id = %interface.correlation_id(),
                error_code = interface.code(),
                error = %interface,
                "catalog request rejected"
            );
        }

        let body = ErrorBody {
            error: interface.code().to_string(),
            message: interface.user_message().to_string(),
            correlation_id: interface.correlation_id().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn new_correlation_id() -> String {
    Uuid::new_v4().simple().to_string()
}
