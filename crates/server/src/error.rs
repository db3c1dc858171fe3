//! HTTP error mapping. Every route error funnels into [`ApiError`], which
//! renders a structured JSON body with a matching status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use matchbot_slack::actions::ActionError;
use matchbot_slack::events::RouterError;

use crate::rounds::RoundError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unprocessable: {0}")]
    Unprocessable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::BadRequest(message)
            | Self::Unauthorized(message)
            | Self::NotFound(message)
            | Self::Conflict(message)
            | Self::Unprocessable(message)
            | Self::Internal(message) => message.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody { message: self.message(), correlation_id: None },
        };
        (status, Json(body)).into_response()
    }
}

impl From<RouterError> for ApiError {
    fn from(error: RouterError) -> Self {
        match error {
            RouterError::PersonNotFound { .. } => Self::NotFound(error.to_string()),
            RouterError::Service(message) => Self::Internal(message),
        }
    }
}

impl From<ActionError> for ApiError {
    fn from(error: ActionError) -> Self {
        match &error {
            ActionError::Malformed(_) => Self::BadRequest(error.to_string()),
            ActionError::PersonNotFound { .. }
            | ActionError::PoolNotFound(_)
            | ActionError::MatchNotFound { .. } => Self::NotFound(error.to_string()),
            ActionError::Service(message) => Self::Internal(message.clone()),
        }
    }
}

impl From<RoundError> for ApiError {
    fn from(error: RoundError) -> Self {
        match &error {
            RoundError::PoolNotFound(_) | RoundError::RoundNotFound(_) => {
                Self::NotFound(error.to_string())
            }
            RoundError::InvalidTransition(_) => Self::Conflict(error.to_string()),
            RoundError::Selection(_) => Self::Unprocessable(error.to_string()),
            RoundError::Repository(message) | RoundError::Integration(message) => {
                Self::Internal(message.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use matchbot_core::SelectionError;
    use matchbot_slack::actions::ActionError;
    use matchbot_slack::events::RouterError;

    use crate::rounds::RoundError;

    use super::ApiError;

    #[test]
    fn person_not_found_is_not_a_silent_success() {
        let error =
            ApiError::from(RouterError::PersonNotFound { user_id: "U_STALE".to_owned() });
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn malformed_actions_are_bad_requests() {
        let error = ApiError::from(ActionError::Malformed("no action".to_owned()));
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_excludable_person_maps_to_unprocessable() {
        let error = ApiError::from(RoundError::Selection(
            SelectionError::NoExcludableParticipant { pool: "interns".to_owned() },
        ));
        assert_eq!(error.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(error.to_string().contains("interns"));
    }
}
