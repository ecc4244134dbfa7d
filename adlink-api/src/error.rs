use adlink_core::CoreError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    Unauthorized(String),
    Core(CoreError),
    BadRequest(String),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            AppError::Core(err) => {
                let status = match err {
                    CoreError::ValidationError(_) => StatusCode::BAD_REQUEST,
                    CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                    CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
                    CoreError::Conflict(_) | CoreError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
                    CoreError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.code(), err.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, mut message) = self.parts();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal Server Error: {}", message);
            message = "Internal Server Error".to_string();
        }

        let body = Json(json!({
            "error": code,
            "message": message,
            "code": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
