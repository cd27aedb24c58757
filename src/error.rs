use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error response envelope, matching the `{"detail": ...}` wire shape the
/// clients expect.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Response type for the health check endpoint. `db` only appears when the
/// DB-backed check is enabled and passes.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db: Option<String>,
}

/// Custom error type for API endpoints
///
/// Maps each failure class to its HTTP status code and a fixed JSON body.
/// Storage errors are logged in full but never echoed to the client.
#[derive(Debug)]
pub enum ApiError {
    /// Requested id does not exist
    NotFound,
    /// PATCH body contained no fields
    EmptyUpdate,
    /// Database operation error
    DatabaseError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                "Mascota no encontrada".to_string(),
            ),
            ApiError::EmptyUpdate => (
                StatusCode::BAD_REQUEST,
                "No se proporcionaron campos para actualizar".to_string(),
            ),
            ApiError::DatabaseError(err) => {
                tracing::error!("Database error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse { detail });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::DatabaseError(err)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::DatabaseError(err.into())
    }
}
