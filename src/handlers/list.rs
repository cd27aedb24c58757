use crate::error::{ApiError, ErrorResponse};
use crate::models::Mascota;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};

/// GET /mascotas/ handler - List all pets
///
/// Returns every row, in whatever order Postgres yields them.
#[utoipa::path(
    get,
    path = "/mascotas/",
    responses(
        (status = 200, description = "All pets", body = Vec<Mascota>),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "mascotas"
)]
pub async fn list_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Vec<Mascota>>), ApiError> {
    let mascotas = state.db.list().await?;

    tracing::debug!("Listed {} mascotas", mascotas.len());
    Ok((StatusCode::OK, Json(mascotas)))
}
