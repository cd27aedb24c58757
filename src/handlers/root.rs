use axum::{extract::State, response::Html};

use crate::routes;
use crate::state::AppState;

const FALLBACK_INDEX: &str =
    "<html><body><h1>API Veterinaria</h1><p>Index no encontrado.</p></body></html>";

/// GET / handler - Welcome page
///
/// Serves the local index document so the interactive page works from the
/// same origin. Any read failure falls back to an inline placeholder and is
/// never surfaced to the caller.
#[utoipa::path(
    get,
    path = routes::ROOT,
    responses(
        (status = 200, description = "Welcome document", body = String, content_type = "text/html")
    ),
    tag = "root"
)]
pub async fn root_handler(State(state): State<AppState>) -> Html<String> {
    index_document(&state.config.index_path).await
}

async fn index_document(path: &str) -> Html<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Html(contents),
        Err(err) => {
            tracing::debug!("Serving fallback index ({}): {}", path, err);
            Html(FALLBACK_INDEX.to_string())
        }
    }
}
