// Route path constants - single source of truth for all API paths

use axum::{
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;

pub const ROOT: &str = "/";
pub const HEALTHZ: &str = "/healthz";
pub const MASCOTAS: &str = "/mascotas/";
pub const MASCOTA_ITEM: &str = "/mascotas/{id}";

/// Assemble the application router.
///
/// CORS is wide open so a locally-served page can call the API during
/// development; restrict the origins before deploying anywhere real.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(ROOT, get(handlers::root_handler))
        .route(HEALTHZ, get(handlers::health_handler))
        .route(
            MASCOTAS,
            get(handlers::list_handler).post(handlers::create_handler),
        )
        .route(
            MASCOTA_ITEM,
            get(handlers::get_handler)
                .put(handlers::put_handler)
                .patch(handlers::patch_handler),
        )
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
