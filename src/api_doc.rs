use utoipa::OpenApi;

use crate::error::{ErrorResponse, HealthResponse};
use crate::handlers;
use crate::models::{Mascota, MascotaInput, MascotaPatch};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "API Veterinaria",
        version = "1.0.0",
        description = "Record management for pets, backed by PostgreSQL"
    ),
    paths(
        handlers::root::root_handler,
        handlers::health::health_handler,
        handlers::create::create_handler,
        handlers::list::list_handler,
        handlers::get::get_handler,
        handlers::put::put_handler,
        handlers::patch::patch_handler
    ),
    components(
        schemas(
            Mascota,
            MascotaInput,
            MascotaPatch,
            ErrorResponse,
            HealthResponse
        )
    ),
    tags(
        (name = "root", description = "Welcome page"),
        (name = "health", description = "Health check operations"),
        (name = "mascotas", description = "Pet record operations")
    )
)]
pub struct ApiDoc;
