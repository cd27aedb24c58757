use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A persisted pet record. `id` is assigned by Postgres on insert and is
/// never accepted from clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Mascota {
    pub id: i32,
    pub nombre: String,
    pub especie: String,
    pub edad: i32,
}

/// Request body for create (POST) and full replace (PUT). All fields are
/// required; a missing field is rejected at extraction time. An `id` in the
/// body is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MascotaInput {
    pub nombre: String,
    pub especie: String,
    pub edad: i32,
}

/// Request body for partial update (PATCH). A field that is omitted from the
/// body stays `None` and is excluded from the UPDATE statement entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MascotaPatch {
    pub nombre: Option<String>,
    pub especie: Option<String>,
    pub edad: Option<i32>,
}

impl MascotaPatch {
    /// True when the body provided no fields at all.
    pub fn is_empty(&self) -> bool {
        self.nombre.is_none() && self.especie.is_none() && self.edad.is_none()
    }
}
