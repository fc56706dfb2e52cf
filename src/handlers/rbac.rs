// src/handlers/rbac.rs

use axum::Json;

use crate::models::access::{feature_catalog, FeatureCatalogEntry};

// GET /api/permissions (Para o frontend saber o que mostrar na tela de cargos)
#[utoipa::path(
    get,
    path = "/api/permissions",
    tag = "RBAC",
    responses(
        (status = 200, description = "Funcionalidades e cargos que as possuem por padrão", body = Vec<FeatureCatalogEntry>)
    )
)]
pub async fn list_permissions() -> Json<Vec<FeatureCatalogEntry>> {
    Json(feature_catalog())
}
