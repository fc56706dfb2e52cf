// src/handlers/fines.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermFines, RequirePermission},
        tenancy::TenantContext,
    },
    models::fines::{Fine, FineFilter, FinePayload, FineStatistics, FineStatusPayload},
};

// POST /api/fines
#[utoipa::path(
    post,
    path = "/api/fines",
    tag = "Fines",
    request_body = FinePayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    responses(
        (status = 201, description = "Multa registrada, associada ao contrato e com custo lançado", body = Fine),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Veículo ou condutor inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_fine(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermFines>,
    Json(payload): Json<FinePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let fine = app_state
        .fine_service
        .create_fine(&mut *rls_conn, tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(fine)))
}

// GET /api/fines
#[utoipa::path(
    get,
    path = "/api/fines",
    tag = "Fines",
    params(
        FineFilter,
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses((status = 200, description = "Multas filtradas", body = Vec<Fine>)),
    security(("api_jwt" = []))
)]
pub async fn list_fines(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermFines>,
    Query(filter): Query<FineFilter>,
) -> Result<Json<Vec<Fine>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let fines = app_state
        .fine_service
        .list_fines(&mut *rls_conn, tenant.0, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(fines))
}

// GET /api/fines/statistics
#[utoipa::path(
    get,
    path = "/api/fines/statistics",
    tag = "Fines",
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    responses((status = 200, description = "Contagem e valores por status", body = FineStatistics)),
    security(("api_jwt" = []))
)]
pub async fn fines_statistics(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermFines>,
) -> Result<Json<FineStatistics>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let stats = app_state
        .fine_service
        .fines_statistics(&mut *rls_conn, tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(stats))
}

// GET /api/fines/{id}
#[utoipa::path(
    get,
    path = "/api/fines/{id}",
    tag = "Fines",
    params(
        ("id" = Uuid, Path, description = "ID da multa"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses(
        (status = 200, description = "Multa", body = Fine),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_fine(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermFines>,
    Path(id): Path<Uuid>,
) -> Result<Json<Fine>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let fine = app_state
        .fine_service
        .get_fine(&mut *rls_conn, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(fine))
}

// PATCH /api/fines/{id}/status
#[utoipa::path(
    patch,
    path = "/api/fines/{id}/status",
    tag = "Fines",
    request_body = FineStatusPayload,
    params(
        ("id" = Uuid, Path, description = "ID da multa"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses(
        (status = 200, description = "Status alterado", body = Fine),
        (status = 422, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_fine_status(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermFines>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FineStatusPayload>,
) -> Result<Json<Fine>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let fine = app_state
        .fine_service
        .update_status(&mut *rls_conn, tenant.0, id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(fine))
}

// POST /api/fines/{id}/match
#[utoipa::path(
    post,
    path = "/api/fines/{id}/match",
    tag = "Fines",
    params(
        ("id" = Uuid, Path, description = "ID da multa"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses((status = 200, description = "Multa reassociada pelo período dos contratos", body = Fine)),
    security(("api_jwt" = []))
)]
pub async fn rematch_fine(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermFines>,
    Path(id): Path<Uuid>,
) -> Result<Json<Fine>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let fine = app_state
        .fine_service
        .rematch_fine(&mut *rls_conn, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(fine))
}
