// src/handlers/fuel.rs

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
        rbac::{PermFuel, RequirePermission},
        tenancy::TenantContext,
    },
    models::fuel::{ConsumptionReport, FuelLog, FuelLogFilter, FuelLogPayload},
};

// POST /api/fuel-logs
#[utoipa::path(
    post,
    path = "/api/fuel-logs",
    tag = "Fuel",
    request_body = FuelLogPayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    responses(
        (status = 201, description = "Abastecimento registrado com custo automático", body = FuelLog),
        (status = 422, description = "Hodômetro menor que o último abastecimento")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_fuel_log(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermFuel>,
    Json(payload): Json<FuelLogPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let log = app_state
        .fuel_service
        .create_fuel_log(&mut *rls_conn, tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(log)))
}

// GET /api/fuel-logs
#[utoipa::path(
    get,
    path = "/api/fuel-logs",
    tag = "Fuel",
    params(
        FuelLogFilter,
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses((status = 200, description = "Abastecimentos", body = Vec<FuelLog>)),
    security(("api_jwt" = []))
)]
pub async fn list_fuel_logs(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermFuel>,
    Query(filter): Query<FuelLogFilter>,
) -> Result<Json<Vec<FuelLog>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let logs = app_state
        .fuel_service
        .list_fuel_logs(&mut *rls_conn, tenant.0, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(logs))
}

// DELETE /api/fuel-logs/{id}
#[utoipa::path(
    delete,
    path = "/api/fuel-logs/{id}",
    tag = "Fuel",
    params(
        ("id" = Uuid, Path, description = "ID do abastecimento"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses(
        (status = 204, description = "Abastecimento e custo removidos"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_fuel_log(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermFuel>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .fuel_service
        .delete_fuel_log(&mut *rls_conn, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/vehicles/{id}/consumption
#[utoipa::path(
    get,
    path = "/api/vehicles/{id}/consumption",
    tag = "Fuel",
    params(
        ("id" = Uuid, Path, description = "ID do veículo"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses((status = 200, description = "Consumo médio (km/l), litros e gasto", body = ConsumptionReport)),
    security(("api_jwt" = []))
)]
pub async fn vehicle_consumption(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermFuel>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<Json<ConsumptionReport>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let report = app_state
        .fuel_service
        .consumption(&mut *rls_conn, tenant.0, vehicle_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(report))
}
