// src/handlers/vehicles.rs

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
        rbac::{PermVehicles, RequirePermission},
        tenancy::TenantContext,
    },
    models::vehicles::{MileagePayload, MileageReport, Vehicle, VehicleFilter, VehiclePayload},
};

// POST /api/vehicles
#[utoipa::path(
    post,
    path = "/api/vehicles",
    tag = "Vehicles",
    request_body = VehiclePayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    responses(
        (status = 201, description = "Veículo cadastrado (com custo de compra, se houver valor)", body = Vehicle),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Placa já cadastrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_vehicle(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermVehicles>,
    Json(payload): Json<VehiclePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let vehicle = app_state
        .vehicle_service
        .create_vehicle(&mut *rls_conn, tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(vehicle)))
}

// GET /api/vehicles
#[utoipa::path(
    get,
    path = "/api/vehicles",
    tag = "Vehicles",
    params(
        VehicleFilter,
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses((status = 200, description = "Veículos da frota", body = Vec<Vehicle>)),
    security(("api_jwt" = []))
)]
pub async fn list_vehicles(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermVehicles>,
    Query(filter): Query<VehicleFilter>,
) -> Result<Json<Vec<Vehicle>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let vehicles = app_state
        .vehicle_service
        .list_vehicles(&mut *rls_conn, tenant.0, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(vehicles))
}

// GET /api/vehicles/{id}
#[utoipa::path(
    get,
    path = "/api/vehicles/{id}",
    tag = "Vehicles",
    params(
        ("id" = Uuid, Path, description = "ID do veículo"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses(
        (status = 200, description = "Veículo", body = Vehicle),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_vehicle(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermVehicles>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vehicle>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let vehicle = app_state
        .vehicle_service
        .get_vehicle(&mut *rls_conn, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(vehicle))
}

// PUT /api/vehicles/{id}
#[utoipa::path(
    put,
    path = "/api/vehicles/{id}",
    tag = "Vehicles",
    request_body = VehiclePayload,
    params(
        ("id" = Uuid, Path, description = "ID do veículo"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses(
        (status = 200, description = "Veículo atualizado", body = Vehicle),
        (status = 422, description = "Quilometragem menor que a atual")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_vehicle(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermVehicles>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VehiclePayload>,
) -> Result<Json<Vehicle>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let vehicle = app_state
        .vehicle_service
        .update_vehicle(&mut *rls_conn, tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(vehicle))
}

// DELETE /api/vehicles/{id} (soft delete: status Inactive)
#[utoipa::path(
    delete,
    path = "/api/vehicles/{id}",
    tag = "Vehicles",
    params(
        ("id" = Uuid, Path, description = "ID do veículo"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses(
        (status = 204, description = "Veículo desativado"),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_vehicle(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermVehicles>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .vehicle_service
        .deactivate_vehicle(&mut *rls_conn, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// PATCH /api/vehicles/{id}/mileage
#[utoipa::path(
    patch,
    path = "/api/vehicles/{id}/mileage",
    tag = "Vehicles",
    request_body = MileagePayload,
    params(
        ("id" = Uuid, Path, description = "ID do veículo"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses(
        (status = 200, description = "Quilometragem atualizada", body = Vehicle),
        (status = 422, description = "Leitura menor que a atual")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_mileage(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermVehicles>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MileagePayload>,
) -> Result<Json<Vehicle>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let vehicle = app_state
        .vehicle_service
        .update_mileage(&mut *rls_conn, tenant.0, id, payload.mileage)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(vehicle))
}

// GET /api/vehicles/{id}/mileage
#[utoipa::path(
    get,
    path = "/api/vehicles/{id}/mileage",
    tag = "Vehicles",
    params(
        ("id" = Uuid, Path, description = "ID do veículo"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses((status = 200, description = "Quilometragem acumulada por fonte", body = MileageReport)),
    security(("api_jwt" = []))
)]
pub async fn get_mileage_report(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermVehicles>,
    Path(id): Path<Uuid>,
) -> Result<Json<MileageReport>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let report = app_state
        .vehicle_service
        .mileage_report(&mut *rls_conn, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(report))
}
