// src/handlers/costs.rs

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
        rbac::{PermCosts, PermReports, RequirePermission},
        tenancy::TenantContext,
    },
    models::{
        billing::OptionalPeriodQuery,
        costs::{Cost, CostFilter, CostPayload, CostSummary, CostUpdate},
    },
};

// POST /api/costs
#[utoipa::path(
    post,
    path = "/api/costs",
    tag = "Costs",
    request_body = CostPayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    responses(
        (status = 201, description = "Custo lançado", body = Cost),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_cost(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermCosts>,
    Json(payload): Json<CostPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let cost = app_state
        .cost_service
        .create_cost(&mut *rls_conn, tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(cost)))
}

// GET /api/costs
#[utoipa::path(
    get,
    path = "/api/costs",
    tag = "Costs",
    params(
        CostFilter,
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses((status = 200, description = "Custos filtrados", body = Vec<Cost>)),
    security(("api_jwt" = []))
)]
pub async fn list_costs(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermCosts>,
    Query(filter): Query<CostFilter>,
) -> Result<Json<Vec<Cost>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let costs = app_state
        .cost_service
        .list_costs(&mut *rls_conn, tenant.0, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(costs))
}

// GET /api/costs/summary
#[utoipa::path(
    get,
    path = "/api/costs/summary",
    tag = "Costs",
    params(
        OptionalPeriodQuery,
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses(
        (status = 200, description = "Totais por categoria e por veículo", body = CostSummary),
        (status = 422, description = "Período inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn cost_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermReports>,
    Query(period): Query<OptionalPeriodQuery>,
) -> Result<Json<CostSummary>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let summary = app_state
        .cost_service
        .cost_summary(&mut *rls_conn, tenant.0, period.from, period.to)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(summary))
}

// GET /api/costs/{id}
#[utoipa::path(
    get,
    path = "/api/costs/{id}",
    tag = "Costs",
    params(
        ("id" = Uuid, Path, description = "ID do custo"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses(
        (status = 200, description = "Custo", body = Cost),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_cost(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermCosts>,
    Path(id): Path<Uuid>,
) -> Result<Json<Cost>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let cost = app_state
        .cost_service
        .get_cost(&mut *rls_conn, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(cost))
}

// PUT /api/costs/{id}
#[utoipa::path(
    put,
    path = "/api/costs/{id}",
    tag = "Costs",
    request_body = CostUpdate,
    params(
        ("id" = Uuid, Path, description = "ID do custo"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses(
        (status = 200, description = "Custo atualizado", body = Cost),
        (status = 422, description = "Campo bloqueado em custo automático")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_cost(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermCosts>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CostUpdate>,
) -> Result<Json<Cost>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let cost = app_state
        .cost_service
        .update_cost(&mut *rls_conn, tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(cost))
}

// DELETE /api/costs/{id}
#[utoipa::path(
    delete,
    path = "/api/costs/{id}",
    tag = "Costs",
    params(
        ("id" = Uuid, Path, description = "ID do custo"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses(
        (status = 204, description = "Custo removido"),
        (status = 422, description = "Custos automáticos não podem ser removidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_cost(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermCosts>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .cost_service
        .delete_cost(&mut *rls_conn, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
