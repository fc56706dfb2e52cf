// src/handlers/contracts.rs

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
        rbac::{PermContracts, RequirePermission},
        tenancy::TenantContext,
    },
    models::contracts::{
        CloseContractPayload, Contract, ContractDetail, ContractFilter, ContractPayload, ContractStatusPayload,
    },
};

// POST /api/contracts
#[utoipa::path(
    post,
    path = "/api/contracts",
    tag = "Contracts",
    request_body = ContractPayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    responses(
        (status = 201, description = "Contrato criado", body = ContractDetail),
        (status = 409, description = "Veículo já reservado no período"),
        (status = 422, description = "Período inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_contract(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermContracts>,
    Json(payload): Json<ContractPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let contract = app_state
        .contract_service
        .create_contract(&mut *rls_conn, tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(contract)))
}

// GET /api/contracts
#[utoipa::path(
    get,
    path = "/api/contracts",
    tag = "Contracts",
    params(
        ContractFilter,
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses((status = 200, description = "Contratos", body = Vec<Contract>)),
    security(("api_jwt" = []))
)]
pub async fn list_contracts(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermContracts>,
    Query(filter): Query<ContractFilter>,
) -> Result<Json<Vec<Contract>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let contracts = app_state
        .contract_service
        .list_contracts(&mut *rls_conn, tenant.0, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(contracts))
}

// GET /api/contracts/{id}
#[utoipa::path(
    get,
    path = "/api/contracts/{id}",
    tag = "Contracts",
    params(
        ("id" = Uuid, Path, description = "ID do contrato"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses(
        (status = 200, description = "Contrato com veículos", body = ContractDetail),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_contract(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermContracts>,
    Path(id): Path<Uuid>,
) -> Result<Json<ContractDetail>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let contract = app_state
        .contract_service
        .get_contract(&mut *rls_conn, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(contract))
}

// PATCH /api/contracts/{id}/status
#[utoipa::path(
    patch,
    path = "/api/contracts/{id}/status",
    tag = "Contracts",
    request_body = ContractStatusPayload,
    params(
        ("id" = Uuid, Path, description = "ID do contrato"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses(
        (status = 200, description = "Status alterado", body = ContractDetail),
        (status = 422, description = "Transição inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_contract_status(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermContracts>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ContractStatusPayload>,
) -> Result<Json<ContractDetail>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let contract = app_state
        .contract_service
        .update_status(&mut *rls_conn, tenant.0, id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(contract))
}

// POST /api/contracts/{id}/close
#[utoipa::path(
    post,
    path = "/api/contracts/{id}/close",
    tag = "Contracts",
    request_body = CloseContractPayload,
    params(
        ("id" = Uuid, Path, description = "ID do contrato"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses(
        (status = 200, description = "Contrato encerrado e veículos devolvidos", body = ContractDetail),
        (status = 422, description = "Hodômetro de devolução menor que o de retirada")
    ),
    security(("api_jwt" = []))
)]
pub async fn close_contract(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermContracts>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CloseContractPayload>,
) -> Result<Json<ContractDetail>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let contract = app_state
        .contract_service
        .close_contract(&mut *rls_conn, tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(contract))
}
