// src/handlers/billing.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::{
    common::{db_utils::get_rls_connection, error::ApiError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermBilling, RequirePermission},
        tenancy::TenantContext,
    },
    models::billing::{BillingSummary, ContractStatement, PeriodQuery},
};

// GET /api/billing/contracts/{id}
#[utoipa::path(
    get,
    path = "/api/billing/contracts/{id}",
    tag = "Billing",
    params(
        ("id" = Uuid, Path, description = "ID do contrato"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses(
        (status = 200, description = "Extrato: diárias, encargos, caução e saldo", body = ContractStatement),
        (status = 404, description = "Contrato não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn contract_statement(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermBilling>,
    Path(id): Path<Uuid>,
) -> Result<Json<ContractStatement>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let statement = app_state
        .billing_service
        .contract_statement(&mut *rls_conn, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(statement))
}

// GET /api/billing/summary?from=2024-06-01&to=2024-06-30
#[utoipa::path(
    get,
    path = "/api/billing/summary",
    tag = "Billing",
    params(
        PeriodQuery,
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses(
        (status = 200, description = "Faturamento do período por contrato", body = BillingSummary),
        (status = 422, description = "Período inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn billing_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermBilling>,
    Query(period): Query<PeriodQuery>,
) -> Result<Json<BillingSummary>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let summary = app_state
        .billing_service
        .billing_summary(&mut *rls_conn, tenant.0, period.from, period.to)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(summary))
}
