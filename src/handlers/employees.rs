// src/handlers/employees.rs

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
        rbac::{CurrentAccess, PermEmployees, RequirePermission},
        tenancy::TenantContext,
    },
    models::{
        access::AccessProfile,
        employees::{CreateEmployeePayload, Employee, EmployeeFilter, EmployeeListEntry, EmployeeUpdate},
    },
};

// GET /api/employees
#[utoipa::path(
    get,
    path = "/api/employees",
    tag = "Employees",
    params(
        EmployeeFilter,
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses(
        (status = 200, description = "Funcionários da empresa com o e-mail do usuário", body = Vec<EmployeeListEntry>),
        (status = 403, description = "Sem a permissão 'employees'")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_employees(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermEmployees>,
    Query(filter): Query<EmployeeFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let employees = app_state
        .employee_service
        .list_employees_for_admin(&mut *rls_conn, tenant.0, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(employees))
}

// POST /api/employees
#[utoipa::path(
    post,
    path = "/api/employees",
    tag = "Employees",
    request_body = CreateEmployeePayload,
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    responses(
        (status = 201, description = "Funcionário vinculado", body = Employee),
        (status = 404, description = "Nenhum usuário com esse e-mail"),
        (status = 409, description = "Usuário já é funcionário")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermEmployees>,
    Json(payload): Json<CreateEmployeePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let employee = app_state
        .employee_service
        .create_employee(&mut *rls_conn, tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    app_state.access_service.invalidate_user(employee.user_id).await;

    Ok((StatusCode::CREATED, Json(employee)))
}

// GET /api/employees/{id}
#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    tag = "Employees",
    params(
        ("id" = Uuid, Path, description = "ID do funcionário"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses(
        (status = 200, description = "Funcionário", body = Employee),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermEmployees>,
    Path(id): Path<Uuid>,
) -> Result<Json<Employee>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let employee = app_state
        .employee_service
        .get_employee(&mut *rls_conn, tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(employee))
}

// PUT /api/employees/{id}
#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    tag = "Employees",
    request_body = EmployeeUpdate,
    params(
        ("id" = Uuid, Path, description = "ID do funcionário"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses(
        (status = 200, description = "Funcionário atualizado", body = Employee),
        (status = 422, description = "Removeria o último administrador ativo")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermEmployees>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EmployeeUpdate>,
) -> Result<Json<Employee>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let employee = app_state
        .employee_service
        .update_employee(&mut *rls_conn, tenant.0, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    rls_conn
        .commit()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;

    // Só depois do commit, senão outra requisição recarrega o valor antigo
    app_state.access_service.invalidate_user(employee.user_id).await;

    Ok(Json(employee))
}

// GET /api/employees/me/access
#[utoipa::path(
    get,
    path = "/api/employees/me/access",
    tag = "Employees",
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    responses(
        (status = 200, description = "Cargo e permissões efetivas do usuário logado", body = AccessProfile)
    ),
    security(("api_jwt" = []))
)]
pub async fn my_access(CurrentAccess(profile): CurrentAccess) -> Json<AccessProfile> {
    Json(profile)
}
