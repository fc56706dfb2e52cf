//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::middleware::{auth::auth_guard, tenancy::tenant_guard};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG sobrescreve o filtro padrão
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env()?;
    let app_state = AppState::new(config).await?;

    // Schema + policies de RLS
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let addr = app_state.config.server_addr.clone();
    let app = build_router(app_state);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(app_state: AppState) -> Router {
    // Rotas públicas
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Só login, sem empresa
    let user_routes = Router::new()
        .route("/users/me", get(handlers::auth::get_me))
        .route("/users/me/tenants", get(handlers::auth::get_my_tenants))
        .route(
            "/tenants",
            post(handlers::tenancy::create_tenant).get(handlers::tenancy::list_my_tenants),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let employee_routes = Router::new()
        .route(
            "/employees",
            get(handlers::employees::list_employees).post(handlers::employees::create_employee),
        )
        .route("/employees/me/access", get(handlers::employees::my_access))
        .route(
            "/employees/{id}",
            get(handlers::employees::get_employee).put(handlers::employees::update_employee),
        );

    let vehicle_routes = Router::new()
        .route(
            "/vehicles",
            get(handlers::vehicles::list_vehicles).post(handlers::vehicles::create_vehicle),
        )
        .route(
            "/vehicles/{id}",
            get(handlers::vehicles::get_vehicle)
                .put(handlers::vehicles::update_vehicle)
                .delete(handlers::vehicles::delete_vehicle),
        )
        .route(
            "/vehicles/{id}/mileage",
            get(handlers::vehicles::get_mileage_report).patch(handlers::vehicles::update_mileage),
        )
        .route("/vehicles/{id}/consumption", get(handlers::fuel::vehicle_consumption));

    let cost_routes = Router::new()
        .route("/costs", get(handlers::costs::list_costs).post(handlers::costs::create_cost))
        .route("/costs/summary", get(handlers::costs::cost_summary))
        .route(
            "/costs/{id}",
            get(handlers::costs::get_cost)
                .put(handlers::costs::update_cost)
                .delete(handlers::costs::delete_cost),
        );

    let fine_routes = Router::new()
        .route("/fines", get(handlers::fines::list_fines).post(handlers::fines::create_fine))
        .route("/fines/statistics", get(handlers::fines::fines_statistics))
        .route("/fines/{id}", get(handlers::fines::get_fine))
        .route("/fines/{id}/status", patch(handlers::fines::update_fine_status))
        .route("/fines/{id}/match", post(handlers::fines::rematch_fine));

    let fuel_routes = Router::new()
        .route(
            "/fuel-logs",
            get(handlers::fuel::list_fuel_logs).post(handlers::fuel::create_fuel_log),
        )
        .route("/fuel-logs/{id}", delete(handlers::fuel::delete_fuel_log));

    let customer_routes = Router::new()
        .route(
            "/customers",
            get(handlers::customers::list_customers).post(handlers::customers::create_customer),
        )
        .route(
            "/customers/{id}",
            get(handlers::customers::get_customer).put(handlers::customers::update_customer),
        );

    let contract_routes = Router::new()
        .route(
            "/contracts",
            get(handlers::contracts::list_contracts).post(handlers::contracts::create_contract),
        )
        .route("/contracts/{id}", get(handlers::contracts::get_contract))
        .route("/contracts/{id}/status", patch(handlers::contracts::update_contract_status))
        .route("/contracts/{id}/close", post(handlers::contracts::close_contract));

    let billing_routes = Router::new()
        .route("/billing/contracts/{id}", get(handlers::billing::contract_statement))
        .route("/billing/summary", get(handlers::billing::billing_summary))
        .route("/dashboard/summary", get(handlers::dashboard::get_summary));

    // Tudo abaixo exige login + X-Tenant-ID + vínculo ativo
    let tenant_routes = Router::new()
        .merge(employee_routes)
        .merge(vehicle_routes)
        .merge(cost_routes)
        .merge(fine_routes)
        .merge(fuel_routes)
        .merge(customer_routes)
        .merge(contract_routes)
        .merge(billing_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/permissions", get(handlers::rbac::list_permissions))
        .nest("/api/auth", auth_routes)
        .nest("/api", user_routes.merge(tenant_routes))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(app_state)
}
