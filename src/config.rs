// src/config.rs

use std::{env, time::Duration};

use anyhow::Context;
use axum::extract::FromRef;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        BillingRepository, ContractRepository, CostRepository, CustomerRepository, DashboardRepository,
        EmployeeRepository, FineRepository, FuelRepository, TenantRepository, UserRepository,
        VehicleRepository,
    },
    services::{
        access_service::{AccessCache, AccessService},
        auth::AuthService,
        billing_service::BillingService,
        contract_service::ContractService,
        cost_service::CostService,
        customer_service::CustomerService,
        dashboard_service::DashboardService,
        employee_service::EmployeeService,
        fine_service::FineService,
        fuel_service::FuelService,
        tenancy_service::TenantService,
        vehicle_service::VehicleService,
    },
};

// Variáveis de ambiente lidas na inicialização
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub db_max_connections: u32,
    pub access_cache_ttl: Duration,
    pub jwt_expiration_days: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        Ok(Self {
            database_url,
            jwt_secret,
            server_addr,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 5)?,
            access_cache_ttl: Duration::from_secs(parse_or("ACCESS_CACHE_TTL_SECS", 300)?),
            jwt_expiration_days: parse_or("JWT_EXPIRATION_DAYS", 7)?,
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} com valor inválido: '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Config,
    pub i18n_store: I18nStore,

    pub auth_service: AuthService,
    pub tenant_service: TenantService,
    pub access_service: AccessService,
    pub employee_service: EmployeeService,
    pub vehicle_service: VehicleService,
    pub cost_service: CostService,
    pub fine_service: FineService,
    pub fuel_service: FuelService,
    pub customer_service: CustomerService,
    pub contract_service: ContractService,
    pub billing_service: BillingService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let i18n_store = I18nStore::load()?;

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let tenant_repo = TenantRepository::new();
        let employee_repo = EmployeeRepository::new();
        let vehicle_repo = VehicleRepository::new();
        let cost_repo = CostRepository::new();
        let fine_repo = FineRepository::new();
        let fuel_repo = FuelRepository::new();
        let customer_repo = CustomerRepository::new();
        let contract_repo = ContractRepository::new();
        let billing_repo = BillingRepository::new();
        let dashboard_repo = DashboardRepository::new();

        let auth_service = AuthService::new(
            user_repo.clone(),
            config.jwt_secret.clone(),
            config.jwt_expiration_days,
            db_pool.clone(),
        );
        let tenant_service = TenantService::new(tenant_repo, employee_repo.clone(), db_pool.clone());
        let access_service = AccessService::new(employee_repo.clone(), AccessCache::new(config.access_cache_ttl));
        let employee_service = EmployeeService::new(employee_repo.clone(), user_repo);
        let vehicle_service = VehicleService::new(vehicle_repo.clone(), cost_repo.clone());
        let cost_service = CostService::new(cost_repo.clone(), vehicle_repo.clone(), contract_repo.clone());
        let fine_service = FineService::new(
            fine_repo,
            cost_repo.clone(),
            contract_repo.clone(),
            vehicle_repo.clone(),
            employee_repo.clone(),
        );
        let fuel_service = FuelService::new(fuel_repo, cost_repo.clone(), vehicle_repo.clone(), employee_repo);
        let customer_service = CustomerService::new(customer_repo);
        let contract_service = ContractService::new(contract_repo.clone(), vehicle_repo);
        let billing_service = BillingService::new(billing_repo, contract_repo, cost_repo);
        let dashboard_service = DashboardService::new(dashboard_repo, billing_service.clone());

        Ok(Self {
            db_pool,
            config,
            i18n_store,
            auth_service,
            tenant_service,
            access_service,
            employee_service,
            vehicle_service,
            cost_service,
            fine_service,
            fuel_service,
            customer_service,
            contract_service,
            billing_service,
            dashboard_service,
        })
    }
}

// Permite que os extractors peçam só o catálogo de mensagens
impl FromRef<AppState> for I18nStore {
    fn from_ref(state: &AppState) -> Self {
        state.i18n_store.clone()
    }
}
