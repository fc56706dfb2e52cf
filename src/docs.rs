// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::get_my_tenants,

        // --- Tenancy ---
        handlers::tenancy::create_tenant,
        handlers::tenancy::list_my_tenants,

        // --- RBAC ---
        handlers::rbac::list_permissions,

        // --- Employees ---
        handlers::employees::list_employees,
        handlers::employees::create_employee,
        handlers::employees::get_employee,
        handlers::employees::update_employee,
        handlers::employees::my_access,

        // --- Vehicles ---
        handlers::vehicles::create_vehicle,
        handlers::vehicles::list_vehicles,
        handlers::vehicles::get_vehicle,
        handlers::vehicles::update_vehicle,
        handlers::vehicles::delete_vehicle,
        handlers::vehicles::update_mileage,
        handlers::vehicles::get_mileage_report,

        // --- Costs ---
        handlers::costs::create_cost,
        handlers::costs::list_costs,
        handlers::costs::cost_summary,
        handlers::costs::get_cost,
        handlers::costs::update_cost,
        handlers::costs::delete_cost,

        // --- Fines ---
        handlers::fines::create_fine,
        handlers::fines::list_fines,
        handlers::fines::fines_statistics,
        handlers::fines::get_fine,
        handlers::fines::update_fine_status,
        handlers::fines::rematch_fine,

        // --- Fuel ---
        handlers::fuel::create_fuel_log,
        handlers::fuel::list_fuel_logs,
        handlers::fuel::delete_fuel_log,
        handlers::fuel::vehicle_consumption,

        // --- Customers ---
        handlers::customers::create_customer,
        handlers::customers::list_customers,
        handlers::customers::get_customer,
        handlers::customers::update_customer,

        // --- Contracts ---
        handlers::contracts::create_contract,
        handlers::contracts::list_contracts,
        handlers::contracts::get_contract,
        handlers::contracts::update_contract_status,
        handlers::contracts::close_contract,

        // --- Billing ---
        handlers::billing::contract_statement,
        handlers::billing::billing_summary,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::UserTenant,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Tenancy ---
            models::tenancy::Tenant,
            handlers::tenancy::CreateTenantPayload,

            // --- Acesso ---
            models::access::Role,
            models::access::Feature,
            models::access::AccessProfile,
            models::access::FeatureCatalogEntry,

            // --- Employees ---
            models::employees::Employee,
            models::employees::EmployeeListEntry,
            models::employees::CreateEmployeePayload,
            models::employees::EmployeeUpdate,

            // --- Vehicles ---
            models::vehicles::VehicleStatus,
            models::vehicles::Vehicle,
            models::vehicles::VehiclePayload,
            models::vehicles::MileagePayload,
            models::vehicles::MileageSource,
            models::vehicles::MileageReport,

            // --- Costs ---
            models::costs::CostCategory,
            models::costs::CostOrigin,
            models::costs::Cost,
            models::costs::CostPayload,
            models::costs::CostUpdate,
            models::costs::CategoryTotal,
            models::costs::VehicleCostTotal,
            models::costs::CostSummary,

            // --- Fines ---
            models::fines::FineStatus,
            models::fines::Fine,
            models::fines::FinePayload,
            models::fines::FineStatusPayload,
            models::fines::FineStatusTotal,
            models::fines::FineStatistics,

            // --- Fuel ---
            models::fuel::FuelType,
            models::fuel::FuelLog,
            models::fuel::FuelLogPayload,
            models::fuel::ConsumptionReport,

            // --- Customers ---
            models::customers::Customer,
            models::customers::CustomerPayload,

            // --- Contracts ---
            models::contracts::ContractStatus,
            models::contracts::Contract,
            models::contracts::ContractVehicle,
            models::contracts::ContractDetail,
            models::contracts::ContractPayload,
            models::contracts::ContractStatusPayload,
            models::contracts::VehicleReturn,
            models::contracts::CloseContractPayload,

            // --- Billing ---
            models::billing::ContractStatement,
            models::billing::BillingLine,
            models::billing::BillingSummary,

            // --- Dashboard ---
            models::dashboard::VehicleStatusCount,
            models::dashboard::DashboardSummary,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário e Perfil"),
        (name = "Tenancy", description = "Gestão de Empresas e Acesso"),
        (name = "RBAC", description = "Catálogo de Funcionalidades e Cargos"),
        (name = "Employees", description = "Funcionários, Cargos e Permissões"),
        (name = "Vehicles", description = "Frota e Quilometragem"),
        (name = "Costs", description = "Custos da Frota"),
        (name = "Fines", description = "Multas e Associação a Contratos"),
        (name = "Fuel", description = "Abastecimentos e Consumo"),
        (name = "Customers", description = "Clientes"),
        (name = "Contracts", description = "Contratos de Locação"),
        (name = "Billing", description = "Extratos e Faturamento"),
        (name = "Dashboard", description = "Indicadores Gerenciais")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme("api_jwt", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_fleet_routes_and_jwt_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/fines/{id}/match"));
        assert!(doc.paths.paths.contains_key("/api/billing/summary"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
        assert!(components.schemas.contains_key("AccessProfile"));
    }
}
