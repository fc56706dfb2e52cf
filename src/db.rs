pub mod user_repo;
pub use user_repo::UserRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod employee_repo;
pub use employee_repo::EmployeeRepository;
pub mod vehicle_repo;
pub use vehicle_repo::VehicleRepository;
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod cost_repo;
pub use cost_repo::CostRepository;
pub mod fine_repo;
pub use fine_repo::FineRepository;
pub mod fuel_repo;
pub use fuel_repo::FuelRepository;
pub mod contract_repo;
pub use contract_repo::ContractRepository;
pub mod billing_repo;
pub use billing_repo::BillingRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
