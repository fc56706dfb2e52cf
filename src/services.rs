pub mod access_service;
pub mod auth;
pub mod billing_service;
pub mod contract_service;
pub mod cost_service;
pub mod customer_service;
pub mod dashboard_service;
pub mod employee_service;
pub mod fine_service;
pub mod fuel_service;
pub mod tenancy_service;
pub mod vehicle_service;
