pub mod access;
pub mod auth;
pub mod billing;
pub mod contracts;
pub mod costs;
pub mod customers;
pub mod dashboard;
pub mod employees;
pub mod fines;
pub mod fuel;
pub mod tenancy;
pub mod vehicles;
