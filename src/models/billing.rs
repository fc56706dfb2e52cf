// src/models/billing.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::{
    contracts::{ContractStatus, ContractVehicle},
    costs::Cost,
};

// Extrato de um contrato
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContractStatement {
    pub contract_id: Uuid,
    #[schema(example = 42)]
    pub contract_number: i32,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub status: ContractStatus,

    #[schema(value_type = String, format = Date)]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub end_date: NaiveDate,

    pub rental_days: i64,
    pub daily_rate: Decimal,
    pub vehicles: Vec<ContractVehicle>,
    pub rental_amount: Decimal,

    // Multas e demais custos vinculados ao contrato
    pub charges: Vec<Cost>,
    pub charges_total: Decimal,

    pub deposit: Decimal,
    pub total_due: Decimal,
    pub refund_due: Decimal,
}

/// Linha de contrato usada no faturamento por período.
#[derive(Debug, Clone, FromRow)]
pub struct BillableContract {
    pub contract_id: Uuid,
    pub number: i32,
    pub customer_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub daily_rate: Decimal,
    pub vehicle_count: i64,
    pub status: ContractStatus,
}

/// Cobranças lançadas no período, agrupadas por contrato.
#[derive(Debug, Clone, FromRow)]
pub struct ContractCharges {
    pub contract_id: Uuid,
    pub number: i32,
    pub customer_name: String,
    pub status: ContractStatus,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillingLine {
    pub contract_id: Uuid,
    pub contract_number: i32,
    pub customer_name: String,
    pub status: ContractStatus,
    pub billed_days: i64,
    pub rental_amount: Decimal,
    pub charges_amount: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillingSummary {
    #[schema(value_type = String, format = Date)]
    pub from: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub to: NaiveDate,
    pub lines: Vec<BillingLine>,
    pub rental_total: Decimal,
    pub charges_total: Decimal,
    pub grand_total: Decimal,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PeriodQuery {
    #[param(value_type = String, format = Date)]
    pub from: NaiveDate,
    #[param(value_type = String, format = Date)]
    pub to: NaiveDate,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OptionalPeriodQuery {
    #[param(value_type = Option<String>, format = Date)]
    pub from: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = Date)]
    pub to: Option<NaiveDate>,
}
