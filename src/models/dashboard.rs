// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::models::vehicles::VehicleStatus;

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VehicleStatusCount {
    pub status: VehicleStatus,
    pub count: i64,
}

// Os cards do topo do painel
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_vehicles: i64,
    pub vehicles_by_status: Vec<VehicleStatusCount>,
    pub active_contracts: i64,
    pub pending_fines_count: i64,
    pub pending_fines_amount: Decimal,
    pub month_costs: Decimal,   // Custos lançados no mês corrente
    pub month_revenue: Decimal, // Diárias dos contratos dentro do mês corrente
}
