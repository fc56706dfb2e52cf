// src/models/fines.rs

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::costs::validate_positive_amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "fine_status", rename_all = "snake_case")]
pub enum FineStatus {
    Pending,
    Paid,
    Appealed,
    Cancelled,
    ChargedToCustomer,
}

impl FineStatus {
    /// Cancelada é final; as demais podem circular entre si, exceto paga -> cancelada.
    pub fn can_transition_to(self, next: FineStatus) -> bool {
        self != FineStatus::Cancelled
            && self != next
            && !(self == FineStatus::Paid && next == FineStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Fine {
    pub id: Uuid,

    #[schema(ignore)]
    pub tenant_id: Uuid,

    pub vehicle_id: Uuid,
    pub contract_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub cost_id: Option<Uuid>,

    #[schema(value_type = String, format = Date, example = "2024-06-03")]
    pub infraction_date: NaiveDate,
    #[schema(value_type = Option<String>, example = "14:35:00")]
    pub infraction_time: Option<NaiveTime>,

    #[schema(example = "7455-0")]
    pub infraction_code: Option<String>,
    #[schema(example = "Transitar em velocidade superior à máxima permitida em até 20%")]
    pub description: String,
    #[schema(example = "Av. Paulista, 1000 - São Paulo")]
    pub location: Option<String>,

    #[schema(example = "130.16")]
    pub amount: Decimal,
    #[schema(example = 4)]
    pub points: i32,

    #[schema(value_type = Option<String>, format = Date, example = "2024-07-15")]
    pub due_date: Option<NaiveDate>,

    pub status: FineStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinePayload {
    pub vehicle_id: Uuid,
    // Informado explicitamente, o contrato não é recalculado
    pub contract_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    #[schema(value_type = String, format = Date, example = "2024-06-03")]
    pub infraction_date: NaiveDate,
    #[schema(value_type = Option<String>, example = "14:35:00")]
    pub infraction_time: Option<NaiveTime>,
    #[schema(example = "7455-0")]
    pub infraction_code: Option<String>,
    #[validate(length(min = 1, message = "required"))]
    pub description: String,
    pub location: Option<String>,
    #[validate(custom(function = "validate_positive_amount"))]
    #[schema(example = "130.16")]
    pub amount: Decimal,
    #[validate(range(min = 0, max = 40, message = "invalid_points"))]
    #[serde(default)]
    pub points: i32,
    #[schema(value_type = Option<String>, format = Date)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FineStatusPayload {
    pub status: FineStatus,
}

#[derive(Debug, Clone)]
pub struct NewFine {
    pub vehicle_id: Uuid,
    pub contract_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub infraction_date: NaiveDate,
    pub infraction_time: Option<NaiveTime>,
    pub infraction_code: Option<String>,
    pub description: String,
    pub location: Option<String>,
    pub amount: Decimal,
    pub points: i32,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FineFilter {
    pub status: Option<FineStatus>,
    pub vehicle_id: Option<Uuid>,
    pub contract_id: Option<Uuid>,
}

// --- Estatísticas (fn_fines_statistics) ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FineStatusTotal {
    pub status: FineStatus,
    pub count: i64,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FineStatistics {
    pub by_status: Vec<FineStatusTotal>,
    pub total_count: i64,
    pub total_amount: Decimal,
    pub overdue_pending_count: i64,
    pub total_points: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_fines_are_final() {
        assert!(!FineStatus::Cancelled.can_transition_to(FineStatus::Pending));
        assert!(FineStatus::Pending.can_transition_to(FineStatus::Appealed));
        assert!(FineStatus::Appealed.can_transition_to(FineStatus::Pending));
        assert!(!FineStatus::Paid.can_transition_to(FineStatus::Paid));
    }

    #[test]
    fn paid_fines_cannot_be_cancelled() {
        assert!(!FineStatus::Paid.can_transition_to(FineStatus::Cancelled));
        assert!(FineStatus::Paid.can_transition_to(FineStatus::Appealed));
        assert!(FineStatus::Pending.can_transition_to(FineStatus::Cancelled));
    }
}
