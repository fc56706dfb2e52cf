// src/models/contracts.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::costs::validate_positive_amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "contract_status", rename_all = "snake_case")]
pub enum ContractStatus {
    Draft,
    Active,
    Finished,
    Cancelled,
}

impl ContractStatus {
    /// Draft -> Active|Cancelled, Active -> Finished|Cancelled. Finished e Cancelled são finais.
    pub fn can_transition_to(self, next: ContractStatus) -> bool {
        use ContractStatus::*;
        matches!(
            (self, next),
            (Draft, Active) | (Draft, Cancelled) | (Active, Finished) | (Active, Cancelled)
        )
    }

    /// Contratos que ainda prendem o veículo na agenda.
    pub fn holds_vehicles(self) -> bool {
        matches!(self, ContractStatus::Draft | ContractStatus::Active)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: Uuid,

    #[schema(ignore)]
    pub tenant_id: Uuid,

    // Número sequencial por empresa
    #[schema(example = 42)]
    pub number: i32,

    pub customer_id: Uuid,

    #[schema(value_type = String, format = Date, example = "2024-06-01")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2024-06-10")]
    pub end_date: NaiveDate,

    #[schema(example = "120.00")]
    pub daily_rate: Decimal,
    #[schema(example = "500.00")]
    pub deposit: Decimal,

    pub status: ContractStatus,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContractVehicle {
    pub contract_id: Uuid,
    pub vehicle_id: Uuid,
    #[schema(example = "ABC1D23")]
    pub plate: String,
    pub pickup_mileage: Option<i64>,
    pub return_mileage: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContractDetail {
    #[serde(flatten)]
    pub contract: Contract,
    #[schema(example = "Transportes Silva Ltda")]
    pub customer_name: String,
    pub vehicles: Vec<ContractVehicle>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContractPayload {
    pub customer_id: Uuid,
    #[validate(length(min = 1, message = "required"))]
    pub vehicle_ids: Vec<Uuid>,
    #[schema(value_type = String, format = Date, example = "2024-06-01")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2024-06-10")]
    pub end_date: NaiveDate,
    #[validate(custom(function = "validate_positive_amount"))]
    #[schema(example = "120.00")]
    pub daily_rate: Decimal,
    #[validate(custom(function = "validate_deposit"))]
    #[schema(example = "500.00")]
    pub deposit: Option<Decimal>,
    // Draft (padrão) ou Active
    pub status: Option<ContractStatus>,
    pub notes: Option<String>,
}

fn validate_deposit(deposit: &Decimal) -> Result<(), ValidationError> {
    if deposit.is_sign_negative() {
        return Err(ValidationError::new("range"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ContractStatusPayload {
    pub status: ContractStatus,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VehicleReturn {
    pub vehicle_id: Uuid,
    #[schema(example = 46320)]
    pub return_mileage: i64,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CloseContractPayload {
    #[serde(default)]
    pub returns: Vec<VehicleReturn>,
}

/// Janela de um contrato para um veículo: usada para casar multas com contratos.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ContractWindow {
    pub contract_id: Uuid,
    pub customer_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ContractStatus,
}

impl ContractWindow {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Um veículo preso num contrato, vindo da agenda.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Booking {
    pub contract_id: Uuid,
    pub vehicle_id: Uuid,
    pub plate: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ContractStatus,
}

impl Booking {
    /// Rascunho ou ativo, outro contrato, datas se tocando (limites inclusos).
    pub fn blocks(&self, start_date: NaiveDate, end_date: NaiveDate, exclude_contract: Option<Uuid>) -> bool {
        self.status.holds_vehicles()
            && exclude_contract != Some(self.contract_id)
            && ranges_overlap(self.start_date, self.end_date, start_date, end_date)
    }
}

/// Placa (em ordem alfabética) do primeiro veículo que já está reservado no período.
pub fn first_booking_conflict(
    bookings: &[Booking],
    start_date: NaiveDate,
    end_date: NaiveDate,
    exclude_contract: Option<Uuid>,
) -> Option<String> {
    bookings
        .iter()
        .filter(|b| b.blocks(start_date, end_date, exclude_contract))
        .map(|b| b.plate.clone())
        .min()
}

/// Dois intervalos fechados [a_start, a_end] e [b_start, b_end] se sobrepõem?
pub fn ranges_overlap(a_start: NaiveDate, a_end: NaiveDate, b_start: NaiveDate, b_end: NaiveDate) -> bool {
    a_start <= b_end && b_start <= a_end
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ContractFilter {
    pub status: Option<ContractStatus>,
    pub customer_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn status_transitions() {
        use ContractStatus::*;
        assert!(Draft.can_transition_to(Active));
        assert!(Active.can_transition_to(Finished));
        assert!(Active.can_transition_to(Cancelled));
        assert!(!Finished.can_transition_to(Active));
        assert!(!Cancelled.can_transition_to(Draft));
        assert!(!Draft.can_transition_to(Finished));
        assert!(!Active.can_transition_to(Active));
    }

    #[test]
    fn overlap_is_inclusive_on_both_ends() {
        assert!(ranges_overlap(d(2024, 1, 1), d(2024, 1, 10), d(2024, 1, 10), d(2024, 1, 20)));
        assert!(ranges_overlap(d(2024, 1, 5), d(2024, 1, 6), d(2024, 1, 1), d(2024, 1, 31)));
        assert!(!ranges_overlap(d(2024, 1, 1), d(2024, 1, 9), d(2024, 1, 10), d(2024, 1, 20)));
    }

    fn booking(plate: &str, start: NaiveDate, end: NaiveDate, status: ContractStatus) -> Booking {
        Booking {
            contract_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            plate: plate.to_string(),
            start_date: start,
            end_date: end,
            status,
        }
    }

    #[test]
    fn booking_blocks_touching_dates() {
        let b = booking("ABC1D23", d(2024, 6, 10), d(2024, 6, 20), ContractStatus::Active);
        assert!(b.blocks(d(2024, 6, 20), d(2024, 6, 25), None));
        assert!(b.blocks(d(2024, 6, 1), d(2024, 6, 10), None));
        assert!(b.blocks(d(2024, 6, 12), d(2024, 6, 13), None));
        assert!(!b.blocks(d(2024, 6, 21), d(2024, 6, 30), None));
        assert!(!b.blocks(d(2024, 6, 1), d(2024, 6, 9), None));
    }

    #[test]
    fn only_draft_and_active_bookings_block() {
        let (start, end) = (d(2024, 6, 10), d(2024, 6, 20));
        assert!(booking("A", start, end, ContractStatus::Draft).blocks(start, end, None));
        assert!(booking("A", start, end, ContractStatus::Active).blocks(start, end, None));
        assert!(!booking("A", start, end, ContractStatus::Finished).blocks(start, end, None));
        assert!(!booking("A", start, end, ContractStatus::Cancelled).blocks(start, end, None));
    }

    #[test]
    fn contract_does_not_conflict_with_itself() {
        let b = booking("ABC1D23", d(2024, 6, 10), d(2024, 6, 20), ContractStatus::Draft);
        assert!(!b.blocks(d(2024, 6, 10), d(2024, 6, 20), Some(b.contract_id)));
        assert!(b.blocks(d(2024, 6, 10), d(2024, 6, 20), Some(Uuid::new_v4())));
    }

    #[test]
    fn first_conflict_reports_lowest_plate() {
        let bookings = vec![
            booking("XYZ9K88", d(2024, 6, 1), d(2024, 6, 30), ContractStatus::Active),
            booking("ABC1D23", d(2024, 6, 15), d(2024, 6, 16), ContractStatus::Draft),
            booking("AAA0A00", d(2024, 6, 1), d(2024, 6, 30), ContractStatus::Cancelled),
        ];
        assert_eq!(
            first_booking_conflict(&bookings, d(2024, 6, 10), d(2024, 6, 20), None),
            Some("ABC1D23".to_string())
        );
        assert_eq!(first_booking_conflict(&bookings, d(2024, 7, 1), d(2024, 7, 5), None), None);
        assert_eq!(first_booking_conflict(&[], d(2024, 6, 10), d(2024, 6, 20), None), None);
    }

    #[test]
    fn window_covers_its_boundaries() {
        let w = ContractWindow {
            contract_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            start_date: d(2024, 3, 1),
            end_date: d(2024, 3, 5),
            status: ContractStatus::Active,
        };
        assert!(w.covers(d(2024, 3, 1)));
        assert!(w.covers(d(2024, 3, 5)));
        assert!(!w.covers(d(2024, 3, 6)));
        assert!(!w.covers(d(2024, 2, 29)));
    }
}
