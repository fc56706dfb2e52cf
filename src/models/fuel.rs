// src/models/fuel.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::costs::validate_positive_amount;

// NUMERIC(10, 3): até 9.999.999,999
const MAX_FUEL_QUANTITY: Decimal = Decimal::from_parts(10_000_000, 0, 0, false, 0);

/// Litros e preço por litro: positivos e dentro da precisão da coluna.
pub fn validate_fuel_quantity(value: &Decimal) -> Result<(), ValidationError> {
    validate_positive_amount(value)?;
    if *value >= MAX_FUEL_QUANTITY {
        return Err(ValidationError::new("range"));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "fuel_type", rename_all = "snake_case")]
pub enum FuelType {
    Gasoline,
    Ethanol,
    Diesel,
    Cng,
    Electric,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FuelLog {
    pub id: Uuid,

    #[schema(ignore)]
    pub tenant_id: Uuid,

    pub vehicle_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub cost_id: Option<Uuid>,

    #[schema(value_type = String, format = Date, example = "2024-05-02")]
    pub fuel_date: NaiveDate,

    #[schema(example = "42.350")]
    pub liters: Decimal,
    #[schema(example = "5.890")]
    pub price_per_liter: Decimal,
    #[schema(example = "249.44")]
    pub total_amount: Decimal,

    #[schema(example = 45210)]
    pub odometer: i64,

    #[schema(example = "Posto Shell - Rod. Anhanguera")]
    pub station: Option<String>,
    pub fuel_type: FuelType,
    pub full_tank: bool,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FuelLogPayload {
    pub vehicle_id: Uuid,
    pub driver_id: Option<Uuid>,
    #[schema(value_type = String, format = Date, example = "2024-05-02")]
    pub fuel_date: NaiveDate,
    #[validate(custom(function = "validate_fuel_quantity"))]
    #[schema(example = "42.350")]
    pub liters: Decimal,
    #[validate(custom(function = "validate_fuel_quantity"))]
    #[schema(example = "5.890")]
    pub price_per_liter: Decimal,
    #[validate(range(min = 0, message = "range"))]
    #[schema(example = 45210)]
    pub odometer: i64,
    pub station: Option<String>,
    pub fuel_type: FuelType,
    #[serde(default = "default_full_tank")]
    pub full_tank: bool,
}

fn default_full_tank() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct NewFuelLog {
    pub vehicle_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub fuel_date: NaiveDate,
    pub liters: Decimal,
    pub price_per_liter: Decimal,
    pub total_amount: Decimal,
    pub odometer: i64,
    pub station: Option<String>,
    pub fuel_type: FuelType,
    pub full_tank: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FuelLogFilter {
    pub vehicle_id: Option<Uuid>,
    #[param(value_type = Option<String>, format = Date)]
    pub from: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = Date)]
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionReport {
    pub vehicle_id: Uuid,
    pub log_count: usize,
    pub total_liters: Decimal,
    pub total_spent: Decimal,
    // km percorridos entre o primeiro e o último abastecimento considerados
    pub distance_km: i64,
    // None quando não há pares de abastecimentos para comparar
    #[schema(example = "11.42")]
    pub average_km_per_liter: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(liters: Decimal, price: Decimal) -> FuelLogPayload {
        FuelLogPayload {
            vehicle_id: Uuid::new_v4(),
            driver_id: None,
            fuel_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            liters,
            price_per_liter: price,
            odometer: 45_210,
            station: None,
            fuel_type: FuelType::Diesel,
            full_tank: true,
        }
    }

    #[test]
    fn quantities_must_fit_the_column() {
        assert!(payload(Decimal::new(42_350, 3), Decimal::new(5_890, 3)).validate().is_ok());
        assert!(payload(Decimal::new(9_999_999_999, 3), Decimal::ONE).validate().is_ok());

        let errors = payload(Decimal::from(10_000_000), Decimal::ONE).validate().unwrap_err();
        assert_eq!(errors.field_errors()["liters"][0].code, "range");

        let huge = Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0);
        let errors = payload(huge, huge).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("liters"));
        assert!(errors.field_errors().contains_key("price_per_liter"));

        let errors = payload(Decimal::ZERO, Decimal::ONE).validate().unwrap_err();
        assert_eq!(errors.field_errors()["liters"][0].code, "must_be_positive");
    }
}
