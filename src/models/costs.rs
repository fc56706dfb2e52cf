// src/models/costs.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "cost_category", rename_all = "snake_case")]
pub enum CostCategory {
    Fine,
    Repair,
    Maintenance,
    Fuel,
    Purchase,
    Insurance,
    Tax,
    Cleaning,
    Other,
}

// Manual = lançado por alguém; Automatic = gerado por multa, abastecimento ou compra
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "cost_origin", rename_all = "snake_case")]
pub enum CostOrigin {
    Manual,
    Automatic,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cost {
    pub id: Uuid,

    #[schema(ignore)]
    pub tenant_id: Uuid,

    pub vehicle_id: Option<Uuid>,
    pub contract_id: Option<Uuid>,

    pub category: CostCategory,

    #[schema(example = "Troca de pastilhas de freio")]
    pub description: String,

    #[schema(example = "450.00")]
    pub amount: Decimal,

    #[schema(value_type = String, format = Date, example = "2024-05-10")]
    pub cost_date: NaiveDate,

    pub origin: CostOrigin,

    // ID da multa / abastecimento / veículo que gerou o custo automático
    pub source_id: Option<Uuid>,

    pub is_paid: bool,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Lançamento manual vindo da API
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostPayload {
    pub vehicle_id: Option<Uuid>,
    pub contract_id: Option<Uuid>,
    pub category: CostCategory,
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Troca de pastilhas de freio")]
    pub description: String,
    #[validate(custom(function = "validate_positive_amount"))]
    #[schema(example = "450.00")]
    pub amount: Decimal,
    #[schema(value_type = String, format = Date, example = "2024-05-10")]
    pub cost_date: NaiveDate,
    #[serde(default)]
    pub is_paid: bool,
    pub notes: Option<String>,
}

impl From<&CostPayload> for NewCost {
    fn from(payload: &CostPayload) -> Self {
        NewCost {
            vehicle_id: payload.vehicle_id,
            contract_id: payload.contract_id,
            category: payload.category,
            description: payload.description.trim().to_string(),
            amount: payload.amount,
            cost_date: payload.cost_date,
            origin: CostOrigin::Manual,
            source_id: None,
            is_paid: payload.is_paid,
            notes: payload.notes.clone(),
        }
    }
}

/// Valores monetários precisam ser maiores que zero.
pub fn validate_positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount > Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("must_be_positive"))
    }
}

/// Dados de um custo novo (manual ou automático).
#[derive(Debug, Clone)]
pub struct NewCost {
    pub vehicle_id: Option<Uuid>,
    pub contract_id: Option<Uuid>,
    pub category: CostCategory,
    pub description: String,
    pub amount: Decimal,
    pub cost_date: NaiveDate,
    pub origin: CostOrigin,
    pub source_id: Option<Uuid>,
    pub is_paid: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostUpdate {
    pub vehicle_id: Option<Uuid>,
    pub contract_id: Option<Uuid>,
    pub category: Option<CostCategory>,
    pub description: Option<String>,
    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Option<Decimal>,
    #[schema(value_type = Option<String>, format = Date)]
    pub cost_date: Option<NaiveDate>,
    pub is_paid: Option<bool>,
    pub notes: Option<String>,
}

impl CostUpdate {
    /// Campos que definem o valor/vínculo do custo; em custos automáticos eles vêm da origem.
    pub fn touches_locked_fields(&self) -> bool {
        self.vehicle_id.is_some()
            || self.contract_id.is_some()
            || self.category.is_some()
            || self.amount.is_some()
            || self.cost_date.is_some()
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CostFilter {
    pub vehicle_id: Option<Uuid>,
    pub contract_id: Option<Uuid>,
    pub category: Option<CostCategory>,
    #[param(value_type = Option<String>, format = Date)]
    pub from: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = Date)]
    pub to: Option<NaiveDate>,
}

// --- Resumo ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: CostCategory,
    pub count: i64,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VehicleCostTotal {
    pub vehicle_id: Uuid,
    #[schema(example = "ABC1D23")]
    pub plate: String,
    pub count: i64,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostSummary {
    #[schema(value_type = Option<String>, format = Date)]
    pub from: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub to: Option<NaiveDate>,
    pub by_category: Vec<CategoryTotal>,
    pub by_vehicle: Vec<VehicleCostTotal>,
    pub grand_total: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paid_flag_and_notes_are_not_locked() {
        let update = CostUpdate { is_paid: Some(true), notes: Some("pago via PIX".into()), ..Default::default() };
        assert!(!update.touches_locked_fields());

        let update = CostUpdate { amount: Some(Decimal::ONE), ..Default::default() };
        assert!(update.touches_locked_fields());
    }

    #[test]
    fn amounts_must_be_positive() {
        assert!(validate_positive_amount(&Decimal::new(1, 2)).is_ok());
        assert!(validate_positive_amount(&Decimal::ZERO).is_err());
        assert!(validate_positive_amount(&Decimal::new(-500, 2)).is_err());

        let update = CostUpdate { amount: Some(Decimal::ZERO), ..Default::default() };
        assert!(update.validate().is_err());
        assert!(CostUpdate::default().validate().is_ok());
    }
}
