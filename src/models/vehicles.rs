// src/models/vehicles.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "vehicle_status", rename_all = "snake_case")]
pub enum VehicleStatus {
    Available,
    Rented,
    Maintenance,
    Inactive,
    Sold,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Uuid,

    #[schema(ignore)]
    pub tenant_id: Uuid,

    #[schema(example = "ABC1D23")]
    pub plate: String,
    #[schema(example = "Volkswagen")]
    pub brand: String,
    #[schema(example = "Gol 1.0")]
    pub model: String,
    #[schema(example = 2022)]
    pub year: i32,
    #[schema(example = "Prata")]
    pub color: Option<String>,
    pub renavam: Option<String>,
    pub chassis: Option<String>,

    pub status: VehicleStatus,

    #[schema(example = 45210)]
    pub current_mileage: i64,

    #[schema(value_type = Option<String>, format = Date, example = "2023-03-15")]
    pub acquisition_date: Option<NaiveDate>,
    #[schema(example = "68900.00")]
    pub acquisition_value: Option<Decimal>,

    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Cadastro/edição de veículo. A placa é normalizada antes de gravar.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePayload {
    #[validate(custom(function = "validate_plate"))]
    #[schema(example = "ABC-1D23")]
    pub plate: String,
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Volkswagen")]
    pub brand: String,
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Gol 1.0")]
    pub model: String,
    #[validate(range(min = 1950, max = 2100, message = "invalid_year"))]
    #[schema(example = 2022)]
    pub year: i32,
    pub color: Option<String>,
    pub renavam: Option<String>,
    pub chassis: Option<String>,
    pub status: Option<VehicleStatus>,
    #[validate(range(min = 0, message = "range"))]
    pub current_mileage: Option<i64>,
    #[schema(value_type = Option<String>, format = Date)]
    pub acquisition_date: Option<NaiveDate>,
    pub acquisition_value: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MileagePayload {
    #[schema(example = 46000)]
    pub mileage: i64,
}

// Filtros de listagem (?status=Available&search=gol)
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VehicleFilter {
    pub status: Option<VehicleStatus>,
    /// Busca por placa ou modelo
    pub search: Option<String>,
}

impl VehicleFilter {
    /// Padrões ILIKE da busca: (texto livre, placa normalizada).
    pub fn search_patterns(&self) -> Option<(String, String)> {
        let term = self.search.as_deref()?.trim();
        let text = format!("%{}%", escape_like(term));
        let plate = match normalize_plate(term) {
            p if p.is_empty() => text.clone(),
            p => format!("%{}%", escape_like(&p)),
        };
        Some((text, plate))
    }
}

/// Escapa os curingas do LIKE (`\` é o escape padrão do Postgres).
pub fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Placa sem espaços/hífens e em maiúsculas ("abc-1d23" -> "ABC1D23").
pub fn normalize_plate(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Placa antiga (AAA9999) ou Mercosul (AAA9A99), já normalizada.
pub fn is_valid_plate(plate: &str) -> bool {
    let bytes = plate.as_bytes();
    bytes.len() == 7
        && bytes[..3].iter().all(u8::is_ascii_uppercase)
        && bytes[3].is_ascii_digit()
        && bytes[4].is_ascii_alphanumeric()
        && bytes[5..].iter().all(u8::is_ascii_digit)
}

fn validate_plate(raw: &str) -> Result<(), ValidationError> {
    if is_valid_plate(&normalize_plate(raw)) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_plate"))
    }
}

// --- Quilometragem acumulada ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MileageSource {
    Registry,
    FuelLog,
    Contract,
}

/// Leituras conhecidas de um veículo, vindas de fontes diferentes.
#[derive(Debug, Clone, Default, FromRow)]
pub struct MileageSources {
    pub registry: i64,
    pub fuel_log: Option<i64>,
    pub contract: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MileageReport {
    pub vehicle_id: Uuid,
    pub registry_mileage: i64,
    pub fuel_log_mileage: Option<i64>,
    pub contract_mileage: Option<i64>,
    pub effective_mileage: i64,
    pub source: MileageSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_plates() {
        assert_eq!(normalize_plate("abc-1d23"), "ABC1D23");
        assert_eq!(normalize_plate(" xyz 9876 "), "XYZ9876");
    }

    #[test]
    fn search_escapes_wildcards() {
        assert_eq!(escape_like("100%_off"), "100\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");

        let filter = VehicleFilter { status: None, search: Some("50%".into()) };
        let (text, _) = filter.search_patterns().unwrap();
        assert_eq!(text, "%50\\%%");
    }

    #[test]
    fn search_matches_formatted_plates() {
        let filter = VehicleFilter { status: None, search: Some(" abc-1d23 ".into()) };
        let (text, plate) = filter.search_patterns().unwrap();
        assert_eq!(text, "%abc-1d23%");
        assert_eq!(plate, "%ABC1D23%");

        let filter = VehicleFilter { status: None, search: Some("-".into()) };
        let (text, plate) = filter.search_patterns().unwrap();
        assert_eq!(plate, text);

        assert!(VehicleFilter::default().search_patterns().is_none());
    }

    #[test]
    fn validates_old_and_mercosul_plates() {
        assert!(is_valid_plate("XYZ9876"));
        assert!(is_valid_plate("ABC1D23"));
        assert!(!is_valid_plate("AB12345"));
        assert!(!is_valid_plate("ABC1D2"));
        assert!(!is_valid_plate("ABC1DD3"));
    }

    #[test]
    fn payload_accepts_formatted_plates() {
        let mut payload = VehiclePayload {
            plate: "abc-1d23".into(),
            brand: "Fiat".into(),
            model: "Uno".into(),
            year: 2020,
            color: None,
            renavam: None,
            chassis: None,
            status: None,
            current_mileage: None,
            acquisition_date: None,
            acquisition_value: None,
            notes: None,
        };
        assert!(payload.validate().is_ok());

        payload.plate = "12-ABCD".into();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("plate"));
    }
}
