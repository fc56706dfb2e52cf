// src/models/customers.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,

    #[schema(ignore)]
    pub tenant_id: Uuid,

    #[schema(example = "Transportes Silva Ltda")]
    pub name: String,

    // CPF ou CNPJ, só dígitos
    #[schema(example = "12345678000199")]
    pub document: String,

    #[schema(example = "contato@silva.com")]
    pub email: Option<String>,
    #[schema(example = "(11) 99999-8888")]
    pub phone: Option<String>,
    pub address: Option<String>,
    #[schema(example = "04512345678")]
    pub driver_license: Option<String>,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Transportes Silva Ltda")]
    pub name: String,

    #[validate(length(min = 11, max = 18, message = "length"))]
    #[schema(example = "12.345.678/0001-99")]
    pub document: String,

    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub driver_license: Option<String>,
    pub notes: Option<String>,
}

/// Documento só com dígitos ("12.345.678/0001-99" -> "12345678000199").
pub fn normalize_document(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_document_punctuation() {
        assert_eq!(normalize_document("123.456.789-09"), "12345678909");
        assert_eq!(normalize_document("12.345.678/0001-99"), "12345678000199");
    }
}
