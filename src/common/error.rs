// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::{
    common::i18n::I18nStore,
    middleware::i18n::Locale,
    models::access::Feature,
};

// Erro de domínio. Os handlers convertem para ApiError (com tradução) na borda HTTP.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Já existe uma empresa com o nome '{0}'")]
    TenantNameAlreadyExists(String),

    #[error("Cabeçalho X-Tenant-ID ausente")]
    MissingTenantHeader,

    #[error("Cabeçalho X-Tenant-ID inválido")]
    InvalidTenantHeader,

    #[error("Sem acesso à empresa")]
    TenantAccessDenied,

    #[error("Permissão '{0}' necessária")]
    PermissionDenied(Feature),

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Usuário já é funcionário desta empresa")]
    EmployeeAlreadyExists,

    #[error("A empresa precisa de pelo menos um administrador ativo")]
    LastAdminProtected,

    #[error("Data final anterior à data inicial")]
    InvalidDateRange,

    #[error("Quilometragem {attempted} menor que a atual ({current})")]
    MileageRegression { current: i64, attempted: i64 },

    #[error("Hodômetro {attempted} menor que o último abastecimento ({previous})")]
    OdometerRegression { previous: i64, attempted: i64 },

    #[error("Custos automáticos não podem ser alterados diretamente")]
    AutomaticCostLocked,

    #[error("Veículo {0} já está reservado no período")]
    VehicleAlreadyBooked(String),

    #[error("Transição de status inválida: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Multa sem cliente não pode ser repassada")]
    FineWithoutCustomer,

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// Corpo de erro que sai pela API.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    /// Status HTTP, chave de tradução e parâmetros de interpolação.
    fn descriptor(&self) -> (StatusCode, &'static str, Vec<(&'static str, String)>) {
        match self {
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "validation_failed", vec![]),
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "email_already_exists", vec![]),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials", vec![]),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", vec![]),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "user_not_found", vec![]),
            AppError::TenantNameAlreadyExists(name) => {
                (StatusCode::CONFLICT, "tenant_name_exists", vec![("name", name.clone())])
            }
            AppError::MissingTenantHeader => (StatusCode::BAD_REQUEST, "tenant_header_missing", vec![]),
            AppError::InvalidTenantHeader => (StatusCode::BAD_REQUEST, "tenant_header_invalid", vec![]),
            AppError::TenantAccessDenied => (StatusCode::FORBIDDEN, "tenant_access_denied", vec![]),
            AppError::PermissionDenied(feature) => (
                StatusCode::FORBIDDEN,
                "permission_denied",
                vec![("permission", feature.as_str().to_string())],
            ),
            AppError::ResourceNotFound(what) => {
                (StatusCode::NOT_FOUND, "resource_not_found", vec![("resource", what.clone())])
            }
            AppError::UniqueConstraintViolation(what) => {
                (StatusCode::CONFLICT, "unique_violation", vec![("detail", what.clone())])
            }
            AppError::EmployeeAlreadyExists => (StatusCode::CONFLICT, "employee_already_exists", vec![]),
            AppError::LastAdminProtected => (StatusCode::UNPROCESSABLE_ENTITY, "last_admin_protected", vec![]),
            AppError::InvalidDateRange => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_date_range", vec![]),
            AppError::MileageRegression { current, attempted } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "mileage_regression",
                vec![("current", current.to_string()), ("attempted", attempted.to_string())],
            ),
            AppError::OdometerRegression { previous, attempted } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "odometer_regression",
                vec![("previous", previous.to_string()), ("attempted", attempted.to_string())],
            ),
            AppError::AutomaticCostLocked => (StatusCode::UNPROCESSABLE_ENTITY, "automatic_cost_locked", vec![]),
            AppError::VehicleAlreadyBooked(plate) => {
                (StatusCode::CONFLICT, "vehicle_already_booked", vec![("plate", plate.clone())])
            }
            AppError::InvalidStatusTransition { from, to } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_status_transition",
                vec![("from", from.clone()), ("to", to.clone())],
            ),
            AppError::FineWithoutCustomer => (StatusCode::UNPROCESSABLE_ENTITY, "fine_without_customer", vec![]),
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", vec![]),
        }
    }

    /// Converte o erro de domínio na resposta HTTP traduzida para o idioma do cliente.
    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let (status, key, params) = self.descriptor();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        let params: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let message = store.translate(&locale.0, key, &params);

        let details = match &self {
            AppError::ValidationError(errors) => {
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| {
                            let code = e.message.as_deref().unwrap_or(e.code.as_ref());
                            store.translate(&locale.0, &format!("validation.{}", code), &[])
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(json!(details))
            }
            _ => None,
        };

        ApiError { status, error: message, details }
    }
}

// Erros de unicidade do Postgres viram conflitos legíveis; o resto segue como DatabaseError.
pub fn map_unique_violation(e: sqlx::Error, on_unique: impl FnOnce(&str) -> AppError) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            return on_unique(&constraint);
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "required"))]
        name: String,
    }

    fn store() -> I18nStore {
        I18nStore::load().expect("locales embutidos devem ser válidos")
    }

    #[test]
    fn maps_business_errors_to_status_codes() {
        let store = store();
        let en = Locale("en".into());

        let err = AppError::MileageRegression { current: 1000, attempted: 900 }.to_api_error(&en, &store);
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.error.contains("900"));
        assert!(err.error.contains("1000"));

        let err = AppError::PermissionDenied(Feature::Fines).to_api_error(&en, &store);
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert!(err.error.contains("fines"));

        let err = AppError::VehicleAlreadyBooked("ABC1D23".into()).to_api_error(&en, &store);
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = AppError::InternalServerError(anyhow::anyhow!("segredo do banco"))
            .to_api_error(&Locale("en".into()), &store());
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.error.contains("segredo"));
    }

    #[test]
    fn validation_errors_carry_translated_details() {
        let errors = Sample { name: String::new() }.validate().unwrap_err();
        let err = AppError::ValidationError(errors).to_api_error(&Locale("pt".into()), &store());

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let details = err.details.expect("detalhes de validação");
        let messages = details["name"].as_array().expect("lista de mensagens");
        assert_eq!(messages[0], "Campo obrigatório.");
    }
}
