// src/services/customer_service.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::error::AppError,
    db::CustomerRepository,
    models::customers::{normalize_document, Customer, CustomerPayload},
};

#[derive(Clone)]
pub struct CustomerService {
    repo: CustomerRepository,
}

impl CustomerService {
    pub fn new(repo: CustomerRepository) -> Self {
        Self { repo }
    }

    pub async fn create_customer<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payload: &CustomerPayload,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        check_document(&payload.document)?;
        self.repo.create(executor, tenant_id, payload).await
    }

    pub async fn list_customers<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list(executor, tenant_id, search).await
    }

    pub async fn get_customer<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_by_id(executor, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Cliente {}", id)))
    }

    pub async fn update_customer<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        payload: &CustomerPayload,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        check_document(&payload.document)?;
        self.repo
            .update(executor, tenant_id, id, payload)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Cliente {}", id)))
    }
}

// CPF tem 11 dígitos, CNPJ 14
fn check_document(raw: &str) -> Result<(), AppError> {
    match normalize_document(raw).len() {
        11 | 14 => Ok(()),
        _ => {
            let mut errors = ValidationErrors::new();
            errors.add("document", ValidationError::new("length"));
            Err(AppError::ValidationError(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_cpf_and_cnpj_only() {
        assert!(check_document("123.456.789-09").is_ok());
        assert!(check_document("12.345.678/0001-99").is_ok());
        assert!(matches!(check_document("123.456.789"), Err(AppError::ValidationError(_))));
        assert!(check_document("1234567890123").is_err());
    }
}
