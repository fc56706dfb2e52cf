// src/db/customer_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::customers::{normalize_document, Customer, CustomerPayload},
};

#[derive(Clone, Default)]
pub struct CustomerRepository;

impl CustomerRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        input: &CustomerPayload,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let document = normalize_document(&input.document);

        sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (tenant_id, name, document, email, phone, address, driver_license, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
            .bind(tenant_id)
            .bind(input.name.trim())
            .bind(&document)
            .bind(input.email.as_deref())
            .bind(input.phone.as_deref())
            .bind(input.address.as_deref())
            .bind(input.driver_license.as_deref())
            .bind(input.notes.as_deref())
            .fetch_one(executor)
            .await
            .map_err(|e| map_unique_violation(e, |_| AppError::UniqueConstraintViolation(format!("documento {}", document))))
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        search: Option<&str>,
    ) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pattern = search.map(|s| format!("%{}%", s.trim()));

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE tenant_id = $1
              AND ($2::text IS NULL OR name ILIKE $2 OR document ILIKE $2)
            ORDER BY name ASC
            "#,
        )
            .bind(tenant_id)
            .bind(pattern)
            .fetch_all(executor)
            .await?;

        Ok(customers)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE tenant_id = $1 AND id = $2",
        )
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(customer)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        input: &CustomerPayload,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let document = normalize_document(&input.document);

        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET
                name = $3, document = $4, email = $5, phone = $6,
                address = $7, driver_license = $8, notes = $9,
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(tenant_id)
            .bind(id)
            .bind(input.name.trim())
            .bind(&document)
            .bind(input.email.as_deref())
            .bind(input.phone.as_deref())
            .bind(input.address.as_deref())
            .bind(input.driver_license.as_deref())
            .bind(input.notes.as_deref())
            .fetch_optional(executor)
            .await
            .map_err(|e| map_unique_violation(e, |_| AppError::UniqueConstraintViolation(format!("documento {}", document))))
    }
}
