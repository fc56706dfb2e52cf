// src/db/tenancy_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{auth::UserTenant, tenancy::Tenant},
};

#[derive(Clone, Default)]
pub struct TenantRepository;

impl TenantRepository {
    pub fn new() -> Self {
        Self
    }

    /// O dono já tem uma empresa com esse nome?
    pub async fn owner_has_tenant_with_name<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        name: &str,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM tenants
                WHERE owner_id = $1 AND lower(name) = lower($2)
            )
            "#,
        )
            .bind(owner_id)
            .bind(name)
            .fetch_one(executor)
            .await?;

        Ok(exists)
    }

    pub async fn create_tenant<'e, E>(
        &self,
        executor: E,
        name: &str,
        description: Option<&str>,
        owner_id: Uuid,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (name, description, owner_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
            .bind(name)
            .bind(description)
            .bind(owner_id)
            .fetch_one(executor)
            .await?;

        Ok(tenant)
    }

    /// Empresas em que o usuário tem registro de funcionário.
    pub async fn get_tenants_for_user<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
    ) -> Result<Vec<UserTenant>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenants = sqlx::query_as::<_, UserTenant>(
            r#"
            SELECT t.id AS tenant_id, t.name AS tenant_name,
                   e.id AS employee_id, e.role, e.is_active
            FROM employees e
            JOIN tenants t ON t.id = e.tenant_id
            WHERE e.user_id = $1
            ORDER BY t.name ASC
            "#,
        )
            .bind(user_id)
            .fetch_all(executor)
            .await?;

        Ok(tenants)
    }
}
