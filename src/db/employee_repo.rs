// src/db/employee_repo.rs

use sqlx::{types::Json, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::{
        access::{PermissionMap, Role},
        employees::{Employee, EmployeeListEntry, EmployeeUpdate},
    },
};

#[derive(Clone, Default)]
pub struct EmployeeRepository;

impl EmployeeRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        user_id: Uuid,
        full_name: &str,
        phone: Option<&str>,
        role: Role,
        permissions: &PermissionMap,
    ) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Employee>(
            r#"
            INSERT INTO employees (tenant_id, user_id, full_name, phone, role, permissions)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
            .bind(tenant_id)
            .bind(user_id)
            .bind(full_name)
            .bind(phone)
            .bind(role)
            .bind(Json(permissions))
            .fetch_one(executor)
            .await
            .map_err(|e| map_unique_violation(e, |_| AppError::EmployeeAlreadyExists))
    }

    pub async fn find_by_user<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employee = sqlx::query_as::<_, Employee>(
            "SELECT * FROM employees WHERE tenant_id = $1 AND user_id = $2",
        )
            .bind(tenant_id)
            .bind(user_id)
            .fetch_optional(executor)
            .await?;

        Ok(employee)
    }

    /// Busca com `FOR UPDATE` para serializar alterações de cargo.
    pub async fn find_by_id_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employee = sqlx::query_as::<_, Employee>(
            "SELECT * FROM employees WHERE tenant_id = $1 AND id = $2 FOR UPDATE",
        )
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(employee)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employee = sqlx::query_as::<_, Employee>(
            "SELECT * FROM employees WHERE tenant_id = $1 AND id = $2",
        )
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(employee)
    }

    // list_employees_for_admin
    pub async fn list_for_admin<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        role: Option<Role>,
        active: Option<bool>,
    ) -> Result<Vec<EmployeeListEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employees = sqlx::query_as::<_, EmployeeListEntry>(
            r#"
            SELECT e.id, e.user_id, u.email, e.full_name, e.phone,
                   e.role, e.permissions, e.is_active, e.created_at
            FROM employees e
            JOIN users u ON u.id = e.user_id
            WHERE e.tenant_id = $1
              AND ($2::employee_role IS NULL OR e.role = $2)
              AND ($3::boolean IS NULL OR e.is_active = $3)
            ORDER BY e.full_name ASC
            "#,
        )
            .bind(tenant_id)
            .bind(role)
            .bind(active)
            .fetch_all(executor)
            .await?;

        Ok(employees)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        input: &EmployeeUpdate,
    ) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            UPDATE employees SET
                full_name = COALESCE($3, full_name),
                phone = COALESCE($4, phone),
                role = COALESCE($5, role),
                permissions = COALESCE($6, permissions),
                is_active = COALESCE($7, is_active),
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
            .bind(tenant_id)
            .bind(id)
            .bind(input.full_name.as_deref())
            .bind(input.phone.as_deref())
            .bind(input.role)
            .bind(input.permissions.as_ref().map(Json))
            .bind(input.is_active)
            .fetch_one(executor)
            .await?;

        Ok(employee)
    }

    /// Trava os admins ativos até o fim da transação enquanto conta.
    pub async fn count_active_admins<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM (
                SELECT id FROM employees
                WHERE tenant_id = $1 AND role = 'admin' AND is_active = true
                FOR UPDATE
            ) admins
            "#,
        )
            .bind(tenant_id)
            .fetch_one(executor)
            .await?;

        Ok(count)
    }
}
