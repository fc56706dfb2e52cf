// src/services/employee_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{EmployeeRepository, UserRepository},
    models::employees::{CreateEmployeePayload, Employee, EmployeeFilter, EmployeeListEntry, EmployeeUpdate},
};

#[derive(Clone)]
pub struct EmployeeService {
    repo: EmployeeRepository,
    user_repo: UserRepository,
}

impl EmployeeService {
    pub fn new(repo: EmployeeRepository, user_repo: UserRepository) -> Self {
        Self { repo, user_repo }
    }

    /// list_employees_for_admin
    pub async fn list_employees_for_admin<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        filter: &EmployeeFilter,
    ) -> Result<Vec<EmployeeListEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .list_for_admin(executor, tenant_id, filter.role, filter.active)
            .await
    }

    pub async fn create_employee<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payload: &CreateEmployeePayload,
    ) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = self
            .user_repo
            .find_by_email(payload.email.trim())
            .await?
            .ok_or(AppError::UserNotFound)?;

        let full_name = payload
            .full_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&user.full_name);

        self.repo
            .create(
                executor,
                tenant_id,
                user.id,
                full_name,
                payload.phone.as_deref(),
                payload.role,
                &payload.permissions.clone().unwrap_or_default(),
            )
            .await
    }

    pub async fn get_employee<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_by_id(executor, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Funcionário {}", id)))
    }

    /// A empresa nunca fica sem um Admin ativo.
    /// O cache de acesso do usuário é invalidado por quem confirma a transação.
    pub async fn update_employee<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        update: &EmployeeUpdate,
    ) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self
            .repo
            .find_by_id_for_update(&mut *tx, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Funcionário {}", id)))?;

        if update.removes_admin(&current) {
            let admins = self.repo.count_active_admins(&mut *tx, tenant_id).await?;
            if admins <= 1 {
                return Err(AppError::LastAdminProtected);
            }
        }

        let employee = self.repo.update(&mut *tx, tenant_id, id, update).await?;
        tx.commit().await?;

        if update.touches_access() {
            tracing::info!(
                "🔐 Acesso do funcionário {} alterado (cargo {}, ativo {})",
                employee.id,
                employee.role,
                employee.is_active
            );
        }

        Ok(employee)
    }
}
