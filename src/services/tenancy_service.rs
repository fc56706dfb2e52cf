// src/services/tenancy_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{begin_rls, set_tenant},
        error::AppError,
    },
    db::{EmployeeRepository, TenantRepository},
    models::{
        access::{PermissionMap, Role},
        auth::{User, UserTenant},
        tenancy::Tenant,
    },
};

#[derive(Clone)]
pub struct TenantService {
    tenant_repo: TenantRepository,
    employee_repo: EmployeeRepository,
    pool: PgPool,
}

impl TenantService {
    pub fn new(tenant_repo: TenantRepository, employee_repo: EmployeeRepository, pool: PgPool) -> Self {
        Self { tenant_repo, employee_repo, pool }
    }

    /// Cria a empresa e, na mesma transação, o registro de Admin de quem a criou.
    pub async fn create_tenant_with_owner(
        &self,
        name: &str,
        description: Option<&str>,
        owner: &User,
    ) -> Result<Tenant, AppError> {
        let name = name.trim();
        let mut tx = begin_rls(&self.pool, None, owner.id).await?;

        if self.tenant_repo.owner_has_tenant_with_name(&mut *tx, owner.id, name).await? {
            return Err(AppError::TenantNameAlreadyExists(name.to_string()));
        }

        let tenant = self
            .tenant_repo
            .create_tenant(&mut *tx, name, description, owner.id)
            .await?;

        // A partir daqui as policies enxergam a empresa nova
        set_tenant(&mut tx, tenant.id).await?;

        self.employee_repo
            .create(
                &mut *tx,
                tenant.id,
                owner.id,
                &owner.full_name,
                None,
                Role::Admin,
                &PermissionMap::new(),
            )
            .await?;

        tx.commit().await?;

        tracing::info!("🏢 Empresa '{}' criada por {}", tenant.name, owner.id);
        Ok(tenant)
    }

    pub async fn list_user_tenants(&self, user_id: Uuid) -> Result<Vec<UserTenant>, AppError> {
        let mut tx = begin_rls(&self.pool, None, user_id).await?;
        self.tenant_repo.get_tenants_for_user(&mut *tx, user_id).await
    }
}
