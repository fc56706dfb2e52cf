// src/models/employees.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::access::{derive_permissions, AccessProfile, PermissionMap, Role};

// Registro de funcionário: liga um usuário a uma empresa com cargo e permissões
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,

    #[schema(ignore)]
    pub tenant_id: Uuid,

    pub user_id: Uuid,

    #[schema(example = "Maria Souza")]
    pub full_name: String,

    #[schema(example = "(11) 98888-7777")]
    pub phone: Option<String>,

    pub role: Role,

    #[schema(value_type = Object)]
    pub permissions: Json<PermissionMap>,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn access_profile(&self) -> AccessProfile {
        AccessProfile {
            user_id: self.user_id,
            tenant_id: self.tenant_id,
            employee_id: self.id,
            full_name: self.full_name.clone(),
            role: self.role,
            active: self.is_active,
            permissions: derive_permissions(self.role, &self.permissions, self.is_active),
        }
    }

    pub fn is_active_admin(&self) -> bool {
        self.is_active && self.role == Role::Admin
    }
}

// Linha de `list_employees_for_admin`: funcionário + e-mail do usuário
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeListEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    #[schema(example = "maria@frota.com")]
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
    #[schema(value_type = Object)]
    pub permissions: Json<PermissionMap>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// Cadastro de funcionário a partir de um usuário já registrado
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeePayload {
    #[validate(email(message = "invalid_email"))]
    #[schema(example = "maria@frota.com")]
    pub email: String,
    // Sem nome, usa o do cadastro do usuário
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    #[schema(value_type = Option<Object>)]
    pub permissions: Option<PermissionMap>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeFilter {
    pub role: Option<Role>,
    pub active: Option<bool>,
}

// Alterações aceitas num funcionário (None = mantém)
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    #[schema(value_type = Option<Object>)]
    pub permissions: Option<PermissionMap>,
    pub is_active: Option<bool>,
}

impl EmployeeUpdate {
    /// A alteração tira o funcionário do grupo de admins ativos?
    pub fn removes_admin(&self, current: &Employee) -> bool {
        if !current.is_active_admin() {
            return false;
        }
        let demoted = self.role.is_some_and(|r| r != Role::Admin);
        let deactivated = self.is_active == Some(false);
        demoted || deactivated
    }

    pub fn touches_access(&self) -> bool {
        self.role.is_some() || self.permissions.is_some() || self.is_active.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::access::Feature;

    fn employee(role: Role, active: bool) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            full_name: "João".into(),
            phone: None,
            role,
            permissions: Json(PermissionMap::new()),
            is_active: active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn demoting_or_deactivating_an_admin_removes_admin() {
        let admin = employee(Role::Admin, true);
        let demote = EmployeeUpdate { role: Some(Role::Manager), ..Default::default() };
        let deactivate = EmployeeUpdate { is_active: Some(false), ..Default::default() };
        let rename = EmployeeUpdate { full_name: Some("Outro".into()), ..Default::default() };
        let keep_admin = EmployeeUpdate { role: Some(Role::Admin), ..Default::default() };

        assert!(demote.removes_admin(&admin));
        assert!(deactivate.removes_admin(&admin));
        assert!(!rename.removes_admin(&admin));
        assert!(!keep_admin.removes_admin(&admin));
    }

    #[test]
    fn non_admin_changes_never_remove_admin() {
        let driver = employee(Role::Driver, true);
        let inactive_admin = employee(Role::Admin, false);
        let update = EmployeeUpdate { is_active: Some(false), role: Some(Role::User), ..Default::default() };
        assert!(!update.removes_admin(&driver));
        assert!(!update.removes_admin(&inactive_admin));
    }

    #[test]
    fn access_profile_is_derived_from_record() {
        let mut e = employee(Role::Inspector, true);
        e.permissions = Json([("costs".to_string(), true)].into_iter().collect());
        let profile = e.access_profile();
        assert_eq!(profile.employee_id, e.id);
        assert!(profile.can(Feature::Costs));
        assert!(profile.can(Feature::Fines));
        assert!(!profile.can(Feature::Billing));
    }
}
