// src/models/access.rs

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// --- Cargos (mapeando o enum `employee_role` do Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "employee_role", rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Mechanic,
    Driver,
    Inspector,
    FineAdmin,
    Sales,
    User,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Role::Admin,
        Role::Manager,
        Role::Mechanic,
        Role::Driver,
        Role::Inspector,
        Role::FineAdmin,
        Role::Sales,
        Role::User,
    ];

    /// Funcionalidades liberadas por padrão para o cargo.
    pub fn default_features(self) -> &'static [Feature] {
        use Feature::*;
        match self {
            Role::Admin => &Feature::ALL,
            Role::Manager => &[Dashboard, Vehicles, Costs, Fines, Fuel, Customers, Contracts, Billing, Reports],
            Role::Mechanic => &[Dashboard, Vehicles, Costs, Fuel],
            Role::Driver => &[Dashboard, Fuel],
            Role::Inspector => &[Dashboard, Vehicles, Fines],
            Role::FineAdmin => &[Dashboard, Vehicles, Fines, Costs],
            Role::Sales => &[Dashboard, Customers, Contracts, Billing, Vehicles],
            Role::User => &[Dashboard],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// --- Funcionalidades (chaves do mapa de permissões) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Dashboard,
    Vehicles,
    Costs,
    Fines,
    Fuel,
    Employees,
    Customers,
    Contracts,
    Billing,
    Reports,
}

impl Feature {
    pub const ALL: [Feature; 10] = [
        Feature::Dashboard,
        Feature::Vehicles,
        Feature::Costs,
        Feature::Fines,
        Feature::Fuel,
        Feature::Employees,
        Feature::Customers,
        Feature::Contracts,
        Feature::Billing,
        Feature::Reports,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Feature::Dashboard => "dashboard",
            Feature::Vehicles => "vehicles",
            Feature::Costs => "costs",
            Feature::Fines => "fines",
            Feature::Fuel => "fuel",
            Feature::Employees => "employees",
            Feature::Customers => "customers",
            Feature::Contracts => "contracts",
            Feature::Billing => "billing",
            Feature::Reports => "reports",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Feature::Dashboard => "Painel com indicadores da frota",
            Feature::Vehicles => "Cadastro e quilometragem de veículos",
            Feature::Costs => "Lançamento e consulta de custos",
            Feature::Fines => "Gestão de multas",
            Feature::Fuel => "Registro de abastecimentos",
            Feature::Employees => "Administração de funcionários e cargos",
            Feature::Customers => "Cadastro de clientes",
            Feature::Contracts => "Contratos de locação",
            Feature::Billing => "Faturamento e extratos",
            Feature::Reports => "Relatórios gerenciais",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or(())
    }
}

/// Mapa de permissões como fica gravado no banco (jsonb): `{"fines": true, "billing": false}`.
pub type PermissionMap = BTreeMap<String, bool>;

/// Permissões efetivas: padrão do cargo, sobrescrito pelo mapa explícito.
/// Admin sempre tem tudo e funcionário inativo não tem nada.
/// Chaves desconhecidas no mapa são ignoradas.
pub fn derive_permissions(role: Role, overrides: &PermissionMap, active: bool) -> BTreeSet<Feature> {
    if !active {
        return BTreeSet::new();
    }
    if role == Role::Admin {
        return Feature::ALL.into_iter().collect();
    }

    let mut features: BTreeSet<Feature> = role.default_features().iter().copied().collect();
    for (key, granted) in overrides {
        let Ok(feature) = key.parse::<Feature>() else {
            continue;
        };
        if *granted {
            features.insert(feature);
        } else {
            features.remove(&feature);
        }
    }
    features
}

// O que o cache guarda: quem é o usuário dentro de uma empresa.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessProfile {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub employee_id: Uuid,
    #[schema(example = "Maria Souza")]
    pub full_name: String,
    pub role: Role,
    pub active: bool,
    pub permissions: BTreeSet<Feature>,
}

impl AccessProfile {
    pub fn can(&self, feature: Feature) -> bool {
        self.active && self.permissions.contains(&feature)
    }

    pub fn is_admin(&self) -> bool {
        self.active && self.role == Role::Admin
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.active && roles.contains(&self.role)
    }
}

// Catálogo para o frontend montar a tela de cargos
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeatureCatalogEntry {
    pub feature: Feature,
    #[schema(example = "Gestão de multas")]
    pub description: String,
    pub default_roles: Vec<Role>,
}

pub fn feature_catalog() -> Vec<FeatureCatalogEntry> {
    Feature::ALL
        .into_iter()
        .map(|feature| FeatureCatalogEntry {
            feature,
            description: feature.description().to_string(),
            default_roles: Role::ALL
                .into_iter()
                .filter(|role| role.default_features().contains(&feature))
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, bool)]) -> PermissionMap {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn admin_holds_everything_even_with_revocations() {
        let perms = derive_permissions(Role::Admin, &map(&[("employees", false)]), true);
        assert_eq!(perms.len(), Feature::ALL.len());
        assert!(perms.contains(&Feature::Employees));
    }

    #[test]
    fn manager_cannot_manage_employees_by_default() {
        let perms = derive_permissions(Role::Manager, &PermissionMap::new(), true);
        assert!(perms.contains(&Feature::Billing));
        assert!(!perms.contains(&Feature::Employees));
    }

    #[test]
    fn explicit_map_grants_and_revokes() {
        let perms = derive_permissions(
            Role::Driver,
            &map(&[("fines", true), ("fuel", false), ("nao_existe", true)]),
            true,
        );
        assert!(perms.contains(&Feature::Fines));
        assert!(perms.contains(&Feature::Dashboard));
        assert!(!perms.contains(&Feature::Fuel));
    }

    #[test]
    fn inactive_employee_has_no_permissions() {
        assert!(derive_permissions(Role::Admin, &PermissionMap::new(), false).is_empty());
    }

    #[test]
    fn profile_checks_respect_active_flag() {
        let mut profile = AccessProfile {
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            full_name: "Ana".into(),
            role: Role::FineAdmin,
            active: true,
            permissions: derive_permissions(Role::FineAdmin, &PermissionMap::new(), true),
        };
        assert!(profile.can(Feature::Fines));
        assert!(!profile.can(Feature::Billing));
        assert!(profile.has_any_role(&[Role::Inspector, Role::FineAdmin]));
        assert!(!profile.is_admin());

        profile.active = false;
        assert!(!profile.can(Feature::Fines));
        assert!(!profile.has_any_role(&[Role::FineAdmin]));
    }

    #[test]
    fn feature_keys_round_trip_through_strings() {
        for feature in Feature::ALL {
            assert_eq!(feature.as_str().parse::<Feature>(), Ok(feature));
            assert_eq!(serde_json::to_value(feature).unwrap(), feature.as_str());
        }
    }

    #[test]
    fn catalog_lists_admin_for_every_feature() {
        let catalog = feature_catalog();
        assert_eq!(catalog.len(), Feature::ALL.len());
        assert!(catalog.iter().all(|e| e.default_roles.contains(&Role::Admin)));
        let employees = catalog.iter().find(|e| e.feature == Feature::Employees).unwrap();
        assert_eq!(employees.default_roles, vec![Role::Admin]);
    }
}
