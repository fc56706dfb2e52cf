// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::{
        error::{ApiError, AppError},
        i18n::I18nStore,
    },
    middleware::i18n::Locale,
    models::access::{AccessProfile, Feature},
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn feature() -> Feature;
}

/// 2. O Extractor (Guardião)
/// Não consulta o banco: o tenant_guard já deixou o AccessProfile (vindo do cache) nas extensions.
pub struct RequirePermission<T>(pub PhantomData<T>);

fn reject<S>(parts: &Parts, state: &S, error: AppError) -> ApiError
where
    I18nStore: FromRef<S>,
{
    error.to_api_error(&Locale::from_headers(&parts.headers), &I18nStore::from_ref(state))
}

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    I18nStore: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(profile) = parts.extensions.get::<AccessProfile>() else {
            return Err(reject(parts, state, AppError::TenantAccessDenied));
        };

        let required = T::feature();
        if !profile.can(required) {
            tracing::debug!("⛔ Funcionário {} sem a permissão '{}'", profile.employee_id, required);
            return Err(reject(parts, state, AppError::PermissionDenied(required)));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// Perfil completo do usuário na empresa, para handlers que decidem por cargo
#[derive(Debug, Clone)]
pub struct CurrentAccess(pub AccessProfile);

impl<S> FromRequestParts<S> for CurrentAccess
where
    S: Send + Sync,
    I18nStore: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AccessProfile>() {
            Some(profile) => Ok(CurrentAccess(profile.clone())),
            None => Err(reject(parts, state, AppError::TenantAccessDenied)),
        }
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

macro_rules! permission {
    ($name:ident, $feature:ident) => {
        pub struct $name;
        impl PermissionDef for $name {
            fn feature() -> Feature {
                Feature::$feature
            }
        }
    };
}

permission!(PermDashboard, Dashboard);
permission!(PermVehicles, Vehicles);
permission!(PermCosts, Costs);
permission!(PermFines, Fines);
permission!(PermFuel, Fuel);
permission!(PermEmployees, Employees);
permission!(PermCustomers, Customers);
permission!(PermContracts, Contracts);
permission!(PermBilling, Billing);
permission!(PermReports, Reports);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::access::{derive_permissions, PermissionMap, Role};
    use axum::http::{Request, StatusCode};
    use uuid::Uuid;

    fn profile(role: Role) -> AccessProfile {
        AccessProfile {
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            full_name: "Bruno".into(),
            role,
            active: true,
            permissions: derive_permissions(role, &PermissionMap::new(), true),
        }
    }

    fn parts_with(profile: Option<AccessProfile>) -> Parts {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        if let Some(profile) = profile {
            parts.extensions.insert(profile);
        }
        parts
    }

    #[tokio::test]
    async fn driver_can_log_fuel_but_not_bill() {
        let store = I18nStore::load().unwrap();
        let mut parts = parts_with(Some(profile(Role::Driver)));

        assert!(RequirePermission::<PermFuel>::from_request_parts(&mut parts, &store).await.is_ok());

        let err = RequirePermission::<PermBilling>::from_request_parts(&mut parts, &store)
            .await
            .err()
            .unwrap();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert!(err.error.contains("billing"));
    }

    #[tokio::test]
    async fn missing_profile_is_forbidden() {
        let store = I18nStore::load().unwrap();
        let mut parts = parts_with(None);

        let err = RequirePermission::<PermDashboard>::from_request_parts(&mut parts, &store)
            .await
            .err()
            .unwrap();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert!(CurrentAccess::from_request_parts(&mut parts, &store).await.is_err());
    }

    #[tokio::test]
    async fn current_access_exposes_the_role() {
        let store = I18nStore::load().unwrap();
        let mut parts = parts_with(Some(profile(Role::Sales)));

        let CurrentAccess(found) = CurrentAccess::from_request_parts(&mut parts, &store).await.unwrap();
        assert_eq!(found.role, Role::Sales);
    }
}
