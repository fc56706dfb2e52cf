// src/services/access_service.rs

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use sqlx::{Executor, Postgres};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::EmployeeRepository,
    models::access::AccessProfile,
};

#[derive(Clone)]
struct CachedProfile {
    profile: AccessProfile,
    cached_at: Instant,
}

/// Perfis de acesso em memória por (usuário, empresa), com validade fixa.
#[derive(Clone)]
pub struct AccessCache {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<(Uuid, Uuid), CachedProfile>>>,
}

impl AccessCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get(&self, user_id: Uuid, tenant_id: Uuid) -> Option<AccessProfile> {
        self.get_at(user_id, tenant_id, Instant::now()).await
    }

    /// Entradas vencidas são descartadas na leitura.
    async fn get_at(&self, user_id: Uuid, tenant_id: Uuid, now: Instant) -> Option<AccessProfile> {
        let key = (user_id, tenant_id);
        {
            let entries = self.entries.read().await;
            match entries.get(&key) {
                Some(entry) if now.duration_since(entry.cached_at) < self.ttl => {
                    return Some(entry.profile.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        let mut entries = self.entries.write().await;
        // outra task pode ter renovado a entrada entre os dois locks
        if entries
            .get(&key)
            .is_some_and(|entry| now.duration_since(entry.cached_at) >= self.ttl)
        {
            entries.remove(&key);
            tracing::debug!("🕒 Perfil de acesso expirado: user={} tenant={}", user_id, tenant_id);
        }
        None
    }

    pub async fn insert(&self, profile: AccessProfile) {
        self.insert_at(profile, Instant::now()).await
    }

    async fn insert_at(&self, profile: AccessProfile, now: Instant) {
        let key = (profile.user_id, profile.tenant_id);
        self.entries
            .write()
            .await
            .insert(key, CachedProfile { profile, cached_at: now });
    }

    /// Remove o usuário de todas as empresas.
    pub async fn invalidate_user(&self, user_id: Uuid) {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|(user, _), _| *user != user_id);
        tracing::debug!("🧹 Cache de acesso invalidado para user={} ({} entradas)", user_id, before - entries.len());
    }

    pub async fn invalidate_tenant(&self, tenant_id: Uuid) {
        let mut entries = self.entries.write().await;
        entries.retain(|(_, tenant), _| *tenant != tenant_id);
        tracing::debug!("🧹 Cache de acesso invalidado para tenant={}", tenant_id);
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[derive(Clone)]
pub struct AccessService {
    employee_repo: EmployeeRepository,
    cache: AccessCache,
}

impl AccessService {
    pub fn new(employee_repo: EmployeeRepository, cache: AccessCache) -> Self {
        Self { employee_repo, cache }
    }

    pub fn cache(&self) -> &AccessCache {
        &self.cache
    }

    /// Perfil efetivo do usuário na empresa. `None` quando ele não é funcionário dela.
    pub async fn resolve<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<AccessProfile>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if let Some(profile) = self.cache.get(user_id, tenant_id).await {
            tracing::debug!("⚡ Perfil de acesso em cache: user={} tenant={}", user_id, tenant_id);
            return Ok(Some(profile));
        }

        let Some(employee) = self.employee_repo.find_by_user(executor, tenant_id, user_id).await? else {
            return Ok(None);
        };

        let profile = employee.access_profile();
        self.cache.insert(profile.clone()).await;
        Ok(Some(profile))
    }

    pub async fn invalidate_user(&self, user_id: Uuid) {
        self.cache.invalidate_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::access::{derive_permissions, PermissionMap, Role};

    fn profile(user_id: Uuid, tenant_id: Uuid, role: Role) -> AccessProfile {
        AccessProfile {
            user_id,
            tenant_id,
            employee_id: Uuid::new_v4(),
            full_name: "Teste".into(),
            role,
            active: true,
            permissions: derive_permissions(role, &PermissionMap::new(), true),
        }
    }

    #[tokio::test]
    async fn returns_fresh_entries_and_drops_expired_ones() {
        let cache = AccessCache::new(Duration::from_secs(60));
        let (user, tenant) = (Uuid::new_v4(), Uuid::new_v4());
        let start = Instant::now();

        cache.insert_at(profile(user, tenant, Role::Driver), start).await;

        let hit = cache.get_at(user, tenant, start + Duration::from_secs(59)).await;
        assert_eq!(hit.map(|p| p.role), Some(Role::Driver));

        assert!(cache.get_at(user, tenant, start + Duration::from_secs(60)).await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn keys_are_per_tenant() {
        let cache = AccessCache::new(Duration::from_secs(60));
        let user = Uuid::new_v4();
        let (loja_a, loja_b) = (Uuid::new_v4(), Uuid::new_v4());

        cache.insert(profile(user, loja_a, Role::Admin)).await;
        cache.insert(profile(user, loja_b, Role::Sales)).await;

        assert_eq!(cache.get(user, loja_a).await.map(|p| p.role), Some(Role::Admin));
        assert_eq!(cache.get(user, loja_b).await.map(|p| p.role), Some(Role::Sales));
        assert!(cache.get(Uuid::new_v4(), loja_a).await.is_none());
    }

    #[tokio::test]
    async fn invalidation_by_user_and_by_tenant() {
        let cache = AccessCache::new(Duration::from_secs(60));
        let (ana, bia) = (Uuid::new_v4(), Uuid::new_v4());
        let (loja_a, loja_b) = (Uuid::new_v4(), Uuid::new_v4());

        cache.insert(profile(ana, loja_a, Role::Manager)).await;
        cache.insert(profile(ana, loja_b, Role::Manager)).await;
        cache.insert(profile(bia, loja_a, Role::Driver)).await;

        cache.invalidate_user(ana).await;
        assert!(cache.get(ana, loja_a).await.is_none());
        assert!(cache.get(ana, loja_b).await.is_none());
        assert!(cache.get(bia, loja_a).await.is_some());

        cache.insert(profile(ana, loja_b, Role::Manager)).await;
        cache.invalidate_tenant(loja_a).await;
        assert!(cache.get(bia, loja_a).await.is_none());
        assert!(cache.get(ana, loja_b).await.is_some());

        cache.clear().await;
        assert_eq!(cache.len().await, 0);
    }
}
