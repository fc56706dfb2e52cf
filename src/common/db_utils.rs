use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::config::AppState;
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::tenancy::TenantContext;

// ---
// Helper RLS: A "Chave" para o Banco de Dados
// ---
/// Abre uma transação e define as variáveis RLS (`app.tenant_id`, `app.user_id`).
/// `set_config(.., true)` vale só dentro da transação, então tudo que depende das
/// policies precisa rodar nela. Leituras podem simplesmente descartar (rollback no drop).
pub(crate) async fn get_rls_connection(
    app_state: &AppState,
    tenant_ctx: &TenantContext,
    user: &AuthenticatedUser,
) -> Result<Transaction<'static, Postgres>, AppError> {
    begin_rls(&app_state.db_pool, Some(tenant_ctx.0), user.0.id).await
}

/// Variante sem tenant: só o usuário é conhecido (ex.: listar as empresas dele).
pub(crate) async fn begin_rls(
    pool: &PgPool,
    tenant_id: Option<Uuid>,
    user_id: Uuid,
) -> Result<Transaction<'static, Postgres>, AppError> {
    let mut tx = pool.begin().await?;

    if let Some(tenant_id) = tenant_id {
        set_tenant(&mut tx, tenant_id).await?;
    }

    sqlx::query("SELECT set_config('app.user_id', $1, true)")
        .bind(user_id.to_string())
        .execute(&mut *tx)
        .await?;

    Ok(tx)
}

/// Troca o tenant da transação (usado ao criar uma empresa nova).
pub(crate) async fn set_tenant(
    tx: &mut Transaction<'static, Postgres>,
    tenant_id: Uuid,
) -> Result<(), AppError> {
    sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
        .bind(tenant_id.to_string())
        .execute(&mut **tx)
        .await?;
    Ok(())
}
