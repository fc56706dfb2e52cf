// src/middleware/tenancy.rs

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::begin_rls,
        error::{ApiError, AppError},
        i18n::I18nStore,
    },
    config::AppState,
    middleware::{
        auth::{authenticate, AuthenticatedUser},
        i18n::Locale,
    },
};

// O nome do nosso cabeçalho HTTP customizado
const TENANT_ID_HEADER: &str = "x-tenant-id";

// Empresa da requisição, já conferida pelo tenant_guard
#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub Uuid);

pub fn parse_tenant_header(headers: &HeaderMap) -> Result<Uuid, AppError> {
    let value = headers
        .get(TENANT_ID_HEADER)
        .ok_or(AppError::MissingTenantHeader)?;

    value
        .to_str()
        .ok()
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
        .ok_or(AppError::InvalidTenantHeader)
}

/// Login + X-Tenant-ID + vínculo ativo com a empresa.
/// Deixa nas extensions o usuário, o TenantContext e o AccessProfile resolvido.
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let user = authenticate(&app_state, request.headers()).await.map_err(to_api)?;
    let tenant_id = parse_tenant_header(request.headers()).map_err(to_api)?;

    let profile = {
        let mut tx = begin_rls(&app_state.db_pool, Some(tenant_id), user.id)
            .await
            .map_err(to_api)?;
        app_state
            .access_service
            .resolve(&mut *tx, user.id, tenant_id)
            .await
            .map_err(to_api)?
    };

    let profile = match profile {
        Some(profile) if profile.active => profile,
        _ => {
            tracing::warn!("⛔ Usuário {} sem acesso ativo à empresa {}", user.id, tenant_id);
            return Err(to_api(AppError::TenantAccessDenied));
        }
    };

    let extensions = request.extensions_mut();
    extensions.insert(AuthenticatedUser(user));
    extensions.insert(TenantContext(tenant_id));
    extensions.insert(profile);

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
    I18nStore: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<TenantContext>().copied().ok_or_else(|| {
            AppError::MissingTenantHeader
                .to_api_error(&Locale::from_headers(&parts.headers), &I18nStore::from_ref(state))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = value {
            headers.insert(TENANT_ID_HEADER, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn parses_a_valid_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_tenant_header(&headers(Some(&id.to_string()))).unwrap(), id);
    }

    #[test]
    fn missing_and_invalid_headers_are_distinct_errors() {
        assert!(matches!(parse_tenant_header(&headers(None)), Err(AppError::MissingTenantHeader)));
        assert!(matches!(
            parse_tenant_header(&headers(Some("loja-1"))),
            Err(AppError::InvalidTenantHeader)
        ));
    }
}
