// src/middleware/auth.rs

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{
    common::{
        error::{ApiError, AppError},
        i18n::I18nStore,
    },
    config::AppState,
    middleware::i18n::Locale,
    models::auth::User,
};

// Usuário autenticado, colocado nas extensions pelos guards
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Valida o `Authorization: Bearer <jwt>` e carrega o usuário.
pub(crate) async fn authenticate(app_state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    let bearer = headers
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AppError::InvalidToken)?;

    app_state.auth_service.validate_token(bearer.token()).await
}

// Rotas que só precisam de login (sem empresa)
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&app_state, request.headers())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    I18nStore: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| {
                AppError::InvalidToken.to_api_error(&Locale::from_headers(&parts.headers), &I18nStore::from_ref(state))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request as HttpRequest, StatusCode};
    use chrono::Utc;
    use uuid::Uuid;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "gestor@frota.com".into(),
            full_name: "Carlos".into(),
            password_hash: "hash".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn reads_user_placed_by_the_guard() {
        let store = I18nStore::load().unwrap();
        let expected = user();
        let (mut parts, _) = HttpRequest::builder().body(()).unwrap().into_parts();
        parts.extensions.insert(AuthenticatedUser(expected.clone()));

        let AuthenticatedUser(found) = AuthenticatedUser::from_request_parts(&mut parts, &store).await.unwrap();
        assert_eq!(found.id, expected.id);
    }

    #[tokio::test]
    async fn missing_user_is_unauthorized() {
        let store = I18nStore::load().unwrap();
        let (mut parts, _) = HttpRequest::builder()
            .header("accept-language", "pt-BR")
            .body(())
            .unwrap()
            .into_parts();

        let err = AuthenticatedUser::from_request_parts(&mut parts, &store).await.unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.error, store.translate("pt", "invalid_token", &[]));
    }
}
