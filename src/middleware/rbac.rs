// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::User,
};

/// 1. O Trait que define uma política de acesso
pub trait AccessPolicy: Send + Sync + 'static {
    fn slug() -> &'static str;
    fn allows(user: &User) -> bool;
}

/// 2. O Extractor (Guardião)
pub struct RequirePolicy<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePolicy<T>
where
    T: AccessPolicy,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_headers(&parts.headers);

        let user = parts
            .extensions
            .get::<User>()
            .ok_or(AppError::InvalidToken)
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

        if !T::allows(user) {
            tracing::warn!(
                "Acesso negado: usuário {} sem a política '{}'",
                user.username,
                T::slug()
            );
            return Err(AppError::Forbidden.to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequirePolicy(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS POLÍTICAS (TIPOS)
// ---

// Operador da plataforma (planos, ativação/suspensão de assinaturas, criação de clientes)
pub struct PlatformStaff;
impl AccessPolicy for PlatformStaff {
    fn slug() -> &'static str { "platform:staff" }
    fn allows(user: &User) -> bool { user.is_staff }
}
