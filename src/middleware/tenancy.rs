// src/middleware/tenancy.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::{auth::User, tenancy::ClientUser},
};

// Até onde o usuário enxerga os dados dos clientes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantScope {
    // Operador da plataforma: vê todos os clientes
    Platform,
    // Membro de um cliente: só o próprio cliente
    Client(Uuid),
    // Sem vínculo: nada
    Detached,
}

impl TenantScope {
    pub fn for_user(user: &User, membership: Option<&ClientUser>) -> Self {
        if user.is_staff {
            TenantScope::Platform
        } else {
            match membership {
                Some(link) => TenantScope::Client(link.client_id),
                None => TenantScope::Detached,
            }
        }
    }

    /// Filtro de `client_id` para os repositórios. `None` = sem filtro.
    pub fn filter(&self) -> Result<Option<Uuid>, AppError> {
        match self {
            TenantScope::Platform => Ok(None),
            TenantScope::Client(id) => Ok(Some(*id)),
            TenantScope::Detached => Err(AppError::NoTenantLink),
        }
    }

    /// Cliente dono de um recurso criado diretamente sob o cliente
    /// (departamentos, camadas). Staff precisa informar; membro herda o seu.
    pub fn owner(&self, requested: Option<Uuid>) -> Result<Uuid, AppError> {
        match (self, requested) {
            (TenantScope::Platform, Some(id)) => Ok(id),
            (TenantScope::Platform, None) => {
                Err(AppError::InvalidPayload("client_id é obrigatório.".to_string()))
            }
            (TenantScope::Client(own), None) => Ok(*own),
            (TenantScope::Client(own), Some(id)) if id == *own => Ok(id),
            (TenantScope::Client(_), Some(_)) => Err(AppError::NotFound("client")),
            (TenantScope::Detached, _) => Err(AppError::NoTenantLink),
        }
    }
}

// O contexto do tenant resolvido a partir do usuário autenticado
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub user: User,
    pub membership: Option<ClientUser>,
    pub scope: TenantScope,
}

impl TenantContext {
    /// Cliente do usuário, exigido pelas rotas que só fazem sentido para membros.
    pub fn client_id(&self) -> Result<Uuid, AppError> {
        self.membership
            .as_ref()
            .map(|link| link.client_id)
            .ok_or(AppError::NoTenantLink)
    }
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_headers(&parts.headers);

        // O auth_guard já colocou o usuário aqui
        let user = parts
            .extensions
            .get::<User>()
            .cloned()
            .ok_or(AppError::InvalidToken)
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

        let membership = app_state
            .tenant_service
            .membership_for(user.id)
            .await
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

        let scope = TenantScope::for_user(&user, membership.as_ref());
        Ok(TenantContext { user, membership, scope })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tenancy::ClientRole;
    use chrono::Utc;

    fn user(is_staff: bool) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: "field.agent".into(),
            email: "agent@waterutility.com".into(),
            password_hash: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            is_staff,
            created_at: now,
            updated_at: now,
        }
    }

    fn link(user_id: Uuid, client_id: Uuid) -> ClientUser {
        let now = Utc::now();
        ClientUser {
            id: Uuid::new_v4(),
            user_id,
            client_id,
            role: ClientRole::User,
            department_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn staff_sees_every_client() {
        let scope = TenantScope::for_user(&user(true), None);
        assert_eq!(scope, TenantScope::Platform);
        assert_eq!(scope.filter().unwrap(), None);
    }

    #[test]
    fn member_is_filtered_to_own_client() {
        let member = user(false);
        let client_id = Uuid::new_v4();
        let scope = TenantScope::for_user(&member, Some(&link(member.id, client_id)));
        assert_eq!(scope.filter().unwrap(), Some(client_id));
    }

    #[test]
    fn user_without_link_gets_no_tenant_link() {
        let scope = TenantScope::for_user(&user(false), None);
        assert!(matches!(scope.filter(), Err(AppError::NoTenantLink)));
        assert!(matches!(scope.owner(None), Err(AppError::NoTenantLink)));
    }

    #[test]
    fn owner_resolution() {
        let own = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert_eq!(TenantScope::Client(own).owner(None).unwrap(), own);
        assert_eq!(TenantScope::Client(own).owner(Some(own)).unwrap(), own);
        assert!(matches!(
            TenantScope::Client(own).owner(Some(other)),
            Err(AppError::NotFound(_))
        ));
        assert_eq!(TenantScope::Platform.owner(Some(other)).unwrap(), other);
        assert!(matches!(
            TenantScope::Platform.owner(None),
            Err(AppError::InvalidPayload(_))
        ));
    }
}
