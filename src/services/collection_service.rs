// src/services/collection_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CollectionRepository, FormRepository},
    middleware::tenancy::TenantScope,
    models::{
        auth::User,
        collection::{
            AddEntryPayload, CollectionEntry, CollectionSession, SessionDetail, SessionStatus,
            StartSessionPayload, UpdateLocationPayload,
        },
        forms::FormField,
    },
};

// Coletores só enxergam as próprias sessões; staff vê todas no escopo
fn owner_of(user: &User) -> Option<Uuid> {
    if user.is_staff { None } else { Some(user.id) }
}

/// O campo precisa pertencer ao formulário da sessão.
pub fn ensure_field_of_session(session: &CollectionSession, field: Option<FormField>) -> Result<FormField, AppError> {
    match field {
        Some(field) if field.form_id == session.form_id => Ok(field),
        _ => Err(AppError::InvalidField),
    }
}

#[derive(Clone)]
pub struct CollectionService {
    collection_repo: CollectionRepository,
    form_repo: FormRepository,
}

impl CollectionService {
    pub fn new(collection_repo: CollectionRepository, form_repo: FormRepository) -> Self {
        Self { collection_repo, form_repo }
    }

    async fn find_session(&self, id: Uuid, user: &User, scope: TenantScope) -> Result<CollectionSession, AppError> {
        self.collection_repo
            .find_session(id, scope.filter()?, owner_of(user))
            .await?
            .ok_or(AppError::NotFound("collection_session"))
    }

    pub async fn list_sessions(&self, user: &User, scope: TenantScope) -> Result<Vec<CollectionSession>, AppError> {
        self.collection_repo.list_sessions(scope.filter()?, owner_of(user)).await
    }

    pub async fn start_session(
        &self,
        user: &User,
        scope: TenantScope,
        payload: &StartSessionPayload,
    ) -> Result<CollectionSession, AppError> {
        let form = self
            .form_repo
            .find_form(payload.form_id, scope.filter()?)
            .await?
            .ok_or(AppError::NotFound("form"))?;

        let session = self.collection_repo.create_session(&form, user.id).await?;
        tracing::info!("🛰️ Sessão de coleta {} iniciada por '{}' ({})", session.id, user.username, form.name);
        Ok(session)
    }

    pub async fn get_session(&self, id: Uuid, user: &User, scope: TenantScope) -> Result<SessionDetail, AppError> {
        let session = self.find_session(id, user, scope).await?;
        let form = self
            .form_repo
            .find_form(session.form_id, Some(session.client_id))
            .await?
            .ok_or(AppError::NotFound("form"))?;
        let entries = self.collection_repo.list_entries(session.id).await?;

        Ok(SessionDetail { session, form_name: form.name, entries })
    }

    pub async fn delete_session(&self, id: Uuid, user: &User, scope: TenantScope) -> Result<(), AppError> {
        if !self
            .collection_repo
            .delete_session(id, scope.filter()?, owner_of(user))
            .await?
        {
            return Err(AppError::NotFound("collection_session"));
        }
        Ok(())
    }

    pub async fn update_location(
        &self,
        id: Uuid,
        user: &User,
        scope: TenantScope,
        payload: UpdateLocationPayload,
    ) -> Result<SessionStatus, AppError> {
        let session = self.find_session(id, user, scope).await?;
        session.ensure_open()?;

        let position = payload.into_position()?;
        let location = serde_json::to_value(&position).map_err(anyhow::Error::from)?;

        // A guarda no UPDATE cobre o encerramento concorrente
        self.collection_repo
            .set_location(session.id, &location)
            .await?
            .ok_or(AppError::SessionClosed)?;

        Ok(SessionStatus { status: "location updated".to_string() })
    }

    pub async fn add_entry(
        &self,
        id: Uuid,
        user: &User,
        scope: TenantScope,
        payload: AddEntryPayload,
    ) -> Result<CollectionEntry, AppError> {
        let session = self.find_session(id, user, scope).await?;
        session.ensure_open()?;

        let (field_id, value) = payload.into_parts()?;
        let field = self.form_repo.find_field(field_id).await?;
        let field = ensure_field_of_session(&session, field)?;

        // Encerramento concorrente: o INSERT não encontra a sessão aberta
        self.collection_repo
            .insert_entry(session.id, field.id, &value)
            .await?
            .ok_or(AppError::SessionClosed)
    }

    pub async fn end_session(&self, id: Uuid, user: &User, scope: TenantScope) -> Result<SessionStatus, AppError> {
        let session = self.find_session(id, user, scope).await?;
        let session = self.collection_repo.end_session(session.id).await?;

        tracing::info!("🏁 Sessão de coleta {} encerrada", session.id);
        Ok(SessionStatus { status: "session ended".to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    use crate::models::forms::FieldType;

    fn session(form_id: Uuid) -> CollectionSession {
        CollectionSession {
            id: Uuid::new_v4(),
            client_id: Uuid::nil(),
            user_id: Uuid::nil(),
            form_id,
            start_time: Utc::now(),
            end_time: None,
            current_location: None,
            is_active: true,
        }
    }

    fn field(form_id: Uuid) -> FormField {
        FormField {
            id: Uuid::new_v4(),
            form_id,
            name: "status".into(),
            label: "Status".into(),
            field_type: FieldType::Text,
            required: false,
            options: Some(json!(["ok", "vazando"])),
            order: 2,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn field_of_other_form_is_rejected() {
        let session = session(Uuid::new_v4());
        let foreign = field(Uuid::new_v4());

        let err = ensure_field_of_session(&session, Some(foreign)).unwrap_err();
        assert!(matches!(err, AppError::InvalidField));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let session = session(Uuid::new_v4());
        assert!(matches!(ensure_field_of_session(&session, None), Err(AppError::InvalidField)));
    }

    #[test]
    fn field_of_session_form_is_accepted() {
        let form_id = Uuid::new_v4();
        let session = session(form_id);
        let own = field(form_id);
        let own_id = own.id;

        assert_eq!(ensure_field_of_session(&session, Some(own)).unwrap().id, own_id);
    }

    #[test]
    fn staff_sees_every_session() {
        let now = Utc::now();
        let mut user = User {
            id: Uuid::new_v4(),
            username: "field.agent".into(),
            email: "agent@waterutility.com".into(),
            password_hash: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            is_staff: false,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(owner_of(&user), Some(user.id));
        user.is_staff = true;
        assert_eq!(owner_of(&user), None);
    }
}
