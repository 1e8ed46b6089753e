// src/services/form_service.rs

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{FormRepository, OrganizationRepository},
    middleware::tenancy::TenantScope,
    models::forms::{
        AddFieldPayload, CreateFormPayload, CreateSubmissionPayload, Form, FormDetail, FormField,
        NewFormField, SubmissionResponse, SubmissionRow, UpdateFormPayload,
    },
};

// Agrupa campos por formulário mantendo a ordem vinda do banco
fn fields_by_form(fields: Vec<FormField>) -> HashMap<Uuid, Vec<FormField>> {
    let mut grouped: HashMap<Uuid, Vec<FormField>> = HashMap::new();
    for field in fields {
        grouped.entry(field.form_id).or_default().push(field);
    }
    grouped
}

#[derive(Clone)]
pub struct FormService {
    form_repo: FormRepository,
    organization_repo: OrganizationRepository,
    pool: PgPool,
}

impl FormService {
    pub fn new(form_repo: FormRepository, organization_repo: OrganizationRepository, pool: PgPool) -> Self {
        Self { form_repo, organization_repo, pool }
    }

    // ---
    // FORMULÁRIOS
    // ---

    pub async fn find_form(&self, id: Uuid, scope: TenantScope) -> Result<Form, AppError> {
        self.form_repo
            .find_form(id, scope.filter()?)
            .await?
            .ok_or(AppError::NotFound("form"))
    }

    pub async fn list_forms(
        &self,
        scope: TenantScope,
        category_id: Option<Uuid>,
    ) -> Result<Vec<FormDetail>, AppError> {
        let forms = self.form_repo.list_forms(scope.filter()?, category_id).await?;
        let ids: Vec<Uuid> = forms.iter().map(|f| f.id).collect();
        let mut fields = fields_by_form(self.form_repo.fields_for_forms(&ids).await?);

        Ok(forms
            .into_iter()
            .map(|form| {
                let fields = fields.remove(&form.id).unwrap_or_default();
                FormDetail { form, fields }
            })
            .collect())
    }

    pub async fn get_form(&self, id: Uuid, scope: TenantScope) -> Result<FormDetail, AppError> {
        let form = self.find_form(id, scope).await?;
        let fields = self.form_repo.list_fields(form.id).await?;
        Ok(FormDetail { form, fields })
    }

    /// Cria o formulário já com os campos GIS (latitude/longitude), tudo ou nada.
    pub async fn create_form(&self, scope: TenantScope, payload: &CreateFormPayload) -> Result<FormDetail, AppError> {
        let category = self
            .organization_repo
            .find_category(payload.category_id, scope.filter()?)
            .await?
            .ok_or(AppError::NotFound("category"))?;

        let mut tx = self.pool.begin().await?;

        let form = self
            .form_repo
            .insert_form(&mut *tx, &category, &payload.name, &payload.description)
            .await?;

        let mut fields = Vec::with_capacity(2);
        for field in NewFormField::gis_defaults() {
            fields.push(self.form_repo.insert_field(&mut *tx, form.id, &field).await?);
        }

        tx.commit().await?;

        tracing::info!("📝 Formulário '{}' criado na categoria '{}'", form.name, category.name);
        Ok(FormDetail { form, fields })
    }

    pub async fn update_form(
        &self,
        id: Uuid,
        scope: TenantScope,
        payload: &UpdateFormPayload,
    ) -> Result<FormDetail, AppError> {
        let form = self
            .form_repo
            .update_form(id, scope.filter()?, payload.name.as_deref(), payload.description.as_deref())
            .await?
            .ok_or(AppError::NotFound("form"))?;
        let fields = self.form_repo.list_fields(form.id).await?;
        Ok(FormDetail { form, fields })
    }

    pub async fn delete_form(&self, id: Uuid, scope: TenantScope) -> Result<(), AppError> {
        if !self.form_repo.delete_form(id, scope.filter()?).await? {
            return Err(AppError::NotFound("form"));
        }
        Ok(())
    }

    pub async fn add_field(&self, form_id: Uuid, scope: TenantScope, payload: AddFieldPayload) -> Result<FormField, AppError> {
        let form = self.find_form(form_id, scope).await?;
        let field: NewFormField = payload.into();
        self.form_repo.insert_field(&self.pool, form.id, &field).await
    }

    // ---
    // SUBMISSÕES
    // ---

    async fn present(&self, rows: Vec<SubmissionRow>) -> Result<Vec<SubmissionResponse>, AppError> {
        let mut form_ids: Vec<Uuid> = rows.iter().map(|r| r.form_id).collect();
        form_ids.sort();
        form_ids.dedup();
        let fields = fields_by_form(self.form_repo.fields_for_forms(&form_ids).await?);

        Ok(rows
            .into_iter()
            .map(|row| {
                let form_fields = fields.get(&row.form_id).map(Vec::as_slice).unwrap_or(&[]);
                SubmissionResponse::from_row(row, form_fields)
            })
            .collect())
    }

    pub async fn list_submissions(
        &self,
        scope: TenantScope,
        form_id: Option<Uuid>,
    ) -> Result<Vec<SubmissionResponse>, AppError> {
        let rows = self.form_repo.list_submissions(scope.filter()?, form_id).await?;
        self.present(rows).await
    }

    // GET /forms/{id}/submissions
    pub async fn form_submissions(&self, form_id: Uuid, scope: TenantScope) -> Result<Vec<SubmissionResponse>, AppError> {
        let form = self.find_form(form_id, scope).await?;
        let rows = self.form_repo.list_submissions(Some(form.client_id), Some(form.id)).await?;
        self.present(rows).await
    }

    pub async fn get_submission(&self, id: Uuid, scope: TenantScope) -> Result<SubmissionResponse, AppError> {
        let row = self
            .form_repo
            .find_submission(id, scope.filter()?)
            .await?
            .ok_or(AppError::NotFound("submission"))?;
        let fields = self.form_repo.list_fields(row.form_id).await?;
        Ok(SubmissionResponse::from_row(row, &fields))
    }

    pub async fn create_submission(
        &self,
        scope: TenantScope,
        submitted_by: Uuid,
        payload: &CreateSubmissionPayload,
    ) -> Result<SubmissionResponse, AppError> {
        let form = self.find_form(payload.form, scope).await?;
        let submission = self
            .form_repo
            .insert_submission(&form, &payload.data, submitted_by)
            .await?;

        tracing::info!("📨 Nova submissão {} no formulário '{}'", submission.id, form.name);
        self.get_submission(submission.id, TenantScope::Client(form.client_id)).await
    }

    pub async fn delete_submission(&self, id: Uuid, scope: TenantScope) -> Result<(), AppError> {
        if !self.form_repo.delete_submission(id, scope.filter()?).await? {
            return Err(AppError::NotFound("submission"));
        }
        Ok(())
    }
}
