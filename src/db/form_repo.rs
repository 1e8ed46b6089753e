// src/db/form_repo.rs

use serde_json::Value;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        forms::{Form, FormField, FormSubmission, NewFormField, SubmissionRow},
        organization::Category,
    },
};

// Submissão + nome do formulário + quem enviou
const SUBMISSION_SELECT: &str = r#"
    SELECT s.id, s.form_id, s.data, s.submitted_by,
           u.username, u.email, u.first_name, u.last_name, s.created_at
    FROM form_submissions s
    JOIN users u ON u.id = s.submitted_by
"#;

#[derive(Clone)]
pub struct FormRepository {
    pool: PgPool,
}

impl FormRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // FORMULÁRIOS
    // ---

    pub async fn list_forms(
        &self,
        scope: Option<Uuid>,
        category_id: Option<Uuid>,
    ) -> Result<Vec<Form>, AppError> {
        let forms = sqlx::query_as::<_, Form>(
            r#"
            SELECT * FROM forms
            WHERE ($1::uuid IS NULL OR client_id = $1)
              AND ($2::uuid IS NULL OR category_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(scope)
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(forms)
    }

    pub async fn find_form(&self, id: Uuid, scope: Option<Uuid>) -> Result<Option<Form>, AppError> {
        let form = sqlx::query_as::<_, Form>(
            "SELECT * FROM forms WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)",
        )
        .bind(id)
        .bind(scope)
        .fetch_optional(&self.pool)
        .await?;
        Ok(form)
    }

    // Primeiro formulário (mais antigo) de uma categoria
    pub async fn first_form_of_category(&self, category_id: Uuid) -> Result<Option<Form>, AppError> {
        let form = sqlx::query_as::<_, Form>(
            "SELECT * FROM forms WHERE category_id = $1 ORDER BY created_at ASC, id ASC LIMIT 1",
        )
        .bind(category_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(form)
    }

    pub async fn insert_form<'e, E>(
        &self,
        executor: E,
        category: &Category,
        name: &str,
        description: &str,
    ) -> Result<Form, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let form = sqlx::query_as::<_, Form>(
            r#"
            INSERT INTO forms (client_id, category_id, name, description)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(category.client_id)
        .bind(category.id)
        .bind(name)
        .bind(description)
        .fetch_one(executor)
        .await?;
        Ok(form)
    }

    pub async fn update_form(
        &self,
        id: Uuid,
        scope: Option<Uuid>,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Form>, AppError> {
        let form = sqlx::query_as::<_, Form>(
            r#"
            UPDATE forms SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                updated_at = NOW()
            WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(scope)
        .bind(name)
        .bind(description)
        .fetch_optional(&self.pool)
        .await?;
        Ok(form)
    }

    pub async fn delete_form(&self, id: Uuid, scope: Option<Uuid>) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM forms WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)")
            .bind(id)
            .bind(scope)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---
    // CAMPOS
    // ---

    pub async fn insert_field<'e, E>(
        &self,
        executor: E,
        form_id: Uuid,
        field: &NewFormField,
    ) -> Result<FormField, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let field = sqlx::query_as::<_, FormField>(
            r#"
            INSERT INTO form_fields (form_id, name, label, field_type, required, options, field_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(form_id)
        .bind(&field.name)
        .bind(&field.label)
        .bind(field.field_type)
        .bind(field.required)
        .bind(field.options.clone())
        .bind(field.order)
        .fetch_one(executor)
        .await?;
        Ok(field)
    }

    pub async fn list_fields(&self, form_id: Uuid) -> Result<Vec<FormField>, AppError> {
        let fields = sqlx::query_as::<_, FormField>(
            "SELECT * FROM form_fields WHERE form_id = $1 ORDER BY field_order ASC, created_at ASC",
        )
        .bind(form_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(fields)
    }

    // Campos de vários formulários de uma vez (listagens)
    pub async fn fields_for_forms(&self, form_ids: &[Uuid]) -> Result<Vec<FormField>, AppError> {
        let fields = sqlx::query_as::<_, FormField>(
            "SELECT * FROM form_fields WHERE form_id = ANY($1) ORDER BY field_order ASC, created_at ASC",
        )
        .bind(form_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(fields)
    }

    pub async fn find_field(&self, field_id: Uuid) -> Result<Option<FormField>, AppError> {
        let field = sqlx::query_as::<_, FormField>("SELECT * FROM form_fields WHERE id = $1")
            .bind(field_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(field)
    }

    // ---
    // SUBMISSÕES (imutáveis: sem UPDATE)
    // ---

    pub async fn insert_submission(
        &self,
        form: &Form,
        data: &Value,
        submitted_by: Uuid,
    ) -> Result<FormSubmission, AppError> {
        let submission = sqlx::query_as::<_, FormSubmission>(
            r#"
            INSERT INTO form_submissions (client_id, form_id, data, submitted_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(form.client_id)
        .bind(form.id)
        .bind(data)
        .bind(submitted_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(submission)
    }

    pub async fn list_submissions(
        &self,
        scope: Option<Uuid>,
        form_id: Option<Uuid>,
    ) -> Result<Vec<SubmissionRow>, AppError> {
        let sql = format!(
            "{} WHERE ($1::uuid IS NULL OR s.client_id = $1) AND ($2::uuid IS NULL OR s.form_id = $2) \
             ORDER BY s.created_at DESC",
            SUBMISSION_SELECT
        );
        let rows = sqlx::query_as::<_, SubmissionRow>(&sql)
            .bind(scope)
            .bind(form_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn find_submission(&self, id: Uuid, scope: Option<Uuid>) -> Result<Option<SubmissionRow>, AppError> {
        let sql = format!(
            "{} WHERE s.id = $1 AND ($2::uuid IS NULL OR s.client_id = $2)",
            SUBMISSION_SELECT
        );
        let row = sqlx::query_as::<_, SubmissionRow>(&sql)
            .bind(id)
            .bind(scope)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn delete_submission(&self, id: Uuid, scope: Option<Uuid>) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM form_submissions WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)",
        )
        .bind(id)
        .bind(scope)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // Submissões de um formulário, na ordem de chegada (preview dos dashboards)
    pub async fn submissions_of_form(&self, form_id: Uuid) -> Result<Vec<FormSubmission>, AppError> {
        let rows = sqlx::query_as::<_, FormSubmission>(
            "SELECT * FROM form_submissions WHERE form_id = $1 ORDER BY created_at ASC",
        )
        .bind(form_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
