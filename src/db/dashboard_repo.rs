// src/db/dashboard_repo.rs

use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        dashboard::{
            BreakdownRow, CategoryCountsRow, CreateDashboardPayload, DashboardConfig,
            RecentSubmission, UpdateDashboardPayload,
        },
        forms::Form,
    },
};

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // CONFIGURAÇÕES DE DASHBOARD
    // ---

    pub async fn list_configs(&self, scope: Option<Uuid>) -> Result<Vec<DashboardConfig>, AppError> {
        let rows = sqlx::query_as::<_, DashboardConfig>(
            "SELECT * FROM dashboard_configs WHERE ($1::uuid IS NULL OR client_id = $1) ORDER BY name ASC",
        )
        .bind(scope)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_config(&self, id: Uuid, scope: Option<Uuid>) -> Result<Option<DashboardConfig>, AppError> {
        let row = sqlx::query_as::<_, DashboardConfig>(
            "SELECT * FROM dashboard_configs WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)",
        )
        .bind(id)
        .bind(scope)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    // O client_id vem do formulário
    pub async fn create_config(&self, form: &Form, payload: &CreateDashboardPayload) -> Result<DashboardConfig, AppError> {
        let row = sqlx::query_as::<_, DashboardConfig>(
            r#"
            INSERT INTO dashboard_configs (client_id, form_id, name, description, visualization_type, chart_type, config)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(form.client_id)
        .bind(form.id)
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(payload.visualization_type)
        .bind(payload.chart_type)
        .bind(payload.config.clone().unwrap_or_else(|| json!({})))
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_config(
        &self,
        id: Uuid,
        scope: Option<Uuid>,
        payload: &UpdateDashboardPayload,
    ) -> Result<Option<DashboardConfig>, AppError> {
        let row = sqlx::query_as::<_, DashboardConfig>(
            r#"
            UPDATE dashboard_configs SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                visualization_type = COALESCE($5, visualization_type),
                chart_type = COALESCE($6, chart_type),
                config = COALESCE($7, config),
                updated_at = NOW()
            WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(scope)
        .bind(payload.name.as_deref())
        .bind(payload.description.as_deref())
        .bind(payload.visualization_type)
        .bind(payload.chart_type)
        .bind(payload.config.clone())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete_config(&self, id: Uuid, scope: Option<Uuid>) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM dashboard_configs WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)",
        )
        .bind(id)
        .bind(scope)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---
    // CONTAGENS PARA /dashboards/stats
    // ---

    pub async fn count_forms(&self, client_id: Uuid) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM forms WHERE client_id = $1")
            .bind(client_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    pub async fn count_submissions(&self, client_id: Uuid) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM form_submissions WHERE client_id = $1",
        )
        .bind(client_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    pub async fn count_open_incidences(&self, client_id: Uuid) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM incidences WHERE client_id = $1 AND status = 'open'",
        )
        .bind(client_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    pub async fn count_active_users(&self, client_id: Uuid) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM client_users WHERE client_id = $1 AND is_active",
        )
        .bind(client_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    // Janela [start, end); end = None deixa a janela aberta
    pub async fn submissions_between(
        &self,
        client_id: Uuid,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM form_submissions
            WHERE client_id = $1 AND created_at >= $2
              AND ($3::timestamptz IS NULL OR created_at < $3)
            "#,
        )
        .bind(client_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    pub async fn open_incidences_between(
        &self,
        client_id: Uuid,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM incidences
            WHERE client_id = $1 AND status = 'open' AND created_at >= $2
              AND ($3::timestamptz IS NULL OR created_at < $3)
            "#,
        )
        .bind(client_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    // Formulários com pelo menos uma submissão
    pub async fn count_forms_with_submissions(&self, client_id: Uuid) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM forms f
            WHERE f.client_id = $1
              AND EXISTS (SELECT 1 FROM form_submissions s WHERE s.form_id = f.id)
            "#,
        )
        .bind(client_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    pub async fn breakdown_by_category(&self, client_id: Uuid) -> Result<Vec<BreakdownRow>, AppError> {
        let rows = sqlx::query_as::<_, BreakdownRow>(
            r#"
            SELECT c.name,
                   COUNT(DISTINCT f.id) AS forms_count,
                   COUNT(s.id) AS submissions_count
            FROM categories c
            LEFT JOIN forms f ON f.category_id = c.id
            LEFT JOIN form_submissions s ON s.form_id = f.id
            WHERE c.client_id = $1
            GROUP BY c.id, c.name
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn breakdown_by_department(&self, client_id: Uuid) -> Result<Vec<BreakdownRow>, AppError> {
        let rows = sqlx::query_as::<_, BreakdownRow>(
            r#"
            SELECT d.name,
                   COUNT(DISTINCT f.id) AS forms_count,
                   COUNT(s.id) AS submissions_count
            FROM departments d
            LEFT JOIN categories c ON c.department_id = d.id
            LEFT JOIN forms f ON f.category_id = c.id
            LEFT JOIN form_submissions s ON s.form_id = f.id
            WHERE d.client_id = $1
            GROUP BY d.id, d.name
            ORDER BY d.created_at ASC
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn recent_submissions(&self, client_id: Uuid, limit: i64) -> Result<Vec<RecentSubmission>, AppError> {
        let rows = sqlx::query_as::<_, RecentSubmission>(
            r#"
            SELECT f.name AS form_name, u.username, s.created_at
            FROM form_submissions s
            JOIN forms f ON f.id = s.form_id
            JOIN users u ON u.id = s.submitted_by
            WHERE s.client_id = $1
            ORDER BY s.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(client_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ---
    // ÁRVORE DE /clients/{id}/dashboard_data
    // ---

    pub async fn category_counts(&self, client_id: Uuid) -> Result<Vec<CategoryCountsRow>, AppError> {
        let rows = sqlx::query_as::<_, CategoryCountsRow>(
            r#"
            SELECT c.id, c.department_id, c.name,
                   (SELECT COUNT(*) FROM items i WHERE i.category_id = c.id) AS items_count,
                   (SELECT COUNT(*) FROM forms f WHERE f.category_id = c.id) AS forms_count,
                   (SELECT COUNT(*) FROM incidences inc
                        JOIN items i ON i.id = inc.item_id
                        WHERE i.category_id = c.id) AS incidences_count
            FROM categories c
            WHERE c.client_id = $1
            ORDER BY c.name ASC
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
