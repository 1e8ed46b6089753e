// src/db/collection_repo.rs

use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        collection::{CollectionEntry, CollectionSession, EntryResponse},
        forms::Form,
    },
};

// A posição carimbada na entrada é lida na mesma instrução que confere a sessão aberta.
const INSERT_ENTRY_IF_OPEN: &str = r#"
    INSERT INTO collection_entries (session_id, form_field_id, value, location)
    SELECT s.id, $2, $3, COALESCE(s.current_location, '{}'::jsonb)
    FROM collection_sessions s
    WHERE s.id = $1 AND s.is_active AND s.end_time IS NULL
    RETURNING *
"#;

// Sessões de coleta em campo.
// `scope` filtra por cliente e `owner` pelo coletor (None = staff, vê todas).
#[derive(Clone)]
pub struct CollectionRepository {
    pool: PgPool,
}

impl CollectionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_sessions(
        &self,
        scope: Option<Uuid>,
        owner: Option<Uuid>,
    ) -> Result<Vec<CollectionSession>, AppError> {
        let rows = sqlx::query_as::<_, CollectionSession>(
            r#"
            SELECT * FROM collection_sessions
            WHERE ($1::uuid IS NULL OR client_id = $1)
              AND ($2::uuid IS NULL OR user_id = $2)
            ORDER BY start_time DESC
            "#,
        )
        .bind(scope)
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_session(
        &self,
        id: Uuid,
        scope: Option<Uuid>,
        owner: Option<Uuid>,
    ) -> Result<Option<CollectionSession>, AppError> {
        let row = sqlx::query_as::<_, CollectionSession>(
            r#"
            SELECT * FROM collection_sessions
            WHERE id = $1
              AND ($2::uuid IS NULL OR client_id = $2)
              AND ($3::uuid IS NULL OR user_id = $3)
            "#,
        )
        .bind(id)
        .bind(scope)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    // Abre a sessão: ativa, sem fim, sem posição
    pub async fn create_session(&self, form: &Form, user_id: Uuid) -> Result<CollectionSession, AppError> {
        let row = sqlx::query_as::<_, CollectionSession>(
            r#"
            INSERT INTO collection_sessions (client_id, user_id, form_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(form.client_id)
        .bind(user_id)
        .bind(form.id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    // None se a sessão já foi encerrada
    pub async fn set_location(&self, id: Uuid, location: &Value) -> Result<Option<CollectionSession>, AppError> {
        let row = sqlx::query_as::<_, CollectionSession>(
            r#"
            UPDATE collection_sessions SET current_location = $2
            WHERE id = $1 AND is_active AND end_time IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(location)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    // Repetir carimba um novo end_time
    pub async fn end_session(&self, id: Uuid) -> Result<CollectionSession, AppError> {
        let row = sqlx::query_as::<_, CollectionSession>(
            r#"
            UPDATE collection_sessions SET is_active = FALSE, end_time = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete_session(&self, id: Uuid, scope: Option<Uuid>, owner: Option<Uuid>) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM collection_sessions
            WHERE id = $1
              AND ($2::uuid IS NULL OR client_id = $2)
              AND ($3::uuid IS NULL OR user_id = $3)
            "#,
        )
        .bind(id)
        .bind(scope)
        .bind(owner)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // None se a sessão foi encerrada entre a leitura e a escrita
    pub async fn insert_entry(
        &self,
        session_id: Uuid,
        field_id: Uuid,
        value: &Value,
    ) -> Result<Option<CollectionEntry>, AppError> {
        let row = sqlx::query_as::<_, CollectionEntry>(INSERT_ENTRY_IF_OPEN)
            .bind(session_id)
            .bind(field_id)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn list_entries(&self, session_id: Uuid) -> Result<Vec<EntryResponse>, AppError> {
        let rows = sqlx::query_as::<_, EntryResponse>(
            r#"
            SELECT e.id, ff.label AS field_label, ff.field_type, e.value, e.location, e.timestamp
            FROM collection_entries e
            JOIN form_fields ff ON ff.id = e.form_field_id
            WHERE e.session_id = $1
            ORDER BY e.timestamp ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(sql: &str) -> String {
        sql.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn entry_insert_is_guarded_by_open_session() {
        let sql = normalized(INSERT_ENTRY_IF_OPEN);
        assert!(sql.contains("WHERE s.id = $1 AND s.is_active AND s.end_time IS NULL"));
        assert!(!sql.contains("VALUES"));
    }

    #[test]
    fn entry_location_is_taken_from_the_session_row() {
        let sql = normalized(INSERT_ENTRY_IF_OPEN);
        assert!(sql.contains("COALESCE(s.current_location, '{}'::jsonb)"));
        assert!(sql.contains("FROM collection_sessions s"));
    }
}
