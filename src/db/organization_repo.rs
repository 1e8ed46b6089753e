// src/db/organization_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::organization::{Category, Department},
};

// Departamentos e categorias. Todas as leituras aceitam o filtro de cliente
// (`scope`); None = operador da plataforma, sem filtro.
#[derive(Clone)]
pub struct OrganizationRepository {
    pool: PgPool,
}

impl OrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // --- DEPARTAMENTOS ---

    pub async fn list_departments(&self, scope: Option<Uuid>) -> Result<Vec<Department>, AppError> {
        let departments = sqlx::query_as::<_, Department>(
            "SELECT * FROM departments WHERE ($1::uuid IS NULL OR client_id = $1) ORDER BY name ASC",
        )
        .bind(scope)
        .fetch_all(&self.pool)
        .await?;
        Ok(departments)
    }

    pub async fn find_department(&self, id: Uuid, scope: Option<Uuid>) -> Result<Option<Department>, AppError> {
        let department = sqlx::query_as::<_, Department>(
            "SELECT * FROM departments WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)",
        )
        .bind(id)
        .bind(scope)
        .fetch_optional(&self.pool)
        .await?;
        Ok(department)
    }

    pub async fn create_department(&self, client_id: Uuid, name: &str) -> Result<Department, AppError> {
        let department = sqlx::query_as::<_, Department>(
            "INSERT INTO departments (client_id, name) VALUES ($1, $2) RETURNING *",
        )
        .bind(client_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(department)
    }

    pub async fn update_department(
        &self,
        id: Uuid,
        scope: Option<Uuid>,
        name: Option<&str>,
    ) -> Result<Option<Department>, AppError> {
        let department = sqlx::query_as::<_, Department>(
            r#"
            UPDATE departments SET name = COALESCE($3, name)
            WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(scope)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(department)
    }

    pub async fn delete_department(&self, id: Uuid, scope: Option<Uuid>) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM departments WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)")
            .bind(id)
            .bind(scope)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // Departamentos de um cliente específico (árvore do dashboard)
    pub async fn departments_of_client(&self, client_id: Uuid) -> Result<Vec<Department>, AppError> {
        self.list_departments(Some(client_id)).await
    }

    // --- CATEGORIAS ---

    pub async fn list_categories(
        &self,
        scope: Option<Uuid>,
        department_id: Option<Uuid>,
    ) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT * FROM categories
            WHERE ($1::uuid IS NULL OR client_id = $1)
              AND ($2::uuid IS NULL OR department_id = $2)
            ORDER BY name ASC
            "#,
        )
        .bind(scope)
        .bind(department_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    pub async fn find_category(&self, id: Uuid, scope: Option<Uuid>) -> Result<Option<Category>, AppError> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)",
        )
        .bind(id)
        .bind(scope)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    // O client_id vem do departamento pai
    pub async fn create_category(&self, department: &Department, name: &str) -> Result<Category, AppError> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (client_id, department_id, name) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(department.client_id)
        .bind(department.id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(category)
    }

    pub async fn update_category(
        &self,
        id: Uuid,
        scope: Option<Uuid>,
        name: Option<&str>,
        department_id: Option<Uuid>,
    ) -> Result<Option<Category>, AppError> {
        // O novo departamento precisa ser do mesmo cliente da categoria
        let category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories SET
                name = COALESCE($3, name),
                department_id = COALESCE($4, department_id)
            WHERE id = $1
              AND ($2::uuid IS NULL OR client_id = $2)
              AND ($4::uuid IS NULL OR EXISTS (
                    SELECT 1 FROM departments d
                    WHERE d.id = $4 AND d.client_id = categories.client_id))
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(scope)
        .bind(name)
        .bind(department_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    pub async fn delete_category(&self, id: Uuid, scope: Option<Uuid>) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)")
            .bind(id)
            .bind(scope)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
