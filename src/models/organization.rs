// src/models/organization.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// Departamento: primeiro nível abaixo do cliente
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Department {
    pub id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

// Categoria: pertence a exatamente um departamento.
// `client_id` é copiado do departamento na inserção.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub client_id: Uuid,
    pub department_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

// --- PAYLOADS ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDepartmentPayload {
    // Obrigatório para o operador da plataforma; membros herdam o próprio cliente
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "O nome do departamento é obrigatório."))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateDepartmentPayload {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryPayload {
    pub department_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "O nome da categoria é obrigatório."))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryPayload {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    // Só pode mover para um departamento do mesmo cliente
    pub department_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategoryFilter {
    pub department: Option<Uuid>,
}
