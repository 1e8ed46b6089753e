// src/services/organization_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::OrganizationRepository,
    middleware::tenancy::TenantScope,
    models::organization::{
        Category, CreateCategoryPayload, CreateDepartmentPayload, Department,
        UpdateCategoryPayload, UpdateDepartmentPayload,
    },
};

#[derive(Clone)]
pub struct OrganizationService {
    repo: OrganizationRepository,
}

impl OrganizationService {
    pub fn new(repo: OrganizationRepository) -> Self {
        Self { repo }
    }

    // --- DEPARTAMENTOS ---

    pub async fn list_departments(&self, scope: TenantScope) -> Result<Vec<Department>, AppError> {
        self.repo.list_departments(scope.filter()?).await
    }

    pub async fn get_department(&self, id: Uuid, scope: TenantScope) -> Result<Department, AppError> {
        self.repo
            .find_department(id, scope.filter()?)
            .await?
            .ok_or(AppError::NotFound("department"))
    }

    pub async fn create_department(
        &self,
        scope: TenantScope,
        payload: &CreateDepartmentPayload,
    ) -> Result<Department, AppError> {
        let client_id = scope.owner(payload.client_id)?;
        self.repo.create_department(client_id, &payload.name).await
    }

    pub async fn update_department(
        &self,
        id: Uuid,
        scope: TenantScope,
        payload: &UpdateDepartmentPayload,
    ) -> Result<Department, AppError> {
        self.repo
            .update_department(id, scope.filter()?, payload.name.as_deref())
            .await?
            .ok_or(AppError::NotFound("department"))
    }

    pub async fn delete_department(&self, id: Uuid, scope: TenantScope) -> Result<(), AppError> {
        if !self.repo.delete_department(id, scope.filter()?).await? {
            return Err(AppError::NotFound("department"));
        }
        Ok(())
    }

    // GET /departments/{id}/categories
    pub async fn department_categories(&self, id: Uuid, scope: TenantScope) -> Result<Vec<Category>, AppError> {
        let department = self.get_department(id, scope).await?;
        self.repo.list_categories(Some(department.client_id), Some(department.id)).await
    }

    // --- CATEGORIAS ---

    pub async fn list_categories(
        &self,
        scope: TenantScope,
        department_id: Option<Uuid>,
    ) -> Result<Vec<Category>, AppError> {
        self.repo.list_categories(scope.filter()?, department_id).await
    }

    pub async fn get_category(&self, id: Uuid, scope: TenantScope) -> Result<Category, AppError> {
        self.repo
            .find_category(id, scope.filter()?)
            .await?
            .ok_or(AppError::NotFound("category"))
    }

    pub async fn create_category(
        &self,
        scope: TenantScope,
        payload: &CreateCategoryPayload,
    ) -> Result<Category, AppError> {
        // O departamento precisa estar visível para quem cria
        let department = self.get_department(payload.department_id, scope).await?;
        self.repo.create_category(&department, &payload.name).await
    }

    pub async fn update_category(
        &self,
        id: Uuid,
        scope: TenantScope,
        payload: &UpdateCategoryPayload,
    ) -> Result<Category, AppError> {
        let filter = scope.filter()?;
        let current = self
            .repo
            .find_category(id, filter)
            .await?
            .ok_or(AppError::NotFound("category"))?;

        self.repo
            .update_category(current.id, filter, payload.name.as_deref(), payload.department_id)
            .await?
            // Só chega aqui sem linha se o departamento for de outro cliente
            .ok_or(AppError::NotFound("department"))
    }

    pub async fn delete_category(&self, id: Uuid, scope: TenantScope) -> Result<(), AppError> {
        if !self.repo.delete_category(id, scope.filter()?).await? {
            return Err(AppError::NotFound("category"));
        }
        Ok(())
    }
}
