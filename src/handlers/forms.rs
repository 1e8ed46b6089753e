// src/handlers/forms.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::forms::{
        AddFieldPayload, CreateFormPayload, CreateSubmissionPayload, FormDetail, FormField,
        FormFilter, SubmissionFilter, SubmissionResponse, UpdateFormPayload,
    },
};

// =============================================================================
//  ÁREA 1: FORMULÁRIOS
// =============================================================================

// GET /api/forms?category=
#[utoipa::path(
    get,
    path = "/api/forms",
    tag = "Formulários",
    params(FormFilter),
    responses((status = 200, description = "Formulários com os campos", body = Vec<FormDetail>)),
    security(("api_jwt" = []))
)]
pub async fn list_forms(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Query(filter): Query<FormFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let forms = app_state
        .form_service
        .list_forms(tenant.scope, filter.category)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(forms)))
}

// POST /api/forms
#[utoipa::path(
    post,
    path = "/api/forms",
    tag = "Formulários",
    request_body = CreateFormPayload,
    responses(
        (status = 201, description = "Formulário criado já com latitude/longitude", body = FormDetail),
        (status = 404, description = "Categoria não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_form(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<CreateFormPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let form = app_state
        .form_service
        .create_form(tenant.scope, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(form)))
}

// GET /api/forms/{id}
#[utoipa::path(
    get,
    path = "/api/forms/{id}",
    tag = "Formulários",
    params(("id" = Uuid, Path, description = "ID do formulário")),
    responses(
        (status = 200, description = "Formulário", body = FormDetail),
        (status = 404, description = "Formulário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_form(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let form = app_state
        .form_service
        .get_form(id, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(form)))
}

// PATCH /api/forms/{id}
#[utoipa::path(
    patch,
    path = "/api/forms/{id}",
    tag = "Formulários",
    params(("id" = Uuid, Path, description = "ID do formulário")),
    request_body = UpdateFormPayload,
    responses(
        (status = 200, description = "Formulário atualizado", body = FormDetail),
        (status = 404, description = "Formulário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_form(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFormPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let form = app_state
        .form_service
        .update_form(id, tenant.scope, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(form)))
}

// DELETE /api/forms/{id}
#[utoipa::path(
    delete,
    path = "/api/forms/{id}",
    tag = "Formulários",
    params(("id" = Uuid, Path, description = "ID do formulário")),
    responses(
        (status = 204, description = "Formulário removido"),
        (status = 404, description = "Formulário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_form(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .form_service
        .delete_form(id, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/forms/{id}/add_field
#[utoipa::path(
    post,
    path = "/api/forms/{id}/add_field",
    tag = "Formulários",
    params(("id" = Uuid, Path, description = "ID do formulário")),
    request_body = AddFieldPayload,
    responses(
        (status = 201, description = "Campo adicionado", body = FormField),
        (status = 404, description = "Formulário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_field(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddFieldPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let field = app_state
        .form_service
        .add_field(id, tenant.scope, payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(field)))
}

// GET /api/forms/{id}/submissions
#[utoipa::path(
    get,
    path = "/api/forms/{id}/submissions",
    tag = "Formulários",
    params(("id" = Uuid, Path, description = "ID do formulário")),
    responses(
        (status = 200, description = "Submissões do formulário", body = Vec<SubmissionResponse>),
        (status = 404, description = "Formulário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn form_submissions(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let submissions = app_state
        .form_service
        .form_submissions(id, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(submissions)))
}

// =============================================================================
//  ÁREA 2: SUBMISSÕES (imutáveis: sem PATCH)
// =============================================================================

// GET /api/submissions?form=
#[utoipa::path(
    get,
    path = "/api/submissions",
    tag = "Submissões",
    params(SubmissionFilter),
    responses((status = 200, description = "Submissões visíveis", body = Vec<SubmissionResponse>)),
    security(("api_jwt" = []))
)]
pub async fn list_submissions(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Query(filter): Query<SubmissionFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let submissions = app_state
        .form_service
        .list_submissions(tenant.scope, filter.form)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(submissions)))
}

// POST /api/submissions
#[utoipa::path(
    post,
    path = "/api/submissions",
    tag = "Submissões",
    request_body = CreateSubmissionPayload,
    responses(
        (status = 201, description = "Submissão registrada", body = SubmissionResponse),
        (status = 400, description = "data precisa ser um objeto"),
        (status = 404, description = "Formulário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_submission(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<CreateSubmissionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let submission = app_state
        .form_service
        .create_submission(tenant.scope, tenant.user.id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(submission)))
}

// GET /api/submissions/{id}
#[utoipa::path(
    get,
    path = "/api/submissions/{id}",
    tag = "Submissões",
    params(("id" = Uuid, Path, description = "ID da submissão")),
    responses(
        (status = 200, description = "Submissão", body = SubmissionResponse),
        (status = 404, description = "Submissão não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_submission(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let submission = app_state
        .form_service
        .get_submission(id, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(submission)))
}

// DELETE /api/submissions/{id}
#[utoipa::path(
    delete,
    path = "/api/submissions/{id}",
    tag = "Submissões",
    params(("id" = Uuid, Path, description = "ID da submissão")),
    responses(
        (status = 204, description = "Submissão removida"),
        (status = 404, description = "Submissão não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_submission(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .form_service
        .delete_submission(id, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
