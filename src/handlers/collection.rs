// src/handlers/collection.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::collection::{
        AddEntryPayload, CollectionEntry, CollectionSession, SessionDetail, SessionStatus,
        StartSessionPayload, UpdateLocationPayload,
    },
};

// GET /api/collection-sessions
#[utoipa::path(
    get,
    path = "/api/collection-sessions",
    tag = "Coleta",
    responses((status = 200, description = "Sessões do coletor (staff: todas)", body = Vec<CollectionSession>)),
    security(("api_jwt" = []))
)]
pub async fn list_sessions(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let sessions = app_state
        .collection_service
        .list_sessions(&tenant.user, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(sessions)))
}

// POST /api/collection-sessions
#[utoipa::path(
    post,
    path = "/api/collection-sessions",
    tag = "Coleta",
    request_body = StartSessionPayload,
    responses(
        (status = 201, description = "Sessão iniciada", body = CollectionSession),
        (status = 404, description = "Formulário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn start_session(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<StartSessionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let session = app_state
        .collection_service
        .start_session(&tenant.user, tenant.scope, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(session)))
}

// GET /api/collection-sessions/{id}
#[utoipa::path(
    get,
    path = "/api/collection-sessions/{id}",
    tag = "Coleta",
    params(("id" = Uuid, Path, description = "ID da sessão")),
    responses(
        (status = 200, description = "Sessão com as entradas", body = SessionDetail),
        (status = 404, description = "Sessão não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_session(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = app_state
        .collection_service
        .get_session(id, &tenant.user, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(session)))
}

// DELETE /api/collection-sessions/{id}
#[utoipa::path(
    delete,
    path = "/api/collection-sessions/{id}",
    tag = "Coleta",
    params(("id" = Uuid, Path, description = "ID da sessão")),
    responses(
        (status = 204, description = "Sessão removida"),
        (status = 404, description = "Sessão não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_session(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .collection_service
        .delete_session(id, &tenant.user, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/collection-sessions/{id}/update_location
#[utoipa::path(
    post,
    path = "/api/collection-sessions/{id}/update_location",
    tag = "Coleta",
    params(("id" = Uuid, Path, description = "ID da sessão")),
    request_body = UpdateLocationPayload,
    responses(
        (status = 200, description = "Posição registrada", body = SessionStatus),
        (status = 400, description = "Localização ausente ou inválida"),
        (status = 409, description = "Sessão encerrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_location(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let status = app_state
        .collection_service
        .update_location(id, &tenant.user, tenant.scope, payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(status)))
}

// POST /api/collection-sessions/{id}/add_entry
#[utoipa::path(
    post,
    path = "/api/collection-sessions/{id}/add_entry",
    tag = "Coleta",
    params(("id" = Uuid, Path, description = "ID da sessão")),
    request_body = AddEntryPayload,
    responses(
        (status = 201, description = "Entrada registrada", body = CollectionEntry),
        (status = 400, description = "field_id/value ausentes ou campo de outro formulário"),
        (status = 409, description = "Sessão encerrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_entry(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddEntryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = app_state
        .collection_service
        .add_entry(id, &tenant.user, tenant.scope, payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(entry)))
}

// POST /api/collection-sessions/{id}/end_session
#[utoipa::path(
    post,
    path = "/api/collection-sessions/{id}/end_session",
    tag = "Coleta",
    params(("id" = Uuid, Path, description = "ID da sessão")),
    responses(
        (status = 200, description = "Sessão encerrada", body = SessionStatus),
        (status = 404, description = "Sessão não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn end_session(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let status = app_state
        .collection_service
        .end_session(id, &tenant.user, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(status)))
}
