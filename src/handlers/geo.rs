// src/handlers/geo.rs

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
    models::geo::{
        CreateFeaturePayload, CreateIncidencePayload, CreateItemPayload, CreateLayerPayload,
        FeatureFilter, IncidenceDashboard, IncidenceDetail, ItemFilter, ItemMapEntry, ItemResponse, MapFeature,
        MapLayerDetail, UpdateFeaturePayload, UpdateIncidencePayload, UpdateItemPayload,
        UpdateLayerPayload,
    },
};

// =============================================================================
//  ÁREA 1: ITENS
// =============================================================================

// GET /api/items?category=
#[utoipa::path(
    get,
    path = "/api/items",
    tag = "Itens",
    params(ItemFilter),
    responses((status = 200, description = "Itens com form_data", body = Vec<ItemResponse>)),
    security(("api_jwt" = []))
)]
pub async fn list_items(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Query(filter): Query<ItemFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let items = app_state
        .geo_service
        .list_items(tenant.scope, filter.category)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(items)))
}

// POST /api/items
#[utoipa::path(
    post,
    path = "/api/items",
    tag = "Itens",
    request_body = CreateItemPayload,
    responses(
        (status = 201, description = "Item criado", body = ItemResponse),
        (status = 400, description = "Coordenadas inválidas"),
        (status = 404, description = "Categoria não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_item(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<CreateItemPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let item = app_state
        .geo_service
        .create_item(tenant.scope, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(item)))
}

// GET /api/items/map_data?category=
#[utoipa::path(
    get,
    path = "/api/items/map_data",
    tag = "Itens",
    params(ItemFilter),
    responses((status = 200, description = "Itens prontos para o mapa", body = Vec<ItemMapEntry>)),
    security(("api_jwt" = []))
)]
pub async fn map_data(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Query(filter): Query<ItemFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = app_state
        .geo_service
        .map_data(tenant.scope, filter.category)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(entries)))
}

// GET /api/items/{id}
#[utoipa::path(
    get,
    path = "/api/items/{id}",
    tag = "Itens",
    params(("id" = Uuid, Path, description = "ID do item")),
    responses(
        (status = 200, description = "Item", body = ItemResponse),
        (status = 404, description = "Item não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_item(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let item = app_state
        .geo_service
        .get_item(id, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(item)))
}

// PATCH /api/items/{id}
#[utoipa::path(
    patch,
    path = "/api/items/{id}",
    tag = "Itens",
    params(("id" = Uuid, Path, description = "ID do item")),
    request_body = UpdateItemPayload,
    responses(
        (status = 200, description = "Item atualizado", body = ItemResponse),
        (status = 404, description = "Item não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_item(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateItemPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let item = app_state
        .geo_service
        .update_item(id, tenant.scope, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(item)))
}

// DELETE /api/items/{id}
#[utoipa::path(
    delete,
    path = "/api/items/{id}",
    tag = "Itens",
    params(("id" = Uuid, Path, description = "ID do item")),
    responses(
        (status = 204, description = "Item removido"),
        (status = 404, description = "Item não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_item(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .geo_service
        .delete_item(id, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  ÁREA 2: OCORRÊNCIAS
// =============================================================================

// GET /api/incidences
#[utoipa::path(
    get,
    path = "/api/incidences",
    tag = "Ocorrências",
    responses((status = 200, description = "Ocorrências com o item", body = Vec<IncidenceDetail>)),
    security(("api_jwt" = []))
)]
pub async fn list_incidences(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let incidences = app_state
        .geo_service
        .list_incidences(tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(incidences)))
}

// POST /api/incidences
#[utoipa::path(
    post,
    path = "/api/incidences",
    tag = "Ocorrências",
    request_body = CreateIncidencePayload,
    responses(
        (status = 201, description = "Ocorrência registrada", body = IncidenceDetail),
        (status = 404, description = "Item não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_incidence(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<CreateIncidencePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let incidence = app_state
        .geo_service
        .create_incidence(tenant.scope, tenant.user.id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(incidence)))
}

// GET /api/incidences/dashboard
#[utoipa::path(
    get,
    path = "/api/incidences/dashboard",
    tag = "Ocorrências",
    responses((status = 200, description = "Totais por severidade e status", body = IncidenceDashboard)),
    security(("api_jwt" = []))
)]
pub async fn incidence_dashboard(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let dashboard = app_state
        .geo_service
        .incidence_dashboard(tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(dashboard)))
}

// GET /api/incidences/{id}
#[utoipa::path(
    get,
    path = "/api/incidences/{id}",
    tag = "Ocorrências",
    params(("id" = Uuid, Path, description = "ID da ocorrência")),
    responses(
        (status = 200, description = "Ocorrência", body = IncidenceDetail),
        (status = 404, description = "Ocorrência não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_incidence(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let incidence = app_state
        .geo_service
        .get_incidence(id, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(incidence)))
}

// PATCH /api/incidences/{id}
#[utoipa::path(
    patch,
    path = "/api/incidences/{id}",
    tag = "Ocorrências",
    params(("id" = Uuid, Path, description = "ID da ocorrência")),
    request_body = UpdateIncidencePayload,
    responses(
        (status = 200, description = "Ocorrência atualizada", body = IncidenceDetail),
        (status = 404, description = "Ocorrência não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_incidence(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateIncidencePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let incidence = app_state
        .geo_service
        .update_incidence(id, tenant.scope, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(incidence)))
}

// DELETE /api/incidences/{id}
#[utoipa::path(
    delete,
    path = "/api/incidences/{id}",
    tag = "Ocorrências",
    params(("id" = Uuid, Path, description = "ID da ocorrência")),
    responses(
        (status = 204, description = "Ocorrência removida"),
        (status = 404, description = "Ocorrência não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_incidence(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .geo_service
        .delete_incidence(id, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  ÁREA 3: CAMADAS DO MAPA
// =============================================================================

// GET /api/map-layers
#[utoipa::path(
    get,
    path = "/api/map-layers",
    tag = "Camadas",
    responses((status = 200, description = "Camadas com as features", body = Vec<MapLayerDetail>)),
    security(("api_jwt" = []))
)]
pub async fn list_layers(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let layers = app_state
        .geo_service
        .list_layers(tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(layers)))
}

// POST /api/map-layers
#[utoipa::path(
    post,
    path = "/api/map-layers",
    tag = "Camadas",
    request_body = CreateLayerPayload,
    responses(
        (status = 201, description = "Camada criada", body = MapLayerDetail),
        (status = 400, description = "Cor ou opacidade inválidas")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_layer(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<CreateLayerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let layer = app_state
        .geo_service
        .create_layer(tenant.scope, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(layer)))
}

// GET /api/map-layers/{id}
#[utoipa::path(
    get,
    path = "/api/map-layers/{id}",
    tag = "Camadas",
    params(("id" = Uuid, Path, description = "ID da camada")),
    responses(
        (status = 200, description = "Camada", body = MapLayerDetail),
        (status = 404, description = "Camada não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_layer(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let layer = app_state
        .geo_service
        .get_layer(id, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(layer)))
}

// PATCH /api/map-layers/{id}
#[utoipa::path(
    patch,
    path = "/api/map-layers/{id}",
    tag = "Camadas",
    params(("id" = Uuid, Path, description = "ID da camada")),
    request_body = UpdateLayerPayload,
    responses(
        (status = 200, description = "Camada atualizada", body = MapLayerDetail),
        (status = 404, description = "Camada não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_layer(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLayerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let layer = app_state
        .geo_service
        .update_layer(id, tenant.scope, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(layer)))
}

// DELETE /api/map-layers/{id}
#[utoipa::path(
    delete,
    path = "/api/map-layers/{id}",
    tag = "Camadas",
    params(("id" = Uuid, Path, description = "ID da camada")),
    responses(
        (status = 204, description = "Camada removida"),
        (status = 404, description = "Camada não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_layer(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .geo_service
        .delete_layer(id, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/map-layers/{id}/add_feature
#[utoipa::path(
    post,
    path = "/api/map-layers/{id}/add_feature",
    tag = "Camadas",
    params(("id" = Uuid, Path, description = "ID da camada")),
    request_body = CreateFeaturePayload,
    responses(
        (status = 201, description = "Feature adicionada", body = MapFeature),
        (status = 404, description = "Camada não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_feature(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateFeaturePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let feature = app_state
        .geo_service
        .add_feature(id, tenant.scope, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(feature)))
}

// GET /api/map-layers/{id}/features
#[utoipa::path(
    get,
    path = "/api/map-layers/{id}/features",
    tag = "Camadas",
    params(("id" = Uuid, Path, description = "ID da camada")),
    responses(
        (status = 200, description = "Features da camada", body = Vec<MapFeature>),
        (status = 404, description = "Camada não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn layer_features(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let features = app_state
        .geo_service
        .layer_features(id, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(features)))
}

// =============================================================================
//  ÁREA 4: FEATURES
// =============================================================================

// GET /api/map-features?layer=
#[utoipa::path(
    get,
    path = "/api/map-features",
    tag = "Features",
    params(FeatureFilter),
    responses((status = 200, description = "Features visíveis", body = Vec<MapFeature>)),
    security(("api_jwt" = []))
)]
pub async fn list_features(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Query(filter): Query<FeatureFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let features = app_state
        .geo_service
        .list_features(tenant.scope, filter.layer)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(features)))
}

// POST /api/map-features
#[utoipa::path(
    post,
    path = "/api/map-features",
    tag = "Features",
    request_body = CreateFeaturePayload,
    responses(
        (status = 201, description = "Feature criada", body = MapFeature),
        (status = 400, description = "layer_id ausente"),
        (status = 404, description = "Camada não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_feature(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<CreateFeaturePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let feature = app_state
        .geo_service
        .create_feature(tenant.scope, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(feature)))
}

// GET /api/map-features/{id}
#[utoipa::path(
    get,
    path = "/api/map-features/{id}",
    tag = "Features",
    params(("id" = Uuid, Path, description = "ID da feature")),
    responses(
        (status = 200, description = "Feature", body = MapFeature),
        (status = 404, description = "Feature não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_feature(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let feature = app_state
        .geo_service
        .get_feature(id, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(feature)))
}

// PATCH /api/map-features/{id}
#[utoipa::path(
    patch,
    path = "/api/map-features/{id}",
    tag = "Features",
    params(("id" = Uuid, Path, description = "ID da feature")),
    request_body = UpdateFeaturePayload,
    responses(
        (status = 200, description = "Feature atualizada", body = MapFeature),
        (status = 404, description = "Feature não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_feature(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFeaturePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let feature = app_state
        .geo_service
        .update_feature(id, tenant.scope, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(feature)))
}

// DELETE /api/map-features/{id}
#[utoipa::path(
    delete,
    path = "/api/map-features/{id}",
    tag = "Features",
    params(("id" = Uuid, Path, description = "ID da feature")),
    responses(
        (status = 204, description = "Feature removida"),
        (status = 404, description = "Feature não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_feature(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .geo_service
        .delete_feature(id, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
