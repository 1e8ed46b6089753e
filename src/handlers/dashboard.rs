// src/handlers/dashboard.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        i18n::I18nStore,
    },
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::dashboard::{
        CreateDashboardPayload, DashboardConfig, DashboardPreview, DashboardStats,
        UpdateDashboardPayload,
    },
};

// =============================================================================
//  ÁREA 1: CONFIGURAÇÕES DE DASHBOARD
// =============================================================================

// GET /api/dashboards
#[utoipa::path(
    get,
    path = "/api/dashboards",
    tag = "Dashboards",
    responses((status = 200, description = "Dashboards configurados", body = Vec<DashboardConfig>)),
    security(("api_jwt" = []))
)]
pub async fn list_configs(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let configs = app_state
        .dashboard_service
        .list_configs(tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(configs)))
}

// POST /api/dashboards
#[utoipa::path(
    post,
    path = "/api/dashboards",
    tag = "Dashboards",
    request_body = CreateDashboardPayload,
    responses(
        (status = 201, description = "Dashboard criado", body = DashboardConfig),
        (status = 404, description = "Formulário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_config(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<CreateDashboardPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let config = app_state
        .dashboard_service
        .create_config(tenant.scope, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(config)))
}

/// Corpo do 500 das estatísticas. A cadeia de erros só sai do servidor
/// com EXPOSE_ERROR_DETAILS ligado.
fn stats_error_body(err: &anyhow::Error, expose: bool, store: &I18nStore, locale: &Locale) -> Value {
    if expose {
        let traceback: Vec<String> = err.chain().map(|cause| cause.to_string()).collect();
        json!({ "error": err.to_string(), "traceback": traceback })
    } else {
        json!({ "error": store.translate(&locale.0, "internal_error") })
    }
}

// GET /api/dashboards/stats
#[utoipa::path(
    get,
    path = "/api/dashboards/stats",
    tag = "Dashboards",
    responses(
        (status = 200, description = "Totais, tendências e atividade recente", body = DashboardStats),
        (status = 404, description = "Usuário sem cliente associado"),
        (status = 500, description = "Falha na agregação")
    ),
    security(("api_jwt" = []))
)]
pub async fn stats(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<Response, ApiError> {
    let client_id = tenant
        .client_id()
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    match app_state.dashboard_service.stats(client_id).await {
        Ok(stats) => Ok((StatusCode::OK, Json(stats)).into_response()),
        Err(err) => {
            tracing::error!("Falha ao agregar estatísticas do cliente {}: {:?}", client_id, err);

            let body = stats_error_body(
                &err,
                app_state.settings.expose_error_details,
                &app_state.i18n_store,
                &locale,
            );
            Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response())
        }
    }
}

// GET /api/dashboards/{id}
#[utoipa::path(
    get,
    path = "/api/dashboards/{id}",
    tag = "Dashboards",
    params(("id" = Uuid, Path, description = "ID do dashboard")),
    responses(
        (status = 200, description = "Dashboard", body = DashboardConfig),
        (status = 404, description = "Dashboard não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_config(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let config = app_state
        .dashboard_service
        .get_config(id, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(config)))
}

// PATCH /api/dashboards/{id}
#[utoipa::path(
    patch,
    path = "/api/dashboards/{id}",
    tag = "Dashboards",
    params(("id" = Uuid, Path, description = "ID do dashboard")),
    request_body = UpdateDashboardPayload,
    responses(
        (status = 200, description = "Dashboard atualizado", body = DashboardConfig),
        (status = 404, description = "Dashboard não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_config(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDashboardPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let config = app_state
        .dashboard_service
        .update_config(id, tenant.scope, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(config)))
}

// DELETE /api/dashboards/{id}
#[utoipa::path(
    delete,
    path = "/api/dashboards/{id}",
    tag = "Dashboards",
    params(("id" = Uuid, Path, description = "ID do dashboard")),
    responses(
        (status = 204, description = "Dashboard removido"),
        (status = 404, description = "Dashboard não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_config(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .dashboard_service
        .delete_config(id, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  ÁREA 2: PREVIEW
// =============================================================================

// GET /api/dashboards/{id}/preview
#[utoipa::path(
    get,
    path = "/api/dashboards/{id}/preview",
    tag = "Dashboards",
    params(("id" = Uuid, Path, description = "ID do dashboard")),
    responses(
        (status = 200, description = "Dados da visualização", body = DashboardPreview),
        (status = 404, description = "Dashboard não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn preview(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let preview = app_state
        .dashboard_service
        .preview(id, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(preview)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    fn failed_aggregation() -> anyhow::Error {
        Err::<(), _>(anyhow::anyhow!("relation \"form_submissions\" does not exist"))
            .context("contagem de submissões")
            .unwrap_err()
    }

    #[test]
    fn exposed_stats_error_carries_every_context_layer() {
        let body = stats_error_body(&failed_aggregation(), true, &I18nStore::new(), &Locale("en".into()));

        assert_eq!(body["error"], "contagem de submissões");
        assert_eq!(
            body["traceback"],
            json!(["contagem de submissões", "relation \"form_submissions\" does not exist"])
        );
    }

    #[test]
    fn hidden_stats_error_is_the_localized_generic_message() {
        let store = I18nStore::new();
        let locale = Locale("pt".into());
        let body = stats_error_body(&failed_aggregation(), false, &store, &locale);

        assert!(body.get("traceback").is_none());
        assert_eq!(body["error"], store.translate("pt", "internal_error"));
        assert_ne!(body["error"], "contagem de submissões");
    }
}
