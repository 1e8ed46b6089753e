// src/handlers/tenancy.rs

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PlatformStaff, RequirePolicy},
        tenancy::TenantContext,
    },
    models::{
        dashboard::DashboardData,
        tenancy::{
            ActivateSubscriptionPayload, AddClientUserPayload, ClientBilling, ClientMember,
            ClientResponse, ClientUsage, ClientUser, CreateClientPayload, CreatePlanPayload,
            SubscriptionPlan, UpdateClientPayload, UpdatePlanPayload,
        },
    },
};

// =============================================================================
//  ÁREA 1: PLANOS DE ASSINATURA (somente staff)
// =============================================================================

// GET /api/subscription-plans
#[utoipa::path(
    get,
    path = "/api/subscription-plans",
    tag = "Planos",
    responses(
        (status = 200, description = "Planos cadastrados", body = Vec<SubscriptionPlan>),
        (status = 403, description = "Acesso de administrador necessário")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_plans(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePolicy<PlatformStaff>,
) -> Result<impl IntoResponse, ApiError> {
    let plans = app_state
        .tenant_service
        .list_plans()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(plans)))
}

// POST /api/subscription-plans
#[utoipa::path(
    post,
    path = "/api/subscription-plans",
    tag = "Planos",
    request_body = CreatePlanPayload,
    responses(
        (status = 201, description = "Plano criado", body = SubscriptionPlan),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Acesso de administrador necessário")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePolicy<PlatformStaff>,
    Json(payload): Json<CreatePlanPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let plan = app_state
        .tenant_service
        .create_plan(&payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(plan)))
}

// GET /api/subscription-plans/{id}
#[utoipa::path(
    get,
    path = "/api/subscription-plans/{id}",
    tag = "Planos",
    params(("id" = Uuid, Path, description = "ID do plano")),
    responses(
        (status = 200, description = "Plano", body = SubscriptionPlan),
        (status = 404, description = "Plano não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePolicy<PlatformStaff>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = app_state
        .tenant_service
        .get_plan(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(plan)))
}

// PATCH /api/subscription-plans/{id}
#[utoipa::path(
    patch,
    path = "/api/subscription-plans/{id}",
    tag = "Planos",
    params(("id" = Uuid, Path, description = "ID do plano")),
    request_body = UpdatePlanPayload,
    responses(
        (status = 200, description = "Plano atualizado", body = SubscriptionPlan),
        (status = 404, description = "Plano não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePolicy<PlatformStaff>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePlanPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let plan = app_state
        .tenant_service
        .update_plan(id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(plan)))
}

// DELETE /api/subscription-plans/{id}
#[utoipa::path(
    delete,
    path = "/api/subscription-plans/{id}",
    tag = "Planos",
    params(("id" = Uuid, Path, description = "ID do plano")),
    responses(
        (status = 204, description = "Plano removido"),
        (status = 404, description = "Plano não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePolicy<PlatformStaff>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .tenant_service
        .delete_plan(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  ÁREA 2: CLIENTES
// =============================================================================

// GET /api/clients
#[utoipa::path(
    get,
    path = "/api/clients",
    tag = "Clientes",
    responses(
        (status = 200, description = "Staff vê todos; membros só o próprio cliente", body = Vec<ClientResponse>),
        (status = 404, description = "Usuário sem cliente")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_clients(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let clients = app_state
        .tenant_service
        .list_clients(tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(clients)))
}

// POST /api/clients
#[utoipa::path(
    post,
    path = "/api/clients",
    tag = "Clientes",
    request_body = CreateClientPayload,
    responses(
        (status = 201, description = "Cliente criado", body = ClientResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Acesso de administrador necessário")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_client(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePolicy<PlatformStaff>,
    Json(payload): Json<CreateClientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let client = app_state
        .tenant_service
        .create_client(&payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(client)))
}

// GET /api/clients/{id}
#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    tag = "Clientes",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente", body = ClientResponse),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_client(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let client = app_state
        .tenant_service
        .get_client(id, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(client)))
}

// PATCH /api/clients/{id}
#[utoipa::path(
    patch,
    path = "/api/clients/{id}",
    tag = "Clientes",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = UpdateClientPayload,
    responses(
        (status = 200, description = "Cliente atualizado", body = ClientResponse),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_client(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateClientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let client = app_state
        .tenant_service
        .update_client(id, tenant.scope, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(client)))
}

// DELETE /api/clients/{id}
#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    tag = "Clientes",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 204, description = "Cliente removido"),
        (status = 403, description = "Acesso de administrador necessário"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_client(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePolicy<PlatformStaff>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .tenant_service
        .delete_client(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/clients/{id}/users
#[utoipa::path(
    post,
    path = "/api/clients/{id}/users",
    tag = "Clientes",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = AddClientUserPayload,
    responses(
        (status = 201, description = "Usuário vinculado", body = ClientUser),
        (status = 404, description = "Cliente ou usuário não encontrado"),
        (status = 409, description = "Usuário já vinculado a este cliente")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_client_user(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddClientUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let link = app_state
        .tenant_service
        .add_user(id, tenant.scope, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(link)))
}

// GET /api/clients/{id}/users
#[utoipa::path(
    get,
    path = "/api/clients/{id}/users",
    tag = "Clientes",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Membros do cliente", body = Vec<ClientMember>),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_client_users(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let members = app_state
        .tenant_service
        .list_members(id, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(members)))
}

// =============================================================================
//  ÁREA 3: ASSINATURA, USO E FATURAMENTO
// =============================================================================

// POST /api/clients/{id}/activate_subscription
#[utoipa::path(
    post,
    path = "/api/clients/{id}/activate_subscription",
    tag = "Clientes",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = ActivateSubscriptionPayload,
    responses(
        (status = 200, description = "Assinatura ativada e fatura emitida", body = ClientResponse),
        (status = 400, description = "Plano inválido"),
        (status = 403, description = "Acesso de administrador necessário"),
        (status = 409, description = "Já existe fatura emitida hoje para este cliente")
    ),
    security(("api_jwt" = []))
)]
pub async fn activate_subscription(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePolicy<PlatformStaff>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ActivateSubscriptionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let client = app_state
        .tenant_service
        .activate_subscription(id, &payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(client)))
}

// POST /api/clients/{id}/suspend_subscription
#[utoipa::path(
    post,
    path = "/api/clients/{id}/suspend_subscription",
    tag = "Clientes",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Assinatura suspensa", body = ClientResponse),
        (status = 403, description = "Acesso de administrador necessário"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn suspend_subscription(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePolicy<PlatformStaff>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let client = app_state
        .tenant_service
        .suspend_subscription(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(client)))
}

// GET /api/clients/{id}/usage_stats
#[utoipa::path(
    get,
    path = "/api/clients/{id}/usage_stats",
    tag = "Clientes",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Foto de uso do dia", body = ClientUsage),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn usage_stats(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let usage = app_state
        .tenant_service
        .usage_stats(id, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(usage)))
}

// GET /api/clients/{id}/billing_history
#[utoipa::path(
    get,
    path = "/api/clients/{id}/billing_history",
    tag = "Clientes",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Faturas, da mais recente para a mais antiga", body = Vec<ClientBilling>),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn billing_history(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let billing = app_state
        .tenant_service
        .billing_history(id, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(billing)))
}

// GET /api/clients/{id}/billing/{billing_id}/invoice.pdf
#[utoipa::path(
    get,
    path = "/api/clients/{id}/billing/{billing_id}/invoice.pdf",
    tag = "Clientes",
    params(
        ("id" = Uuid, Path, description = "ID do cliente"),
        ("billing_id" = Uuid, Path, description = "ID da fatura")
    ),
    responses(
        (status = 200, description = "Fatura em PDF", content_type = "application/pdf"),
        (status = 404, description = "Cliente ou fatura não encontrados")
    ),
    security(("api_jwt" = []))
)]
pub async fn invoice_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path((id, billing_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, ApiError> {
    let pdf_bytes = app_state
        .document_service
        .invoice_pdf(id, billing_id, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    // Configura os Headers para o navegador baixar ou mostrar o PDF
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"fatura_{}.pdf\"", billing_id),
        ),
    ];

    Ok((headers, pdf_bytes).into_response())
}

// GET /api/clients/{id}/dashboard_data
#[utoipa::path(
    get,
    path = "/api/clients/{id}/dashboard_data",
    tag = "Clientes",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Árvore departamentos → categorias com totais e camadas", body = DashboardData),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn dashboard_data(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let data = app_state
        .dashboard_service
        .dashboard_data(id, tenant.scope)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(data)))
}
