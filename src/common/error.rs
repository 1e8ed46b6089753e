// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// Erro interno da aplicação. Serviços e repositórios só conhecem este tipo;
// a conversão para a resposta HTTP acontece em `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Payload inválido: {0}")]
    InvalidPayload(String),

    #[error("Plano de assinatura inválido")]
    InvalidPlan,

    #[error("Campo não pertence ao formulário da sessão")]
    InvalidField,

    #[error("field_id e value são obrigatórios")]
    MissingEntryData,

    #[error("Dados de localização são obrigatórios")]
    MissingLocation,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso de administrador necessário")]
    Forbidden,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Usuário não está associado a nenhum cliente")]
    NoTenantLink,

    #[error("Recurso não encontrado: {0}")]
    NotFound(&'static str),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Sessão de coleta já encerrada")]
    SessionClosed,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Falha ao gerar documento: {0}")]
    DocumentError(String),
}

// O erro que efetivamente vai para o cliente.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidPayload(_)
            | AppError::InvalidPlan
            | AppError::InvalidField
            | AppError::MissingEntryData
            | AppError::MissingLocation => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken | AppError::JwtError(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::UserNotFound | AppError::NoTenantLink | AppError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::UniqueConstraintViolation(_) | AppError::SessionClosed => {
                StatusCode::CONFLICT
            }
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::DocumentError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Chave do catálogo de mensagens (ver `I18nStore`).
    pub fn message_key(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_failed",
            AppError::InvalidPayload(_) => "invalid_payload",
            AppError::InvalidPlan => "invalid_plan",
            AppError::InvalidField => "invalid_field",
            AppError::MissingEntryData => "missing_entry_data",
            AppError::MissingLocation => "missing_location",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidToken | AppError::JwtError(_) => "invalid_token",
            AppError::Forbidden => "admin_required",
            AppError::UserNotFound => "user_not_found",
            AppError::NoTenantLink => "no_tenant_link",
            AppError::NotFound(_) => "not_found",
            AppError::UniqueConstraintViolation(_) => "conflict",
            AppError::SessionClosed => "session_closed",
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::DocumentError(_) => "internal_error",
        }
    }

    /// Converte o erro interno num `ApiError` traduzido para o idioma do pedido.
    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();
        let error = store.translate(&locale.0, self.message_key());

        let details = match &self {
            AppError::ValidationError(errors) => {
                let mut fields: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    fields.insert(field.to_string(), messages);
                }
                Some(json!(fields))
            }
            AppError::InvalidPayload(detail) | AppError::UniqueConstraintViolation(detail) => {
                Some(json!({ "detail": detail }))
            }
            AppError::NotFound(resource) => Some(json!({ "resource": resource })),
            _ => None,
        };

        if status.is_server_error() {
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        ApiError { status, error, details }
    }
}

// Usado pelo middleware de autenticação, que ainda não conhece o idioma do pedido.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), &I18nStore::new())
            .into_response()
    }
}

/// Converte violação de chave única em `UniqueConstraintViolation`, o resto vira `DatabaseError`.
pub fn map_unique_violation(e: sqlx::Error, detail: impl Into<String>) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::UniqueConstraintViolation(detail.into());
        }
    }
    AppError::DatabaseError(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    fn english() -> Locale {
        Locale("en".to_string())
    }

    #[test]
    fn taxonomy_maps_to_http_status() {
        assert_eq!(AppError::InvalidPlan.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NoTenantLink.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::UniqueConstraintViolation("INV-1".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::SessionClosed.status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn api_error_uses_requested_language() {
        let store = I18nStore::new();
        let api = AppError::NoTenantLink.to_api_error(&english(), &store);
        assert_eq!(api.error, "User is not associated with any client");

        let api = AppError::Forbidden.to_api_error(&Locale("pt".into()), &store);
        assert_eq!(api.error, "Acesso de administrador necessário");
    }

    #[test]
    fn validation_errors_are_reported_per_field() {
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("range");
        err.message = Some("must be between 1 and 120".into());
        errors.add("duration_months", err);

        let api = AppError::ValidationError(errors).to_api_error(&english(), &I18nStore::new());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.expect("details");
        assert_eq!(details["duration_months"][0], "must be between 1 and 120");
    }

    #[test]
    fn server_errors_hide_internal_message() {
        let api = AppError::DocumentError("fonte ausente".into())
            .to_api_error(&english(), &I18nStore::new());
        assert_eq!(api.error, "An unexpected error occurred.");
        assert!(api.details.is_none());
    }
}
