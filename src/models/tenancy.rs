// src/models/tenancy.rs

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::auth::UserSummary;

/// Cada "mês" de assinatura vale 30 dias corridos.
pub const DAYS_PER_BILLING_MONTH: i64 = 30;

// ---
// 1. SubscriptionPlan (O "Plano")
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SubscriptionPlan {
    pub id: Uuid,
    #[schema(example = "Professional")]
    pub name: String,
    pub description: String,
    #[schema(value_type = f64, example = 49.90)]
    pub price: Decimal,
    // Lista/objeto livre de features incluídas no plano
    pub features: Value,
    pub max_users: i32,
    pub max_storage: i64,
    pub max_forms: i32,
    pub max_items: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 2. Client (O "Tenant")
// ---
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "client_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    Trial,
    Active,
    Suspended,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub industry: String,
    pub status: ClientStatus,
    pub subscription_plan_id: Option<Uuid>,
    pub subscription_start: Option<DateTime<Utc>>,
    pub subscription_end: Option<DateTime<Utc>>,
    pub billing_email: String,
    pub billing_address: String,
    pub billing_phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// Assinatura ativa = status 'active' E fim definido E fim no futuro.
    /// Sempre recalculado, nunca persistido.
    pub fn is_subscription_active_at(&self, now: DateTime<Utc>) -> bool {
        match self.subscription_end {
            Some(end) => self.status == ClientStatus::Active && end > now,
            None => false,
        }
    }

    pub fn is_subscription_active(&self) -> bool {
        self.is_subscription_active_at(Utc::now())
    }
}

// Representação do cliente devolvida pela API
#[derive(Debug, Serialize, ToSchema)]
pub struct ClientResponse {
    #[serde(flatten)]
    pub client: Client,
    pub subscription_plan: Option<SubscriptionPlan>,
    pub is_subscription_active: bool,
}

impl ClientResponse {
    pub fn new(client: Client, subscription_plan: Option<SubscriptionPlan>) -> Self {
        let is_subscription_active = client.is_subscription_active();
        Self { client, subscription_plan, is_subscription_active }
    }
}

// ---
// 3. ClientUser (A "Ponte" Usuário-Cliente)
// ---
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Default, ToSchema)]
#[sqlx(type_name = "client_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClientRole {
    Admin,
    Manager,
    #[default]
    User,
    Viewer,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ClientUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub client_id: Uuid,
    pub role: ClientRole,
    pub department_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Membro do cliente com os dados públicos do usuário
#[derive(Debug, Serialize, ToSchema)]
pub struct ClientMember {
    #[serde(flatten)]
    pub link: ClientUser,
    pub user: UserSummary,
}

// ---
// 4. ClientBilling (Faturas, apenas inserção)
// ---
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ClientBilling {
    pub id: Uuid,
    pub client_id: Uuid,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub payment_status: PaymentStatus,
    pub payment_date: Option<DateTime<Utc>>,
    pub invoice_number: String,
    pub billing_period_start: DateTime<Utc>,
    pub billing_period_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 5. ClientUsage (Foto diária de consumo)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ClientUsage {
    pub id: Uuid,
    pub client_id: Uuid,
    pub date: NaiveDate,
    pub users_count: i32,
    pub forms_count: i32,
    pub items_count: i32,
    pub storage_used: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Contagens usadas para montar a foto do dia
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromRow)]
pub struct UsageCounts {
    pub users_count: i32,
    pub forms_count: i32,
    pub items_count: i32,
}

// ---
// 6. Termos de uma ativação de assinatura
// ---
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionTerms {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub amount: Decimal,
    pub invoice_number: String,
}

impl SubscriptionTerms {
    /// Janela [now, now + 30 * meses dias) e fatura de `preço * meses`.
    /// O número da fatura só depende do cliente e do dia, então duas ativações
    /// no mesmo dia colidem na constraint UNIQUE.
    pub fn compute(
        client_id: Uuid,
        plan: &SubscriptionPlan,
        duration_months: u32,
        now: DateTime<Utc>,
    ) -> Self {
        let end = now + Duration::days(DAYS_PER_BILLING_MONTH * i64::from(duration_months));
        Self {
            start: now,
            end,
            amount: plan.price * Decimal::from(duration_months),
            invoice_number: invoice_number_for(client_id, now),
        }
    }
}

pub fn invoice_number_for(client_id: Uuid, at: DateTime<Utc>) -> String {
    format!("INV-{}-{}", client_id, at.format("%Y%m%d"))
}

// ---
// 7. Payloads
// ---

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price < Decimal::new(1, 2) {
        let mut err = ValidationError::new("min_price");
        err.message = Some("O preço mínimo é 0.01.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePlanPayload {
    #[validate(length(min = 1, max = 100, message = "O nome do plano é obrigatório."))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(custom(function = "validate_price"))]
    #[schema(value_type = f64, example = 49.90)]
    pub price: Decimal,
    pub features: Option<Value>,
    #[validate(range(min = 1))]
    pub max_users: Option<i32>,
    #[validate(range(min = 1))]
    pub max_storage: Option<i64>,
    #[validate(range(min = 1))]
    pub max_forms: Option<i32>,
    #[validate(range(min = 1))]
    pub max_items: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePlanPayload {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom(function = "validate_price"))]
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    pub features: Option<Value>,
    #[validate(range(min = 1))]
    pub max_users: Option<i32>,
    #[validate(range(min = 1))]
    pub max_storage: Option<i64>,
    #[validate(range(min = 1))]
    pub max_forms: Option<i32>,
    #[validate(range(min = 1))]
    pub max_items: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateClientPayload {
    #[validate(length(min = 1, max = 200, message = "O nome do cliente é obrigatório."))]
    pub name: String,
    #[serde(default)]
    pub industry: String,
    #[validate(email(message = "O e-mail de cobrança é inválido."))]
    pub billing_email: String,
    #[serde(default)]
    pub billing_address: String,
    #[serde(default)]
    pub billing_phone: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateClientPayload {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub industry: Option<String>,
    #[validate(email(message = "O e-mail de cobrança é inválido."))]
    pub billing_email: Option<String>,
    pub billing_address: Option<String>,
    pub billing_phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddClientUserPayload {
    pub user_id: Uuid,
    #[serde(default)]
    pub role: ClientRole,
    pub department_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ActivateSubscriptionPayload {
    // Ausente ou inexistente: "Invalid plan"
    pub plan_id: Option<Uuid>,
    #[validate(range(min = 1, max = 120, message = "duration_months deve estar entre 1 e 120."))]
    pub duration_months: Option<u32>,
}

impl ActivateSubscriptionPayload {
    pub fn months(&self) -> u32 {
        self.duration_months.unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn client(status: ClientStatus, end: Option<DateTime<Utc>>) -> Client {
        let now = Utc::now();
        Client {
            id: Uuid::new_v4(),
            name: "Water Utility Demo".into(),
            industry: "Utilities".into(),
            status,
            subscription_plan_id: None,
            subscription_start: None,
            subscription_end: end,
            billing_email: "demo@waterutility.com".into(),
            billing_address: String::new(),
            billing_phone: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn plan(price: &str) -> SubscriptionPlan {
        let now = Utc::now();
        SubscriptionPlan {
            id: Uuid::new_v4(),
            name: "Pro".into(),
            description: String::new(),
            price: Decimal::from_str(price).unwrap(),
            features: serde_json::json!({}),
            max_users: 5,
            max_storage: 5_368_709_120,
            max_forms: 10,
            max_items: 1000,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn subscription_is_active_only_when_active_and_not_expired() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let future = now + Duration::days(1);
        let past = now - Duration::seconds(1);

        assert!(client(ClientStatus::Active, Some(future)).is_subscription_active_at(now));
        assert!(!client(ClientStatus::Active, Some(past)).is_subscription_active_at(now));
        assert!(!client(ClientStatus::Active, Some(now)).is_subscription_active_at(now));
        assert!(!client(ClientStatus::Active, None).is_subscription_active_at(now));
        assert!(!client(ClientStatus::Trial, Some(future)).is_subscription_active_at(now));
        assert!(!client(ClientStatus::Suspended, Some(future)).is_subscription_active_at(now));
        assert!(!client(ClientStatus::Cancelled, Some(future)).is_subscription_active_at(now));
    }

    #[test]
    fn three_month_activation_spans_ninety_days_and_bills_three_times_price() {
        let now = Utc.with_ymd_and_hms(2025, 1, 31, 8, 30, 0).unwrap();
        let client_id = Uuid::new_v4();
        let terms = SubscriptionTerms::compute(client_id, &plan("49.90"), 3, now);

        assert_eq!(terms.start, now);
        assert_eq!(terms.end - terms.start, Duration::days(90));
        assert_eq!(terms.amount, Decimal::from_str("149.70").unwrap());
        assert_eq!(terms.invoice_number, format!("INV-{}-20250131", client_id));
    }

    #[test]
    fn invoice_number_repeats_within_the_same_day() {
        let client_id = Uuid::new_v4();
        let morning = Utc.with_ymd_and_hms(2025, 6, 1, 0, 5, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2025, 6, 1, 23, 55, 0).unwrap();
        assert_eq!(invoice_number_for(client_id, morning), invoice_number_for(client_id, evening));
    }

    #[test]
    fn price_below_one_cent_is_rejected() {
        let payload = CreatePlanPayload {
            name: "Free".into(),
            description: String::new(),
            price: Decimal::ZERO,
            features: None,
            max_users: None,
            max_storage: None,
            max_forms: None,
            max_items: None,
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn activation_defaults_to_one_month_and_bounds_duration() {
        let payload: ActivateSubscriptionPayload =
            serde_json::from_value(serde_json::json!({ "plan_id": Uuid::new_v4() })).unwrap();
        assert_eq!(payload.months(), 1);
        assert!(payload.validate().is_ok());

        let too_long = ActivateSubscriptionPayload { plan_id: None, duration_months: Some(121) };
        assert!(too_long.validate().is_err());
        let zero = ActivateSubscriptionPayload { plan_id: None, duration_months: Some(0) };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn client_response_exposes_derived_flag() {
        let c = client(ClientStatus::Active, Some(Utc::now() + Duration::days(10)));
        let json = serde_json::to_value(ClientResponse::new(c, None)).unwrap();
        assert_eq!(json["is_subscription_active"], true);
        assert_eq!(json["status"], "active");
        assert!(json["subscription_plan"].is_null());
    }
}
