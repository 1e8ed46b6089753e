// src/db/tenancy_repo.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::{
        auth::UserSummary,
        tenancy::{
            Client, ClientBilling, ClientRole, ClientStatus, ClientUsage, ClientUser,
            CreateClientPayload, CreatePlanPayload, SubscriptionPlan, UpdateClientPayload,
            UpdatePlanPayload, UsageCounts,
        },
    },
};

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ---
    // PLANOS DE ASSINATURA
    // ---

    pub async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, AppError> {
        let plans = sqlx::query_as::<_, SubscriptionPlan>(
            "SELECT * FROM subscription_plans ORDER BY price ASC, name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(plans)
    }

    pub async fn find_plan<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<SubscriptionPlan>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let plan = sqlx::query_as::<_, SubscriptionPlan>("SELECT * FROM subscription_plans WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(plan)
    }

    pub async fn create_plan(&self, payload: &CreatePlanPayload) -> Result<SubscriptionPlan, AppError> {
        sqlx::query_as::<_, SubscriptionPlan>(
            r#"
            INSERT INTO subscription_plans
                (name, description, price, features, max_users, max_storage, max_forms, max_items)
            VALUES ($1, $2, $3, $4, COALESCE($5, 5), COALESCE($6, 5368709120), COALESCE($7, 10), COALESCE($8, 1000))
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(payload.price)
        .bind(payload.features.clone().unwrap_or_else(|| json!({})))
        .bind(payload.max_users)
        .bind(payload.max_storage)
        .bind(payload.max_forms)
        .bind(payload.max_items)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, format!("Plano '{}' já existe.", payload.name)))
    }

    pub async fn update_plan(
        &self,
        id: Uuid,
        payload: &UpdatePlanPayload,
    ) -> Result<Option<SubscriptionPlan>, AppError> {
        let plan = sqlx::query_as::<_, SubscriptionPlan>(
            r#"
            UPDATE subscription_plans SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                features = COALESCE($5, features),
                max_users = COALESCE($6, max_users),
                max_storage = COALESCE($7, max_storage),
                max_forms = COALESCE($8, max_forms),
                max_items = COALESCE($9, max_items),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.name.as_deref())
        .bind(payload.description.as_deref())
        .bind(payload.price)
        .bind(payload.features.clone())
        .bind(payload.max_users)
        .bind(payload.max_storage)
        .bind(payload.max_forms)
        .bind(payload.max_items)
        .fetch_optional(&self.pool)
        .await?;
        Ok(plan)
    }

    pub async fn delete_plan(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM subscription_plans WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---
    // CLIENTES
    // `scope` = None significa sem filtro (operador da plataforma)
    // ---

    pub async fn list_clients(&self, scope: Option<Uuid>) -> Result<Vec<Client>, AppError> {
        let clients = sqlx::query_as::<_, Client>(
            "SELECT * FROM clients WHERE ($1::uuid IS NULL OR id = $1) ORDER BY name ASC",
        )
        .bind(scope)
        .fetch_all(&self.pool)
        .await?;
        Ok(clients)
    }

    pub async fn find_client<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        scope: Option<Uuid>,
    ) -> Result<Option<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let client = sqlx::query_as::<_, Client>(
            "SELECT * FROM clients WHERE id = $1 AND ($2::uuid IS NULL OR id = $2)",
        )
        .bind(id)
        .bind(scope)
        .fetch_optional(executor)
        .await?;
        Ok(client)
    }

    pub async fn create_client(&self, payload: &CreateClientPayload) -> Result<Client, AppError> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (name, industry, billing_email, billing_address, billing_phone)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.industry)
        .bind(&payload.billing_email)
        .bind(&payload.billing_address)
        .bind(&payload.billing_phone)
        .fetch_one(&self.pool)
        .await?;
        Ok(client)
    }

    pub async fn update_client(
        &self,
        id: Uuid,
        scope: Option<Uuid>,
        payload: &UpdateClientPayload,
    ) -> Result<Option<Client>, AppError> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients SET
                name = COALESCE($3, name),
                industry = COALESCE($4, industry),
                billing_email = COALESCE($5, billing_email),
                billing_address = COALESCE($6, billing_address),
                billing_phone = COALESCE($7, billing_phone),
                updated_at = NOW()
            WHERE id = $1 AND ($2::uuid IS NULL OR id = $2)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(scope)
        .bind(payload.name.as_deref())
        .bind(payload.industry.as_deref())
        .bind(payload.billing_email.as_deref())
        .bind(payload.billing_address.as_deref())
        .bind(payload.billing_phone.as_deref())
        .fetch_optional(&self.pool)
        .await?;
        Ok(client)
    }

    pub async fn delete_client(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // Vincula o plano e abre a janela de assinatura
    pub async fn set_subscription<'e, E>(
        &self,
        executor: E,
        client_id: Uuid,
        plan_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let client = sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients SET
                subscription_plan_id = $2,
                status = 'active',
                subscription_start = $3,
                subscription_end = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(client_id)
        .bind(plan_id)
        .bind(start)
        .bind(end)
        .fetch_one(executor)
        .await?;
        Ok(client)
    }

    pub async fn set_status(&self, client_id: Uuid, status: ClientStatus) -> Result<Option<Client>, AppError> {
        let client = sqlx::query_as::<_, Client>(
            "UPDATE clients SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(client_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(client)
    }

    // ---
    // MEMBROS (ClientUser)
    // ---

    pub async fn find_membership_by_user(&self, user_id: Uuid) -> Result<Option<ClientUser>, AppError> {
        let link = sqlx::query_as::<_, ClientUser>("SELECT * FROM client_users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(link)
    }

    pub async fn add_member<'e, E>(
        &self,
        executor: E,
        client_id: Uuid,
        user_id: Uuid,
        role: ClientRole,
        department_id: Option<Uuid>,
    ) -> Result<ClientUser, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ClientUser>(
            r#"
            INSERT INTO client_users (client_id, user_id, role, department_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(client_id)
        .bind(user_id)
        .bind(role)
        .bind(department_id)
        .fetch_one(executor)
        .await
        // Um usuário pertence a no máximo um cliente
        .map_err(|e| map_unique_violation(e, "Usuário já está vinculado a um cliente."))
    }

    pub async fn department_belongs_to(&self, department_id: Uuid, client_id: Uuid) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM departments WHERE id = $1 AND client_id = $2)",
        )
        .bind(department_id)
        .bind(client_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn list_members(&self, client_id: Uuid) -> Result<Vec<ClientUser>, AppError> {
        let links = sqlx::query_as::<_, ClientUser>(
            "SELECT * FROM client_users WHERE client_id = $1 ORDER BY created_at ASC",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(links)
    }

    pub async fn user_summaries(&self, user_ids: &[Uuid]) -> Result<Vec<UserSummary>, AppError> {
        let users = sqlx::query_as::<_, UserSummary>(
            "SELECT id, username, email, first_name, last_name FROM users WHERE id = ANY($1)",
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    // ---
    // FATURAMENTO (somente inserção)
    // ---

    pub async fn insert_billing<'e, E>(
        &self,
        executor: E,
        client_id: Uuid,
        amount: Decimal,
        invoice_number: &str,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<ClientBilling, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ClientBilling>(
            r#"
            INSERT INTO client_billing
                (client_id, amount, payment_status, invoice_number, billing_period_start, billing_period_end)
            VALUES ($1, $2, 'pending', $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(client_id)
        .bind(amount)
        .bind(invoice_number)
        .bind(period_start)
        .bind(period_end)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, format!("Fatura {} já emitida hoje.", invoice_number)))
    }

    pub async fn list_billing(&self, client_id: Uuid) -> Result<Vec<ClientBilling>, AppError> {
        let rows = sqlx::query_as::<_, ClientBilling>(
            "SELECT * FROM client_billing WHERE client_id = $1 ORDER BY created_at DESC",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_billing(&self, client_id: Uuid, billing_id: Uuid) -> Result<Option<ClientBilling>, AppError> {
        let row = sqlx::query_as::<_, ClientBilling>(
            "SELECT * FROM client_billing WHERE id = $1 AND client_id = $2",
        )
        .bind(billing_id)
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    // ---
    // USO DIÁRIO
    // ---

    pub async fn find_usage(&self, client_id: Uuid, date: NaiveDate) -> Result<Option<ClientUsage>, AppError> {
        let usage = sqlx::query_as::<_, ClientUsage>(
            "SELECT * FROM client_usage WHERE client_id = $1 AND date = $2",
        )
        .bind(client_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(usage)
    }

    pub async fn count_usage(&self, client_id: Uuid) -> Result<UsageCounts, AppError> {
        let counts = sqlx::query_as::<_, UsageCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM client_users WHERE client_id = $1)::int AS users_count,
                (SELECT COUNT(*) FROM forms WHERE client_id = $1)::int AS forms_count,
                (SELECT COUNT(*) FROM items i
                    JOIN categories c ON c.id = i.category_id
                    WHERE c.client_id = $1)::int AS items_count
            "#,
        )
        .bind(client_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }

    // Insere a foto do dia; None se outra requisição chegou antes
    pub async fn insert_usage_if_absent(
        &self,
        client_id: Uuid,
        date: NaiveDate,
        counts: UsageCounts,
    ) -> Result<Option<ClientUsage>, AppError> {
        let usage = sqlx::query_as::<_, ClientUsage>(
            r#"
            INSERT INTO client_usage (client_id, date, users_count, forms_count, items_count, storage_used)
            VALUES ($1, $2, $3, $4, $5, 0)
            ON CONFLICT (client_id, date) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(client_id)
        .bind(date)
        .bind(counts.users_count)
        .bind(counts.forms_count)
        .bind(counts.items_count)
        .fetch_optional(&self.pool)
        .await?;
        Ok(usage)
    }
}
