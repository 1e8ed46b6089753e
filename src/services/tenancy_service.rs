// src/services/tenancy_service.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{TenantRepository, UserRepository},
    middleware::tenancy::TenantScope,
    models::tenancy::{
        ActivateSubscriptionPayload, AddClientUserPayload, Client, ClientBilling, ClientMember,
        ClientResponse, ClientStatus, ClientUsage, ClientUser, CreateClientPayload,
        CreatePlanPayload, SubscriptionPlan, SubscriptionTerms, UpdateClientPayload,
        UpdatePlanPayload, UsageCounts,
    },
};

// ---
// Armazenamento da foto diária de uso
// ---

#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn find_usage(&self, client_id: Uuid, date: NaiveDate) -> Result<Option<ClientUsage>, AppError>;
    async fn current_counts(&self, client_id: Uuid) -> Result<UsageCounts, AppError>;
    /// `None` quando já existe uma foto para (cliente, dia).
    async fn insert_usage_if_absent(
        &self,
        client_id: Uuid,
        date: NaiveDate,
        counts: UsageCounts,
    ) -> Result<Option<ClientUsage>, AppError>;
}

#[async_trait]
impl UsageStore for TenantRepository {
    async fn find_usage(&self, client_id: Uuid, date: NaiveDate) -> Result<Option<ClientUsage>, AppError> {
        TenantRepository::find_usage(self, client_id, date).await
    }

    async fn current_counts(&self, client_id: Uuid) -> Result<UsageCounts, AppError> {
        self.count_usage(client_id).await
    }

    async fn insert_usage_if_absent(
        &self,
        client_id: Uuid,
        date: NaiveDate,
        counts: UsageCounts,
    ) -> Result<Option<ClientUsage>, AppError> {
        TenantRepository::insert_usage_if_absent(self, client_id, date, counts).await
    }
}

/// Foto de uso do dia: a primeira leitura do dia grava as contagens,
/// as seguintes devolvem a mesma linha.
pub async fn usage_snapshot<S>(store: &S, client_id: Uuid, date: NaiveDate) -> Result<ClientUsage, AppError>
where
    S: UsageStore + ?Sized,
{
    if let Some(usage) = store.find_usage(client_id, date).await? {
        return Ok(usage);
    }

    let counts = store.current_counts(client_id).await?;
    if let Some(created) = store.insert_usage_if_absent(client_id, date, counts).await? {
        tracing::info!("📊 Foto de uso criada para o cliente {} em {}", client_id, date);
        return Ok(created);
    }

    // Outra requisição gravou a foto entre a leitura e a inserção
    store
        .find_usage(client_id, date)
        .await?
        .ok_or_else(|| anyhow::anyhow!("foto de uso de {} em {} sumiu após conflito", client_id, date).into())
}

#[derive(Clone)]
pub struct TenantService {
    tenant_repo: TenantRepository,
    user_repo: UserRepository,
    pool: PgPool, // Usamos a pool para iniciar transações
}

impl TenantService {
    pub fn new(tenant_repo: TenantRepository, user_repo: UserRepository, pool: PgPool) -> Self {
        Self { tenant_repo, user_repo, pool }
    }

    pub async fn membership_for(&self, user_id: Uuid) -> Result<Option<ClientUser>, AppError> {
        self.tenant_repo.find_membership_by_user(user_id).await
    }

    // ---
    // PLANOS
    // ---

    pub async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, AppError> {
        self.tenant_repo.list_plans().await
    }

    pub async fn get_plan(&self, id: Uuid) -> Result<SubscriptionPlan, AppError> {
        self.tenant_repo
            .find_plan(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("subscription_plan"))
    }

    pub async fn create_plan(&self, payload: &CreatePlanPayload) -> Result<SubscriptionPlan, AppError> {
        self.tenant_repo.create_plan(payload).await
    }

    pub async fn update_plan(&self, id: Uuid, payload: &UpdatePlanPayload) -> Result<SubscriptionPlan, AppError> {
        self.tenant_repo
            .update_plan(id, payload)
            .await?
            .ok_or(AppError::NotFound("subscription_plan"))
    }

    pub async fn delete_plan(&self, id: Uuid) -> Result<(), AppError> {
        if !self.tenant_repo.delete_plan(id).await? {
            return Err(AppError::NotFound("subscription_plan"));
        }
        Ok(())
    }

    // ---
    // CLIENTES
    // ---

    async fn with_plan(&self, client: Client) -> Result<ClientResponse, AppError> {
        let plan = match client.subscription_plan_id {
            Some(plan_id) => self.tenant_repo.find_plan(&self.pool, plan_id).await?,
            None => None,
        };
        Ok(ClientResponse::new(client, plan))
    }

    pub async fn find_client(&self, id: Uuid, scope: TenantScope) -> Result<Client, AppError> {
        self.tenant_repo
            .find_client(&self.pool, id, scope.filter()?)
            .await?
            .ok_or(AppError::NotFound("client"))
    }

    pub async fn list_clients(&self, scope: TenantScope) -> Result<Vec<ClientResponse>, AppError> {
        let clients = self.tenant_repo.list_clients(scope.filter()?).await?;
        let plans: HashMap<Uuid, SubscriptionPlan> = self
            .tenant_repo
            .list_plans()
            .await?
            .into_iter()
            .map(|plan| (plan.id, plan))
            .collect();

        Ok(clients
            .into_iter()
            .map(|client| {
                let plan = client.subscription_plan_id.and_then(|id| plans.get(&id).cloned());
                ClientResponse::new(client, plan)
            })
            .collect())
    }

    pub async fn get_client(&self, id: Uuid, scope: TenantScope) -> Result<ClientResponse, AppError> {
        let client = self.find_client(id, scope).await?;
        self.with_plan(client).await
    }

    pub async fn create_client(&self, payload: &CreateClientPayload) -> Result<ClientResponse, AppError> {
        let client = self.tenant_repo.create_client(payload).await?;
        tracing::info!("🏢 Cliente '{}' criado ({})", client.name, client.id);
        Ok(ClientResponse::new(client, None))
    }

    pub async fn update_client(
        &self,
        id: Uuid,
        scope: TenantScope,
        payload: &UpdateClientPayload,
    ) -> Result<ClientResponse, AppError> {
        let client = self
            .tenant_repo
            .update_client(id, scope.filter()?, payload)
            .await?
            .ok_or(AppError::NotFound("client"))?;
        self.with_plan(client).await
    }

    pub async fn delete_client(&self, id: Uuid) -> Result<(), AppError> {
        if !self.tenant_repo.delete_client(id).await? {
            return Err(AppError::NotFound("client"));
        }
        tracing::info!("🗑️ Cliente {} removido", id);
        Ok(())
    }

    // ---
    // MEMBROS
    // ---

    pub async fn add_user(
        &self,
        client_id: Uuid,
        scope: TenantScope,
        payload: &AddClientUserPayload,
    ) -> Result<ClientUser, AppError> {
        let client = self.find_client(client_id, scope).await?;

        self.user_repo
            .find_by_id(payload.user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if let Some(department_id) = payload.department_id {
            if !self.tenant_repo.department_belongs_to(department_id, client.id).await? {
                return Err(AppError::NotFound("department"));
            }
        }

        let link = self
            .tenant_repo
            .add_member(&self.pool, client.id, payload.user_id, payload.role, payload.department_id)
            .await?;

        tracing::info!("🔗 Usuário {} vinculado ao cliente {}", payload.user_id, client.id);
        Ok(link)
    }

    pub async fn list_members(&self, client_id: Uuid, scope: TenantScope) -> Result<Vec<ClientMember>, AppError> {
        let client = self.find_client(client_id, scope).await?;
        let links = self.tenant_repo.list_members(client.id).await?;

        let user_ids: Vec<Uuid> = links.iter().map(|link| link.user_id).collect();
        let mut users: HashMap<Uuid, _> = self
            .tenant_repo
            .user_summaries(&user_ids)
            .await?
            .into_iter()
            .map(|user| (user.id, user))
            .collect();

        Ok(links
            .into_iter()
            .filter_map(|link| {
                let user = users.remove(&link.user_id)?;
                Some(ClientMember { link, user })
            })
            .collect())
    }

    // ---
    // ASSINATURA
    // ---

    /// Ativa o plano: atualiza o cliente e emite a fatura na mesma transação.
    /// Fatura repetida no mesmo dia (409) desfaz tudo.
    pub async fn activate_subscription(
        &self,
        client_id: Uuid,
        payload: &ActivateSubscriptionPayload,
    ) -> Result<ClientResponse, AppError> {
        let plan_id = payload.plan_id.ok_or(AppError::InvalidPlan)?;
        let months = payload.months();

        // 1. Inicia a transação
        let mut tx = self.pool.begin().await?;

        // 2. Cliente primeiro (404), depois o plano (400)
        self.tenant_repo
            .find_client(&mut *tx, client_id, None)
            .await?
            .ok_or(AppError::NotFound("client"))?;

        let plan = self
            .tenant_repo
            .find_plan(&mut *tx, plan_id)
            .await?
            .ok_or(AppError::InvalidPlan)?;

        // 3. Um único "agora" para início, fim e número da fatura
        let terms = SubscriptionTerms::compute(client_id, &plan, months, Utc::now());

        let client = self
            .tenant_repo
            .set_subscription(&mut *tx, client_id, plan.id, terms.start, terms.end)
            .await?;

        // 4. Fatura (se colidir, o drop do tx faz rollback)
        self.tenant_repo
            .insert_billing(&mut *tx, client_id, terms.amount, &terms.invoice_number, terms.start, terms.end)
            .await?;

        // 5. Commit
        tx.commit().await?;

        tracing::info!(
            "✅ Assinatura '{}' ativada para o cliente {} por {} mês(es), fatura {}",
            plan.name,
            client_id,
            months,
            terms.invoice_number
        );

        Ok(ClientResponse::new(client, Some(plan)))
    }

    pub async fn suspend_subscription(&self, client_id: Uuid) -> Result<ClientResponse, AppError> {
        let client = self
            .tenant_repo
            .set_status(client_id, ClientStatus::Suspended)
            .await?
            .ok_or(AppError::NotFound("client"))?;

        tracing::info!("⏸️ Assinatura do cliente {} suspensa", client_id);
        self.with_plan(client).await
    }

    // ---
    // USO E FATURAMENTO
    // ---

    pub async fn usage_stats(&self, client_id: Uuid, scope: TenantScope) -> Result<ClientUsage, AppError> {
        let client = self.find_client(client_id, scope).await?;
        usage_snapshot(&self.tenant_repo, client.id, Utc::now().date_naive()).await
    }

    pub async fn billing_history(&self, client_id: Uuid, scope: TenantScope) -> Result<Vec<ClientBilling>, AppError> {
        let client = self.find_client(client_id, scope).await?;
        self.tenant_repo.list_billing(client.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    };

    fn row(client_id: Uuid, date: NaiveDate, counts: UsageCounts) -> ClientUsage {
        let now = Utc::now();
        ClientUsage {
            id: Uuid::new_v4(),
            client_id,
            date,
            users_count: counts.users_count,
            forms_count: counts.forms_count,
            items_count: counts.items_count,
            storage_used: 0,
            created_at: now,
            updated_at: now,
        }
    }

    // Armazenamento em memória com a mesma semântica do ON CONFLICT DO NOTHING
    #[derive(Default)]
    struct MemoryUsageStore {
        rows: Mutex<HashMap<(Uuid, NaiveDate), ClientUsage>>,
        counts: Mutex<UsageCounts>,
        count_calls: AtomicUsize,
    }

    impl MemoryUsageStore {
        fn set_counts(&self, users: i32, forms: i32, items: i32) {
            *self.counts.lock().unwrap() = UsageCounts {
                users_count: users,
                forms_count: forms,
                items_count: items,
            };
        }
    }

    #[async_trait]
    impl UsageStore for MemoryUsageStore {
        async fn find_usage(&self, client_id: Uuid, date: NaiveDate) -> Result<Option<ClientUsage>, AppError> {
            Ok(self.rows.lock().unwrap().get(&(client_id, date)).cloned())
        }

        async fn current_counts(&self, _client_id: Uuid) -> Result<UsageCounts, AppError> {
            self.count_calls.fetch_add(1, Ordering::SeqCst);
            Ok(*self.counts.lock().unwrap())
        }

        async fn insert_usage_if_absent(
            &self,
            client_id: Uuid,
            date: NaiveDate,
            counts: UsageCounts,
        ) -> Result<Option<ClientUsage>, AppError> {
            let mut rows = self.rows.lock().unwrap();
            if rows.contains_key(&(client_id, date)) {
                return Ok(None);
            }
            let usage = row(client_id, date, counts);
            rows.insert((client_id, date), usage.clone());
            Ok(Some(usage))
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[tokio::test]
    async fn same_day_reads_return_the_same_counts() {
        let store = MemoryUsageStore::default();
        let client_id = Uuid::new_v4();
        store.set_counts(2, 1, 3);

        let first = usage_snapshot(&store, client_id, day(10)).await.unwrap();
        store.set_counts(9, 9, 9);
        let second = usage_snapshot(&store, client_id, day(10)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!((second.users_count, second.forms_count, second.items_count), (2, 1, 3));
        assert_eq!(second.storage_used, 0);
        assert_eq!(store.count_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn next_day_takes_a_fresh_snapshot() {
        let store = MemoryUsageStore::default();
        let client_id = Uuid::new_v4();
        store.set_counts(1, 1, 1);
        usage_snapshot(&store, client_id, day(10)).await.unwrap();

        store.set_counts(4, 2, 8);
        let tomorrow = usage_snapshot(&store, client_id, day(11)).await.unwrap();
        assert_eq!((tomorrow.users_count, tomorrow.forms_count, tomorrow.items_count), (4, 2, 8));
    }

    // Simula outra requisição gravando a foto entre a leitura e a inserção
    struct RacingStore {
        inner: MemoryUsageStore,
        hide_first_read: AtomicBool,
    }

    #[async_trait]
    impl UsageStore for RacingStore {
        async fn find_usage(&self, client_id: Uuid, date: NaiveDate) -> Result<Option<ClientUsage>, AppError> {
            if self.hide_first_read.swap(false, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find_usage(client_id, date).await
        }

        async fn current_counts(&self, client_id: Uuid) -> Result<UsageCounts, AppError> {
            self.inner.current_counts(client_id).await
        }

        async fn insert_usage_if_absent(
            &self,
            client_id: Uuid,
            date: NaiveDate,
            counts: UsageCounts,
        ) -> Result<Option<ClientUsage>, AppError> {
            self.inner.insert_usage_if_absent(client_id, date, counts).await
        }
    }

    #[tokio::test]
    async fn losing_the_insert_race_returns_the_winner_row() {
        let client_id = Uuid::new_v4();
        let inner = MemoryUsageStore::default();
        let winner = row(client_id, day(10), UsageCounts { users_count: 5, forms_count: 0, items_count: 0 });
        inner.rows.lock().unwrap().insert((client_id, day(10)), winner.clone());
        inner.set_counts(7, 7, 7);

        let store = RacingStore { inner, hide_first_read: AtomicBool::new(true) };
        let usage = usage_snapshot(&store, client_id, day(10)).await.unwrap();

        assert_eq!(usage.id, winner.id);
        assert_eq!(usage.users_count, 5);
    }
}
