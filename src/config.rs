// src/config.rs

use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        CollectionRepository, DashboardRepository, FormRepository, GeoRepository,
        OrganizationRepository, TenantRepository, UserRepository,
    },
    services::{
        auth::AuthService, collection_service::CollectionService,
        dashboard_service::DashboardService, document_service::DocumentService,
        form_service::FormService, geo_service::GeoService,
        organization_service::OrganizationService, tenancy_service::TenantService,
    },
};

// Configurações lidas do ambiente (.env)
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub token_ttl_days: i64,
    // Só em desenvolvimento: devolve a cadeia de erros no 500 das estatísticas
    pub expose_error_details: bool,
    pub fonts_dir: PathBuf,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 5)?,
            token_ttl_days: parse_or("TOKEN_TTL_DAYS", 7)?,
            expose_error_details: parse_or("EXPOSE_ERROR_DETAILS", false)?,
            fonts_dir: env::var("FONTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./fonts")),
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} tem um valor inválido: '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub settings: Arc<Settings>,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub tenant_service: TenantService,
    pub organization_service: OrganizationService,
    pub form_service: FormService,
    pub geo_service: GeoService,
    pub dashboard_service: DashboardService,
    pub collection_service: CollectionService,
    pub document_service: DocumentService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let settings = Settings::from_env()?;

        let db_pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let tenant_repo = TenantRepository::new(db_pool.clone());
        let organization_repo = OrganizationRepository::new(db_pool.clone());
        let form_repo = FormRepository::new(db_pool.clone());
        let geo_repo = GeoRepository::new(db_pool.clone());
        let dashboard_repo = DashboardRepository::new(db_pool.clone());
        let collection_repo = CollectionRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            settings.jwt_secret.clone(),
            settings.token_ttl_days,
        );
        let tenant_service = TenantService::new(tenant_repo.clone(), user_repo, db_pool.clone());
        let organization_service = OrganizationService::new(organization_repo.clone());
        let form_service = FormService::new(form_repo.clone(), organization_repo.clone(), db_pool.clone());
        let geo_service = GeoService::new(geo_repo.clone(), organization_repo.clone(), form_repo.clone());
        let dashboard_service = DashboardService::new(
            dashboard_repo,
            tenant_repo.clone(),
            organization_repo,
            geo_repo,
            form_repo.clone(),
        );
        let collection_service = CollectionService::new(collection_repo, form_repo);
        let document_service = DocumentService::new(tenant_repo, settings.fonts_dir.clone());

        Ok(Self {
            db_pool,
            settings: Arc::new(settings),
            i18n_store: Arc::new(I18nStore::new()),
            auth_service,
            tenant_service,
            organization_service,
            form_service,
            geo_service,
            dashboard_service,
            collection_service,
            document_service,
        })
    }
}
