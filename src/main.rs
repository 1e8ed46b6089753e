// src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controla o nível; padrão "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new().await?;

    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let bind_addr = app_state.settings.bind_addr.clone();

    // Rotas públicas
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // --- Usuários ---
    let user_routes = Router::new()
        .route("/", get(handlers::auth::list_users))
        .route("/me", get(handlers::auth::get_me));

    // --- Planos (staff) ---
    let plan_routes = Router::new()
        .route("/"
               ,get(handlers::tenancy::list_plans)
               .post(handlers::tenancy::create_plan)
        )
        .route("/{id}"
               ,get(handlers::tenancy::get_plan)
               .patch(handlers::tenancy::update_plan)
               .delete(handlers::tenancy::delete_plan)
        );

    // --- Clientes ---
    let client_routes = Router::new()
        .route("/"
               ,get(handlers::tenancy::list_clients)
               .post(handlers::tenancy::create_client)
        )
        .route("/{id}"
               ,get(handlers::tenancy::get_client)
               .patch(handlers::tenancy::update_client)
               .delete(handlers::tenancy::delete_client)
        )
        .route("/{id}/users"
               ,get(handlers::tenancy::list_client_users)
               .post(handlers::tenancy::add_client_user)
        )
        .route("/{id}/activate_subscription", post(handlers::tenancy::activate_subscription))
        .route("/{id}/suspend_subscription", post(handlers::tenancy::suspend_subscription))
        .route("/{id}/usage_stats", get(handlers::tenancy::usage_stats))
        .route("/{id}/billing_history", get(handlers::tenancy::billing_history))
        .route("/{id}/billing/{billing_id}/invoice.pdf", get(handlers::tenancy::invoice_pdf))
        .route("/{id}/dashboard_data", get(handlers::tenancy::dashboard_data));

    // --- Organização ---
    let department_routes = Router::new()
        .route("/"
               ,get(handlers::organization::list_departments)
               .post(handlers::organization::create_department)
        )
        .route("/{id}"
               ,get(handlers::organization::get_department)
               .patch(handlers::organization::update_department)
               .delete(handlers::organization::delete_department)
        )
        .route("/{id}/categories", get(handlers::organization::department_categories));

    let category_routes = Router::new()
        .route("/"
               ,get(handlers::organization::list_categories)
               .post(handlers::organization::create_category)
        )
        .route("/{id}"
               ,get(handlers::organization::get_category)
               .patch(handlers::organization::update_category)
               .delete(handlers::organization::delete_category)
        )
        .route("/{id}/items_map", get(handlers::organization::category_items_map));

    // --- Formulários ---
    let form_routes = Router::new()
        .route("/"
               ,get(handlers::forms::list_forms)
               .post(handlers::forms::create_form)
        )
        .route("/{id}"
               ,get(handlers::forms::get_form)
               .patch(handlers::forms::update_form)
               .delete(handlers::forms::delete_form)
        )
        .route("/{id}/add_field", post(handlers::forms::add_field))
        .route("/{id}/submissions", get(handlers::forms::form_submissions));

    let submission_routes = Router::new()
        .route("/"
               ,get(handlers::forms::list_submissions)
               .post(handlers::forms::create_submission)
        )
        .route("/{id}"
               ,get(handlers::forms::get_submission)
               .delete(handlers::forms::delete_submission)
        );

    // --- Geo ---
    let item_routes = Router::new()
        .route("/"
               ,get(handlers::geo::list_items)
               .post(handlers::geo::create_item)
        )
        .route("/map_data", get(handlers::geo::map_data))
        .route("/{id}"
               ,get(handlers::geo::get_item)
               .patch(handlers::geo::update_item)
               .delete(handlers::geo::delete_item)
        );

    let incidence_routes = Router::new()
        .route("/"
               ,get(handlers::geo::list_incidences)
               .post(handlers::geo::create_incidence)
        )
        .route("/dashboard", get(handlers::geo::incidence_dashboard))
        .route("/{id}"
               ,get(handlers::geo::get_incidence)
               .patch(handlers::geo::update_incidence)
               .delete(handlers::geo::delete_incidence)
        );

    let layer_routes = Router::new()
        .route("/"
               ,get(handlers::geo::list_layers)
               .post(handlers::geo::create_layer)
        )
        .route("/{id}"
               ,get(handlers::geo::get_layer)
               .patch(handlers::geo::update_layer)
               .delete(handlers::geo::delete_layer)
        )
        .route("/{id}/add_feature", post(handlers::geo::add_feature))
        .route("/{id}/features", get(handlers::geo::layer_features));

    let feature_routes = Router::new()
        .route("/"
               ,get(handlers::geo::list_features)
               .post(handlers::geo::create_feature)
        )
        .route("/{id}"
               ,get(handlers::geo::get_feature)
               .patch(handlers::geo::update_feature)
               .delete(handlers::geo::delete_feature)
        );

    // --- Dashboards ---
    let dashboard_routes = Router::new()
        .route("/"
               ,get(handlers::dashboard::list_configs)
               .post(handlers::dashboard::create_config)
        )
        .route("/stats", get(handlers::dashboard::stats))
        .route("/{id}"
               ,get(handlers::dashboard::get_config)
               .patch(handlers::dashboard::update_config)
               .delete(handlers::dashboard::delete_config)
        )
        .route("/{id}/preview", get(handlers::dashboard::preview));

    // --- Coleta ---
    let collection_routes = Router::new()
        .route("/"
               ,get(handlers::collection::list_sessions)
               .post(handlers::collection::start_session)
        )
        .route("/{id}"
               ,get(handlers::collection::get_session)
               .delete(handlers::collection::delete_session)
        )
        .route("/{id}/update_location", post(handlers::collection::update_location))
        .route("/{id}/add_entry", post(handlers::collection::add_entry))
        .route("/{id}/end_session", post(handlers::collection::end_session));

    // Tudo abaixo exige Bearer válido
    let protected_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/subscription-plans", plan_routes)
        .nest("/clients", client_routes)
        .nest("/departments", department_routes)
        .nest("/categories", category_routes)
        .nest("/forms", form_routes)
        .nest("/submissions", submission_routes)
        .nest("/items", item_routes)
        .nest("/incidences", incidence_routes)
        .nest("/map-layers", layer_routes)
        .nest("/map-features", feature_routes)
        .nest("/dashboards", dashboard_routes)
        .nest("/collection-sessions", collection_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api", protected_routes)
        .with_state(app_state);

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
