// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::list_users,

        // --- Planos e clientes ---
        handlers::tenancy::list_plans,
        handlers::tenancy::create_plan,
        handlers::tenancy::get_plan,
        handlers::tenancy::update_plan,
        handlers::tenancy::delete_plan,
        handlers::tenancy::list_clients,
        handlers::tenancy::create_client,
        handlers::tenancy::get_client,
        handlers::tenancy::update_client,
        handlers::tenancy::delete_client,
        handlers::tenancy::add_client_user,
        handlers::tenancy::list_client_users,
        handlers::tenancy::activate_subscription,
        handlers::tenancy::suspend_subscription,
        handlers::tenancy::usage_stats,
        handlers::tenancy::billing_history,
        handlers::tenancy::invoice_pdf,
        handlers::tenancy::dashboard_data,

        // --- Organização ---
        handlers::organization::list_departments,
        handlers::organization::create_department,
        handlers::organization::get_department,
        handlers::organization::update_department,
        handlers::organization::delete_department,
        handlers::organization::department_categories,
        handlers::organization::list_categories,
        handlers::organization::create_category,
        handlers::organization::get_category,
        handlers::organization::update_category,
        handlers::organization::delete_category,
        handlers::organization::category_items_map,

        // --- Formulários ---
        handlers::forms::list_forms,
        handlers::forms::create_form,
        handlers::forms::get_form,
        handlers::forms::update_form,
        handlers::forms::delete_form,
        handlers::forms::add_field,
        handlers::forms::form_submissions,
        handlers::forms::list_submissions,
        handlers::forms::create_submission,
        handlers::forms::get_submission,
        handlers::forms::delete_submission,

        // --- Geo ---
        handlers::geo::list_items,
        handlers::geo::create_item,
        handlers::geo::map_data,
        handlers::geo::get_item,
        handlers::geo::update_item,
        handlers::geo::delete_item,
        handlers::geo::list_incidences,
        handlers::geo::create_incidence,
        handlers::geo::incidence_dashboard,
        handlers::geo::get_incidence,
        handlers::geo::update_incidence,
        handlers::geo::delete_incidence,
        handlers::geo::list_layers,
        handlers::geo::create_layer,
        handlers::geo::get_layer,
        handlers::geo::update_layer,
        handlers::geo::delete_layer,
        handlers::geo::add_feature,
        handlers::geo::layer_features,
        handlers::geo::list_features,
        handlers::geo::create_feature,
        handlers::geo::get_feature,
        handlers::geo::update_feature,
        handlers::geo::delete_feature,

        // --- Dashboards ---
        handlers::dashboard::list_configs,
        handlers::dashboard::create_config,
        handlers::dashboard::stats,
        handlers::dashboard::get_config,
        handlers::dashboard::update_config,
        handlers::dashboard::delete_config,
        handlers::dashboard::preview,

        // --- Coleta ---
        handlers::collection::list_sessions,
        handlers::collection::start_session,
        handlers::collection::get_session,
        handlers::collection::delete_session,
        handlers::collection::update_location,
        handlers::collection::add_entry,
        handlers::collection::end_session,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::UserSummary,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Tenancy ---
            models::tenancy::SubscriptionPlan,
            models::tenancy::ClientStatus,
            models::tenancy::Client,
            models::tenancy::ClientResponse,
            models::tenancy::ClientRole,
            models::tenancy::ClientUser,
            models::tenancy::ClientMember,
            models::tenancy::PaymentStatus,
            models::tenancy::ClientBilling,
            models::tenancy::ClientUsage,
            models::tenancy::CreatePlanPayload,
            models::tenancy::UpdatePlanPayload,
            models::tenancy::CreateClientPayload,
            models::tenancy::UpdateClientPayload,
            models::tenancy::AddClientUserPayload,
            models::tenancy::ActivateSubscriptionPayload,

            // --- Organização ---
            models::organization::Department,
            models::organization::Category,
            models::organization::CreateDepartmentPayload,
            models::organization::UpdateDepartmentPayload,
            models::organization::CreateCategoryPayload,
            models::organization::UpdateCategoryPayload,

            // --- Formulários ---
            models::forms::FieldType,
            models::forms::Form,
            models::forms::FormField,
            models::forms::FormDetail,
            models::forms::FormSubmission,
            models::forms::SubmissionResponse,
            models::forms::CreateFormPayload,
            models::forms::UpdateFormPayload,
            models::forms::AddFieldPayload,
            models::forms::CreateSubmissionPayload,

            // --- Geo ---
            models::geo::Item,
            models::geo::ItemResponse,
            models::geo::ItemMapEntry,
            models::geo::Severity,
            models::geo::IncidenceStatus,
            models::geo::Incidence,
            models::geo::IncidenceDetail,
            models::geo::IncidenceDashboard,
            models::geo::LayerType,
            models::geo::MapLayer,
            models::geo::MapFeature,
            models::geo::MapLayerDetail,
            models::geo::CreateItemPayload,
            models::geo::UpdateItemPayload,
            models::geo::CreateIncidencePayload,
            models::geo::UpdateIncidencePayload,
            models::geo::CreateLayerPayload,
            models::geo::UpdateLayerPayload,
            models::geo::CreateFeaturePayload,
            models::geo::UpdateFeaturePayload,

            // --- Dashboards ---
            models::dashboard::VisualizationType,
            models::dashboard::ChartType,
            models::dashboard::DashboardConfig,
            models::dashboard::CreateDashboardPayload,
            models::dashboard::UpdateDashboardPayload,
            models::dashboard::MapPoint,
            models::dashboard::PreviewData,
            models::dashboard::DashboardPreview,
            models::dashboard::TrendDirection,
            models::dashboard::Trend,
            models::dashboard::Trends,
            models::dashboard::BreakdownCounts,
            models::dashboard::FormStats,
            models::dashboard::ActivityEntry,
            models::dashboard::DashboardStats,
            models::dashboard::CategoryNode,
            models::dashboard::DepartmentNode,
            models::dashboard::DashboardData,

            // --- Coleta ---
            models::collection::GeoPosition,
            models::collection::CollectionSession,
            models::collection::CollectionEntry,
            models::collection::EntryResponse,
            models::collection::SessionDetail,
            models::collection::StartSessionPayload,
            models::collection::UpdateLocationPayload,
            models::collection::AddEntryPayload,
            models::collection::SessionStatus,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário"),
        (name = "Planos", description = "Planos de assinatura (staff)"),
        (name = "Clientes", description = "Clientes, membros, assinatura e faturamento"),
        (name = "Organização", description = "Departamentos e categorias"),
        (name = "Formulários", description = "Formulários dinâmicos e campos"),
        (name = "Submissões", description = "Respostas dos formulários"),
        (name = "Itens", description = "Ativos georreferenciados"),
        (name = "Ocorrências", description = "Problemas reportados sobre os itens"),
        (name = "Camadas", description = "Camadas do mapa"),
        (name = "Features", description = "Geometrias das camadas"),
        (name = "Dashboards", description = "Visualizações e indicadores"),
        (name = "Coleta", description = "Sessões de coleta em campo")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
