// src/models/dashboard.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::geo::MapLayerDetail;

// --- ENUMS ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "visualization_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VisualizationType {
    Map,
    Chart,
    Table,
    List,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "chart_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Scatter,
}

// --- CONFIGURAÇÃO DE DASHBOARD ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DashboardConfig {
    pub id: Uuid,
    pub client_id: Uuid,
    pub form_id: Uuid,
    pub name: String,
    pub description: String,
    pub visualization_type: VisualizationType,
    pub chart_type: Option<ChartType>,
    // Ex: { "field": "status" } para gráficos
    pub config: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDashboardPayload {
    pub form_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "O nome do dashboard é obrigatório."))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub visualization_type: VisualizationType,
    pub chart_type: Option<ChartType>,
    pub config: Option<Value>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateDashboardPayload {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub visualization_type: Option<VisualizationType>,
    pub chart_type: Option<ChartType>,
    pub config: Option<Value>,
}

// --- PREVIEW ---

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MapPoint {
    pub id: Uuid,
    pub latitude: Value,
    pub longitude: Value,
    pub data: Value,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum PreviewData {
    Points(Vec<MapPoint>),
    Counts(BTreeMap<String, i64>),
    Rows(Vec<Value>),
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardPreview {
    #[serde(rename = "type")]
    pub visualization_type: VisualizationType,
    pub chart_type: Option<ChartType>,
    pub data: PreviewData,
}

// --- ESTATÍSTICAS (GET /dashboards/stats) ---

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
pub struct Trend {
    pub value: i64,
    pub direction: TrendDirection,
    pub percentage: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Trends {
    pub total_forms: Trend,
    pub total_submissions: Trend,
    pub open_incidences: Trend,
    pub active_users: Trend,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq, ToSchema)]
pub struct BreakdownCounts {
    pub forms_count: i64,
    pub submissions_count: i64,
}

// Linha agregada por categoria/departamento
#[derive(Debug, Clone, FromRow)]
pub struct BreakdownRow {
    pub name: String,
    pub forms_count: i64,
    pub submissions_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FormStats {
    pub completion_rate: i64,
    pub by_category: BTreeMap<String, BreakdownCounts>,
    pub by_department: BTreeMap<String, BreakdownCounts>,
}

#[derive(Debug, Clone, FromRow)]
pub struct RecentSubmission {
    pub form_name: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
pub struct ActivityEntry {
    pub title: String,
    pub description: String,
    pub timestamp: String,
}

impl From<RecentSubmission> for ActivityEntry {
    fn from(sub: RecentSubmission) -> Self {
        Self {
            title: sub.form_name,
            description: format!("New submission by {}", sub.username),
            timestamp: sub.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_forms: i64,
    pub total_submissions: i64,
    pub open_incidences: i64,
    pub active_users: i64,
    pub trends: Trends,
    pub form_stats: FormStats,
    pub recent_activity: Vec<ActivityEntry>,
}

// Contagens brutas de uma janela de 30 dias contra a anterior
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodCounts {
    pub current: i64,
    pub previous: i64,
}

// --- ÁRVORE ORGANIZACIONAL (GET /clients/{id}/dashboard_data) ---

#[derive(Debug, Clone, FromRow)]
pub struct CategoryCountsRow {
    pub id: Uuid,
    pub department_id: Uuid,
    pub name: String,
    pub items_count: i64,
    pub forms_count: i64,
    pub incidences_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryNode {
    pub id: Uuid,
    pub name: String,
    pub items_count: i64,
    pub forms_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DepartmentNode {
    pub id: Uuid,
    pub name: String,
    pub categories: Vec<CategoryNode>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardData {
    pub departments: Vec<DepartmentNode>,
    pub total_items: i64,
    pub total_forms: i64,
    pub total_incidences: i64,
    pub map_layers: Vec<MapLayerDetail>,
}
