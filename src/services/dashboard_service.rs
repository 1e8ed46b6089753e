// src/services/dashboard_service.rs

use std::collections::{BTreeMap, HashMap};

use anyhow::Context;
use chrono::{Duration, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{DashboardRepository, FormRepository, GeoRepository, OrganizationRepository, TenantRepository},
    middleware::tenancy::TenantScope,
    models::{
        dashboard::{
            ActivityEntry, BreakdownCounts, BreakdownRow, CategoryCountsRow, CategoryNode, CreateDashboardPayload,
            DashboardConfig, DashboardData, DashboardPreview, DashboardStats, DepartmentNode,
            FormStats, MapPoint, PeriodCounts, PreviewData, Trend, TrendDirection, Trends,
            UpdateDashboardPayload, VisualizationType,
        },
        forms::FormSubmission,
        geo::MapLayerDetail,
        organization::Department,
    },
};

const TREND_WINDOW_DAYS: i64 = 30;
const RECENT_ACTIVITY_LIMIT: i64 = 5;

// ---
// Cálculos puros
// ---

/// Variação percentual entre dois períodos. Base zero vira 100 (se cresceu) ou 0.
pub fn percentage_change(old: i64, new: i64) -> i64 {
    if old == 0 {
        return if new > 0 { 100 } else { 0 };
    }
    let change = (new - old) as f64 / old as f64 * 100.0;
    change.round_ties_even() as i64
}

pub fn trend(value: i64, period: PeriodCounts) -> Trend {
    let direction = if period.current >= period.previous {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    };
    Trend {
        value,
        direction,
        percentage: percentage_change(period.previous, period.current),
    }
}

// Sem histórico: sempre "up" com 0%
fn flat_trend(value: i64) -> Trend {
    Trend { value, direction: TrendDirection::Up, percentage: 0 }
}

pub fn completion_rate(total_forms: i64, forms_with_submissions: i64) -> i64 {
    if total_forms == 0 {
        return 0;
    }
    (forms_with_submissions as f64 / total_forms as f64 * 100.0).round_ties_even() as i64
}

fn breakdown(rows: Vec<BreakdownRow>) -> BTreeMap<String, BreakdownCounts> {
    rows.into_iter()
        .map(|row| {
            let counts = BreakdownCounts {
                forms_count: row.forms_count,
                submissions_count: row.submissions_count,
            };
            (row.name, counts)
        })
        .collect()
}

/// Valores "vazios" não entram na contagem do gráfico.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

// Chave do agrupamento: só escalares viram chave
pub fn group_key(value: &Value) -> Option<String> {
    if !is_truthy(value) {
        return None;
    }
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn count_by_field(submissions: &[FormSubmission], field: Option<&str>) -> BTreeMap<String, i64> {
    let mut counts = BTreeMap::new();
    let Some(field) = field else {
        return counts;
    };
    for key in submissions
        .iter()
        .filter_map(|s| s.data.get(field))
        .filter_map(group_key)
    {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// Remodela as submissões do formulário conforme o tipo de visualização.
pub fn build_preview(config: &DashboardConfig, submissions: &[FormSubmission]) -> DashboardPreview {
    let data = match config.visualization_type {
        VisualizationType::Map => PreviewData::Points(
            submissions
                .iter()
                .map(|s| MapPoint {
                    id: s.id,
                    latitude: s.data.get("latitude").cloned().unwrap_or(Value::Null),
                    longitude: s.data.get("longitude").cloned().unwrap_or(Value::Null),
                    data: s.data.clone(),
                })
                .collect(),
        ),
        VisualizationType::Chart => {
            let field = config.config.get("field").and_then(Value::as_str);
            PreviewData::Counts(count_by_field(submissions, field))
        }
        VisualizationType::Table | VisualizationType::List => {
            PreviewData::Rows(submissions.iter().map(|s| s.data.clone()).collect())
        }
    };

    DashboardPreview {
        visualization_type: config.visualization_type,
        chart_type: config.chart_type,
        data,
    }
}

// Somatório do cliente inteiro na árvore de dashboard_data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeTotals {
    pub items: i64,
    pub forms: i64,
    pub incidences: i64,
}

/// Monta departamentos -> categorias na ordem dos departamentos recebidos.
/// Departamentos sem categoria aparecem com lista vazia; ocorrências entram
/// só no total.
pub fn build_tree(departments: Vec<Department>, rows: Vec<CategoryCountsRow>) -> (Vec<DepartmentNode>, TreeTotals) {
    let mut totals = TreeTotals::default();
    let mut by_department: HashMap<Uuid, Vec<CategoryNode>> = HashMap::new();
    for row in rows {
        totals.items += row.items_count;
        totals.forms += row.forms_count;
        totals.incidences += row.incidences_count;
        by_department.entry(row.department_id).or_default().push(CategoryNode {
            id: row.id,
            name: row.name,
            items_count: row.items_count,
            forms_count: row.forms_count,
        });
    }

    let nodes = departments
        .into_iter()
        .map(|dept| DepartmentNode {
            categories: by_department.remove(&dept.id).unwrap_or_default(),
            id: dept.id,
            name: dept.name,
        })
        .collect();

    (nodes, totals)
}

#[derive(Clone)]
pub struct DashboardService {
    dashboard_repo: DashboardRepository,
    tenant_repo: TenantRepository,
    organization_repo: OrganizationRepository,
    geo_repo: GeoRepository,
    form_repo: FormRepository,
}

impl DashboardService {
    pub fn new(
        dashboard_repo: DashboardRepository,
        tenant_repo: TenantRepository,
        organization_repo: OrganizationRepository,
        geo_repo: GeoRepository,
        form_repo: FormRepository,
    ) -> Self {
        Self { dashboard_repo, tenant_repo, organization_repo, geo_repo, form_repo }
    }

    // ---
    // CONFIGURAÇÕES
    // ---

    pub async fn list_configs(&self, scope: TenantScope) -> Result<Vec<DashboardConfig>, AppError> {
        self.dashboard_repo.list_configs(scope.filter()?).await
    }

    pub async fn get_config(&self, id: Uuid, scope: TenantScope) -> Result<DashboardConfig, AppError> {
        self.dashboard_repo
            .find_config(id, scope.filter()?)
            .await?
            .ok_or(AppError::NotFound("dashboard"))
    }

    pub async fn create_config(
        &self,
        scope: TenantScope,
        payload: &CreateDashboardPayload,
    ) -> Result<DashboardConfig, AppError> {
        let form = self
            .form_repo
            .find_form(payload.form_id, scope.filter()?)
            .await?
            .ok_or(AppError::NotFound("form"))?;
        self.dashboard_repo.create_config(&form, payload).await
    }

    pub async fn update_config(
        &self,
        id: Uuid,
        scope: TenantScope,
        payload: &UpdateDashboardPayload,
    ) -> Result<DashboardConfig, AppError> {
        self.dashboard_repo
            .update_config(id, scope.filter()?, payload)
            .await?
            .ok_or(AppError::NotFound("dashboard"))
    }

    pub async fn delete_config(&self, id: Uuid, scope: TenantScope) -> Result<(), AppError> {
        if !self.dashboard_repo.delete_config(id, scope.filter()?).await? {
            return Err(AppError::NotFound("dashboard"));
        }
        Ok(())
    }

    // GET /dashboards/{id}/preview
    pub async fn preview(&self, id: Uuid, scope: TenantScope) -> Result<DashboardPreview, AppError> {
        let config = self.get_config(id, scope).await?;
        let submissions = self.form_repo.submissions_of_form(config.form_id).await?;
        Ok(build_preview(&config, &submissions))
    }

    // ---
    // ESTATÍSTICAS
    // ---

    /// Agregação de GET /dashboards/stats para o cliente do usuário.
    pub async fn stats(&self, client_id: Uuid) -> anyhow::Result<DashboardStats> {
        let repo = &self.dashboard_repo;

        let total_forms = repo.count_forms(client_id).await.context("contagem de formulários")?;
        let total_submissions = repo.count_submissions(client_id).await.context("contagem de submissões")?;
        let open_incidences = repo
            .count_open_incidences(client_id)
            .await
            .context("contagem de ocorrências abertas")?;
        let active_users = repo.count_active_users(client_id).await.context("contagem de usuários ativos")?;

        let now = Utc::now();
        let window_start = now - Duration::days(TREND_WINDOW_DAYS);
        let previous_start = window_start - Duration::days(TREND_WINDOW_DAYS);

        let submissions_period = PeriodCounts {
            current: repo.submissions_between(client_id, window_start, None).await?,
            previous: repo
                .submissions_between(client_id, previous_start, Some(window_start))
                .await?,
        };
        let incidences_period = PeriodCounts {
            current: repo.open_incidences_between(client_id, window_start, None).await?,
            previous: repo
                .open_incidences_between(client_id, previous_start, Some(window_start))
                .await?,
        };

        let forms_with_submissions = repo
            .count_forms_with_submissions(client_id)
            .await
            .context("taxa de preenchimento")?;
        let by_category = breakdown(repo.breakdown_by_category(client_id).await.context("agrupamento por categoria")?);
        let by_department = breakdown(
            repo.breakdown_by_department(client_id)
                .await
                .context("agrupamento por departamento")?,
        );

        let recent_activity = repo
            .recent_submissions(client_id, RECENT_ACTIVITY_LIMIT)
            .await
            .context("atividade recente")?
            .into_iter()
            .map(ActivityEntry::from)
            .collect();

        Ok(DashboardStats {
            total_forms,
            total_submissions,
            open_incidences,
            active_users,
            trends: Trends {
                total_forms: flat_trend(total_forms),
                total_submissions: trend(total_submissions, submissions_period),
                open_incidences: trend(open_incidences, incidences_period),
                active_users: flat_trend(active_users),
            },
            form_stats: FormStats {
                completion_rate: completion_rate(total_forms, forms_with_submissions),
                by_category,
                by_department,
            },
            recent_activity,
        })
    }

    // ---
    // ÁRVORE ORGANIZACIONAL
    // ---

    // GET /clients/{id}/dashboard_data
    pub async fn dashboard_data(&self, client_id: Uuid, scope: TenantScope) -> Result<DashboardData, AppError> {
        let client = self
            .tenant_repo
            .find_client(self.tenant_repo.pool(), client_id, scope.filter()?)
            .await?
            .ok_or(AppError::NotFound("client"))?;

        let departments = self.organization_repo.departments_of_client(client.id).await?;
        let categories = self.dashboard_repo.category_counts(client.id).await?;

        let (departments, totals) = build_tree(departments, categories);

        let layers = self.geo_repo.list_layers(Some(client.id)).await?;
        let ids: Vec<Uuid> = layers.iter().map(|l| l.id).collect();
        let features = self.geo_repo.features_of_layers(&ids).await?;

        Ok(DashboardData {
            departments,
            total_items: totals.items,
            total_forms: totals.forms,
            total_incidences: totals.incidences,
            map_layers: MapLayerDetail::group(layers, features),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn submission(data: Value) -> FormSubmission {
        FormSubmission {
            id: Uuid::new_v4(),
            client_id: Uuid::nil(),
            form_id: Uuid::nil(),
            submitted_by: Uuid::nil(),
            data,
            created_at: Utc::now(),
        }
    }

    fn config(visualization_type: VisualizationType, config: Value) -> DashboardConfig {
        DashboardConfig {
            id: Uuid::new_v4(),
            client_id: Uuid::nil(),
            form_id: Uuid::nil(),
            name: "Status".into(),
            description: String::new(),
            visualization_type,
            chart_type: None,
            config,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn percentage_change_handles_zero_base() {
        assert_eq!(percentage_change(0, 5), 100);
        assert_eq!(percentage_change(0, 0), 0);
        assert_eq!(percentage_change(10, 15), 50);
        assert_eq!(percentage_change(10, 5), -50);
    }

    #[test]
    fn percentage_change_rounds_half_to_even() {
        // 1/8 = 12.5% e 3/8 = 37.5%
        assert_eq!(percentage_change(8, 9), 12);
        assert_eq!(percentage_change(8, 11), 38);
    }

    #[test]
    fn trend_direction_follows_periods() {
        let up = trend(7, PeriodCounts { current: 3, previous: 3 });
        assert_eq!(up.direction, TrendDirection::Up);
        assert_eq!(up.percentage, 0);

        let down = trend(7, PeriodCounts { current: 1, previous: 4 });
        assert_eq!(down.direction, TrendDirection::Down);
        assert_eq!(down.percentage, -75);
    }

    #[test]
    fn completion_rate_cases() {
        assert_eq!(completion_rate(0, 0), 0);
        assert_eq!(completion_rate(4, 2), 50);
        assert_eq!(completion_rate(3, 1), 33);
    }

    #[test]
    fn chart_preview_counts_values() {
        let subs = vec![
            submission(json!({ "status": "A" })),
            submission(json!({ "status": "A" })),
            submission(json!({ "status": "B" })),
        ];
        let preview = build_preview(&config(VisualizationType::Chart, json!({ "field": "status" })), &subs);

        let PreviewData::Counts(counts) = preview.data else {
            panic!("esperava contagens");
        };
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["A"], 2);
        assert_eq!(counts["B"], 1);
    }

    #[test]
    fn chart_preview_skips_falsy_values() {
        let subs = vec![
            submission(json!({ "status": "" })),
            submission(json!({ "status": null })),
            submission(json!({ "status": 0 })),
            submission(json!({ "status": false })),
            submission(json!({ "status": [] })),
            submission(json!({ "other": "A" })),
            submission(json!({ "status": 3 })),
        ];
        let counts = count_by_field(&subs, Some("status"));
        assert_eq!(counts.len(), 1);
        assert_eq!(counts["3"], 1);
    }

    #[test]
    fn chart_without_field_is_empty() {
        let subs = vec![submission(json!({ "status": "A" }))];
        assert!(count_by_field(&subs, None).is_empty());
    }

    #[test]
    fn map_preview_extracts_coordinates() {
        let subs = vec![
            submission(json!({ "latitude": -23.5, "longitude": -46.6, "note": "ok" })),
            submission(json!({ "note": "sem gps" })),
        ];
        let preview = build_preview(&config(VisualizationType::Map, json!({})), &subs);

        let PreviewData::Points(points) = preview.data else {
            panic!("esperava pontos");
        };
        assert_eq!(points[0].latitude, json!(-23.5));
        assert_eq!(points[1].longitude, Value::Null);
        assert_eq!(points[1].data["note"], "sem gps");
    }

    #[test]
    fn table_preview_passes_data_through() {
        let subs = vec![submission(json!({ "a": 1 })), submission(json!({ "b": 2 }))];
        let preview = build_preview(&config(VisualizationType::Table, json!({})), &subs);

        let PreviewData::Rows(rows) = preview.data else {
            panic!("esperava linhas");
        };
        assert_eq!(rows, vec![json!({ "a": 1 }), json!({ "b": 2 })]);
    }

    fn department(name: &str) -> Department {
        Department { id: Uuid::new_v4(), client_id: Uuid::nil(), name: name.into(), created_at: Utc::now() }
    }

    fn category_row(department_id: Uuid, name: &str, items: i64, forms: i64, incidences: i64) -> CategoryCountsRow {
        CategoryCountsRow {
            id: Uuid::new_v4(),
            department_id,
            name: name.into(),
            items_count: items,
            forms_count: forms,
            incidences_count: incidences,
        }
    }

    #[test]
    fn department_without_categories_stays_in_tree() {
        let (nodes, totals) = build_tree(vec![department("Obras")], vec![]);
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].categories.is_empty());
        assert_eq!(totals, TreeTotals::default());
    }

    #[test]
    fn categories_group_under_their_department() {
        let water = department("Saneamento");
        let rows = vec![
            category_row(water.id, "Hidrantes", 4, 1, 0),
            category_row(water.id, "Válvulas", 2, 2, 0),
        ];
        let (nodes, totals) = build_tree(vec![water], rows);

        let names: Vec<&str> = nodes[0].categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Hidrantes", "Válvulas"]);
        assert_eq!(totals.items, 6);
        assert_eq!(totals.forms, 3);
    }

    #[test]
    fn incidences_only_count_toward_total() {
        let water = department("Saneamento");
        let (nodes, totals) = build_tree(vec![water.clone()], vec![category_row(water.id, "Hidrantes", 1, 1, 7)]);

        assert_eq!(totals.incidences, 7);
        let node = serde_json::to_value(&nodes[0].categories[0]).unwrap();
        assert!(node.get("incidences_count").is_none());
    }

    #[test]
    fn department_order_is_preserved() {
        let first = department("Zeladoria");
        let second = department("Agua");
        let rows = vec![
            category_row(second.id, "Redes", 1, 0, 0),
            category_row(first.id, "Praças", 1, 0, 0),
        ];
        let (nodes, _) = build_tree(vec![first, second], rows);

        let names: Vec<&str> = nodes.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Zeladoria", "Agua"]);
    }
}
