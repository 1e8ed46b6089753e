// src/models/geo.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

// ---
// 1. Item (ativo georreferenciado dentro de uma categoria)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Item {
    pub id: Uuid,
    pub client_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub properties: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemResponse {
    #[serde(flatten)]
    pub item: Item,
    // Propriedades formatadas pelo primeiro formulário da categoria
    pub form_data: Value,
}

// Linha pronta para o mapa (GET /items/map_data)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ItemMapEntry {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    pub properties: Value,
    pub incidences_count: i64,
}

// ---
// 2. Incidence (problema reportado sobre um item)
// ---
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "incidence_severity", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [Severity::Low, Severity::Medium, Severity::High, Severity::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Default, ToSchema)]
#[sqlx(type_name = "incidence_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IncidenceStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
}

impl IncidenceStatus {
    pub const ALL: [IncidenceStatus; 3] =
        [IncidenceStatus::Open, IncidenceStatus::InProgress, IncidenceStatus::Resolved];

    pub fn as_str(&self) -> &'static str {
        match self {
            IncidenceStatus::Open => "open",
            IncidenceStatus::InProgress => "in_progress",
            IncidenceStatus::Resolved => "resolved",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Incidence {
    pub id: Uuid,
    pub client_id: Uuid,
    pub item_id: Uuid,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub status: IncidenceStatus,
    pub reported_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IncidenceDetail {
    #[serde(flatten)]
    pub incidence: Incidence,
    pub item_details: Item,
}

// Contagem agrupada vinda do banco (severity ou status como texto)
#[derive(Debug, Clone, FromRow)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

// GET /incidences/dashboard
#[derive(Debug, Serialize, ToSchema)]
pub struct IncidenceDashboard {
    pub total: i64,
    pub by_severity: BTreeMap<String, i64>,
    pub by_status: BTreeMap<String, i64>,
}

impl IncidenceDashboard {
    /// Todas as severidades e status aparecem, mesmo com contagem zero.
    pub fn assemble(total: i64, by_severity: &[LabelCount], by_status: &[LabelCount]) -> Self {
        let lookup = |rows: &[LabelCount], key: &str| {
            rows.iter().find(|r| r.label == key).map(|r| r.count).unwrap_or(0)
        };

        Self {
            total,
            by_severity: Severity::ALL
                .iter()
                .map(|s| (s.as_str().to_string(), lookup(by_severity, s.as_str())))
                .collect(),
            by_status: IncidenceStatus::ALL
                .iter()
                .map(|s| (s.as_str().to_string(), lookup(by_status, s.as_str())))
                .collect(),
        }
    }
}

// ---
// 3. MapLayer / MapFeature
// ---
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "layer_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    Point,
    Line,
    Polygon,
    Grid,
    Heatmap,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MapLayer {
    pub id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    pub description: String,
    pub layer_type: LayerType,
    #[schema(example = "#FF0000")]
    pub color: String,
    pub opacity: f64,
    pub properties: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MapFeature {
    pub id: Uuid,
    pub client_id: Uuid,
    pub layer_id: Uuid,
    pub name: String,
    pub description: String,
    // Geometria GeoJSON, guardada como veio
    pub geometry: Value,
    pub properties: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MapLayerDetail {
    #[serde(flatten)]
    pub layer: MapLayer,
    pub features: Vec<MapFeature>,
    pub feature_count: usize,
}

impl MapLayerDetail {
    pub fn new(layer: MapLayer, features: Vec<MapFeature>) -> Self {
        let feature_count = features.len();
        Self { layer, features, feature_count }
    }

    /// Distribui as features (de várias camadas) pelas respectivas camadas.
    pub fn group(layers: Vec<MapLayer>, features: Vec<MapFeature>) -> Vec<Self> {
        let mut by_layer: BTreeMap<Uuid, Vec<MapFeature>> = BTreeMap::new();
        for feature in features {
            by_layer.entry(feature.layer_id).or_default().push(feature);
        }
        layers
            .into_iter()
            .map(|layer| {
                let features = by_layer.remove(&layer.id).unwrap_or_default();
                Self::new(layer, features)
            })
            .collect()
    }
}

// ---
// 4. Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateItemPayload {
    pub category_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "O nome do item é obrigatório."))]
    pub name: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    pub properties: Option<Value>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateItemPayload {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    pub properties: Option<Value>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ItemFilter {
    pub category: Option<Uuid>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeatureFilter {
    pub layer: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateIncidencePayload {
    pub item_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "O título é obrigatório."))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub severity: Severity,
    #[serde(default)]
    pub status: IncidenceStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateIncidencePayload {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub severity: Option<Severity>,
    pub status: Option<IncidenceStatus>,
}

fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    let bytes = color.as_bytes();
    let ok = bytes.len() == 7 && bytes[0] == b'#' && bytes[1..].iter().all(u8::is_ascii_hexdigit);
    if ok {
        Ok(())
    } else {
        let mut err = ValidationError::new("hex_color");
        err.message = Some("A cor deve estar no formato #RRGGBB.".into());
        Err(err)
    }
}

fn default_color() -> String {
    "#FF0000".to_string()
}

fn default_opacity() -> f64 {
    0.8
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLayerPayload {
    // Obrigatório para o operador da plataforma; membros herdam o próprio cliente
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "O nome da camada é obrigatório."))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub layer_type: LayerType,
    #[serde(default = "default_color")]
    #[validate(custom(function = "validate_hex_color"))]
    pub color: String,
    #[serde(default = "default_opacity")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub opacity: f64,
    pub properties: Option<Value>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateLayerPayload {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub layer_type: Option<LayerType>,
    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
    #[validate(range(min = 0.0, max = 1.0))]
    pub opacity: Option<f64>,
    pub properties: Option<Value>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFeaturePayload {
    // Em /map-layers/{id}/add_feature a camada vem da rota
    pub layer_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "O nome da feature é obrigatório."))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub geometry: Value,
    pub properties: Option<Value>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateFeaturePayload {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub geometry: Option<Value>,
    pub properties: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn incidence_dashboard_lists_every_key() {
        let by_severity = vec![LabelCount { label: "high".into(), count: 2 }];
        let by_status = vec![
            LabelCount { label: "open".into(), count: 1 },
            LabelCount { label: "resolved".into(), count: 1 },
        ];
        let dashboard = IncidenceDashboard::assemble(2, &by_severity, &by_status);

        assert_eq!(dashboard.total, 2);
        assert_eq!(dashboard.by_severity.len(), 4);
        assert_eq!(dashboard.by_severity["high"], 2);
        assert_eq!(dashboard.by_severity["critical"], 0);
        assert_eq!(dashboard.by_status["in_progress"], 0);
        assert_eq!(dashboard.by_status["open"], 1);
    }

    #[test]
    fn features_are_grouped_under_their_layer() {
        let now = Utc::now();
        let layer = |name: &str| MapLayer {
            id: Uuid::new_v4(),
            client_id: Uuid::nil(),
            name: name.into(),
            description: String::new(),
            layer_type: LayerType::Point,
            color: "#FF0000".into(),
            opacity: 0.8,
            properties: json!({}),
            created_at: now,
            updated_at: now,
        };
        let valves = layer("Valves");
        let pipes = layer("Pipes");
        let feature = MapFeature {
            id: Uuid::new_v4(),
            client_id: Uuid::nil(),
            layer_id: valves.id,
            name: "V-01".into(),
            description: String::new(),
            geometry: json!({ "type": "Point", "coordinates": [-46.6, -23.5] }),
            properties: json!({}),
            created_at: now,
            updated_at: now,
        };

        let grouped = MapLayerDetail::group(vec![valves, pipes], vec![feature]);
        assert_eq!(grouped[0].feature_count, 1);
        assert_eq!(grouped[1].feature_count, 0);
    }

    #[test]
    fn layer_color_must_be_hex() {
        let layer = |color: &str| CreateLayerPayload {
            client_id: None,
            name: "Valves".into(),
            description: String::new(),
            layer_type: LayerType::Point,
            color: color.into(),
            opacity: 0.8,
            properties: None,
        };
        assert!(layer("#00ff7A").validate().is_ok());
        assert!(layer("red").validate().is_err());
        assert!(layer("#GG0000").validate().is_err());
    }

    #[test]
    fn layer_defaults_apply() {
        let payload: CreateLayerPayload =
            serde_json::from_value(json!({ "name": "Pipes", "layer_type": "line" })).unwrap();
        assert_eq!(payload.color, "#FF0000");
        assert_eq!(payload.opacity, 0.8);
    }

    #[test]
    fn incidence_status_serializes_snake_case() {
        assert_eq!(serde_json::to_value(IncidenceStatus::InProgress).unwrap(), "in_progress");
    }
}
