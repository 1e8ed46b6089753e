// src/db/geo_repo.rs

use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        geo::{
            CreateFeaturePayload, CreateIncidencePayload, CreateItemPayload, CreateLayerPayload,
            Incidence, Item, ItemMapEntry, LabelCount, MapFeature, MapLayer, UpdateFeaturePayload,
            UpdateIncidencePayload, UpdateItemPayload, UpdateLayerPayload,
        },
        organization::Category,
    },
};

// Itens, ocorrências, camadas e features.
// `scope` = filtro de cliente; None = operador da plataforma.
#[derive(Clone)]
pub struct GeoRepository {
    pool: PgPool,
}

impl GeoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // ITENS
    // ---

    pub async fn list_items(&self, scope: Option<Uuid>, category_id: Option<Uuid>) -> Result<Vec<Item>, AppError> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT * FROM items
            WHERE ($1::uuid IS NULL OR client_id = $1)
              AND ($2::uuid IS NULL OR category_id = $2)
            ORDER BY name ASC
            "#,
        )
        .bind(scope)
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn find_item(&self, id: Uuid, scope: Option<Uuid>) -> Result<Option<Item>, AppError> {
        let item = sqlx::query_as::<_, Item>(
            "SELECT * FROM items WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)",
        )
        .bind(id)
        .bind(scope)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    pub async fn items_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Item>, AppError> {
        let items = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    pub async fn create_item(&self, category: &Category, payload: &CreateItemPayload) -> Result<Item, AppError> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (client_id, category_id, name, latitude, longitude, properties)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(category.client_id)
        .bind(category.id)
        .bind(&payload.name)
        .bind(payload.latitude)
        .bind(payload.longitude)
        .bind(payload.properties.clone().unwrap_or_else(|| json!({})))
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    pub async fn update_item(
        &self,
        id: Uuid,
        scope: Option<Uuid>,
        payload: &UpdateItemPayload,
    ) -> Result<Option<Item>, AppError> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items SET
                name = COALESCE($3, name),
                latitude = COALESCE($4, latitude),
                longitude = COALESCE($5, longitude),
                properties = COALESCE($6, properties),
                updated_at = NOW()
            WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(scope)
        .bind(payload.name.as_deref())
        .bind(payload.latitude)
        .bind(payload.longitude)
        .bind(payload.properties.clone())
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    pub async fn delete_item(&self, id: Uuid, scope: Option<Uuid>) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)")
            .bind(id)
            .bind(scope)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // Itens prontos para o mapa, com o nome da categoria e o nº de ocorrências
    pub async fn map_data(
        &self,
        scope: Option<Uuid>,
        category_id: Option<Uuid>,
    ) -> Result<Vec<ItemMapEntry>, AppError> {
        let rows = sqlx::query_as::<_, ItemMapEntry>(
            r#"
            SELECT i.id, i.name, c.name AS category, i.latitude, i.longitude, i.properties,
                   COUNT(inc.id) AS incidences_count
            FROM items i
            JOIN categories c ON c.id = i.category_id
            LEFT JOIN incidences inc ON inc.item_id = i.id
            WHERE ($1::uuid IS NULL OR i.client_id = $1)
              AND ($2::uuid IS NULL OR i.category_id = $2)
            GROUP BY i.id, c.name
            ORDER BY i.name ASC
            "#,
        )
        .bind(scope)
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ---
    // OCORRÊNCIAS
    // ---

    pub async fn list_incidences(&self, scope: Option<Uuid>) -> Result<Vec<Incidence>, AppError> {
        let rows = sqlx::query_as::<_, Incidence>(
            "SELECT * FROM incidences WHERE ($1::uuid IS NULL OR client_id = $1) ORDER BY created_at DESC",
        )
        .bind(scope)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_incidence(&self, id: Uuid, scope: Option<Uuid>) -> Result<Option<Incidence>, AppError> {
        let row = sqlx::query_as::<_, Incidence>(
            "SELECT * FROM incidences WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)",
        )
        .bind(id)
        .bind(scope)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn create_incidence(
        &self,
        item: &Item,
        payload: &CreateIncidencePayload,
        reported_by: Uuid,
    ) -> Result<Incidence, AppError> {
        let row = sqlx::query_as::<_, Incidence>(
            r#"
            INSERT INTO incidences (client_id, item_id, title, description, severity, status, reported_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(item.client_id)
        .bind(item.id)
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(payload.severity)
        .bind(payload.status)
        .bind(reported_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_incidence(
        &self,
        id: Uuid,
        scope: Option<Uuid>,
        payload: &UpdateIncidencePayload,
    ) -> Result<Option<Incidence>, AppError> {
        let row = sqlx::query_as::<_, Incidence>(
            r#"
            UPDATE incidences SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                severity = COALESCE($5, severity),
                status = COALESCE($6, status),
                updated_at = NOW()
            WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(scope)
        .bind(payload.title.as_deref())
        .bind(payload.description.as_deref())
        .bind(payload.severity)
        .bind(payload.status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete_incidence(&self, id: Uuid, scope: Option<Uuid>) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM incidences WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)")
            .bind(id)
            .bind(scope)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_incidences(&self, scope: Option<Uuid>) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM incidences WHERE ($1::uuid IS NULL OR client_id = $1)",
        )
        .bind(scope)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    pub async fn incidences_by_severity(&self, scope: Option<Uuid>) -> Result<Vec<LabelCount>, AppError> {
        let rows = sqlx::query_as::<_, LabelCount>(
            r#"
            SELECT severity::text AS label, COUNT(*) AS count
            FROM incidences
            WHERE ($1::uuid IS NULL OR client_id = $1)
            GROUP BY severity
            "#,
        )
        .bind(scope)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn incidences_by_status(&self, scope: Option<Uuid>) -> Result<Vec<LabelCount>, AppError> {
        let rows = sqlx::query_as::<_, LabelCount>(
            r#"
            SELECT status::text AS label, COUNT(*) AS count
            FROM incidences
            WHERE ($1::uuid IS NULL OR client_id = $1)
            GROUP BY status
            "#,
        )
        .bind(scope)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ---
    // CAMADAS
    // ---

    pub async fn list_layers(&self, scope: Option<Uuid>) -> Result<Vec<MapLayer>, AppError> {
        let rows = sqlx::query_as::<_, MapLayer>(
            "SELECT * FROM map_layers WHERE ($1::uuid IS NULL OR client_id = $1) ORDER BY name ASC",
        )
        .bind(scope)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_layer(&self, id: Uuid, scope: Option<Uuid>) -> Result<Option<MapLayer>, AppError> {
        let row = sqlx::query_as::<_, MapLayer>(
            "SELECT * FROM map_layers WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)",
        )
        .bind(id)
        .bind(scope)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn create_layer(&self, client_id: Uuid, payload: &CreateLayerPayload) -> Result<MapLayer, AppError> {
        let row = sqlx::query_as::<_, MapLayer>(
            r#"
            INSERT INTO map_layers (client_id, name, description, layer_type, color, opacity, properties)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(client_id)
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(payload.layer_type)
        .bind(&payload.color)
        .bind(payload.opacity)
        .bind(payload.properties.clone().unwrap_or_else(|| json!({})))
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_layer(
        &self,
        id: Uuid,
        scope: Option<Uuid>,
        payload: &UpdateLayerPayload,
    ) -> Result<Option<MapLayer>, AppError> {
        let row = sqlx::query_as::<_, MapLayer>(
            r#"
            UPDATE map_layers SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                layer_type = COALESCE($5, layer_type),
                color = COALESCE($6, color),
                opacity = COALESCE($7, opacity),
                properties = COALESCE($8, properties),
                updated_at = NOW()
            WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(scope)
        .bind(payload.name.as_deref())
        .bind(payload.description.as_deref())
        .bind(payload.layer_type)
        .bind(payload.color.as_deref())
        .bind(payload.opacity)
        .bind(payload.properties.clone())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete_layer(&self, id: Uuid, scope: Option<Uuid>) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM map_layers WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)")
            .bind(id)
            .bind(scope)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ---
    // FEATURES
    // ---

    pub async fn list_features(
        &self,
        scope: Option<Uuid>,
        layer_id: Option<Uuid>,
    ) -> Result<Vec<MapFeature>, AppError> {
        let rows = sqlx::query_as::<_, MapFeature>(
            r#"
            SELECT * FROM map_features
            WHERE ($1::uuid IS NULL OR client_id = $1)
              AND ($2::uuid IS NULL OR layer_id = $2)
            ORDER BY created_at ASC
            "#,
        )
        .bind(scope)
        .bind(layer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn features_of_layers(&self, layer_ids: &[Uuid]) -> Result<Vec<MapFeature>, AppError> {
        let rows = sqlx::query_as::<_, MapFeature>(
            "SELECT * FROM map_features WHERE layer_id = ANY($1) ORDER BY created_at ASC",
        )
        .bind(layer_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_feature(&self, id: Uuid, scope: Option<Uuid>) -> Result<Option<MapFeature>, AppError> {
        let row = sqlx::query_as::<_, MapFeature>(
            "SELECT * FROM map_features WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)",
        )
        .bind(id)
        .bind(scope)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    // O client_id vem da camada
    pub async fn create_feature(&self, layer: &MapLayer, payload: &CreateFeaturePayload) -> Result<MapFeature, AppError> {
        let row = sqlx::query_as::<_, MapFeature>(
            r#"
            INSERT INTO map_features (client_id, layer_id, name, description, geometry, properties)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(layer.client_id)
        .bind(layer.id)
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(&payload.geometry)
        .bind(payload.properties.clone().unwrap_or_else(|| json!({})))
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_feature(
        &self,
        id: Uuid,
        scope: Option<Uuid>,
        payload: &UpdateFeaturePayload,
    ) -> Result<Option<MapFeature>, AppError> {
        let row = sqlx::query_as::<_, MapFeature>(
            r#"
            UPDATE map_features SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                geometry = COALESCE($5, geometry),
                properties = COALESCE($6, properties),
                updated_at = NOW()
            WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(scope)
        .bind(payload.name.as_deref())
        .bind(payload.description.as_deref())
        .bind(payload.geometry.clone())
        .bind(payload.properties.clone())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete_feature(&self, id: Uuid, scope: Option<Uuid>) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM map_features WHERE id = $1 AND ($2::uuid IS NULL OR client_id = $2)")
            .bind(id)
            .bind(scope)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
