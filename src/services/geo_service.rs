// src/services/geo_service.rs

use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{FormRepository, GeoRepository, OrganizationRepository},
    middleware::tenancy::TenantScope,
    models::{
        forms::{format_form_data, FormField},
        geo::{
            CreateFeaturePayload, CreateIncidencePayload, CreateItemPayload, CreateLayerPayload,
            Incidence, IncidenceDashboard, IncidenceDetail, Item, ItemMapEntry, ItemResponse,
            MapFeature, MapLayer, MapLayerDetail, UpdateFeaturePayload, UpdateIncidencePayload,
            UpdateItemPayload, UpdateLayerPayload,
        },
    },
};

#[derive(Clone)]
pub struct GeoService {
    geo_repo: GeoRepository,
    organization_repo: OrganizationRepository,
    form_repo: FormRepository,
}

impl GeoService {
    pub fn new(geo_repo: GeoRepository, organization_repo: OrganizationRepository, form_repo: FormRepository) -> Self {
        Self { geo_repo, organization_repo, form_repo }
    }

    // ---
    // ITENS
    // ---

    // Campos do primeiro formulário da categoria (None se a categoria não tem formulário)
    async fn category_fields(&self, category_id: Uuid) -> Result<Option<Vec<FormField>>, AppError> {
        match self.form_repo.first_form_of_category(category_id).await? {
            Some(form) => Ok(Some(self.form_repo.list_fields(form.id).await?)),
            None => Ok(None),
        }
    }

    fn present_item(item: Item, fields: Option<&Vec<FormField>>) -> ItemResponse {
        let form_data = match fields {
            Some(fields) => format_form_data(fields, &item.properties),
            None => item.properties.clone(),
        };
        ItemResponse { item, form_data }
    }

    pub async fn list_items(&self, scope: TenantScope, category_id: Option<Uuid>) -> Result<Vec<ItemResponse>, AppError> {
        let items = self.geo_repo.list_items(scope.filter()?, category_id).await?;

        let mut fields_cache: HashMap<Uuid, Option<Vec<FormField>>> = HashMap::new();
        for item in &items {
            if !fields_cache.contains_key(&item.category_id) {
                let fields = self.category_fields(item.category_id).await?;
                fields_cache.insert(item.category_id, fields);
            }
        }

        Ok(items
            .into_iter()
            .map(|item| {
                let fields = fields_cache.get(&item.category_id).and_then(Option::as_ref);
                Self::present_item(item, fields)
            })
            .collect())
    }

    async fn find_item(&self, id: Uuid, scope: TenantScope) -> Result<Item, AppError> {
        self.geo_repo
            .find_item(id, scope.filter()?)
            .await?
            .ok_or(AppError::NotFound("item"))
    }

    pub async fn get_item(&self, id: Uuid, scope: TenantScope) -> Result<ItemResponse, AppError> {
        let item = self.find_item(id, scope).await?;
        let fields = self.category_fields(item.category_id).await?;
        Ok(Self::present_item(item, fields.as_ref()))
    }

    pub async fn create_item(&self, scope: TenantScope, payload: &CreateItemPayload) -> Result<ItemResponse, AppError> {
        let category = self
            .organization_repo
            .find_category(payload.category_id, scope.filter()?)
            .await?
            .ok_or(AppError::NotFound("category"))?;

        let item = self.geo_repo.create_item(&category, payload).await?;
        let fields = self.category_fields(category.id).await?;
        Ok(Self::present_item(item, fields.as_ref()))
    }

    pub async fn update_item(
        &self,
        id: Uuid,
        scope: TenantScope,
        payload: &UpdateItemPayload,
    ) -> Result<ItemResponse, AppError> {
        let item = self
            .geo_repo
            .update_item(id, scope.filter()?, payload)
            .await?
            .ok_or(AppError::NotFound("item"))?;
        let fields = self.category_fields(item.category_id).await?;
        Ok(Self::present_item(item, fields.as_ref()))
    }

    pub async fn delete_item(&self, id: Uuid, scope: TenantScope) -> Result<(), AppError> {
        if !self.geo_repo.delete_item(id, scope.filter()?).await? {
            return Err(AppError::NotFound("item"));
        }
        Ok(())
    }

    pub async fn map_data(&self, scope: TenantScope, category_id: Option<Uuid>) -> Result<Vec<ItemMapEntry>, AppError> {
        self.geo_repo.map_data(scope.filter()?, category_id).await
    }

    // GET /categories/{id}/items_map
    pub async fn category_items_map(&self, category_id: Uuid, scope: TenantScope) -> Result<Vec<ItemMapEntry>, AppError> {
        let category = self
            .organization_repo
            .find_category(category_id, scope.filter()?)
            .await?
            .ok_or(AppError::NotFound("category"))?;
        self.geo_repo.map_data(Some(category.client_id), Some(category.id)).await
    }

    // ---
    // OCORRÊNCIAS
    // ---

    async fn with_items(&self, incidences: Vec<Incidence>) -> Result<Vec<IncidenceDetail>, AppError> {
        let ids: Vec<Uuid> = incidences.iter().map(|i| i.item_id).collect();
        let items: HashMap<Uuid, Item> = self
            .geo_repo
            .items_by_ids(&ids)
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        Ok(incidences
            .into_iter()
            .filter_map(|incidence| {
                let item_details = items.get(&incidence.item_id)?.clone();
                Some(IncidenceDetail { incidence, item_details })
            })
            .collect())
    }

    pub async fn list_incidences(&self, scope: TenantScope) -> Result<Vec<IncidenceDetail>, AppError> {
        let incidences = self.geo_repo.list_incidences(scope.filter()?).await?;
        self.with_items(incidences).await
    }

    pub async fn get_incidence(&self, id: Uuid, scope: TenantScope) -> Result<IncidenceDetail, AppError> {
        let incidence = self
            .geo_repo
            .find_incidence(id, scope.filter()?)
            .await?
            .ok_or(AppError::NotFound("incidence"))?;
        let item_details = self.find_item(incidence.item_id, TenantScope::Client(incidence.client_id)).await?;
        Ok(IncidenceDetail { incidence, item_details })
    }

    pub async fn create_incidence(
        &self,
        scope: TenantScope,
        reported_by: Uuid,
        payload: &CreateIncidencePayload,
    ) -> Result<IncidenceDetail, AppError> {
        let item = self.find_item(payload.item_id, scope).await?;
        let incidence = self.geo_repo.create_incidence(&item, payload, reported_by).await?;

        tracing::info!(
            "⚠️ Ocorrência '{}' ({:?}) registrada no item '{}'",
            incidence.title,
            incidence.severity,
            item.name
        );
        Ok(IncidenceDetail { incidence, item_details: item })
    }

    pub async fn update_incidence(
        &self,
        id: Uuid,
        scope: TenantScope,
        payload: &UpdateIncidencePayload,
    ) -> Result<IncidenceDetail, AppError> {
        let incidence = self
            .geo_repo
            .update_incidence(id, scope.filter()?, payload)
            .await?
            .ok_or(AppError::NotFound("incidence"))?;
        let item_details = self.find_item(incidence.item_id, TenantScope::Client(incidence.client_id)).await?;
        Ok(IncidenceDetail { incidence, item_details })
    }

    pub async fn delete_incidence(&self, id: Uuid, scope: TenantScope) -> Result<(), AppError> {
        if !self.geo_repo.delete_incidence(id, scope.filter()?).await? {
            return Err(AppError::NotFound("incidence"));
        }
        Ok(())
    }

    pub async fn incidence_dashboard(&self, scope: TenantScope) -> Result<IncidenceDashboard, AppError> {
        let filter = scope.filter()?;
        let total = self.geo_repo.count_incidences(filter).await?;
        let by_severity = self.geo_repo.incidences_by_severity(filter).await?;
        let by_status = self.geo_repo.incidences_by_status(filter).await?;
        Ok(IncidenceDashboard::assemble(total, &by_severity, &by_status))
    }

    // ---
    // CAMADAS E FEATURES
    // ---

    async fn find_layer(&self, id: Uuid, scope: TenantScope) -> Result<MapLayer, AppError> {
        self.geo_repo
            .find_layer(id, scope.filter()?)
            .await?
            .ok_or(AppError::NotFound("map_layer"))
    }

    async fn detail(&self, layer: MapLayer) -> Result<MapLayerDetail, AppError> {
        let features = self.geo_repo.features_of_layers(&[layer.id]).await?;
        Ok(MapLayerDetail::new(layer, features))
    }

    pub async fn list_layers(&self, scope: TenantScope) -> Result<Vec<MapLayerDetail>, AppError> {
        let layers = self.geo_repo.list_layers(scope.filter()?).await?;
        let ids: Vec<Uuid> = layers.iter().map(|l| l.id).collect();
        let features = self.geo_repo.features_of_layers(&ids).await?;
        Ok(MapLayerDetail::group(layers, features))
    }

    pub async fn get_layer(&self, id: Uuid, scope: TenantScope) -> Result<MapLayerDetail, AppError> {
        let layer = self.find_layer(id, scope).await?;
        self.detail(layer).await
    }

    pub async fn create_layer(&self, scope: TenantScope, payload: &CreateLayerPayload) -> Result<MapLayerDetail, AppError> {
        let client_id = scope.owner(payload.client_id)?;
        let layer = self.geo_repo.create_layer(client_id, payload).await?;
        Ok(MapLayerDetail::new(layer, Vec::new()))
    }

    pub async fn update_layer(
        &self,
        id: Uuid,
        scope: TenantScope,
        payload: &UpdateLayerPayload,
    ) -> Result<MapLayerDetail, AppError> {
        let layer = self
            .geo_repo
            .update_layer(id, scope.filter()?, payload)
            .await?
            .ok_or(AppError::NotFound("map_layer"))?;
        self.detail(layer).await
    }

    pub async fn delete_layer(&self, id: Uuid, scope: TenantScope) -> Result<(), AppError> {
        if !self.geo_repo.delete_layer(id, scope.filter()?).await? {
            return Err(AppError::NotFound("map_layer"));
        }
        Ok(())
    }

    // POST /map-layers/{id}/add_feature
    pub async fn add_feature(
        &self,
        layer_id: Uuid,
        scope: TenantScope,
        payload: &CreateFeaturePayload,
    ) -> Result<MapFeature, AppError> {
        let layer = self.find_layer(layer_id, scope).await?;
        self.geo_repo.create_feature(&layer, payload).await
    }

    // GET /map-layers/{id}/features
    pub async fn layer_features(&self, layer_id: Uuid, scope: TenantScope) -> Result<Vec<MapFeature>, AppError> {
        let layer = self.find_layer(layer_id, scope).await?;
        self.geo_repo.features_of_layers(&[layer.id]).await
    }

    pub async fn list_features(&self, scope: TenantScope, layer_id: Option<Uuid>) -> Result<Vec<MapFeature>, AppError> {
        self.geo_repo.list_features(scope.filter()?, layer_id).await
    }

    pub async fn get_feature(&self, id: Uuid, scope: TenantScope) -> Result<MapFeature, AppError> {
        self.geo_repo
            .find_feature(id, scope.filter()?)
            .await?
            .ok_or(AppError::NotFound("map_feature"))
    }

    pub async fn create_feature(&self, scope: TenantScope, payload: &CreateFeaturePayload) -> Result<MapFeature, AppError> {
        let layer_id = payload
            .layer_id
            .ok_or_else(|| AppError::InvalidPayload("layer_id é obrigatório.".to_string()))?;
        self.add_feature(layer_id, scope, payload).await
    }

    pub async fn update_feature(
        &self,
        id: Uuid,
        scope: TenantScope,
        payload: &UpdateFeaturePayload,
    ) -> Result<MapFeature, AppError> {
        self.geo_repo
            .update_feature(id, scope.filter()?, payload)
            .await?
            .ok_or(AppError::NotFound("map_feature"))
    }

    pub async fn delete_feature(&self, id: Uuid, scope: TenantScope) -> Result<(), AppError> {
        if !self.geo_repo.delete_feature(id, scope.filter()?).await? {
            return Err(AppError::NotFound("map_feature"));
        }
        Ok(())
    }
}
