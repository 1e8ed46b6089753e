pub mod auth;
pub mod collection_service;
pub mod dashboard_service;
pub mod document_service;
pub mod form_service;
pub mod geo_service;
pub mod organization_service;
pub mod tenancy_service;
