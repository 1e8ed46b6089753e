pub mod user_repo;
pub use user_repo::UserRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod organization_repo;
pub use organization_repo::OrganizationRepository;
pub mod form_repo;
pub use form_repo::FormRepository;
pub mod geo_repo;
pub use geo_repo::GeoRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
pub mod collection_repo;
pub use collection_repo::CollectionRepository;
