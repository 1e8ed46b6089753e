pub mod auth;
pub mod collection;
pub mod dashboard;
pub mod forms;
pub mod geo;
pub mod organization;
pub mod tenancy;
