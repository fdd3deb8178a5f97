pub mod app_config;
pub mod google_config;
