pub mod auth;
pub mod drive;
pub mod error;
pub mod http_client;
pub mod sheets;
