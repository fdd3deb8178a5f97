pub mod command_handler;
pub mod file_storage;
pub mod operation;
pub mod service_error;
pub mod spreadsheet_service;
