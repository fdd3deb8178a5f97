use std::sync::Arc;

use error_stack::ResultExt;
use thiserror::Error;
use tracing::{info, instrument};

use crate::adapters::google::{
    auth::auth, drive::GoogleDrive, http_client::http_client, sheets::GoogleSheets,
};
use crate::application::duplicate_sheet::default_branch_names;
use crate::cli_adapter::CliAdapter;
use crate::config::app_config::AppConfig;

#[derive(Error, Debug)]
pub enum FactoryError {
    #[error("Failed to authenticate against Google")]
    Authentication,
}

pub struct ServiceFactory;

impl ServiceFactory {
    /// Wires Drive and Sheets behind one authenticated client.
    #[instrument(name = "ServiceFactory::create_cli", skip(config))]
    pub async fn create_cli(config: &AppConfig) -> error_stack::Result<CliAdapter, FactoryError> {
        let client = http_client();
        let authenticator = auth(&config.google, client.clone())
            .await
            .change_context(FactoryError::Authentication)?;

        let storage = Arc::new(GoogleDrive::new(client.clone(), authenticator.clone()));
        let sheets = Arc::new(GoogleSheets::new(client, authenticator));

        let branches = config
            .duplicate
            .branches
            .clone()
            .unwrap_or_else(default_branch_names);
        info!("Using {} branch names for duplicate-sheet", branches.len());

        Ok(CliAdapter::new(storage, sheets, branches))
    }
}
