use error_stack::ResultExt;
use google_sheets4::oauth2::{self, authenticator::Authenticator};
use thiserror::Error;
use tracing::instrument;

use crate::config::google_config::GoogleConfig;

use super::http_client::{HttpClient, HttpsConnector};

pub type GoogleAuthenticator = Authenticator<HttpsConnector>;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Could not read service account private key at '{0}'")]
    ReadKey(String),
    #[error("Could not create an authenticator")]
    Build,
}

/// Service-account authenticator shared by the Sheets and Drive hubs.
#[instrument(skip(client))]
pub async fn auth(
    config: &GoogleConfig,
    client: HttpClient,
) -> error_stack::Result<GoogleAuthenticator, AuthError> {
    let priv_key_path = config.priv_key.as_ref();
    let secret: oauth2::ServiceAccountKey = oauth2::read_service_account_key(priv_key_path)
        .await
        .change_context_lazy(|| AuthError::ReadKey(priv_key_path.to_string()))
        .attach_printable(
            "Share the target folders with the service account and point google.priv_key at its JSON key",
        )?;

    oauth2::ServiceAccountAuthenticator::with_client(secret, client)
        .build()
        .await
        .change_context(AuthError::Build)
}
