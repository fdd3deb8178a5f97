#[derive(serde::Deserialize, Debug, Clone)]
pub struct GoogleConfig {
    /// Path to the service account's JSON key.
    pub priv_key: Box<str>,
}
