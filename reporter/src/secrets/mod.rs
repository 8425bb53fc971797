use async_trait::async_trait;
use thiserror::Error;
use tracing::error;

mod env;
mod file;

pub use env::EnvProvider;
pub use file::SecretFileProvider;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("parameter `{0}` not found")]
    NotFound(String),
    #[error("retrieving parameter `{name}` failed: {reason}")]
    RetrievalFailed { name: String, reason: String },
}

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn get_parameter(&self, name: &str, decrypt: bool) -> Result<String, CredentialError>;
}

/// What a run needs before it may touch the store or the webhook.
#[derive(Clone)]
pub struct Credentials {
    pub database_uri: String,
    pub webhook_url: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("database_uri", &"<redacted>")
            .field("webhook_url", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("parameter `{0}` is empty")]
    Empty(String),
    #[error("{0}")]
    Invalid(String),
}

pub struct ParameterNames<'a> {
    pub database_uri: &'a str,
    pub webhook_url: &'a str,
    pub decrypt: bool,
}

pub async fn resolve_credentials(
    provider: &dyn CredentialProvider,
    names: &ParameterNames<'_>,
) -> Result<Credentials, ConfigurationError> {
    let database_uri = fetch_non_empty(provider, names.database_uri, names.decrypt).await?;
    let webhook_url = fetch_non_empty(provider, names.webhook_url, names.decrypt).await?;

    Ok(Credentials {
        database_uri,
        webhook_url,
    })
}

async fn fetch_non_empty(
    provider: &dyn CredentialProvider,
    name: &str,
    decrypt: bool,
) -> Result<String, ConfigurationError> {
    let value = provider.get_parameter(name, decrypt).await.map_err(|e| {
        error!("Error retrieving parameter '{}': {}", name, e);
        e
    })?;

    let value = value.trim();
    if value.is_empty() {
        error!("Parameter '{}' is empty", name);
        return Err(ConfigurationError::Empty(name.to_string()));
    }
    Ok(value.to_string())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;

    /// Fixed parameter map for tests.
    #[derive(Default)]
    pub struct StaticProvider {
        pub values: HashMap<String, String>,
    }

    impl StaticProvider {
        pub fn with(pairs: &[(&str, &str)]) -> Self {
            Self {
                values: pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            }
        }
    }

    #[async_trait]
    impl CredentialProvider for StaticProvider {
        async fn get_parameter(&self, name: &str, _decrypt: bool) -> Result<String, CredentialError> {
            self.values
                .get(name)
                .cloned()
                .ok_or_else(|| CredentialError::NotFound(name.to_string()))
        }
    }
}
