use async_trait::async_trait;
use std::env::VarError;

use crate::secrets::{CredentialError, CredentialProvider};

/// Parameters injected by the deployment as plain environment variables.
/// They arrive already decrypted, so `decrypt` has nothing to do here.
#[derive(Debug, Clone, Default)]
pub struct EnvProvider;

#[async_trait]
impl CredentialProvider for EnvProvider {
    async fn get_parameter(&self, name: &str, _decrypt: bool) -> Result<String, CredentialError> {
        match std::env::var(name) {
            Ok(value) => Ok(value),
            Err(VarError::NotPresent) => Err(CredentialError::NotFound(name.to_string())),
            Err(e @ VarError::NotUnicode(_)) => Err(CredentialError::RetrievalFailed {
                name: name.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}
