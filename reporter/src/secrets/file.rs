use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::secrets::{CredentialError, CredentialProvider};

/// A mounted secret: one JSON object mapping parameter names to string values.
/// The file is re-read on every lookup so rotated secrets are picked up by the
/// next run without a restart.
#[derive(Debug, Clone)]
pub struct SecretFileProvider {
    path: PathBuf,
}

impl SecretFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self, name: &str) -> Result<Map<String, Value>, CredentialError> {
        let failed = |reason: String| CredentialError::RetrievalFailed {
            name: name.to_string(),
            reason,
        };

        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| failed(format!("reading {}: {}", self.path.display(), e)))?;

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(failed(format!("{} is not a JSON object", self.path.display()))),
            Err(e) => Err(failed(format!("parsing {}: {}", self.path.display(), e))),
        }
    }
}

#[async_trait]
impl CredentialProvider for SecretFileProvider {
    async fn get_parameter(&self, name: &str, _decrypt: bool) -> Result<String, CredentialError> {
        let secrets = self.load(name).await?;

        match secrets.get(name) {
            Some(Value::String(value)) => Ok(value.clone()),
            Some(_) => Err(CredentialError::RetrievalFailed {
                name: name.to_string(),
                reason: "value is not a string".to_string(),
            }),
            None => Err(CredentialError::NotFound(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn secret_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn reads_named_values() {
        let file = secret_file(r#"{"DATABASE_URI": "postgres://db/x", "WEBHOOK_URL": "https://hook"}"#);
        let provider = SecretFileProvider::new(file.path());

        assert_eq!(provider.get_parameter("DATABASE_URI", true).await.unwrap(), "postgres://db/x");
        assert_eq!(provider.get_parameter("WEBHOOK_URL", true).await.unwrap(), "https://hook");
    }

    #[tokio::test]
    async fn absent_key_is_not_found() {
        let file = secret_file(r#"{"DATABASE_URI": "postgres://db/x"}"#);
        let provider = SecretFileProvider::new(file.path());

        assert_eq!(
            provider.get_parameter("WEBHOOK_URL", true).await,
            Err(CredentialError::NotFound("WEBHOOK_URL".to_string()))
        );
    }

    #[tokio::test]
    async fn unreadable_or_malformed_files_are_retrieval_failures() {
        let missing = SecretFileProvider::new("/definitely/not/a/secret.json");
        assert!(matches!(
            missing.get_parameter("DATABASE_URI", true).await,
            Err(CredentialError::RetrievalFailed { .. })
        ));

        let file = secret_file("[1, 2, 3]");
        let provider = SecretFileProvider::new(file.path());
        assert!(matches!(
            provider.get_parameter("DATABASE_URI", true).await,
            Err(CredentialError::RetrievalFailed { .. })
        ));

        let file = secret_file(r#"{"DATABASE_URI": 42}"#);
        let provider = SecretFileProvider::new(file.path());
        assert!(matches!(
            provider.get_parameter("DATABASE_URI", true).await,
            Err(CredentialError::RetrievalFailed { .. })
        ));
    }
}
