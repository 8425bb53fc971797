mod send_summary;

use std::sync::Arc;
use std::time::Duration;

use crate::config::{CredentialSource, Settings};
use crate::outbound::WebhookNotifier;
use crate::secrets::{ConfigurationError, CredentialProvider, EnvProvider, SecretFileProvider};
use crate::store::UriConnector;

pub use send_summary::{OutcomeKind, RunOutcome, SendSummary};

/// Wires the job from settings. Nothing here touches the network. The HTTP
/// client is shared by every run; store connections are opened per run.
pub fn send_summary_from_settings(settings: Settings) -> Result<SendSummary, ConfigurationError> {
    let credentials: Arc<dyn CredentialProvider> = match settings.credential_source {
        CredentialSource::Env => Arc::new(EnvProvider),
        CredentialSource::File => {
            let path = settings.secrets_file.clone().ok_or_else(|| {
                ConfigurationError::Invalid("credential_source is `file` but secrets_file is not set".to_string())
            })?;
            Arc::new(SecretFileProvider::new(path))
        }
    };

    let connector = Arc::new(UriConnector {
        connect_timeout: Duration::from_secs(settings.connect_timeout_secs),
        statement_timeout: Duration::from_secs(settings.statement_timeout_secs),
    });

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.notify_timeout_secs))
        .build()
        .map_err(|e| ConfigurationError::Invalid(format!("building HTTP client: {}", e)))?;

    let notifier = Arc::new(
        WebhookNotifier::new(http).with_identity(settings.bot_username.clone(), settings.bot_icon_emoji.clone()),
    );

    Ok(SendSummary::new(Arc::new(settings), credentials, connector, notifier))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_source_requires_a_path() {
        let mut settings = Settings::defaults();
        settings.credential_source = CredentialSource::File;
        assert!(matches!(
            send_summary_from_settings(settings),
            Err(ConfigurationError::Invalid(_))
        ));
    }

    #[test]
    fn default_settings_wire_up() {
        assert!(send_summary_from_settings(Settings::defaults()).is_ok());
    }
}
