use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Transport(String),
    #[error("webhook responded {status}: {body}")]
    Status { status: u16, body: String },
}

/// Delivers report text. The endpoint comes from credentials resolved per run,
/// so it is passed with each message rather than fixed at construction.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, webhook_url: &str, text: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WebhookPayload<'a> {
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_emoji: Option<&'a str>,
}

#[derive(Clone, Debug)]
pub struct WebhookNotifier {
    client: Client,
    username: Option<String>,
    icon_emoji: Option<String>,
}

impl WebhookNotifier {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            username: None,
            icon_emoji: None,
        }
    }

    pub fn with_identity(mut self, username: Option<String>, icon_emoji: Option<String>) -> Self {
        self.username = username;
        self.icon_emoji = icon_emoji;
        self
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, webhook_url: &str, text: &str) -> Result<(), NotifyError> {
        let payload = WebhookPayload {
            text,
            username: self.username.as_deref(),
            icon_emoji: self.icon_emoji.as_deref(),
        };

        match self.client.post(webhook_url).json(&payload).send().await {
            Ok(res) => {
                let status = res.status();
                if status.is_success() {
                    info!("Summary delivered to webhook. Status Code: {}", status.as_u16());
                    Ok(())
                } else {
                    let body = res.text().await.unwrap_or_default();
                    error!("Webhook rejected summary: {} - status: {}", body, status.as_str());
                    Err(NotifyError::Status {
                        status: status.as_u16(),
                        body,
                    })
                }
            }
            Err(e) => {
                // The webhook URL is itself a secret; keep it out of logs.
                let e = e.without_url();
                error!("Error sending summary to webhook: {}", e);
                Err(NotifyError::Transport(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn posts_text_as_json() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/hooks/T000/B000")
                    .header("content-type", "application/json")
                    .json_body(json!({ "text": "hello" }));
                then.status(200).body("ok");
            })
            .await;

        let notifier = WebhookNotifier::new(Client::new());
        notifier.send(&server.url("/hooks/T000/B000"), "hello").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn includes_bot_identity_when_configured() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).json_body(json!({
                    "text": "hello",
                    "username": "Bill Payment Bot",
                    "icon_emoji": ":robot_face:"
                }));
                then.status(204);
            })
            .await;

        let notifier = WebhookNotifier::new(Client::new())
            .with_identity(Some("Bill Payment Bot".to_string()), Some(":robot_face:".to_string()));
        notifier.send(&server.url("/"), "hello").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_a_delivery_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(404).body("no_service");
            })
            .await;

        let notifier = WebhookNotifier::new(Client::new());
        match notifier.send(&server.url("/"), "hello").await {
            Err(NotifyError::Status { status, body }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "no_service");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_failure() {
        let notifier = WebhookNotifier::new(Client::new());
        assert!(matches!(
            notifier.send("http://127.0.0.1:9/", "hello").await,
            Err(NotifyError::Transport(_))
        ));
    }
}
