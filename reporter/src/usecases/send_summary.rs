use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::models::{AggregateResult, ReportWindow, TriggerEvent};
use crate::outbound::Notifier;
use crate::report::{self, DisplayZone, ReportStyle, WindowError};
use crate::secrets::{ConfigurationError, CredentialProvider, ParameterNames, resolve_credentials};
use crate::store::{AggregationRequest, RecordLayout, StoreConnector, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    ConfigurationError,
    StoreError,
    DeliveryError,
    Internal,
}

impl OutcomeKind {
    pub fn status_code(self) -> u16 {
        match self {
            OutcomeKind::Success => 200,
            OutcomeKind::ConfigurationError | OutcomeKind::Internal => 500,
            OutcomeKind::StoreError | OutcomeKind::DeliveryError => 502,
        }
    }

    pub fn exit_code(self) -> u8 {
        match self {
            OutcomeKind::Success => 0,
            OutcomeKind::Internal => 1,
            OutcomeKind::ConfigurationError => 2,
            OutcomeKind::StoreError => 3,
            OutcomeKind::DeliveryError => 4,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub kind: OutcomeKind,
    pub message: String,
    /// The text that was delivered, if delivery succeeded.
    pub report: Option<String>,
    pub summary: Option<AggregateResult>,
}

impl RunOutcome {
    fn failed(kind: OutcomeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            report: None,
            summary: None,
        }
    }
}

/// Everything a run needs that is fixed by configuration.
struct ReportPlan {
    layout: RecordLayout,
    zone: DisplayZone,
    style: ReportStyle,
}

/// One scheduled summary run. The caller owns the provider, the store
/// connector and the notifier; the store connection itself lives only for
/// the duration of `execute`.
#[derive(Clone)]
pub struct SendSummary {
    settings: Arc<Settings>,
    credentials: Arc<dyn CredentialProvider>,
    connector: Arc<dyn StoreConnector>,
    notifier: Arc<dyn Notifier>,
}

impl SendSummary {
    pub fn new(
        settings: Arc<Settings>,
        credentials: Arc<dyn CredentialProvider>,
        connector: Arc<dyn StoreConnector>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            settings,
            credentials,
            connector,
            notifier,
        }
    }

    /// Runs one invocation. Never fails: every error, including a panic, is
    /// folded into the returned outcome.
    pub async fn run(&self, event: TriggerEvent) -> RunOutcome {
        let span = info_span!("invocation", run_id = %Uuid::new_v4());

        let outcome = AssertUnwindSafe(self.execute(event, Utc::now()))
            .catch_unwind()
            .instrument(span.clone())
            .await
            .unwrap_or_else(|panic| {
                let message = format!("Critical error: {}", panic_message(panic.as_ref()));
                span.in_scope(|| error!("{}", message));
                RunOutcome::failed(OutcomeKind::Internal, message)
            });

        span.in_scope(|| info!("Run finished: {:?} - {}", outcome.kind, outcome.message));
        outcome
    }

    pub async fn execute(&self, event: TriggerEvent, now: DateTime<Utc>) -> RunOutcome {
        info!("Received event: {}", serde_json::to_string(&event).unwrap_or_default());

        let plan = match self.plan() {
            Ok(plan) => plan,
            Err(e) => return configuration_failure(e),
        };

        let names = ParameterNames {
            database_uri: &self.settings.database_uri_param,
            webhook_url: &self.settings.webhook_url_param,
            decrypt: self.settings.decrypt_parameters,
        };
        let credentials = match resolve_credentials(self.credentials.as_ref(), &names).await {
            Ok(credentials) => credentials,
            Err(e) => return configuration_failure(e),
        };

        let window = report::resolve(trigger_instant(&event, now), &plan.zone);
        let request = AggregationRequest::for_window(&plan.layout, &window, &self.settings.success_status);
        let (lower, upper) = request.bounds();
        info!("Fetching transactions from {} to {}", lower, upper);

        let aggregated = self.aggregate(&credentials.database_uri, &request).await;

        let (text, store_error, summary) = match aggregated {
            Ok(summary) => {
                if let Some(result) = &summary {
                    if result.amount_anomalies > 0 {
                        warn!(
                            "{} successful transactions had non-numeric amounts and were summed as zero",
                            result.amount_anomalies
                        );
                    }
                }
                (report::format_summary(summary.as_ref(), &window, &plan.style), None, summary)
            }
            Err(e) => {
                error!("Record store unavailable: {}", e);
                (report::format_failure(&e.to_string(), &window, &plan.style), Some(e), None)
            }
        };

        if let Err(e) = self.notifier.send(&credentials.webhook_url, &text).await {
            return RunOutcome::failed(
                OutcomeKind::DeliveryError,
                format!("Failed to send summary to webhook: {}", e),
            );
        }

        match store_error {
            Some(e) => RunOutcome {
                kind: OutcomeKind::StoreError,
                message: format!("Record store unavailable; error notice sent: {}", e),
                report: Some(text),
                summary: None,
            },
            None => RunOutcome {
                kind: OutcomeKind::Success,
                message: describe_success(&window, summary.as_ref()),
                report: Some(text),
                summary,
            },
        }
    }

    fn plan(&self) -> Result<ReportPlan, ConfigurationError> {
        let settings = &self.settings;
        let layout = RecordLayout::new(
            &settings.table,
            &settings.date_column,
            &settings.status_column,
            &settings.amount_column,
        )
        .map_err(|e| ConfigurationError::Invalid(e.to_string()))?;
        let zone = DisplayZone::new(settings.display_offset_hours, settings.display_zone_name.clone())
            .map_err(|e| ConfigurationError::Invalid(e.to_string()))?;

        Ok(ReportPlan {
            layout,
            zone,
            style: ReportStyle {
                title: settings.report_title.clone(),
                currency_symbol: settings.currency_symbol.clone(),
            },
        })
    }

    /// The store handle is dropped, and its connection released, before this returns.
    async fn aggregate(
        &self,
        uri: &str,
        request: &AggregationRequest,
    ) -> Result<Option<AggregateResult>, StoreError> {
        let store = self.connector.connect(uri).await?;
        store.aggregate(request).await
    }
}

/// A missing or unreadable trigger falls back to `now`; it is never fatal.
fn trigger_instant(event: &TriggerEvent, now: DateTime<Utc>) -> DateTime<Utc> {
    let parsed = match &event.time {
        None | Some(Value::Null) => {
            warn!("Trigger 'time' field not found in event. Using current UTC time as fallback.");
            return now;
        }
        Some(Value::String(raw)) => report::parse_trigger(raw),
        Some(other) => Err(WindowError::MalformedTrigger(other.to_string())),
    };

    parsed.unwrap_or_else(|e| {
        warn!("{}. Using current UTC time as fallback.", e);
        now
    })
}

fn configuration_failure(e: ConfigurationError) -> RunOutcome {
    error!("Configuration error: {}", e);
    RunOutcome::failed(
        OutcomeKind::ConfigurationError,
        format!("Configuration Error: {}", e),
    )
}

fn describe_success(window: &ReportWindow, summary: Option<&AggregateResult>) -> String {
    match summary {
        Some(result) => format!(
            "Transaction summary for {} sent ({} transactions).",
            window.label, result.total_count
        ),
        None => format!("No transactions for {}; notice sent.", window.label),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
