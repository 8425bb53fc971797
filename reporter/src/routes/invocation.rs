use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, get, post, web};
use serde::Serialize;

use crate::models::{AggregateResult, TriggerEvent};
use crate::usecases::{OutcomeKind, RunOutcome, SendSummary};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    status_code: u16,
    body: String,
    outcome: OutcomeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<AggregateResult>,
}

impl From<RunOutcome> for InvocationResponse {
    fn from(outcome: RunOutcome) -> Self {
        Self {
            status_code: outcome.kind.status_code(),
            body: outcome.message,
            outcome: outcome.kind,
            report: outcome.report,
            summary: outcome.summary,
        }
    }
}

/// Scheduler entry point. The body is the trigger event; an empty body is an
/// event without a `time` field.
#[post("/invocations")]
pub async fn invoke(usecases: web::Data<SendSummary>, body: web::Bytes) -> impl Responder {
    let event = if body.iter().all(u8::is_ascii_whitespace) {
        TriggerEvent::default()
    } else {
        match serde_json::from_slice::<TriggerEvent>(&body) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("Rejected invocation payload: {}", e);
                return HttpResponse::BadRequest().body(format!("invalid event payload: {}", e));
            }
        }
    };

    let response = InvocationResponse::from(usecases.run(event).await);
    let status = StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(response)
}

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().body("ok")
}
