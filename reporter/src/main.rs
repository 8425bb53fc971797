mod config;
mod models;
mod outbound;
mod report;
mod routes;
mod secrets;
mod serializers;
mod store;
mod usecases;

use std::process::ExitCode;

use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use serde_json::json;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{RunMode, Settings};
use crate::models::TriggerEvent;
use crate::usecases::{OutcomeKind, SendSummary};

#[actix_web::main]
async fn main() -> ExitCode {
    let settings = match Settings::new() {
        Ok(settings) => settings,
        Err(e) => {
            init_tracing("info");
            error!("Invalid settings: {}", e);
            return ExitCode::from(OutcomeKind::ConfigurationError.exit_code());
        }
    };
    init_tracing(&settings.log_level);
    info!("Starting transaction summary reporter in {:?} mode", settings.mode);

    let mode = settings.mode;
    let (server_url, server_port) = (settings.server_url.clone(), settings.server_port);

    let send_summary = match usecases::send_summary_from_settings(settings) {
        Ok(send_summary) => send_summary,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::from(OutcomeKind::ConfigurationError.exit_code());
        }
    };

    match mode {
        RunMode::Once => run_once(send_summary).await,
        RunMode::Serve => match serve(send_summary, server_url, server_port).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("Server failed: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

/// One invocation, with the event JSON taken from the first argument.
async fn run_once(send_summary: SendSummary) -> ExitCode {
    let event = match std::env::args().nth(1) {
        None => TriggerEvent::default(),
        Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring unparsable event argument: {}", e);
            TriggerEvent::default()
        }),
    };

    let outcome = send_summary.run(event).await;
    println!(
        "{}",
        json!({ "statusCode": outcome.kind.status_code(), "body": outcome.message })
    );
    ExitCode::from(outcome.kind.exit_code())
}

async fn serve(send_summary: SendSummary, server_url: String, server_port: u16) -> std::io::Result<()> {
    info!("Listening on {}:{}", server_url, server_port);
    let data = web::Data::new(send_summary);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(data.clone())
            .service(routes::invoke)
            .service(routes::health)
    })
    .bind((server_url, server_port))?
    .run()
    .await
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt().with_env_filter(filter).with_line_number(true).init();
}
