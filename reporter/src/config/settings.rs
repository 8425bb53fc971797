use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Once,
    Serve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    Env,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub mode: RunMode,
    pub server_url: String,
    pub server_port: u16,
    pub log_level: String,

    pub credential_source: CredentialSource,
    pub secrets_file: Option<String>,
    pub database_uri_param: String,
    pub webhook_url_param: String,
    pub decrypt_parameters: bool,

    pub table: String,
    pub date_column: String,
    pub status_column: String,
    pub amount_column: String,
    pub success_status: String,

    pub display_offset_hours: i32,
    pub display_zone_name: String,
    pub report_title: String,
    pub currency_symbol: String,

    pub bot_username: Option<String>,
    pub bot_icon_emoji: Option<String>,

    pub connect_timeout_secs: u64,
    pub statement_timeout_secs: u64,
    pub notify_timeout_secs: u64,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name("reporter").required(false))
                .add_source(Environment::with_prefix("APP").try_parsing(true)),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let cfg = builder
            .set_default("mode", "once")?
            .set_default("server_url", "0.0.0.0")?
            .set_default("server_port", 8080)?
            .set_default("log_level", "info")?
            .set_default("credential_source", "env")?
            .set_default("database_uri_param", "DATABASE_URI")?
            .set_default("webhook_url_param", "WEBHOOK_URL")?
            .set_default("decrypt_parameters", true)?
            .set_default("table", "power_transaction_items")?
            .set_default("date_column", "date_created")?
            .set_default("status_column", "status")?
            .set_default("amount_column", "amount")?
            .set_default("success_status", "fulfilled")?
            .set_default("display_offset_hours", -4)?
            .set_default("display_zone_name", "EDT")?
            .set_default("report_title", "Daily Transaction Summary")?
            .set_default("currency_symbol", "$")?
            .set_default("connect_timeout_secs", 10)?
            .set_default("statement_timeout_secs", 30)?
            .set_default("notify_timeout_secs", 10)?
            .build()?;

        cfg.try_deserialize()
    }
}

#[cfg(test)]
impl Settings {
    /// Defaults with no file or environment layered on top.
    pub fn defaults() -> Self {
        Self::from_builder(Config::builder()).expect("defaults deserialize")
    }
}
