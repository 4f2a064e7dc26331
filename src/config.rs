//! Command-line and environment configuration.

use clap::Parser;
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AdminError, AdminResult};

pub const DEFAULT_API_URL: &str = "https://reqres.in/api";
pub const DEFAULT_STORAGE_PATH: &str = "user-admin-storage.json";

/// Terminal user administration for a reqres-style REST API.
#[derive(Debug, Clone, Parser)]
#[command(name = "user_admin", version, about)]
pub struct Cli {
    /// Base URL of the users API
    #[arg(long, env = "USER_ADMIN_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Value sent in the `x-api-key` header, if the API wants one
    #[arg(long, env = "USER_ADMIN_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// File holding persisted client state (the session token)
    #[arg(long, env = "USER_ADMIN_STORAGE", default_value = DEFAULT_STORAGE_PATH)]
    pub storage: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, env = "USER_ADMIN_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Pause between a successful login and the redirect to the user list
    #[arg(long, env = "USER_ADMIN_LOGIN_REDIRECT_MS", default_value_t = 1500)]
    pub login_redirect_ms: u64,

    /// Emit logs as JSON lines instead of the compact format
    #[arg(long, env = "USER_ADMIN_JSON_LOGS")]
    pub json_logs: bool,
}

/// Settings for the HTTP adapter.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Url,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: &str) -> AdminResult<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            api_key: None,
            timeout: Duration::from_secs(30),
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub storage_path: PathBuf,
    pub login_redirect_delay: Duration,
    pub json_logs: bool,
}

impl TryFrom<Cli> for AppConfig {
    type Error = AdminError;

    fn try_from(cli: Cli) -> AdminResult<Self> {
        if cli.timeout_secs == 0 {
            return Err(AdminError::Config("timeout must be at least one second".to_string()));
        }

        Ok(Self {
            api: ApiConfig {
                base_url: parse_base_url(&cli.api_url)?,
                api_key: cli.api_key.filter(|key| !key.trim().is_empty()),
                timeout: Duration::from_secs(cli.timeout_secs),
            },
            storage_path: cli.storage,
            login_redirect_delay: Duration::from_millis(cli.login_redirect_ms),
            json_logs: cli.json_logs,
        })
    }
}

fn parse_base_url(raw: &str) -> AdminResult<Url> {
    let url = Url::parse(raw).map_err(|e| AdminError::Config(format!("invalid API URL '{}': {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AdminError::Config(format!("unsupported URL scheme '{}'", other))),
    }
}
