//! Environment driven configuration

use di::{inject, injectable};
use log::warn;
use std::env;
use std::str::FromStr;
use std::sync::RwLock;
use std::time::Duration;

pub const DEFAULT_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev/v1";
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";
pub const DEFAULT_TEMPERATURE: f32 = 0.8;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://moodmoji.db?mode=rwc";

static TEST_GATEWAY_CONFIG: RwLock<Option<GatewayConfig>> = RwLock::new(None);

/// Settings for the hosted text-completion gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Bearer token. Missing keys are reported per request, not at startup.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

#[injectable]
impl GatewayConfig {
    #[inject]
    pub fn create() -> GatewayConfig {
        if let Some(config) = TEST_GATEWAY_CONFIG.read().ok().and_then(|c| c.clone()) {
            return config;
        }

        Self::from_env()
    }
}

impl GatewayConfig {
    pub fn from_env() -> GatewayConfig {
        dotenvy::dotenv().ok();

        GatewayConfig {
            api_key: env::var("LLM_GATEWAY_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            base_url: env::var("LLM_GATEWAY_URL").unwrap_or(DEFAULT_GATEWAY_URL.to_owned()),
            model: env::var("LLM_MODEL").unwrap_or(DEFAULT_MODEL.to_owned()),
            temperature: parse_var("LLM_TEMPERATURE", DEFAULT_TEMPERATURE),
            timeout: Duration::from_secs(parse_var("LLM_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)),
        }
    }

    /// Gateway pointed at `base_url` with the default model and sampling settings.
    pub fn for_endpoint(base_url: impl Into<String>, api_key: Option<String>) -> GatewayConfig {
        GatewayConfig {
            api_key,
            base_url: base_url.into(),
            model: DEFAULT_MODEL.to_owned(),
            temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Makes every DI-created config return `config` instead of reading the environment.
    pub fn set_test_config(config: GatewayConfig) {
        if let Ok(mut slot) = TEST_GATEWAY_CONFIG.write() {
            *slot = Some(config);
        }
    }

    pub fn clear_test_config() {
        if let Ok(mut slot) = TEST_GATEWAY_CONFIG.write() {
            *slot = None;
        }
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl ServerConfig {
    pub fn from_env() -> ServerConfig {
        dotenvy::dotenv().ok();

        ServerConfig {
            bind_addr: env::var("BIND_ADDR").unwrap_or(DEFAULT_BIND_ADDR.to_owned()),
        }
    }
}

/// The one place `DATABASE_URL` is read, shared by the pool and the startup log.
pub fn database_url() -> String {
    env::var("DATABASE_URL").unwrap_or(DEFAULT_DATABASE_URL.to_owned())
}

fn parse_var<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => T::from_str(raw.trim()).unwrap_or_else(|_| {
            warn!("ignoring invalid {name}={raw:?}, using {default}");
            default
        }),
        Err(_) => default,
    }
}
