use crate::client::Credentials;
use std::env;
use std::path::Path;
use std::sync::Once;
use thiserror::Error;
use tracing::debug;

/// Environment variables read at startup.
pub const URL_VAR: &str = "KUMA_URL";
pub const USERNAME_VAR: &str = "KUMA_USERNAME";
pub const PASSWORD_VAR: &str = "KUMA_PASSWORD";
pub const TOKEN_VAR: &str = "KUMA_TOKEN";

static ENV_LOADER: Once = Once::new();

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("base URL '{url}' must start with http://, https://, ws:// or wss://")]
    InvalidUrl { url: String },
}

/// Startup configuration for the remote service connection. A missing URL is
/// not an error: the server still runs, with every tool call failing until
/// initialization succeeds.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
}

/// Ensures environment variables are loaded from the given dotenv file (or
/// `.env` in the working directory) exactly once.
pub fn ensure_env_loaded(path: Option<&Path>) {
    ENV_LOADER.call_once(|| match path {
        Some(path) => {
            let _ = dotenvy::from_filename(path);
        }
        None => {
            let _ = dotenvy::dotenv();
        }
    });
}

fn non_empty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.trim().is_empty())
}

impl AppConfig {
    /// Builds the configuration from the environment.
    pub fn from_env() -> Self {
        Self {
            url: non_empty(URL_VAR),
            username: non_empty(USERNAME_VAR),
            password: non_empty(PASSWORD_VAR),
            token: non_empty(TOKEN_VAR),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.url {
            let ok = ["http://", "https://", "ws://", "wss://"]
                .iter()
                .any(|scheme| url.starts_with(scheme));
            if !ok {
                return Err(ConfigError::InvalidUrl { url: url.clone() });
            }
        }
        debug!(
            url_set = self.url.is_some(),
            token_set = self.token.is_some(),
            "configuration validated"
        );
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            token: self.token.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}
