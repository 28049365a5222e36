use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;
use crate::ports::Credential;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8086/api/v1";
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Connection settings for the quiz backend.
#[derive(Clone, Debug)]
pub struct QuizApiConfig {
    pub base_url: Url,
    pub credential: Option<Credential>,
    pub request_timeout: Duration,
}

impl QuizApiConfig {
    /// Read settings from `QUIZ_API_*` environment variables, after loading a
    /// local `.env` if there is one.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when a variable is set but unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings from a dotenv file. Variables already set in the process
    /// environment take precedence over the file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EnvFile` if the file cannot be read or parsed,
    /// otherwise the same errors as `from_lookup`.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file: HashMap<String, String> =
            dotenvy::from_path_iter(path.as_ref())?.collect::<Result<_, _>>()?;
        Self::from_lookup(|key| env::var(key).ok().or_else(|| file.get(key).cloned()))
    }

    /// Same as `from_env`, reading through `lookup` instead of the process env.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when a value is set but unusable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = lookup("QUIZ_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.into());
        let base_url = parse_base_url(&raw_url)?;

        let credential = lookup("QUIZ_API_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .map(|token| {
                let scheme = lookup("QUIZ_API_TOKEN_TYPE")
                    .filter(|scheme| !scheme.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.into());
                Credential::new(scheme.trim(), token.trim())
            });

        let request_timeout = match lookup("QUIZ_API_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "QUIZ_API_TIMEOUT_SECS",
                    reason: format!("not a number of seconds: {raw}"),
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "QUIZ_API_TIMEOUT_SECS",
                        reason: "must be > 0".into(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            base_url,
            credential,
            request_timeout,
        })
    }

    /// Override the base URL, e.g. from a `--api` flag.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the URL is unusable.
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url(raw)?;
        Ok(self)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidValue {
        key: "QUIZ_API_BASE_URL",
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue {
            key: "QUIZ_API_BASE_URL",
            reason: format!("expected an http(s) url, got {raw}"),
        });
    }
    Ok(url)
}
