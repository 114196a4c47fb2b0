//! Configuration for autoverify.
//!
//! Settings come from the environment (after `.env` is loaded), overlaid on an
//! optional config file. The file is either given with `--config` or
//! discovered by `prefer` under the name `autoverify`. Environment values win
//! over file values.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::matching::{MatchThresholds, StrategyKind};
use crate::ocr::PollPolicy;

pub const DEFAULT_DATABASE_URL: &str = "autoverify.db";
pub const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_DB_PORT: u16 = 5432;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("Failed to load config file {}: {message}", .path.display())]
    File { path: PathBuf, message: String },
}

/// OCR section of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrFileConfig {
    pub endpoint: Option<String>,
    pub subscription_key: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub max_poll_attempts: Option<u32>,
    pub request_timeout_secs: Option<u64>,
}

/// Reconciliation section of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileFileConfig {
    pub max_limit: Option<f64>,
    pub match_strategy: Option<String>,
    pub auto_verify: Option<bool>,
    pub odometer_threshold: Option<u32>,
    pub plate_threshold: Option<u32>,
}

/// Contents of an `autoverify.{toml,json,yaml}` file. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    pub database_url: Option<String>,
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub ocr: OcrFileConfig,
    #[serde(default)]
    pub reconcile: ReconcileFileConfig,
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl FileConfig {
    /// Discover a config file with `prefer`. No file means an empty config.
    pub async fn discover() -> Result<Self, ConfigError> {
        let discovered = match prefer::load("autoverify").await {
            Ok(found) => found.source_path().map(|p| p.to_path_buf()),
            Err(_) => None,
        };

        match discovered {
            Some(path) => Self::load_from_path(&path).await,
            None => Ok(Self::default()),
        }
    }

    /// Load a config file, picking the format from its extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let file_error = |message: String| ConfigError::File {
            path: path.to_path_buf(),
            message,
        };

        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| file_error(e.to_string()))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(ext, &contents).map_err(file_error)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(ext: &str, contents: &str) -> Result<Self, String> {
        match ext {
            "toml" => toml::from_str(contents).map_err(|e| format!("invalid TOML: {}", e)),
            "yaml" | "yml" => {
                serde_yaml::from_str(contents).map_err(|e| format!("invalid YAML: {}", e))
            }
            _ => serde_json::from_str(contents).map_err(|e| format!("invalid JSON: {}", e)),
        }
    }
}

/// Connection and polling settings for the OCR service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrSettings {
    pub endpoint: String,
    pub subscription_key: String,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub request_timeout_secs: u64,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            subscription_key: String::new(),
            poll_interval_ms: 1000,
            max_poll_attempts: 60,
            request_timeout_secs: 30,
        }
    }
}

impl OcrSettings {
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: std::time::Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.max_poll_attempts,
        }
    }
}

/// Parameters of a reconciliation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileSettings {
    /// Odometer distance per day below which a record is sent to OCR.
    pub max_limit: f64,
    pub strategy: StrategyKind,
    pub thresholds: MatchThresholds,
    /// Stamp `ocr_verified_at` when both categories match.
    pub auto_verify: bool,
}

/// Resolved settings.
///
/// OCR credentials and `MAX_LIMIT` are only required by the commands that
/// reconcile, so they are checked by [`Settings::ocr`] and
/// [`Settings::reconcile`] rather than at load time.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub log_dir: PathBuf,
    pub config_path: Option<PathBuf>,
    ocr_endpoint: Option<String>,
    ocr_subscription_key: Option<String>,
    poll_interval_ms: u64,
    max_poll_attempts: u32,
    request_timeout_secs: u64,
    max_limit: Option<f64>,
    strategy: StrategyKind,
    thresholds: MatchThresholds,
    auto_verify: bool,
}

impl Settings {
    /// Load settings from the process environment and a config file.
    pub async fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match config_path {
            Some(path) => FileConfig::load_from_path(path).await?,
            None => FileConfig::discover().await?,
        };
        Self::resolve(|key| std::env::var(key).ok(), file)
    }

    /// Resolve settings from an environment lookup and file values.
    pub fn resolve<E>(env: E, file: FileConfig) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = OcrSettings::default();
        let default_thresholds = MatchThresholds::default();

        let database_url = match database_url_from_env(&env)? {
            Some(url) => url,
            None => file
                .database_url
                .clone()
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
        };

        let strategy = match env("MATCH_STRATEGY").or(file.reconcile.match_strategy.clone()) {
            Some(name) => StrategyKind::from_str(&name).ok_or_else(|| ConfigError::Invalid {
                key: "MATCH_STRATEGY",
                message: format!("unknown strategy '{}'", name),
            })?,
            None => StrategyKind::default(),
        };

        let max_limit = match env("MAX_LIMIT") {
            Some(raw) => Some(parse_value::<f64>("MAX_LIMIT", &raw)?),
            None => file.reconcile.max_limit,
        };
        if let Some(limit) = max_limit {
            if !limit.is_finite() {
                return Err(ConfigError::Invalid {
                    key: "MAX_LIMIT",
                    message: format!("{} is not a finite number", limit),
                });
            }
        }

        let thresholds = MatchThresholds {
            odometer: file
                .reconcile
                .odometer_threshold
                .unwrap_or(default_thresholds.odometer),
            plate: file
                .reconcile
                .plate_threshold
                .unwrap_or(default_thresholds.plate),
        };
        // A zero threshold matches any aggregation.
        for (key, value) in [
            ("reconcile.odometer_threshold", thresholds.odometer),
            ("reconcile.plate_threshold", thresholds.plate),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    key,
                    message: "must be at least 1".to_string(),
                });
            }
        }

        let auto_verify = match env("AUTO_VERIFY") {
            Some(raw) => parse_bool("AUTO_VERIFY", &raw)?,
            None => file.reconcile.auto_verify.unwrap_or(true),
        };

        Ok(Self {
            database_url,
            log_dir: env("LOG_DIR")
                .map(PathBuf::from)
                .or(file.log_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
            config_path: file.source_path,
            ocr_endpoint: env("OCR_ENDPOINT").or(file.ocr.endpoint),
            ocr_subscription_key: env("OCR_SUBSCRIPTION_KEY").or(file.ocr.subscription_key),
            poll_interval_ms: env_or("OCR_POLL_INTERVAL_MS", &env, file.ocr.poll_interval_ms)?
                .unwrap_or(defaults.poll_interval_ms),
            max_poll_attempts: env_or("OCR_MAX_POLL_ATTEMPTS", &env, file.ocr.max_poll_attempts)?
                .unwrap_or(defaults.max_poll_attempts),
            request_timeout_secs: env_or(
                "OCR_REQUEST_TIMEOUT_SECS",
                &env,
                file.ocr.request_timeout_secs,
            )?
            .unwrap_or(defaults.request_timeout_secs),
            max_limit,
            strategy,
            thresholds,
            auto_verify,
        })
    }

    /// OCR settings; fails if the endpoint or key is missing.
    pub fn ocr(&self) -> Result<OcrSettings, ConfigError> {
        let endpoint = self
            .ocr_endpoint
            .clone()
            .ok_or(ConfigError::Missing("OCR_ENDPOINT"))?;
        let subscription_key = self
            .ocr_subscription_key
            .clone()
            .ok_or(ConfigError::Missing("OCR_SUBSCRIPTION_KEY"))?;

        if self.max_poll_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "OCR_MAX_POLL_ATTEMPTS",
                message: "must be at least 1".to_string(),
            });
        }

        Ok(OcrSettings {
            endpoint,
            subscription_key,
            poll_interval_ms: self.poll_interval_ms,
            max_poll_attempts: self.max_poll_attempts,
            request_timeout_secs: self.request_timeout_secs,
        })
    }

    /// Configured match strategy and thresholds.
    pub fn matching(&self) -> (StrategyKind, MatchThresholds) {
        (self.strategy, self.thresholds)
    }

    /// Reconciliation settings; fails if `MAX_LIMIT` is missing.
    pub fn reconcile(&self) -> Result<ReconcileSettings, ConfigError> {
        Ok(ReconcileSettings {
            max_limit: self.max_limit.ok_or(ConfigError::Missing("MAX_LIMIT"))?,
            strategy: self.strategy,
            thresholds: self.thresholds,
            auto_verify: self.auto_verify,
        })
    }
}

/// `DATABASE_URL`, or a PostgreSQL URL assembled from the `DB_*` variables.
fn database_url_from_env<E>(env: &E) -> Result<Option<String>, ConfigError>
where
    E: Fn(&str) -> Option<String>,
{
    if let Some(url) = env("DATABASE_URL") {
        return Ok(Some(url));
    }
    let Some(host) = env("DB_HOST") else {
        return Ok(None);
    };

    let name = env("DB_NAME").ok_or(ConfigError::Missing("DB_NAME"))?;
    let user = env("DB_USER").ok_or(ConfigError::Missing("DB_USER"))?;
    let port = match env("DB_PORT") {
        Some(raw) => parse_value::<u16>("DB_PORT", &raw)?,
        None => DEFAULT_DB_PORT,
    };

    let invalid = |message: String| ConfigError::Invalid {
        key: "DB_HOST",
        message,
    };
    let mut url = Url::parse(&format!("postgres://{}:{}/", host, port))
        .map_err(|e| invalid(e.to_string()))?;
    url.set_path(&name);
    url.set_username(&user)
        .map_err(|_| invalid(format!("cannot use '{}' as a host", host)))?;
    if let Some(password) = env("DB_PASSWORD") {
        url.set_password(Some(&password))
            .map_err(|_| invalid(format!("cannot use '{}' as a host", host)))?;
    }

    Ok(Some(url.to_string()))
}

fn env_or<T, E>(key: &'static str, env: &E, file: Option<T>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    E: Fn(&str) -> Option<String>,
{
    match env(key) {
        Some(raw) => parse_value(key, &raw).map(Some),
        None => Ok(file),
    }
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        message: format!("'{}': {}", raw, e),
    })
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            message: format!("'{}' is not a boolean", raw),
        }),
    }
}
