use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::format::Locale;
use crate::notifications::DEFAULT_TTL_MS;
use crate::store::DEFAULT_INVOICE_PREFIX;
use crate::view::Page;

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["vendorly.toml", "config/vendorly.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub portal: PortalConfig,
    pub notifications: NotificationConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct PortalConfig {
    pub vendor_name: String,
    pub currency: String,
    pub locale: Locale,
    pub invoice_prefix: String,
    pub default_page: Page,
}

#[derive(Clone, Debug)]
pub struct NotificationConfig {
    pub ttl_ms: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub vendor_name: Option<String>,
    pub locale: Option<Locale>,
    pub notification_ttl_ms: Option<u64>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            portal: PortalConfig {
                vendor_name: "PT Sinar Logistik Nusantara".to_string(),
                currency: "IDR".to_string(),
                locale: Locale::IdId,
                invoice_prefix: DEFAULT_INVOICE_PREFIX.to_string(),
                default_page: Page::Dashboard,
            },
            notifications: NotificationConfig { ttl_ms: DEFAULT_TTL_MS },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(portal) = patch.portal {
            if let Some(vendor_name) = portal.vendor_name {
                self.portal.vendor_name = vendor_name;
            }
            if let Some(currency) = portal.currency {
                self.portal.currency = currency;
            }
            if let Some(locale) = portal.locale {
                self.portal.locale = parse_locale(&locale)?;
            }
            if let Some(invoice_prefix) = portal.invoice_prefix {
                self.portal.invoice_prefix = invoice_prefix;
            }
            if let Some(default_page) = portal.default_page {
                self.portal.default_page = parse_page(&default_page)?;
            }
        }

        if let Some(notifications) = patch.notifications {
            if let Some(ttl_ms) = notifications.ttl_ms {
                self.notifications.ttl_ms = ttl_ms;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("VENDORLY_PORTAL_VENDOR_NAME") {
            self.portal.vendor_name = value;
        }
        if let Some(value) = read_env("VENDORLY_PORTAL_CURRENCY") {
            self.portal.currency = value;
        }
        if let Some(value) = read_env("VENDORLY_PORTAL_LOCALE") {
            self.portal.locale = value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "VENDORLY_PORTAL_LOCALE".to_string(),
                value: value.clone(),
            })?;
        }
        if let Some(value) = read_env("VENDORLY_PORTAL_INVOICE_PREFIX") {
            self.portal.invoice_prefix = value;
        }
        if let Some(value) = read_env("VENDORLY_PORTAL_DEFAULT_PAGE") {
            self.portal.default_page =
                value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                    key: "VENDORLY_PORTAL_DEFAULT_PAGE".to_string(),
                    value: value.clone(),
                })?;
        }

        if let Some(value) = read_env("VENDORLY_NOTIFICATIONS_TTL_MS") {
            self.notifications.ttl_ms = parse_u64("VENDORLY_NOTIFICATIONS_TTL_MS", &value)?;
        }

        let log_level =
            read_env("VENDORLY_LOGGING_LEVEL").or_else(|| read_env("VENDORLY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("VENDORLY_LOGGING_FORMAT").or_else(|| read_env("VENDORLY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(vendor_name) = overrides.vendor_name {
            self.portal.vendor_name = vendor_name;
        }
        if let Some(locale) = overrides.locale {
            self.portal.locale = locale;
        }
        if let Some(ttl_ms) = overrides.notification_ttl_ms {
            self.notifications.ttl_ms = ttl_ms;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_portal(&self.portal)?;
        validate_notifications(&self.notifications)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// First existing config file: the explicit path, then the default
/// candidates relative to the working directory.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_portal(portal: &PortalConfig) -> Result<(), ConfigError> {
    if portal.vendor_name.trim().is_empty() {
        return Err(ConfigError::Validation("portal.vendor_name must not be empty".to_string()));
    }

    let currency = portal.currency.trim();
    if currency.len() != 3 || !currency.chars().all(|ch| ch.is_ascii_alphabetic()) {
        return Err(ConfigError::Validation(
            "portal.currency must be a three-letter ISO 4217 code such as `IDR`".to_string(),
        ));
    }

    let prefix = portal.invoice_prefix.trim();
    if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(
            "portal.invoice_prefix must be non-empty and contain no whitespace".to_string(),
        ));
    }

    Ok(())
}

fn validate_notifications(notifications: &NotificationConfig) -> Result<(), ConfigError> {
    if !(100..=600_000).contains(&notifications.ttl_ms) {
        return Err(ConfigError::Validation(
            "notifications.ttl_ms must be in range 100..=600000".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn parse_locale(value: &str) -> Result<Locale, ConfigError> {
    value.parse().map_err(|error| ConfigError::Validation(format!("portal.locale: {error}")))
}

fn parse_page(value: &str) -> Result<Page, ConfigError> {
    value.parse().map_err(|error| ConfigError::Validation(format!("portal.default_page: {error}")))
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    portal: Option<PortalPatch>,
    notifications: Option<NotificationPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct PortalPatch {
    vendor_name: Option<String>,
    currency: Option<String>,
    locale: Option<String>,
    invoice_prefix: Option<String>,
    default_page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NotificationPatch {
    ttl_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
