pub mod config;
pub mod dashboard;
pub mod demo;
pub mod list;
pub mod shell;

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;
use vendorly_core::config::{AppConfig, ConfigError, LoadOptions};
use vendorly_core::{ApplicationError, Clock, DomainError, PortalSession, SystemClock};

use crate::render::Renderer;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_INVALID_ARGUMENT: u8 = 3;
pub const EXIT_INVALID_TRANSITION: u8 = 4;
pub const EXIT_RUNTIME: u8 = 5;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct CommandReport<'a, T: Serialize> {
    command: &'a str,
    status: &'a str,
    report: &'a T,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            user_message: None,
            correlation_id: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            user_message: None,
            correlation_id: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Structured `--json` output: the report nested under the usual envelope.
    pub fn report<T: Serialize>(command: &str, report: &T) -> Self {
        let envelope = CommandReport { command, status: "ok", report };
        match serde_json::to_string(&envelope) {
            Ok(output) => Self { exit_code: 0, output },
            Err(error) => Self::failure(command, "serialization", error.to_string(), EXIT_RUNTIME),
        }
    }

    /// Human-readable output, printed as is.
    pub fn text(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }

    /// Classifies the error, then maps it through the interface layer so the
    /// payload carries a user-facing message and a correlation id.
    pub fn application_failure(command: &str, error: ApplicationError) -> Self {
        let (error_class, exit_code) = match &error {
            ApplicationError::Domain(DomainError::InvalidTransition { .. }) => {
                ("invalid_transition", EXIT_INVALID_TRANSITION)
            }
            ApplicationError::Domain(_) => ("invalid_argument", EXIT_INVALID_ARGUMENT),
            ApplicationError::Configuration(_) => ("config_validation", EXIT_CONFIG),
            ApplicationError::Rendering(_) => ("render", EXIT_RUNTIME),
        };
        let message = error.to_string();
        let interface = error.into_interface(Uuid::new_v4().to_string());

        tracing::warn!(
            event_name = "cli.command.failed",
            command,
            error_class,
            correlation_id = %interface.correlation_id(),
            error = %message,
            "command failed"
        );

        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message,
            user_message: Some(interface.user_message().to_string()),
            correlation_id: Some(interface.correlation_id().to_string()),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn config_failure(command: &str, error: &ConfigError) -> Self {
        Self::application_failure(command, ApplicationError::Configuration(error.to_string()))
    }

    pub fn domain_failure(command: &str, error: &DomainError) -> Self {
        Self::application_failure(command, ApplicationError::Domain(error.clone()))
    }
}

/// Loads configuration and builds a seeded session on the system clock, the
/// starting point of every portal command.
pub(crate) fn open_session(command: &str) -> Result<(AppConfig, PortalSession), CommandResult> {
    open_session_with_clock(command, Arc::new(SystemClock))
}

pub(crate) fn open_session_with_clock(
    command: &str,
    clock: Arc<dyn Clock>,
) -> Result<(AppConfig, PortalSession), CommandResult> {
    let config = AppConfig::load(LoadOptions::default())
        .map_err(|error| CommandResult::config_failure(command, &error))?;
    let session = PortalSession::from_config(&config, clock);
    Ok((config, session))
}

pub(crate) fn renderer(command: &str, session: &PortalSession) -> Result<Renderer, CommandResult> {
    Renderer::new(session.settings())
        .map_err(|error| CommandResult::application_failure(command, error))
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
