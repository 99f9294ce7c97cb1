//! Process-wide leveled logger.
//!
//! The [`Logger`] owns its own `tracing` dispatcher so it can be handed to
//! components as a dependency (and replaced in tests) while still rendering
//! with the same [`LineFormat`] as the global subscriber.
//!
//! # Environment Variables
//!
//! - `LOG_LEVEL`: `error`, `warn`, `info` (default), `http` or `debug`
//! - `ENVIRONMENT`: `production` renders metadata compactly; any other value
//!   renders it indented
//!
//! # Example
//!
//! ```no_run
//! use apiforge_lambda_shared::{log, Meta};
//! use serde_json::json;
//!
//! log().info("Home route hit");
//! log().warn_with("slow upstream", json!({ "elapsed_ms": 812 }));
//! ```

use std::error::Error as StdError;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{Dispatch, Level};
use tracing_subscriber::fmt::MakeWriter;

use crate::tracing_init::{render_json, LineFormat};

const LOG_TARGET: &str = "apiforge";

static LOGGER: OnceCell<Logger> = OnceCell::new();

/// The process logger, created from the environment on first use.
pub fn log() -> &'static Logger {
    LOGGER.get_or_init(|| Logger::new(LoggerConfig::from_env()))
}

/// Severity, from most to least severe.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Http,
    Debug,
}

impl LogLevel {
    /// Parse a level name, case-insensitively. Unknown names map to `Info`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "error" => LogLevel::Error,
            "warn" | "warning" => LogLevel::Warn,
            "http" => LogLevel::Http,
            "debug" => LogLevel::Debug,
            _ => LogLevel::Info,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Http => "http",
            LogLevel::Debug => "debug",
        }
    }

    /// Tracing level this severity is emitted at.
    pub const fn tracing_level(self) -> Level {
        match self {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Http => Level::DEBUG,
            LogLevel::Debug => Level::TRACE,
        }
    }

    pub(crate) const fn filter_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Http => "debug",
            LogLevel::Debug => "trace",
        }
    }
}

/// Logger configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Least severe level that is emitted.
    pub level: LogLevel,
    /// Compact metadata when true, indented otherwise.
    pub production: bool,
}

impl LoggerConfig {
    /// Create configuration from `LOG_LEVEL` and `ENVIRONMENT`.
    pub fn from_env() -> Self {
        Self::from_values(
            std::env::var("LOG_LEVEL").ok().as_deref(),
            std::env::var("ENVIRONMENT").ok().as_deref(),
        )
    }

    fn from_values(level: Option<&str>, environment: Option<&str>) -> Self {
        Self {
            level: level.map(LogLevel::from_name).unwrap_or_default(),
            production: environment
                .map(|env| env.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
        }
    }
}

/// Metadata attached to a log record.
#[derive(Debug, Clone, PartialEq)]
pub enum Meta {
    /// Any JSON value. Strings render without quotes.
    Value(Value),
    /// An error and the display text of its sources.
    Error { message: String, causes: Vec<String> },
}

impl Meta {
    /// Capture an error and its source chain.
    pub fn error(error: &(dyn StdError + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Meta::Error {
            message: error.to_string(),
            causes,
        }
    }

    fn render(&self, production: bool) -> String {
        match self {
            Meta::Value(Value::String(text)) => text.clone(),
            Meta::Value(value) => render_json(value, production),
            Meta::Error { message, causes } if causes.is_empty() => {
                render_json(&json!({ "message": message }), production)
            }
            Meta::Error { message, causes } => render_json(
                &json!({ "message": message, "causes": causes }),
                production,
            ),
        }
    }
}

impl From<Value> for Meta {
    fn from(value: Value) -> Self {
        Meta::Value(value)
    }
}

impl From<&str> for Meta {
    fn from(value: &str) -> Self {
        Meta::Value(Value::String(value.to_string()))
    }
}

impl From<String> for Meta {
    fn from(value: String) -> Self {
        Meta::Value(Value::String(value))
    }
}

/// Leveled logger writing one line per record.
#[derive(Debug, Clone)]
pub struct Logger {
    config: LoggerConfig,
    dispatch: Dispatch,
}

impl Logger {
    /// Logger writing to stdout.
    pub fn new(config: LoggerConfig) -> Self {
        Self::with_writer(config, std::io::stdout)
    }

    /// Logger writing to any tracing-subscriber writer.
    pub fn with_writer<W>(config: LoggerConfig, writer: W) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(writer)
            .with_ansi(false)
            .with_max_level(config.level.tracing_level())
            .event_format(LineFormat::new(config.production))
            .finish();

        Self {
            config,
            dispatch: Dispatch::new(subscriber),
        }
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// Whether records at `level` are emitted.
    pub fn enabled(&self, level: LogLevel) -> bool {
        level <= self.config.level
    }

    /// Emit a record. Never fails; disabled levels are dropped.
    pub fn log(&self, level: LogLevel, message: &str, meta: Option<&Meta>) {
        if !self.enabled(level) {
            return;
        }

        let rendered = meta
            .map(|meta| meta.render(self.config.production))
            .unwrap_or_default();
        let meta = rendered.as_str();

        tracing::dispatcher::with_default(&self.dispatch, || match level {
            LogLevel::Error => tracing::error!(target: LOG_TARGET, meta, "{}", message),
            LogLevel::Warn => tracing::warn!(target: LOG_TARGET, meta, "{}", message),
            LogLevel::Info => tracing::info!(target: LOG_TARGET, meta, "{}", message),
            LogLevel::Http => tracing::debug!(target: LOG_TARGET, meta, "{}", message),
            LogLevel::Debug => tracing::trace!(target: LOG_TARGET, meta, "{}", message),
        });
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message, None);
    }

    pub fn error_with(&self, message: &str, meta: impl Into<Meta>) {
        self.log(LogLevel::Error, message, Some(&meta.into()));
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message, None);
    }

    pub fn warn_with(&self, message: &str, meta: impl Into<Meta>) {
        self.log(LogLevel::Warn, message, Some(&meta.into()));
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, None);
    }

    pub fn info_with(&self, message: &str, meta: impl Into<Meta>) {
        self.log(LogLevel::Info, message, Some(&meta.into()));
    }

    pub fn http(&self, message: &str) {
        self.log(LogLevel::Http, message, None);
    }

    pub fn http_with(&self, message: &str, meta: impl Into<Meta>) {
        self.log(LogLevel::Http, message, Some(&meta.into()));
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, None);
    }

    pub fn debug_with(&self, message: &str, meta: impl Into<Meta>) {
        self.log(LogLevel::Debug, message, Some(&meta.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::capture_logger;
    use crate::HttpError;

    fn config(level: LogLevel, production: bool) -> LoggerConfig {
        LoggerConfig { level, production }
    }

    #[test]
    fn test_level_from_name() {
        assert_eq!(LogLevel::from_name("ERROR"), LogLevel::Error);
        assert_eq!(LogLevel::from_name("warn"), LogLevel::Warn);
        assert_eq!(LogLevel::from_name("http"), LogLevel::Http);
        assert_eq!(LogLevel::from_name(" Debug "), LogLevel::Debug);
        assert_eq!(LogLevel::from_name("verbose"), LogLevel::Info);
    }

    #[test]
    fn test_config_defaults() {
        let config = LoggerConfig::from_values(None, None);
        assert_eq!(config.level, LogLevel::Info);
        assert!(!config.production);

        let config = LoggerConfig::from_values(Some("debug"), Some("Production"));
        assert_eq!(config.level, LogLevel::Debug);
        assert!(config.production);
    }

    #[test]
    fn test_line_format() {
        let (logger, logs) = capture_logger(config(LogLevel::Info, true));
        logger.info("Home route hit");

        let lines = logs.lines();
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert!(line.ends_with(" [info]: Home route hit"), "{line}");
        // RFC 3339 UTC with milliseconds, e.g. 2026-01-04T10:00:00.000Z
        let timestamp = line.split(' ').next().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok(), "{timestamp}");
        assert!(timestamp.ends_with('Z'));
    }

    #[test]
    fn test_compact_metadata_in_production() {
        let (logger, logs) = capture_logger(config(LogLevel::Info, true));
        logger.warn_with("slow upstream", json!({"elapsed_ms": 812}));

        assert!(logs
            .contents()
            .contains("[warn]: slow upstream, {\"elapsed_ms\":812}"));
    }

    #[test]
    fn test_indented_metadata_outside_production() {
        let (logger, logs) = capture_logger(config(LogLevel::Info, false));
        logger.info_with("payload", json!({"a": 1}));

        assert!(logs.contents().contains("[info]: payload, {\n  \"a\": 1\n}"));
    }

    #[test]
    fn test_string_and_error_metadata() {
        let (logger, logs) = capture_logger(config(LogLevel::Debug, true));
        logger.debug_with("cache", "miss");
        logger.error_with(
            "Error in middleware:",
            Meta::error(&HttpError::unauthorized("Unauthorized: No token provided")),
        );

        let contents = logs.contents();
        assert!(contents.contains("[debug]: cache, miss"));
        assert!(contents.contains(
            "[error]: Error in middleware:, {\"message\":\"Unauthorized: Unauthorized: No token provided\"}"
        ));
    }

    #[test]
    fn test_level_filtering() {
        let (logger, logs) = capture_logger(config(LogLevel::Warn, true));
        logger.error("kept");
        logger.warn("kept too");
        logger.info("dropped");
        logger.http("dropped");
        logger.debug("dropped");

        let lines = logs.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|line| line.contains("kept")));
    }

    #[test]
    fn test_http_level_label() {
        let (logger, logs) = capture_logger(config(LogLevel::Http, true));
        logger.http("GET / 200");
        logger.debug("dropped");

        let lines = logs.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("[http]: GET / 200"));
    }

    #[test]
    fn test_global_logger_is_shared() {
        let first = log() as *const Logger;
        let second = log() as *const Logger;
        assert_eq!(first, second);
    }
}
