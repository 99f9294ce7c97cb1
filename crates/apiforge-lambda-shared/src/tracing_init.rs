//! Tracing initialization and the line format shared with [`crate::Logger`].
//!
//! Every record renders as one entry:
//!
//! ```text
//! 2026-01-04T10:00:00.000Z [info]: Home route hit
//! 2026-01-04T10:00:00.000Z [error]: Error in middleware:, {"message":"Unauthorized: No token provided"}
//! ```
//!
//! Tracing has no `http` level, so the five logger levels are carried on
//! tracing levels shifted by one below `info`: DEBUG renders as `http` and
//! TRACE as `debug`.

use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::logger::LoggerConfig;

/// Field carrying metadata already rendered by the [`crate::Logger`].
pub(crate) const META_FIELD: &str = "meta";

/// Event formatter producing `<timestamp> [<level>]: <message>[, <meta>]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat {
    production: bool,
}

impl LineFormat {
    /// Compact metadata when `production`, indented otherwise.
    pub fn new(production: bool) -> Self {
        Self { production }
    }
}

pub(crate) fn level_label(level: &Level) -> &'static str {
    match level.as_str() {
        "ERROR" => "error",
        "WARN" => "warn",
        "INFO" => "info",
        "DEBUG" => "http",
        _ => "debug",
    }
}

pub(crate) fn render_json(value: &Value, production: bool) -> String {
    let rendered = if production {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    rendered.unwrap_or_else(|_| value.to_string())
}

#[derive(Default)]
struct FieldCollector {
    message: String,
    meta: Option<String>,
    fields: Map<String, Value>,
}

impl FieldCollector {
    fn insert(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            META_FIELD => {
                if !value.is_empty() {
                    self.meta = Some(value.to_string());
                }
            }
            _ => self.insert(field, Value::String(value.to_string())),
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.insert(field, Value::String(format!("{:?}", value)));
        }
    }
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut collector = FieldCollector::default();
        event.record(&mut collector);

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let label = level_label(event.metadata().level());
        write!(writer, "{} [{}]: {}", timestamp, label, collector.message)?;

        // Logger metadata wins; otherwise structured tracing fields are the metadata.
        let meta = match collector.meta {
            Some(meta) => Some(meta),
            None if !collector.fields.is_empty() => Some(render_json(
                &Value::Object(collector.fields),
                self.production,
            )),
            None => None,
        };
        if let Some(meta) = meta {
            write!(writer, ", {}", meta)?;
        }

        writeln!(writer)
    }
}

/// Install the global tracing subscriber using the [`LineFormat`].
///
/// Call once at the start of the Lambda `main`, before
/// `lambda_runtime::run()`. `RUST_LOG` takes precedence over `LOG_LEVEL`;
/// `ENVIRONMENT=production` selects compact metadata. Calling it again is a
/// no-op.
///
/// # Example
///
/// ```no_run
/// use apiforge_lambda_shared::init_tracing;
///
/// #[tokio::main]
/// async fn main() -> Result<(), lambda_runtime::Error> {
///     init_tracing();
///     // ... rest of Lambda setup
///     Ok(())
/// }
/// ```
pub fn init_tracing() {
    let config = LoggerConfig::from_env();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.filter_directive()));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .event_format(LineFormat::new(config.production));

    // A subscriber installed earlier (tests, embedding binaries) stays in place.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_labels() {
        assert_eq!(level_label(&Level::ERROR), "error");
        assert_eq!(level_label(&Level::WARN), "warn");
        assert_eq!(level_label(&Level::INFO), "info");
        assert_eq!(level_label(&Level::DEBUG), "http");
        assert_eq!(level_label(&Level::TRACE), "debug");
    }

    #[test]
    fn test_render_json_compact_and_pretty() {
        let value = serde_json::json!({"a": 1});
        assert_eq!(render_json(&value, true), r#"{"a":1}"#);
        assert_eq!(render_json(&value, false), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
