//! # Logging
//!
//! `tracing` subscriber setup for the uploader core.
//!
//! Events are written to stdout in one of three formats and can additionally
//! be mirrored to a host [`LogSink`]. Mirrored records pass through
//! [`redact_field`] first so session tokens and passwords never leave the
//! process.
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//! use bridge_traits::time::LogLevel;
//!
//! init_logging(
//!     LoggingConfig::default()
//!         .with_format(LogFormat::Compact)
//!         .with_level(LogLevel::Debug),
//! )?;
//! tracing::info!(batch_id = %id, "Batch submitted");
//! ```

use crate::error::{Error, Result};

use bridge_traits::time::{LogLevel, LogRecord, LogSink};

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::{
    filter::EnvFilter,
    fmt::format::FmtSpan,
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    Layer,
};

const REDACTED: &str = "[REDACTED]";

const SENSITIVE_FIELD_MARKERS: &[&str] = &[
    "token",
    "password",
    "secret",
    "authorization",
    "bearer",
];

/// Crates that follow the configured level when no explicit filter is set.
const WORKSPACE_TARGETS: &[&str] = &[
    "product_uploader_workspace",
    "core_runtime",
    "core_auth",
    "core_catalog",
    "core_upload",
    "core_service",
    "bridge_desktop",
];

/// Dependencies that are only interesting when they misbehave.
const QUIET_TARGETS: &[&str] = &["h2", "hyper", "reqwest", "rustls"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Raw `EnvFilter` directives; replaces the per-crate defaults entirely.
    pub filter: Option<String>,
    pub sink: Option<Arc<dyn LogSink>>,
    /// Mask sensitive values in records handed to `sink`.
    pub redact: bool,
    /// Log span open/close in the pretty format.
    pub span_events: bool,
    pub display_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            sink: None,
            redact: true,
            span_events: false,
            display_target: true,
        }
    }
}

impl fmt::Debug for LoggingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingConfig")
            .field("format", &self.format)
            .field("level", &self.level)
            .field("filter", &self.filter)
            .field("has_sink", &self.sink.is_some())
            .field("redact", &self.redact)
            .finish()
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_redaction(mut self, redact: bool) -> Self {
        self.redact = redact;
        self
    }

    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        let directives = match &self.filter {
            Some(custom) => custom.clone(),
            None => default_directives(self.level),
        };
        EnvFilter::try_new(directives)
            .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))
    }
}

/// Installs the global subscriber. A second call fails with [`Error::Config`].
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = config.env_filter()?;

    tracing_subscriber::registry()
        .with(stdout_layer(&config))
        .with(HostSinkLayer {
            sink: config.sink.clone(),
            redact: config.redact,
        })
        .with(filter)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

fn default_directives(level: LogLevel) -> String {
    WORKSPACE_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level.as_str()))
        .chain(QUIET_TARGETS.iter().map(|target| format!("{}=warn", target)))
        .collect::<Vec<_>>()
        .join(",")
}

fn stdout_layer<S>(config: &LoggingConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let base = tracing_subscriber::fmt::layer()
        .with_target(config.display_target)
        .with_writer(io::stdout);

    match config.format {
        LogFormat::Pretty => {
            let spans = if config.span_events {
                FmtSpan::NEW | FmtSpan::CLOSE
            } else {
                FmtSpan::NONE
            };
            base.pretty().with_span_events(spans).boxed()
        }
        LogFormat::Json => base
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Compact => base.compact().boxed(),
    }
}

/// Mirrors events into a [`LogSink`].
struct HostSinkLayer {
    sink: Option<Arc<dyn LogSink>>,
    redact: bool,
}

impl<S> Layer<S> for HostSinkLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let Some(sink) = &self.sink else {
            return;
        };

        let metadata = event.metadata();
        let level = log_level(metadata.level());
        if level < sink.min_level() {
            return;
        }

        let mut collector = FieldCollector::default();
        event.record(&mut collector);

        let message = collector
            .message
            .take()
            .unwrap_or_else(|| metadata.name().to_string());
        let mut record = LogRecord::new(level, metadata.target(), message);
        record.fields = collector
            .fields
            .into_iter()
            .map(|(name, value)| {
                let value = if self.redact {
                    redact_field(&name, &value)
                } else {
                    value
                };
                (name, value)
            })
            .collect();
        record.span = ctx.lookup_current().map(|span| span.name().to_string());

        let sink = Arc::clone(sink);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(err) = sink.log(record).await {
                        eprintln!("log sink rejected record: {}", err);
                    }
                });
            }
            Err(_) => {
                if let Err(err) = futures::executor::block_on(sink.log(record)) {
                    eprintln!("log sink rejected record: {}", err);
                }
            }
        }
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    fields: BTreeMap<String, String>,
}

impl FieldCollector {
    fn push(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            name => {
                self.fields.insert(name.to_string(), value);
            }
        }
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, format!("{:?}", value));
    }
}

fn log_level(level: &tracing::Level) -> LogLevel {
    match *level {
        tracing::Level::TRACE => LogLevel::Trace,
        tracing::Level::DEBUG => LogLevel::Debug,
        tracing::Level::INFO => LogLevel::Info,
        tracing::Level::WARN => LogLevel::Warn,
        tracing::Level::ERROR => LogLevel::Error,
    }
}

/// Masks a field value that could identify or authenticate the seller.
///
/// Credential-like field names are replaced wholesale. Email addresses keep
/// their first character so support can still correlate log lines.
pub fn redact_field(name: &str, value: &str) -> String {
    let name = name.to_ascii_lowercase();
    if SENSITIVE_FIELD_MARKERS
        .iter()
        .any(|marker| name.contains(marker))
    {
        return REDACTED.to_string();
    }

    match value.split_once('@') {
        Some((local, domain)) if domain.contains('.') && !local.is_empty() => {
            let first: String = local.chars().take(1).collect();
            format!("{}***@{}", first, REDACTED)
        }
        _ => value.to_string(),
    }
}

/// The last path component, so local directory names stay out of logs.
pub fn file_name_only(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
