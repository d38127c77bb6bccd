use std::{panic::PanicHookInfo, str::FromStr};

use tracing::Subscriber;
use tracing_subscriber::{fmt, registry::LookupSpan, EnvFilter, Layer};

/// Output format of the logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown log format `{0}`, expected `plain` or `json`")]
pub struct LogFormatError(String);

impl FromStr for LogFormat {
    type Err = LogFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            _ => Err(LogFormatError(s.to_owned())),
        }
    }
}

/// Logs layer configuration.
#[derive(Debug, Default)]
pub struct Logs {
    format: LogFormat,
    log_directives: Option<String>,
}

impl From<LogFormat> for Logs {
    fn from(format: LogFormat) -> Self {
        Self {
            format,
            log_directives: None,
        }
    }
}

impl Logs {
    pub fn new(format: &str) -> Result<Self, LogFormatError> {
        Ok(format.parse::<LogFormat>()?.into())
    }

    /// Sets filtering directives, overriding `RUST_LOG`.
    pub fn with_log_directives(mut self, log_directives: Option<String>) -> Self {
        self.log_directives = log_directives;
        self
    }

    pub(super) fn install_panic_hook(&self) {
        // Plain panics are readable as is; JSON logs need panics to be single-line events.
        if self.format == LogFormat::Json {
            std::panic::set_hook(Box::new(json_panic_handler));
        }
    }

    pub(super) fn build_filter(&self) -> EnvFilter {
        let directives = self
            .log_directives
            .clone()
            .or_else(|| std::env::var(EnvFilter::DEFAULT_ENV).ok())
            .unwrap_or_else(|| "info".to_owned());
        EnvFilter::try_new(&directives).unwrap_or_else(|err| {
            eprintln!("Invalid log directives `{directives}`: {err}; falling back to `info`");
            EnvFilter::new("info")
        })
    }

    pub(super) fn into_layer<S>(self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'span> LookupSpan<'span> + Send + Sync,
    {
        match self.format {
            LogFormat::Plain => fmt::layer().with_target(true).boxed(),
            LogFormat::Json => fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(false)
                .boxed(),
        }
    }
}

fn json_panic_handler(panic_info: &PanicHookInfo<'_>) {
    let payload = panic_info
        .payload()
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic_info.payload().downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>");
    let location = panic_info.location().map(ToString::to_string);
    tracing::error!(
        panic.payload = payload,
        panic.location = location.as_deref(),
        "Panic occurred"
    );
}
