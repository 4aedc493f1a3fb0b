use std::sync::OnceLock;
use tracing_subscriber::{fmt, EnvFilter};

static LOG_FORMAT: OnceLock<LogFormat> = OnceLock::new();

const FORMAT_VAR: &str = "WATCHDOG_LOG_FORMAT";
const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    Console,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "console" => Some(LogFormat::Console),
            _ => None,
        }
    }

    pub fn from_env() -> Self {
        std::env::var(FORMAT_VAR)
            .ok()
            .and_then(|s| Self::parse(&s))
            .unwrap_or(LogFormat::Console)
    }
}

/// Install the global subscriber. Format comes from `WATCHDOG_LOG_FORMAT`,
/// filtering from `RUST_LOG`. Later calls are no-ops.
pub fn init() {
    let format = *LOG_FORMAT.get_or_init(LogFormat::from_env);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let result = match format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
        LogFormat::Console => fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}

pub fn format() -> LogFormat {
    *LOG_FORMAT.get().unwrap_or(&LogFormat::Console)
}
