//! Runtime configuration read from the environment

use http::HeaderValue;
use std::path::PathBuf;

/// Default body of `GET /api/hello`
pub const DEFAULT_HELLO_TEXT: &str = "Hello, World!";
/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";
/// Default snapshot path, relative to the host's working directory
pub const DEFAULT_STATE_FILE: &str = "rendezvous_state.json";
/// `RENDEZVOUS_STATE_FILE` value that keeps state in memory only
pub const IN_MEMORY_STATE: &str = "none";

const ALLOW_ORIGIN_VAR: &str = "RENDEZVOUS_ALLOW_ORIGIN";
const HELLO_TEXT_VAR: &str = "RENDEZVOUS_HELLO_TEXT";
const STATE_FILE_VAR: &str = "RENDEZVOUS_STATE_FILE";
const LOG_FILTER_VAR: &str = "RUST_LOG";

#[derive(Debug, Clone)]
pub struct Config {
    /// Value of `Access-Control-Allow-Origin` on signal responses
    pub allow_origin: HeaderValue,
    pub hello_text: String,
    /// Snapshot file handing state between short-lived host instances;
    /// `None` keeps the negotiation in instance memory only
    pub state_file: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allow_origin: HeaderValue::from_static("*"),
            hello_text: DEFAULT_HELLO_TEXT.to_string(),
            state_file: Some(PathBuf::from(DEFAULT_STATE_FILE)),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let allow_origin = match get(ALLOW_ORIGIN_VAR) {
            Some(origin) => match HeaderValue::from_str(&origin) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(%origin, error = %e, "invalid RENDEZVOUS_ALLOW_ORIGIN, using *");
                    defaults.allow_origin
                }
            },
            None => defaults.allow_origin,
        };

        Self {
            allow_origin,
            hello_text: get(HELLO_TEXT_VAR).unwrap_or(defaults.hello_text),
            state_file: match get(STATE_FILE_VAR) {
                Some(value) if value.eq_ignore_ascii_case(IN_MEMORY_STATE) => None,
                Some(value) => Some(PathBuf::from(value)),
                None => defaults.state_file,
            },
            log_filter: get(LOG_FILTER_VAR).unwrap_or(defaults.log_filter),
        }
    }
}

/// Install the global `tracing` subscriber
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
