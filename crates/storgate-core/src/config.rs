//! Gate configuration.
//!
//! Provides [`GateConfig`], the immutable configuration the gate holds for
//! its lifetime. Values can be set through the builder or loaded from
//! environment variables via [`GateConfig::from_env`].

use std::sync::Arc;
use std::time::Duration;

use storgate_model::request::Credentials;
use storgate_model::RetryableKind;
use typed_builder::TypedBuilder;

/// Hook invoked when a submission is rejected at the concurrency ceiling.
///
/// Receives the configured ceiling. Intended for monitoring side effects;
/// the return value is ignored.
pub type RejectionHook = Arc<dyn Fn(usize) + Send + Sync>;

/// Hook invoked before each retry of a transient failure.
///
/// Receives the failure kind and the zero-based attempt number that just
/// failed. Intended for monitoring side effects; the return value is
/// ignored.
pub type RetryHook = Arc<dyn Fn(RetryableKind, u32) + Send + Sync>;

fn noop_rejection() -> RejectionHook {
    Arc::new(|_| {})
}

fn noop_retry() -> RetryHook {
    Arc::new(|_, _| {})
}

/// Gate configuration.
///
/// Set once at startup and shared read-only with every executor. All
/// fields have working defaults.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use storgate_core::config::GateConfig;
///
/// let config = GateConfig::builder()
///     .max_concurrency(4)
///     .retry_delay(Duration::ZERO)
///     .build();
/// assert_eq!(config.max_concurrency, 4);
/// assert_eq!(config.max_retries, 3);
/// ```
#[derive(Clone, TypedBuilder)]
pub struct GateConfig {
    /// Credentials handed to the storage client.
    #[builder(default)]
    pub credentials: Credentials,

    /// Endpoint URL of the storage backend.
    #[builder(default = String::from("http://localhost:9000"))]
    pub endpoint: String,

    /// Upper bound on a single storage-operation attempt.
    #[builder(default = Duration::from_secs(30))]
    pub request_timeout: Duration,

    /// Maximum number of retries for a transient failure. Total attempts
    /// are bounded by `max_retries + 1`.
    #[builder(default = 3)]
    pub max_retries: u32,

    /// Fixed delay between retry attempts.
    #[builder(default = Duration::from_millis(500))]
    pub retry_delay: Duration,

    /// Maximum number of simultaneously admitted operations.
    #[builder(default = 16)]
    pub max_concurrency: usize,

    /// Whether operation outputs carry backend response headers.
    #[builder(default = false)]
    pub return_headers: bool,

    /// How long shutdown waits for in-flight operations before aborting
    /// them.
    #[builder(default = Duration::from_secs(5))]
    pub shutdown_grace: Duration,

    /// Invoked when a submission is rejected at the concurrency ceiling.
    #[builder(default = noop_rejection())]
    pub on_rejected: RejectionHook,

    /// Invoked before each retry attempt.
    #[builder(default = noop_retry())]
    pub on_retry: RetryHook,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl std::fmt::Debug for GateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateConfig")
            .field("credentials", &self.credentials)
            .field("endpoint", &self.endpoint)
            .field("request_timeout", &self.request_timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("max_concurrency", &self.max_concurrency)
            .field("return_headers", &self.return_headers)
            .field("shutdown_grace", &self.shutdown_grace)
            .field("on_rejected", &"<hook>")
            .field("on_retry", &"<hook>")
            .finish()
    }
}

impl GateConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the following variables (falling back to defaults):
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `STORGATE_ENDPOINT` | `http://localhost:9000` |
    /// | `STORGATE_ACCESS_KEY` / `AWS_ACCESS_KEY_ID` | *(empty)* |
    /// | `STORGATE_SECRET_KEY` / `AWS_SECRET_ACCESS_KEY` | *(empty)* |
    /// | `STORGATE_REQUEST_TIMEOUT_MS` | `30000` |
    /// | `STORGATE_MAX_RETRIES` | `3` |
    /// | `STORGATE_RETRY_DELAY_MS` | `500` |
    /// | `STORGATE_MAX_CONCURRENCY` | `16` |
    /// | `STORGATE_RETURN_HEADERS` | `false` |
    /// | `STORGATE_SHUTDOWN_GRACE_MS` | `5000` |
    ///
    /// Hooks cannot be configured from the environment; set them through
    /// the builder.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("STORGATE_ENDPOINT") {
            config.endpoint = v;
        }
        if let Ok(v) =
            std::env::var("STORGATE_ACCESS_KEY").or_else(|_| std::env::var("AWS_ACCESS_KEY_ID"))
        {
            config.credentials.access_key_id = v;
        }
        if let Ok(v) = std::env::var("STORGATE_SECRET_KEY")
            .or_else(|_| std::env::var("AWS_SECRET_ACCESS_KEY"))
        {
            config.credentials.secret_access_key = v;
        }
        if let Some(ms) = parse_env_u64("STORGATE_REQUEST_TIMEOUT_MS") {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(n) = parse_env_u64("STORGATE_MAX_RETRIES") {
            config.max_retries = u32::try_from(n).unwrap_or(u32::MAX);
        }
        if let Some(ms) = parse_env_u64("STORGATE_RETRY_DELAY_MS") {
            config.retry_delay = Duration::from_millis(ms);
        }
        if let Some(n) = parse_env_u64("STORGATE_MAX_CONCURRENCY") {
            config.max_concurrency = usize::try_from(n).unwrap_or(usize::MAX);
        }
        if let Ok(v) = std::env::var("STORGATE_RETURN_HEADERS") {
            config.return_headers = parse_bool(&v);
        }
        if let Some(ms) = parse_env_u64("STORGATE_SHUTDOWN_GRACE_MS") {
            config.shutdown_grace = Duration::from_millis(ms);
        }

        config
    }
}

/// Parse a numeric environment variable, ignoring unset or malformed values.
fn parse_env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok()?.parse().ok()
}

/// Parse a boolean environment value (`1`/`true` in any case).
fn parse_bool(v: &str) -> bool {
    v == "1" || v.eq_ignore_ascii_case("true")
}
