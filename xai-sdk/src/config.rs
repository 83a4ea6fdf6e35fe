//! Client configuration.
//!
//! [`ClientOptions`] starts from the environment (`XAI_API_KEY`,
//! `XAI_MANAGEMENT_KEY`) and the public endpoints, and is refined with
//! `with_*` builder methods.

use indexmap::IndexMap;
use std::time::Duration;
use xai_sdk_core::{Result, XaiError};
use xai_sdk_retries::RetryConfig;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "XAI_API_KEY";

/// Environment variable holding the management API key.
pub const MANAGEMENT_KEY_ENV: &str = "XAI_MANAGEMENT_KEY";

/// Default API endpoint.
pub const DEFAULT_API_HOST: &str = "api.x.ai:443";

/// Default management API endpoint.
pub const DEFAULT_MANAGEMENT_HOST: &str = "management-api.x.ai:443";

/// Deadline applied to calls whose context carries none.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(27 * 60);

/// Options for building a [`Client`](crate::Client).
#[derive(Clone)]
pub struct ClientOptions {
    /// API key sent as a bearer token.
    pub api_key: Option<String>,
    /// Key for management-tier RPCs.
    ///
    /// Reserved for a management API client. The chat layers never send it.
    pub management_key: Option<String>,
    /// `host:port` of the API.
    pub api_host: String,
    /// `host:port` of the management API. Reserved like `management_key`.
    pub management_host: String,
    /// Static metadata attached to every call, in insertion order.
    pub metadata: IndexMap<String, String>,
    /// Default deadline for calls without one. Zero disables it.
    pub timeout: Duration,
    /// Use a plaintext transport.
    pub insecure: bool,
    /// Retry policy.
    pub retry: RetryConfig,
    /// Extra user-agent token.
    pub user_agent: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_key: None,
            management_key: None,
            api_host: DEFAULT_API_HOST.to_string(),
            management_host: DEFAULT_MANAGEMENT_HOST.to_string(),
            metadata: IndexMap::new(),
            timeout: DEFAULT_TIMEOUT,
            insecure: false,
            retry: RetryConfig::default(),
            user_agent: None,
        }
    }
}

impl ClientOptions {
    /// Defaults with keys read from the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with keys read through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            api_key: read(API_KEY_ENV),
            management_key: read(MANAGEMENT_KEY_ENV),
            ..Self::default()
        }
    }

    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the management key.
    #[must_use]
    pub fn with_management_key(mut self, key: impl Into<String>) -> Self {
        self.management_key = Some(key.into());
        self
    }

    /// Override the API host. Empty hosts are ignored.
    #[must_use]
    pub fn with_api_host(mut self, host: impl Into<String>) -> Self {
        let host = host.into();
        if !host.is_empty() {
            self.api_host = host;
        }
        self
    }

    /// Override the management host. Empty hosts are ignored.
    #[must_use]
    pub fn with_management_host(mut self, host: impl Into<String>) -> Self {
        let host = host.into();
        if !host.is_empty() {
            self.management_host = host;
        }
        self
    }

    /// Add static metadata entries.
    #[must_use]
    pub fn with_metadata<K, V>(mut self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.metadata
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set the default deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a plaintext transport.
    #[must_use]
    pub fn with_insecure(mut self) -> Self {
        self.insecure = true;
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Append a user-agent token.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// The API key, or a validation error if none is configured.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            XaiError::validation(format!(
                "API key is required: pass one explicitly or set {API_KEY_ENV}"
            ))
        })
    }

    /// URI of the API endpoint, with a scheme matching `insecure`.
    pub fn api_endpoint(&self) -> String {
        endpoint_uri(&self.api_host, self.insecure)
    }

    /// URI of the management endpoint, with a scheme matching `insecure`.
    pub fn management_endpoint(&self) -> String {
        endpoint_uri(&self.management_host, self.insecure)
    }
}

impl std::fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientOptions")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field(
                "management_key",
                &self.management_key.as_ref().map(|_| "<redacted>"),
            )
            .field("api_host", &self.api_host)
            .field("management_host", &self.management_host)
            .field("metadata", &self.metadata)
            .field("timeout", &self.timeout)
            .field("insecure", &self.insecure)
            .field("retry", &self.retry)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn endpoint_uri(host: &str, insecure: bool) -> String {
    if host.contains("://") {
        return host.to_string();
    }
    let scheme = if insecure { "http" } else { "https" };
    format!("{scheme}://{host}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn env(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn test_defaults() {
        let options = ClientOptions::default();
        assert_eq!(options.api_host, "api.x.ai:443");
        assert_eq!(options.management_host, "management-api.x.ai:443");
        assert_eq!(options.timeout, Duration::from_secs(1620));
        assert!(!options.insecure);
        assert_eq!(options.api_endpoint(), "https://api.x.ai:443");
    }

    #[test]
    fn test_keys_from_environment() {
        let options = ClientOptions::from_lookup(env(&[
            ("XAI_API_KEY", "api-key"),
            ("XAI_MANAGEMENT_KEY", "  "),
        ]));

        assert_eq!(options.api_key.as_deref(), Some("api-key"));
        assert_eq!(options.management_key, None);
    }

    #[test]
    fn test_explicit_key_wins() {
        let options = ClientOptions::from_lookup(env(&[("XAI_API_KEY", "env")]))
            .with_api_key("explicit");
        assert_eq!(options.require_api_key().unwrap(), "explicit");
    }

    #[test]
    fn test_missing_key_is_validation_error() {
        let err = ClientOptions::default().require_api_key().unwrap_err();
        assert!(matches!(err, XaiError::Validation(_)));
        assert!(err.to_string().contains("XAI_API_KEY"));
    }

    #[test]
    fn test_builder_overrides() {
        let options = ClientOptions::default()
            .with_api_host("localhost:50051")
            .with_management_host("")
            .with_insecure()
            .with_metadata([("x-team", "infra"), ("x-env", "dev")])
            .with_user_agent("my-app/1.0");

        assert_eq!(options.api_endpoint(), "http://localhost:50051");
        assert_eq!(options.management_host, DEFAULT_MANAGEMENT_HOST);
        let keys: Vec<&str> = options.metadata.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["x-team", "x-env"]);
    }

    #[test]
    fn test_debug_redacts_keys() {
        let options = ClientOptions::default().with_api_key("secret");
        let rendered = format!("{options:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_management_settings() {
        let options = ClientOptions::default()
            .with_management_key("mgmt-secret")
            .with_management_host("mgmt.internal:8443");

        assert_eq!(options.management_key.as_deref(), Some("mgmt-secret"));
        assert_eq!(options.api_key, None);
        assert_eq!(options.management_endpoint(), "https://mgmt.internal:8443");
        assert_eq!(
            options.with_insecure().management_endpoint(),
            "http://mgmt.internal:8443"
        );
    }
}
