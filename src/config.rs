//! Configuration for the Document Intelligence decoder.
//!
//! [`DocIntelConfig`] is built once at startup, either through its
//! [`DocIntelConfigBuilder`] or from the process environment, and is never
//! mutated afterwards. The builder only checks what it can check without
//! knowing the authentication mode's requirements; whether the mode is
//! supported and whether a key is present is decided by
//! [`crate::decoder::DocIntelPdfDecoder::new`], which logs the failure before
//! returning it.

use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Environment variable holding the service endpoint URL.
pub const ENV_ENDPOINT: &str = "AZURE_DOCINTEL_ENDPOINT";
/// Environment variable holding the authentication mode.
pub const ENV_AUTH: &str = "AZURE_DOCINTEL_AUTH";
/// Environment variable holding the API key for [`AuthMode::ApiKey`].
pub const ENV_API_KEY: &str = "AZURE_DOCINTEL_API_KEY";
/// Environment variable overriding the model id.
pub const ENV_MODEL: &str = "AZURE_DOCINTEL_MODEL";
/// Environment variable overriding the REST API version.
pub const ENV_API_VERSION: &str = "AZURE_DOCINTEL_API_VERSION";

/// Text-extraction model used when none is configured.
pub const DEFAULT_MODEL_ID: &str = "prebuilt-read";
/// REST API version matching the `formrecognizer` route.
pub const DEFAULT_API_VERSION: &str = "2023-07-31";

/// Connection settings for an Azure AI Document Intelligence resource.
///
/// # Example
/// ```rust
/// use docintel_pdf_decoder::{AuthMode, DocIntelConfig};
///
/// let config = DocIntelConfig::builder()
///     .endpoint("https://my-resource.cognitiveservices.azure.com/")
///     .auth(AuthMode::ApiKey)
///     .api_key("0123456789abcdef")
///     .build()
///     .unwrap();
/// assert_eq!(config.model_id, "prebuilt-read");
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocIntelConfig {
    /// Resource endpoint, e.g. `https://<name>.cognitiveservices.azure.com/`.
    pub endpoint: String,

    /// How requests are authenticated. Default: [`AuthMode::Unspecified`],
    /// which the decoder rejects.
    pub auth: AuthMode,

    /// Resource key. Required (non-empty) when `auth` is [`AuthMode::ApiKey`],
    /// ignored otherwise.
    pub api_key: Option<String>,

    /// Analysis model. Default: `prebuilt-read`.
    pub model_id: String,

    /// REST `api-version` query parameter. Default: `2023-07-31`.
    pub api_version: String,

    /// Delay between status polls when the service sends no `Retry-After`.
    /// Default: 1000.
    pub poll_interval_ms: u64,

    /// Per-request HTTP timeout in seconds. Default: 120.
    ///
    /// Applies to each submit or poll round trip, not to the decode as a
    /// whole; overall limits belong on the caller's cancellation token.
    pub request_timeout_secs: u64,
}

impl Default for DocIntelConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            auth: AuthMode::default(),
            api_key: None,
            model_id: DEFAULT_MODEL_ID.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            poll_interval_ms: 1000,
            request_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for DocIntelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocIntelConfig")
            .field("endpoint", &self.endpoint)
            .field("auth", &self.auth)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model_id", &self.model_id)
            .field("api_version", &self.api_version)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl DocIntelConfig {
    /// Create a new builder for `DocIntelConfig`.
    pub fn builder() -> DocIntelConfigBuilder {
        DocIntelConfigBuilder {
            config: Self::default(),
        }
    }

    /// Load configuration from `AZURE_DOCINTEL_*` environment variables.
    ///
    /// `AZURE_DOCINTEL_ENDPOINT` is required. A missing `AZURE_DOCINTEL_AUTH`
    /// leaves the mode [`AuthMode::Unspecified`] so the decoder constructor
    /// reports it.
    pub fn from_env() -> Result<Self, DecodeError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, DecodeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let endpoint = non_empty(ENV_ENDPOINT).ok_or_else(|| {
            DecodeError::InvalidConfig(format!("{ENV_ENDPOINT} is not set"))
        })?;

        let mut builder = Self::builder().endpoint(endpoint);
        if let Some(auth) = non_empty(ENV_AUTH) {
            builder = builder.auth(auth.parse::<AuthMode>().unwrap_or_default());
        }
        if let Some(key) = lookup(ENV_API_KEY) {
            builder = builder.api_key(key);
        }
        if let Some(model) = non_empty(ENV_MODEL) {
            builder = builder.model_id(model);
        }
        if let Some(version) = non_empty(ENV_API_VERSION) {
            builder = builder.api_version(version);
        }
        builder.build()
    }
}

/// Builder for [`DocIntelConfig`].
#[derive(Debug)]
pub struct DocIntelConfigBuilder {
    config: DocIntelConfig,
}

impl DocIntelConfigBuilder {
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn auth(mut self, auth: AuthMode) -> Self {
        self.config.auth = auth;
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model_id(mut self, model_id: impl Into<String>) -> Self {
        self.config.model_id = model_id.into();
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.config.api_version = version.into();
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms.max(1);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    /// Build the configuration, validating the endpoint and model settings.
    pub fn build(self) -> Result<DocIntelConfig, DecodeError> {
        let c = &self.config;
        let endpoint = reqwest::Url::parse(c.endpoint.trim()).map_err(|e| {
            DecodeError::InvalidConfig(format!(
                "endpoint '{}' is not a valid URL: {}",
                c.endpoint, e
            ))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(DecodeError::InvalidConfig(format!(
                "endpoint '{}' must use http or https",
                c.endpoint
            )));
        }
        if c.model_id.trim().is_empty() {
            return Err(DecodeError::InvalidConfig("model id must not be empty".into()));
        }
        if c.api_version.trim().is_empty() {
            return Err(DecodeError::InvalidConfig("api version must not be empty".into()));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the decoder authenticates against the service.
///
/// Only [`AzureIdentity`](AuthMode::AzureIdentity) and
/// [`ApiKey`](AuthMode::ApiKey) are supported. The other two variants exist
/// so that a missing or unrecognised setting survives parsing and is
/// rejected, with its original spelling, when the decoder is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuthMode {
    /// No mode configured.
    #[default]
    Unspecified,
    /// Ambient credential resolved from the environment (service principal
    /// variables or managed identity).
    AzureIdentity,
    /// Static resource key sent with every request.
    ApiKey,
    /// A value that names no supported mode.
    Other(String),
}

impl FromStr for AuthMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        Ok(match normalised.as_str() {
            "" | "unknown" | "unspecified" => AuthMode::Unspecified,
            "azureidentity" | "identity" | "managedidentity" => AuthMode::AzureIdentity,
            "apikey" | "key" => AuthMode::ApiKey,
            _ => AuthMode::Other(s.trim().to_string()),
        })
    }
}

impl From<String> for AuthMode {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl From<AuthMode> for String {
    fn from(mode: AuthMode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::Unspecified => f.write_str("Unknown"),
            AuthMode::AzureIdentity => f.write_str("AzureIdentity"),
            AuthMode::ApiKey => f.write_str("APIKey"),
            AuthMode::Other(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let c = DocIntelConfig::default();
        assert_eq!(c.auth, AuthMode::Unspecified);
        assert_eq!(c.model_id, "prebuilt-read");
        assert_eq!(c.api_version, "2023-07-31");
        assert_eq!(c.poll_interval_ms, 1000);
        assert!(c.api_key.is_none());
    }

    #[test]
    fn auth_mode_parsing() {
        assert_eq!("AzureIdentity".parse::<AuthMode>().unwrap(), AuthMode::AzureIdentity);
        assert_eq!("azure_identity".parse::<AuthMode>().unwrap(), AuthMode::AzureIdentity);
        assert_eq!("APIKey".parse::<AuthMode>().unwrap(), AuthMode::ApiKey);
        assert_eq!("api-key".parse::<AuthMode>().unwrap(), AuthMode::ApiKey);
        assert_eq!("".parse::<AuthMode>().unwrap(), AuthMode::Unspecified);
        assert_eq!(
            " Kerberos ".parse::<AuthMode>().unwrap(),
            AuthMode::Other("Kerberos".into())
        );
    }

    #[test]
    fn auth_mode_display_round_trips_through_parse() {
        for mode in [AuthMode::AzureIdentity, AuthMode::ApiKey, AuthMode::Unspecified] {
            assert_eq!(mode.to_string().parse::<AuthMode>().unwrap(), mode);
        }
    }

    #[test]
    fn auth_mode_deserialises_unknown_values() {
        let c: DocIntelConfig = serde_json::from_str(
            r#"{"endpoint":"https://x.example/","auth":"Certificate"}"#,
        )
        .unwrap();
        assert_eq!(c.auth, AuthMode::Other("Certificate".into()));
        assert_eq!(c.model_id, "prebuilt-read");
    }

    #[test]
    fn builder_rejects_bad_endpoint() {
        let err = DocIntelConfig::builder().endpoint("not a url").build().unwrap_err();
        assert!(err.is_configuration());

        let err = DocIntelConfig::builder()
            .endpoint("ftp://x.example/")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("http"), "got: {err}");
    }

    #[test]
    fn builder_clamps_poll_interval() {
        let c = DocIntelConfig::builder()
            .endpoint("https://x.example/")
            .poll_interval_ms(0)
            .build()
            .unwrap();
        assert_eq!(c.poll_interval_ms, 1);
    }

    #[test]
    fn debug_redacts_key() {
        let c = DocIntelConfig::builder()
            .endpoint("https://x.example/")
            .api_key("super-secret")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn from_lookup_reads_all_vars() {
        let c = DocIntelConfig::from_lookup(lookup(&[
            (ENV_ENDPOINT, "https://x.example/"),
            (ENV_AUTH, "APIKey"),
            (ENV_API_KEY, "k"),
            (ENV_MODEL, "prebuilt-layout"),
        ]))
        .unwrap();
        assert_eq!(c.auth, AuthMode::ApiKey);
        assert_eq!(c.api_key.as_deref(), Some("k"));
        assert_eq!(c.model_id, "prebuilt-layout");
        assert_eq!(c.api_version, DEFAULT_API_VERSION);
    }

    #[test]
    fn from_lookup_requires_endpoint() {
        let err = DocIntelConfig::from_lookup(lookup(&[(ENV_AUTH, "APIKey")])).unwrap_err();
        assert!(err.to_string().contains(ENV_ENDPOINT));
    }

    #[test]
    fn from_lookup_without_auth_is_unspecified() {
        let c =
            DocIntelConfig::from_lookup(lookup(&[(ENV_ENDPOINT, "https://x.example/")])).unwrap();
        assert_eq!(c.auth, AuthMode::Unspecified);
    }
}
