//! Connection settings for the backend and the app API.

use crate::error::{ClientError, ClientResult};
use url::Url;

/// Base URL of the app API when none is configured.
pub const DEFAULT_APP_BASE_URL: &str = "http://localhost:3000";

/// Connection settings for the relational backend.
#[derive(Clone)]
pub struct BackendConfig {
    /// Project endpoint, e.g. `https://abc.supabase.co`.
    pub url: Url,
    /// Restricted (anon) key. Always required.
    pub anon_key: String,
    /// Elevated (service role) key. Preferred for all reads when present.
    pub service_role_key: Option<String>,
}

impl BackendConfig {
    pub fn new(url: Url, anon_key: impl Into<String>) -> Self {
        Self {
            url,
            anon_key: anon_key.into(),
            service_role_key: None,
        }
    }

    pub fn with_service_role_key(mut self, key: impl Into<String>) -> Self {
        self.service_role_key = Some(key.into());
        self
    }

    /// Build from raw settings as read from the environment or the command
    /// line. Empty values count as missing.
    pub fn from_parts(
        url: Option<&str>,
        anon_key: Option<&str>,
        service_role_key: Option<&str>,
    ) -> ClientResult<Self> {
        let (url, anon_key) = match (non_empty(url), non_empty(anon_key)) {
            (Some(url), Some(key)) => (url, key),
            _ => {
                return Err(ClientError::Config(
                    "SUPABASE_URL and SUPABASE_ANON_KEY environment variables are required"
                        .to_string(),
                ))
            }
        };

        let mut config = Self::new(Url::parse(url)?, anon_key);
        if let Some(key) = non_empty(service_role_key) {
            config = config.with_service_role_key(key);
        }
        Ok(config)
    }
}

// Keys stay out of debug output.
impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"[SET]")
            .field(
                "service_role_key",
                &self.service_role_key.as_ref().map(|_| "[SET]"),
            )
            .finish()
    }
}

/// Settings for the app API used for writes.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Url,
}

impl ApiConfig {
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }

    /// Parse an optional base URL, falling back to [`DEFAULT_APP_BASE_URL`].
    pub fn from_base_url(base_url: Option<&str>) -> ClientResult<Self> {
        let raw = non_empty(base_url).unwrap_or(DEFAULT_APP_BASE_URL);
        Ok(Self::new(Url::parse(raw)?))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_config_requires_url_and_anon_key() {
        let err = BackendConfig::from_parts(None, Some("anon"), None).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
        assert!(err.to_string().contains("SUPABASE_URL and SUPABASE_ANON_KEY"));

        assert!(BackendConfig::from_parts(Some("https://x.supabase.co"), None, None).is_err());
        assert!(BackendConfig::from_parts(Some("https://x.supabase.co"), Some("  "), None).is_err());
    }

    #[test]
    fn test_backend_config_optional_service_key() {
        let config =
            BackendConfig::from_parts(Some("https://x.supabase.co"), Some("anon"), Some(""))
                .unwrap();
        assert_eq!(config.anon_key, "anon");
        assert!(config.service_role_key.is_none());

        let config = BackendConfig::from_parts(
            Some("https://x.supabase.co"),
            Some("anon"),
            Some("service"),
        )
        .unwrap();
        assert_eq!(config.service_role_key.as_deref(), Some("service"));
    }

    #[test]
    fn test_backend_config_rejects_bad_url() {
        let err = BackendConfig::from_parts(Some("not a url"), Some("anon"), None).unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl(_)));
    }

    #[test]
    fn test_debug_hides_keys() {
        let config = BackendConfig::new(Url::parse("https://x.supabase.co").unwrap(), "secret")
            .with_service_role_key("also-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_api_config_default_base_url() {
        let config = ApiConfig::from_base_url(None).unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:3000/");

        let config = ApiConfig::from_base_url(Some("https://app.example.com")).unwrap();
        assert_eq!(config.base_url.host_str(), Some("app.example.com"));
    }
}
