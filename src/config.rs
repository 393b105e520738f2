//! Client configuration: where the backend lives and how long to wait for it.
//! Configuration values are public; secrets never go here.

use crate::api::ApiError;
use std::time::Duration;
use url::Url;

/// Default request timeout applied to every backend call.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    base_url: Url,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Builds a config for the backend at `base_url`, e.g. `https://vault.example`.
    ///
    /// # Errors
    /// Returns an error if the URL cannot be parsed or is not http(s).
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ApiError::Config("base URL is not configured".to_string()));
        }

        let base_url = Url::parse(trimmed)?;
        match base_url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(ApiError::Config(format!(
                    "unsupported base URL scheme: {scheme}"
                )))
            }
        }
        if base_url.host().is_none() {
            return Err(ApiError::Config("base URL has no host".to_string()));
        }

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins a host-relative path and query pairs onto the base URL.
    ///
    /// # Errors
    /// Returns an error if the resulting URL is invalid.
    pub fn endpoint(&self, path: &str, query: &[(String, String)]) -> Result<Url, ApiError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim().trim_start_matches('/');

        let mut url = Url::parse(&format!("{base}/{path}"))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        Ok(url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_and_validates() {
        let config = ClientConfig::new("  https://vault.example/  ").unwrap();
        assert_eq!(config.base_url().as_str(), "https://vault.example/");
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECONDS));

        assert!(matches!(ClientConfig::new(""), Err(ApiError::Config(_))));
        assert!(matches!(
            ClientConfig::new("ftp://vault.example"),
            Err(ApiError::Config(_))
        ));
        assert!(ClientConfig::new("not a url").is_err());
    }

    #[test]
    fn endpoint_joins_path_and_query() {
        let config = ClientConfig::new("http://127.0.0.1:8080").unwrap();

        let url = config
            .endpoint(
                "/api/v1/events",
                &[
                    ("action".to_string(), "calendar".to_string()),
                    ("month".to_string(), "10".to_string()),
                ],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/api/v1/events?action=calendar&month=10"
        );

        let bare = config.endpoint("api/v1/events_simple.php", &[]).unwrap();
        assert_eq!(bare.as_str(), "http://127.0.0.1:8080/api/v1/events_simple.php");
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let config = ClientConfig::new("https://host.example/vault/").unwrap();
        let url = config.endpoint("/api/v1/auth", &[]).unwrap();
        assert_eq!(url.as_str(), "https://host.example/vault/api/v1/auth");
    }

    #[test]
    fn with_timeout_overrides_default() {
        let config = ClientConfig::new("https://vault.example")
            .unwrap()
            .with_timeout(Duration::from_secs(2));
        assert_eq!(config.timeout, Duration::from_secs(2));
    }
}
