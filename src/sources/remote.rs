//! Remote HTTP/HTTPS property source.

use super::{PropertySource, RawProperties, properties};
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use std::time::Duration;

/// Authentication method for HTTP requests.
#[derive(Clone)]
pub enum HttpAuth {
    /// No authentication
    None,
    /// Bearer token authentication
    Bearer(String),
    /// Basic authentication (username, password)
    Basic(String, String),
}

/// HTTP-based property source.
///
/// Issues a GET against a remote endpoint on every fetch and parses the body
/// as `.properties`. A non-success status or transport failure fails the
/// fetch; the engine keeps the last good snapshot in that case.
///
/// # Examples
///
/// ```rust,no_run
/// use polling_config::sources::HttpSource;
/// use std::time::Duration;
///
/// # fn example() -> polling_config::error::Result<()> {
/// let source = HttpSource::builder()
///     .with_url("https://config.example.com/app.properties")
///     .with_auth_token("secret-token")
///     .with_timeout(Duration::from_secs(10))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct HttpSource {
    url: String,
    client: Client,
    auth: HttpAuth,
}

impl HttpSource {
    /// Create a new builder for constructing an HTTP source.
    pub fn builder() -> HttpSourceBuilder {
        HttpSourceBuilder::new()
    }

    /// Create an unauthenticated source for a URL with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::builder().with_url(url).build()
    }

    /// The URL this source fetches.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn unavailable(&self, reason: impl ToString) -> ConfigError {
        ConfigError::Unavailable {
            endpoint: self.name(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl PropertySource for HttpSource {
    async fn fetch(&self) -> Result<RawProperties> {
        // Bearer tokens are installed as client default headers by the builder
        let request = match &self.auth {
            HttpAuth::Basic(username, password) => {
                self.client.get(&self.url).basic_auth(username, Some(password))
            }
            HttpAuth::None | HttpAuth::Bearer(_) => self.client.get(&self.url),
        };

        let response = request
            .send()
            .await
            .map_err(|e| self.unavailable(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConfigError::Status {
                endpoint: self.name(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.unavailable(format!("Failed to read response body: {}", e)))?;

        properties::parse_bytes(&self.name(), &body)
    }

    fn name(&self) -> String {
        self.url.clone()
    }
}

/// Builder for constructing an `HttpSource`.
pub struct HttpSourceBuilder {
    url: Option<String>,
    auth: HttpAuth,
    timeout: Duration,
}

impl HttpSourceBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: None,
            auth: HttpAuth::None,
            timeout: Duration::from_secs(10),
        }
    }

    /// Set the URL to fetch properties from.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set Bearer token authentication.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth = HttpAuth::Bearer(token.into());
        self
    }

    /// Set Basic authentication.
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.auth = HttpAuth::Basic(username.into(), password.into());
        self
    }

    /// Set the request timeout.
    ///
    /// Default is 10 seconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the HTTP source.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No URL is provided
    /// - The bearer token is not a valid header value
    /// - The HTTP client cannot be constructed
    pub fn build(self) -> Result<HttpSource> {
        let url = self
            .url
            .ok_or_else(|| ConfigError::InvalidSource("URL is required for HttpSource".to_string()))?;

        let mut headers = HeaderMap::new();
        if let HttpAuth::Bearer(token) = &self.auth {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ConfigError::InvalidSource(format!("Invalid bearer token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::InvalidSource(format!("Failed to create HTTP client: {}", e)))?;

        Ok(HttpSource {
            url,
            client,
            auth: self.auth,
        })
    }
}

impl Default for HttpSourceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
