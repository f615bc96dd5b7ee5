//! Minimal JSON caller for the app's own HTTP API.

use crate::config::ApiConfig;
use crate::error::{ClientError, ClientResult};
use reqwest::{header, Client, Method};
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Options for a single API call.
#[derive(Debug, Clone)]
pub struct CallOptions {
    pub method: Method,
    pub body: Option<Value>,
    /// Extra headers; they override the default JSON content type.
    pub headers: Vec<(String, String)>,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: Vec::new(),
        }
    }
}

impl CallOptions {
    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Caller for `<base_url>/api/...` endpoints.
///
/// Errors are returned as-is: no retries, no status interpretation and no
/// request timeout.
#[derive(Debug, Clone)]
pub struct ApiCaller {
    client: Client,
    base_url: Url,
}

impl ApiCaller {
    pub fn new(config: &ApiConfig) -> ClientResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Absolute URL for an API path such as `/blog-posts`.
    pub fn endpoint(&self, path: &str) -> ClientResult<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{}/api{}", base, path))?)
    }

    /// Send a request and parse the response body as JSON. Empty bodies
    /// yield `null`; bodies that are not JSON are returned as a string.
    pub async fn call(&self, path: &str, options: CallOptions) -> ClientResult<Value> {
        let url = self.endpoint(path)?;
        debug!(url = %url, method = %options.method, "API request");

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        for (name, value) in &options.headers {
            let name = header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ClientError::InvalidHeader(name.clone()))?;
            let value = header::HeaderValue::from_str(value)
                .map_err(|_| ClientError::InvalidHeader(name.as_str().to_string()))?;
            headers.insert(name, value);
        }

        let mut request = self.client.request(options.method, url).headers(headers);
        if let Some(body) = &options.body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}
