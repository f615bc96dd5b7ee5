//! PostgREST client for the relational backend.

use crate::error::{ClientError, ClientResult};
use reqwest::{header, Client, Response};
use serde_json::Value;
use supamcp_core::{Backend, SelectQuery, Table};
use tracing::debug;
use url::Url;

/// Read client bound to one API key.
#[derive(Debug, Clone)]
pub struct PostgrestClient {
    client: Client,
    rest_url: Url,
}

impl PostgrestClient {
    /// Create a client for the project at `project_url`, authenticating
    /// every request with `key`.
    pub fn new(project_url: &Url, key: &str) -> ClientResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::HeaderName::from_static("apikey"),
            header::HeaderValue::from_str(key)
                .map_err(|_| ClientError::InvalidHeader("Invalid API key format".to_string()))?,
        );
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|_| ClientError::InvalidHeader("Invalid API key format".to_string()))?,
        );

        let client = Client::builder().default_headers(headers).build()?;
        let rest_url = Url::parse(&format!(
            "{}/rest/v1/",
            project_url.as_str().trim_end_matches('/')
        ))?;

        Ok(Self { client, rest_url })
    }

    /// Build the URL for a table endpoint.
    fn table_url(&self, table: Table) -> ClientResult<Url> {
        Ok(self.rest_url.join(table.as_str())?)
    }

    /// Render a query as PostgREST query-string parameters.
    pub fn query_params(query: &SelectQuery) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), query.select_clause())];

        for filter in &query.filters {
            let condition = match &filter.value {
                Value::Null => "is.null".to_string(),
                Value::String(s) => format!("eq.{}", s),
                other => format!("eq.{}", other),
            };
            params.push((filter.column.clone(), condition));
        }

        if let Some(order) = &query.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }
        if let Some(offset) = query.offset {
            params.push(("offset".to_string(), offset.to_string()));
        }
        if let Some(limit) = query.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        params
    }

    /// Execute a select and return the rows.
    pub async fn fetch(&self, query: &SelectQuery) -> ClientResult<Vec<Value>> {
        let url = self.table_url(query.table)?;
        debug!(url = %url, table = %query.table, "GET request");

        let response = self
            .client
            .get(url)
            .query(&Self::query_params(query))
            .send()
            .await?;
        let response = check(response).await?;
        Ok(response.json().await?)
    }

    /// Exact row count of a table, read from the `Content-Range` header of
    /// a `HEAD` request. A response without a total counts as zero.
    pub async fn exact_count(&self, table: Table) -> ClientResult<u64> {
        let url = self.table_url(table)?;
        debug!(url = %url, table = %table, "HEAD count request");

        let response = self
            .client
            .head(url)
            .query(&[("select", "*")])
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = check(response).await?;

        Ok(response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .unwrap_or(0))
    }
}

/// Turn a non-success response into a backend error.
async fn check(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::from_backend_response(status, &body))
}

/// Total from a `Content-Range` value such as `0-24/3573` or `*/0`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

#[async_trait::async_trait]
impl Backend for PostgrestClient {
    async fn select(&self, query: &SelectQuery) -> anyhow::Result<Vec<Value>> {
        Ok(self.fetch(query).await?)
    }

    async fn count(&self, table: Table) -> anyhow::Result<u64> {
        Ok(self.exact_count(table).await?)
    }
}
