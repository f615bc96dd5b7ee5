use crate::model::Table;
use crate::query::SelectQuery;
use anyhow::Result;
use serde_json::Value;

/// Read access to the relational backend.
///
/// Implementations are shared read-only between concurrently running tool
/// calls, so they must not hold per-call state.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Run a select and return the matching rows as JSON objects
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Value>>;

    /// Exact number of rows in a table, without fetching row data
    async fn count(&self, table: Table) -> Result<u64>;
}
