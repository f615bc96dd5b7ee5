// In-memory backend evaluating select queries with PostgREST semantics
// (for tests, demos and running the server without a database)

use crate::backend::Backend;
use crate::model::Table;
use crate::query::{Column, Embed, Link, SelectQuery};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryBackend {
    tables: RwLock<HashMap<Table, Vec<Value>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row; it must serialize to a JSON object
    pub async fn insert<T: Serialize>(&self, table: Table, row: &T) -> Result<()> {
        let value = serde_json::to_value(row).context("Failed to serialize row")?;
        if !value.is_object() {
            return Err(anyhow!("Rows must be JSON objects, got {}", value));
        }
        self.tables
            .write()
            .await
            .entry(table)
            .or_default()
            .push(value);
        Ok(())
    }

    pub async fn insert_all<T: Serialize>(&self, table: Table, rows: &[T]) -> Result<()> {
        for row in rows {
            self.insert(table, row).await?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Backend for MemoryBackend {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Value>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<&Value> = rows_of(&tables, query.table).iter().collect();

        rows.retain(|row| {
            query
                .filters
                .iter()
                .all(|filter| row.get(&filter.column) == Some(&filter.value))
        });

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare_for_order(
                    a.get(&order.column).unwrap_or(&Value::Null),
                    b.get(&order.column).unwrap_or(&Value::Null),
                );
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }

        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);

        rows.into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| project(&tables, query.table, row, &query.columns))
            .collect()
    }

    async fn count(&self, table: Table) -> Result<u64> {
        let tables = self.tables.read().await;
        Ok(rows_of(&tables, table).len() as u64)
    }
}

fn rows_of(tables: &HashMap<Table, Vec<Value>>, table: Table) -> &[Value] {
    tables.get(&table).map(Vec::as_slice).unwrap_or(&[])
}

/// Ordering before the direction is applied. Nulls sort last ascending and
/// first descending, like PostgreSQL.
fn compare_for_order(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

fn project(
    tables: &HashMap<Table, Vec<Value>>,
    table: Table,
    row: &Value,
    columns: &[Column],
) -> Result<Value> {
    let source = row
        .as_object()
        .ok_or_else(|| anyhow!("Row in {} is not an object", table))?;
    let mut out = Map::new();

    for column in columns {
        match column {
            Column::All => out.extend(source.iter().map(|(k, v)| (k.clone(), v.clone()))),
            Column::Field(name) => {
                let value = source
                    .get(name)
                    .ok_or_else(|| anyhow!("column {}.{} does not exist", table, name))?;
                out.insert(name.clone(), value.clone());
            }
            Column::Count => {
                return Err(anyhow!("count is only supported inside an embedded relation"))
            }
            Column::Embed(embed) => {
                out.insert(embed.table.to_string(), embed_value(tables, source, embed)?);
            }
        }
    }

    Ok(Value::Object(out))
}

fn embed_value(
    tables: &HashMap<Table, Vec<Value>>,
    parent: &Map<String, Value>,
    embed: &Embed,
) -> Result<Value> {
    let related = rows_of(tables, embed.table);

    match &embed.link {
        Link::Children { foreign_key } => {
            let parent_id = parent.get("id").unwrap_or(&Value::Null);
            let children: Vec<&Value> = related
                .iter()
                .filter(|r| r.get(foreign_key) == Some(parent_id))
                .collect();

            if embed.columns == [Column::Count] {
                return Ok(serde_json::json!([{ "count": children.len() }]));
            }

            children
                .into_iter()
                .map(|child| project(tables, embed.table, child, &embed.columns))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array)
        }
        Link::Parent { local_key } => {
            let key = parent.get(local_key).unwrap_or(&Value::Null);
            match related.iter().find(|r| r.get("id") == Some(key)) {
                Some(found) => project(tables, embed.table, found, &embed.columns),
                None => Ok(Value::Null),
            }
        }
    }
}
