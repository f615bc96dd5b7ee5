// Backend-neutral description of a single filtered, ordered, paginated read

use crate::model::Table;
use serde_json::Value;

/// One entry of a select list
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// `*`
    All,
    /// A plain column of the queried table
    Field(String),
    /// Aggregate row count of an embedded relation, rendered as `count`
    Count,
    /// A related table embedded into every row
    Embed(Embed),
}

/// How an embedded table is linked to the row it is embedded into
#[derive(Debug, Clone, PartialEq)]
pub enum Link {
    /// Child rows whose `foreign_key` equals the parent's `id` (one-to-many)
    Children { foreign_key: String },
    /// The single row whose `id` equals the parent's `local_key` (many-to-one)
    Parent { local_key: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    pub table: Table,
    pub link: Link,
    pub columns: Vec<Column>,
}

impl Embed {
    pub fn children(table: Table, foreign_key: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            table,
            link: Link::Children {
                foreign_key: foreign_key.into(),
            },
            columns,
        }
    }

    pub fn parent(table: Table, local_key: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            table,
            link: Link::Parent {
                local_key: local_key.into(),
            },
            columns,
        }
    }
}

impl Column {
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    /// Parse a comma separated list of plain column names (`*` allowed)
    pub fn list(columns: &str) -> Vec<Column> {
        columns
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| if c == "*" { Column::All } else { Column::field(c) })
            .collect()
    }
}

/// Render a select list the way PostgREST expects it, e.g.
/// `*,image_tags(tag_id,tags(name,color))`
pub fn render_columns(columns: &[Column]) -> String {
    columns
        .iter()
        .map(|column| match column {
            Column::All => "*".to_string(),
            Column::Field(name) => name.clone(),
            Column::Count => "count".to_string(),
            Column::Embed(embed) => {
                format!("{}({})", embed.table, render_columns(&embed.columns))
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Equality filter on a column
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A read against one table. Built with the chained methods below and
/// executed by a [`crate::Backend`].
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub table: Table,
    pub columns: Vec<Column>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl SelectQuery {
    /// `select *` from `table`
    pub fn from(table: Table) -> Self {
        Self {
            table,
            columns: vec![Column::All],
            filters: Vec::new(),
            order: None,
            offset: None,
            limit: None,
        }
    }

    pub fn select(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    /// Newest rows first
    pub fn newest_first(self) -> Self {
        self.order("created_at", false)
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Rows at positions `[offset, offset + limit)`, i.e. the inclusive range
    /// `offset..=offset + limit - 1`
    pub fn page(mut self, offset: u64, limit: u64) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }

    pub fn select_clause(&self) -> String {
        render_columns(&self.columns)
    }
}
