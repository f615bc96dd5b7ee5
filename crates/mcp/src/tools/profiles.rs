// User profile listing

use crate::protocol::CallToolResult;
use crate::schema::{FieldSpec, InputSchema, ToolArgs};
use crate::tools::{guarded, pretty, Tool};
use std::sync::Arc;
use supamcp_core::{Backend, SelectQuery, Table};

pub struct UserProfilesTool {
    backend: Arc<dyn Backend>,
}

impl UserProfilesTool {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    fn query(args: &ToolArgs) -> SelectQuery {
        let mut query = SelectQuery::from(Table::Profiles).newest_first();
        if let Some(role) = args.non_empty_str("role") {
            query = query.eq("role", role);
        }
        if let Some(limit) = args.positive_u64("limit") {
            query = query.limit(limit);
        }
        query
    }
}

#[async_trait::async_trait]
impl Tool for UserProfilesTool {
    fn name(&self) -> &'static str {
        "get_user_profiles"
    }

    fn description(&self) -> &'static str {
        "List user profiles, newest first, optionally filtered by role"
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new()
            .field(FieldSpec::string(
                "role",
                "Filter by user role (admin, editor, etc.)",
            ))
            .field(FieldSpec::integer("limit", "Limit number of profiles returned"))
    }

    async fn execute(&self, args: ToolArgs) -> CallToolResult {
        let query = Self::query(&args);
        guarded("fetching user profiles", async {
            let rows = self.backend.select(&query).await?;
            pretty(&rows)
        })
        .await
    }
}
