// Application-wide row counts

use crate::protocol::CallToolResult;
use crate::schema::{InputSchema, ToolArgs};
use crate::tools::{guarded, pretty, Tool};
use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use supamcp_core::{AppStats, Backend, Table};

pub struct AppStatsTool {
    backend: Arc<dyn Backend>,
}

impl AppStatsTool {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Issue the six counts concurrently; the first failure aborts the rest
    async fn collect(&self) -> Result<AppStats> {
        let backend = self.backend.as_ref();
        let (blog_posts, subscribers, broadcasts, images, users, broadcast_groups) = tokio::try_join!(
            backend.count(Table::BlogPosts),
            backend.count(Table::Subscribe),
            backend.count(Table::SentMails),
            backend.count(Table::Images),
            backend.count(Table::Profiles),
            backend.count(Table::BroadcastGroups),
        )?;

        Ok(AppStats {
            blog_posts,
            subscribers,
            broadcasts,
            images,
            users,
            broadcast_groups,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }
}

#[async_trait::async_trait]
impl Tool for AppStatsTool {
    fn name(&self) -> &'static str {
        "get_app_stats"
    }

    fn description(&self) -> &'static str {
        "Count blog posts, subscribers, broadcasts, images, users and broadcast groups"
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new()
    }

    async fn execute(&self, _args: ToolArgs) -> CallToolResult {
        guarded("fetching app statistics", async {
            let stats = self.collect().await?;
            tracing::debug!(?stats, "Collected app statistics");
            pretty(&stats)
        })
        .await
    }
}
