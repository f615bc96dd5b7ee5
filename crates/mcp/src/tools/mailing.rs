// Newsletter tools: broadcasts, subscribers and broadcast groups

use crate::protocol::CallToolResult;
use crate::schema::{FieldSpec, InputSchema, ToolArgs};
use crate::tools::{guarded, pretty, Tool};
use std::sync::Arc;
use supamcp_core::{Backend, BroadcastStatus, Column, Embed, SelectQuery, Table};

const BROADCAST_STATUSES: &[&str] = &BroadcastStatus::NAMES;

/// Tool to page through sent and pending broadcasts
pub struct BroadcastsTool {
    backend: Arc<dyn Backend>,
}

impl BroadcastsTool {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    fn query(args: &ToolArgs) -> SelectQuery {
        let limit = args.u64("limit").unwrap_or(10);
        let offset = args.u64("offset").unwrap_or(0);

        let mut query = SelectQuery::from(Table::SentMails)
            .newest_first()
            .page(offset, limit);
        if let Some(status) = args
            .str("status")
            .and_then(|s| s.parse::<BroadcastStatus>().ok())
        {
            query = query.eq("status", status.as_str());
        }
        query
    }
}

#[async_trait::async_trait]
impl Tool for BroadcastsTool {
    fn name(&self) -> &'static str {
        "get_broadcasts"
    }

    fn description(&self) -> &'static str {
        "List broadcast mails, newest first, with offset/limit pagination and an optional status filter"
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new()
            .field(FieldSpec::one_of("status", BROADCAST_STATUSES, "Filter by status"))
            .field(
                FieldSpec::integer("limit", "Limit number of broadcasts returned")
                    .default_value(10),
            )
            .field(FieldSpec::integer("offset", "Offset for pagination").default_value(0))
    }

    async fn execute(&self, args: ToolArgs) -> CallToolResult {
        let query = Self::query(&args);
        guarded("fetching broadcasts", async {
            let rows = self.backend.select(&query).await?;
            pretty(&rows)
        })
        .await
    }
}

/// Tool to list newsletter subscribers
pub struct SubscribersTool {
    backend: Arc<dyn Backend>,
}

impl SubscribersTool {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    fn query(args: &ToolArgs) -> SelectQuery {
        let mut query = SelectQuery::from(Table::Subscribe).newest_first();
        if args.bool("active_only").unwrap_or(true) {
            query = query.eq("is_active", true);
        }
        if let Some(limit) = args.positive_u64("limit") {
            query = query.limit(limit);
        }
        query
    }
}

#[async_trait::async_trait]
impl Tool for SubscribersTool {
    fn name(&self) -> &'static str {
        "get_subscribers"
    }

    fn description(&self) -> &'static str {
        "List newsletter subscribers, newest first; only active ones unless active_only is false"
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new()
            .field(
                FieldSpec::boolean("active_only", "Show only active subscribers")
                    .default_value(true),
            )
            .field(FieldSpec::integer("limit", "Limit number of subscribers returned"))
    }

    async fn execute(&self, args: ToolArgs) -> CallToolResult {
        let query = Self::query(&args);
        guarded("fetching subscribers", async {
            let rows = self.backend.select(&query).await?;
            pretty(&rows)
        })
        .await
    }
}

/// Tool to list broadcast groups
pub struct BroadcastGroupsTool {
    backend: Arc<dyn Backend>,
}

impl BroadcastGroupsTool {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// The counted variant embeds `group_subscribers(count)` and applies no
    /// ordering at all; the plain variant is ordered newest first.
    fn query(args: &ToolArgs) -> SelectQuery {
        if args.flag("include_subscriber_count") {
            SelectQuery::from(Table::BroadcastGroups).select(vec![
                Column::All,
                Column::Embed(Embed::children(
                    Table::GroupSubscribers,
                    "group_id",
                    vec![Column::Count],
                )),
            ])
        } else {
            SelectQuery::from(Table::BroadcastGroups).newest_first()
        }
    }
}

#[async_trait::async_trait]
impl Tool for BroadcastGroupsTool {
    fn name(&self) -> &'static str {
        "get_broadcast_groups"
    }

    fn description(&self) -> &'static str {
        "List broadcast groups, optionally with the number of subscribers in each"
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new().field(
            FieldSpec::boolean(
                "include_subscriber_count",
                "Include subscriber count for each group",
            )
            .default_value(false),
        )
    }

    async fn execute(&self, args: ToolArgs) -> CallToolResult {
        let query = Self::query(&args);
        guarded("fetching broadcast groups", async {
            let rows = self.backend.select(&query).await?;
            pretty(&rows)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{FailingBackend, FAILURE};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use serde_json::{json, Value};
    use supamcp_core::{Broadcast, BroadcastGroup, GroupSubscriber, MemoryBackend, Subscriber};
    use uuid::Uuid;

    async fn run(tool: &dyn Tool, args: Value) -> CallToolResult {
        let args = tool.input_schema().validate(Some(&args)).unwrap();
        tool.execute(args).await
    }

    fn rows(result: &CallToolResult) -> Vec<Value> {
        assert!(!result.is_error(), "unexpected error: {:?}", result.first_text());
        serde_json::from_str(result.first_text().unwrap()).unwrap()
    }

    fn labels(rows: &[Value], key: &str) -> Vec<String> {
        rows.iter().map(|r| r[key].as_str().unwrap().to_string()).collect()
    }

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap() + Duration::days(n)
    }

    fn broadcast(i: usize) -> Broadcast {
        Broadcast {
            id: Uuid::new_v4(),
            subject: format!("Issue {:02}", i),
            content: json!({"blocks": []}),
            content_html: None,
            recipients: vec!["reader@example.com".to_string()],
            status: BroadcastStatus::ALL[i % BroadcastStatus::ALL.len()],
            scheduled_for: None,
            sent_at: None,
            user_id: None,
            broadcast_id: None,
            total_recipients: 1,
            opened_count: None,
            clicked_count: None,
            created_at: day(i as i64),
            updated_at: day(i as i64),
        }
    }

    /// 25 broadcasts, `Issue 00` oldest .. `Issue 24` newest, statuses cycling
    async fn broadcasts() -> Arc<MemoryBackend> {
        let backend = Arc::new(MemoryBackend::new());
        let all: Vec<Broadcast> = (0..25).map(broadcast).collect();
        backend.insert_all(Table::SentMails, &all).await.unwrap();
        backend
    }

    #[tokio::test]
    async fn test_broadcasts_default_page() {
        let tool = BroadcastsTool::new(broadcasts().await);
        let page = rows(&run(&tool, json!({})).await);

        assert_eq!(page.len(), 10);
        assert_eq!(page[0]["subject"], "Issue 24");
        assert_eq!(page[9]["subject"], "Issue 15");
    }

    #[tokio::test]
    async fn test_broadcasts_offset_and_limit() {
        let backend = broadcasts().await;
        let tool = BroadcastsTool::new(backend.clone());

        let all = rows(&run(&tool, json!({"limit": 100})).await);
        let page = rows(&run(&tool, json!({"offset": 5, "limit": 4})).await);

        assert_eq!(labels(&page, "subject"), labels(&all[5..9], "subject"));
    }

    #[tokio::test]
    async fn test_broadcasts_status_filter() {
        let tool = BroadcastsTool::new(broadcasts().await);
        let page = rows(&run(&tool, json!({"status": "sent", "limit": 50})).await);

        assert_eq!(page.len(), 5);
        for row in &page {
            let parsed: Broadcast = serde_json::from_value(row.clone()).unwrap();
            assert_eq!(parsed.status, BroadcastStatus::Sent);
        }
        for pair in page.windows(2) {
            assert!(pair[0]["created_at"].as_str() >= pair[1]["created_at"].as_str());
        }
    }

    #[tokio::test]
    async fn test_broadcasts_zero_limit_is_empty_page() {
        let tool = BroadcastsTool::new(broadcasts().await);
        let page = rows(&run(&tool, json!({"limit": 0})).await);
        assert!(page.is_empty());
    }

    #[test]
    fn test_broadcasts_status_enum_enforced() {
        let tool = BroadcastsTool::new(Arc::new(MemoryBackend::new()));
        let err = tool
            .input_schema()
            .validate(Some(&json!({"status": "archived"})))
            .unwrap_err();
        assert_eq!(err.violations.len(), 1);
    }

    fn subscriber(email: &str, active: bool, n: i64) -> Subscriber {
        Subscriber {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: None,
            is_active: active,
            subscribed_at: day(n),
            unsubscribed_at: if active { None } else { Some(day(n + 1)) },
            created_at: day(n),
            updated_at: day(n),
        }
    }

    async fn subscribers() -> Arc<MemoryBackend> {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .insert_all(
                Table::Subscribe,
                &[
                    subscriber("a@x.io", true, 0),
                    subscriber("b@x.io", false, 1),
                    subscriber("c@x.io", true, 2),
                ],
            )
            .await
            .unwrap();
        backend
    }

    #[tokio::test]
    async fn test_subscribers_active_by_default() {
        let tool = SubscribersTool::new(subscribers().await);
        let list = rows(&run(&tool, json!({})).await);
        assert_eq!(labels(&list, "email"), vec!["c@x.io", "a@x.io"]);
    }

    #[tokio::test]
    async fn test_subscribers_all_when_active_only_false() {
        let tool = SubscribersTool::new(subscribers().await);
        let list = rows(&run(&tool, json!({"active_only": false, "limit": 2})).await);
        assert_eq!(labels(&list, "email"), vec!["c@x.io", "b@x.io"]);
    }

    fn group(name: &str, is_default: bool, n: i64) -> BroadcastGroup {
        BroadcastGroup {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            user_id: None,
            is_default,
            created_at: day(n),
            updated_at: day(n),
        }
    }

    async fn groups() -> Arc<MemoryBackend> {
        let backend = Arc::new(MemoryBackend::new());
        let all = group("All", true, 0);
        let vip = group("VIP", false, 120);
        let (s1, s3) = (Uuid::new_v4(), Uuid::new_v4());

        backend
            .insert_all(Table::BroadcastGroups, &[all.clone(), vip.clone()])
            .await
            .unwrap();
        backend
            .insert_all(
                Table::GroupSubscribers,
                &[
                    GroupSubscriber {
                        group_id: all.id,
                        subscriber_id: s1,
                    },
                    GroupSubscriber {
                        group_id: all.id,
                        subscriber_id: s3,
                    },
                    GroupSubscriber {
                        group_id: vip.id,
                        subscriber_id: s3,
                    },
                ],
            )
            .await
            .unwrap();
        backend
    }

    #[tokio::test]
    async fn test_groups_newest_first_without_counts() {
        let tool = BroadcastGroupsTool::new(groups().await);
        let list = rows(&run(&tool, json!({})).await);

        assert_eq!(labels(&list, "name"), vec!["VIP", "All"]);
        assert!(list[0].get("group_subscribers").is_none());
    }

    #[tokio::test]
    async fn test_groups_with_subscriber_count() {
        let tool = BroadcastGroupsTool::new(groups().await);
        let list = rows(&run(&tool, json!({"include_subscriber_count": true})).await);

        assert_eq!(list.len(), 2);
        for group in &list {
            let expected = if group["name"] == "All" { 2 } else { 1 };
            assert_eq!(group["group_subscribers"], json!([{ "count": expected }]));
        }
    }

    #[test]
    fn test_groups_with_count_has_no_ordering() {
        // Current behavior: asking for counts switches to an unordered query.
        let args = InputSchema::new()
            .field(FieldSpec::boolean("include_subscriber_count", ""))
            .validate(Some(&json!({"include_subscriber_count": true})))
            .unwrap();
        let counted = BroadcastGroupsTool::query(&args);
        assert!(counted.order.is_none());
        assert_eq!(counted.select_clause(), "*,group_subscribers(count)");

        let plain = BroadcastGroupsTool::query(&ToolArgs::default());
        assert!(plain.order.is_some());
        assert_eq!(plain.select_clause(), "*");
    }

    #[tokio::test]
    async fn test_backend_failures_become_error_envelopes() {
        let backend = Arc::new(FailingBackend);
        let cases: Vec<(Box<dyn Tool>, &str)> = vec![
            (Box::new(BroadcastsTool::new(backend.clone())), "fetching broadcasts"),
            (Box::new(SubscribersTool::new(backend.clone())), "fetching subscribers"),
            (
                Box::new(BroadcastGroupsTool::new(backend.clone())),
                "fetching broadcast groups",
            ),
        ];

        for (tool, action) in &cases {
            let result = run(tool.as_ref(), json!({})).await;
            assert!(result.is_error());
            assert_eq!(result.content.len(), 1);
            assert_eq!(
                result.first_text().unwrap(),
                format!("Error {}: {}", action, FAILURE)
            );
        }
    }
}
