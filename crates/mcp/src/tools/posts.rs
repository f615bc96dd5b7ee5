// Blog post tools: listing posts and creating one through the app API

use crate::protocol::CallToolResult;
use crate::schema::{FieldSpec, InputSchema, ToolArgs};
use crate::tools::{guarded, pretty, Tool};
use anyhow::Context;
use std::sync::Arc;
use supamcp_client::{ApiCaller, CallOptions};
use supamcp_core::{Backend, Column, NewBlogPost, SelectQuery, Table};

const POST_COLUMNS: &str =
    "id, title, excerpt, slug, featured_image, created_at, updated_at, published, author_id";

/// Tool to list blog posts, newest first
pub struct BlogPostsTool {
    backend: Arc<dyn Backend>,
}

impl BlogPostsTool {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// `publishedOnly` is checked before `draftsOnly`, so it wins when both
    /// are set
    fn query(args: &ToolArgs) -> SelectQuery {
        let mut query = SelectQuery::from(Table::BlogPosts)
            .select(Column::list(POST_COLUMNS))
            .newest_first();

        if args.flag("publishedOnly") {
            query = query.eq("published", true);
        } else if args.flag("draftsOnly") {
            query = query.eq("published", false);
        }

        if let Some(limit) = args.positive_u64("limit") {
            query = query.limit(limit);
        }

        query
    }
}

#[async_trait::async_trait]
impl Tool for BlogPostsTool {
    fn name(&self) -> &'static str {
        "get_blog_posts"
    }

    fn description(&self) -> &'static str {
        "List blog posts, newest first, optionally only published posts or only drafts"
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new()
            .field(FieldSpec::boolean("onlyMine", "Show only current user's posts"))
            .field(FieldSpec::boolean("publishedOnly", "Show only published posts"))
            .field(FieldSpec::boolean("draftsOnly", "Show only draft posts"))
            .field(FieldSpec::integer("limit", "Limit number of posts returned"))
    }

    async fn execute(&self, args: ToolArgs) -> CallToolResult {
        let query = Self::query(&args);
        guarded("fetching blog posts", async {
            let rows = self.backend.select(&query).await?;
            pretty(&rows)
        })
        .await
    }
}

/// Tool to create a blog post through the app API
pub struct CreateBlogPostTool {
    api: Arc<ApiCaller>,
}

impl CreateBlogPostTool {
    pub fn new(api: Arc<ApiCaller>) -> Self {
        Self { api }
    }

    fn payload(args: &ToolArgs) -> NewBlogPost {
        NewBlogPost {
            title: args.str("title").unwrap_or_default().to_string(),
            content: args.str("content").unwrap_or_default().to_string(),
            excerpt: args.str("excerpt").map(str::to_string),
            slug: args.str("slug").map(str::to_string),
            featured_image: args.str("featured_image").map(str::to_string),
            published: args.flag("published"),
        }
    }
}

#[async_trait::async_trait]
impl Tool for CreateBlogPostTool {
    fn name(&self) -> &'static str {
        "create_blog_post"
    }

    fn description(&self) -> &'static str {
        "Create a blog post; it stays a draft unless published is set"
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new()
            .field(FieldSpec::string("title", "Blog post title").required())
            .field(FieldSpec::string("content", "Blog post content").required())
            .field(FieldSpec::string("excerpt", "Blog post excerpt"))
            .field(FieldSpec::string(
                "slug",
                "Custom slug (auto-generated if not provided)",
            ))
            .field(FieldSpec::string("featured_image", "Featured image URL"))
            .field(
                FieldSpec::boolean("published", "Publish immediately (default: false)")
                    .default_value(false),
            )
    }

    async fn execute(&self, args: ToolArgs) -> CallToolResult {
        let post = Self::payload(&args);
        guarded("creating blog post", async {
            let body = serde_json::to_value(&post).context("Failed to encode blog post")?;
            let created = self
                .api
                .call("/blog-posts", CallOptions::post(body))
                .await?;
            pretty(&created).map(|json| format!("Blog post created successfully:\n{}", json))
        })
        .await
    }
}
