// Image library listing, optionally with tags

use crate::protocol::CallToolResult;
use crate::schema::{FieldSpec, InputSchema, ToolArgs};
use crate::tools::{guarded, pretty, Tool};
use std::sync::Arc;
use supamcp_core::{Backend, Column, Embed, SelectQuery, Table};

pub struct ImagesTool {
    backend: Arc<dyn Backend>,
}

impl ImagesTool {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// `*,image_tags(tag_id,tags(name,color))`
    fn tagged_columns() -> Vec<Column> {
        vec![
            Column::All,
            Column::Embed(Embed::children(
                Table::ImageTags,
                "image_id",
                vec![
                    Column::field("tag_id"),
                    Column::Embed(Embed::parent(
                        Table::Tags,
                        "tag_id",
                        Column::list("name, color"),
                    )),
                ],
            )),
        ]
    }

    fn query(args: &ToolArgs) -> SelectQuery {
        let mut query = SelectQuery::from(Table::Images);
        if args.flag("with_tags") {
            query = query.select(Self::tagged_columns());
        }
        query = query.newest_first();

        if let Some(user_id) = args.non_empty_str("user_id") {
            query = query.eq("user_id", user_id);
        }
        if let Some(limit) = args.positive_u64("limit") {
            query = query.limit(limit);
        }
        query
    }
}

#[async_trait::async_trait]
impl Tool for ImagesTool {
    fn name(&self) -> &'static str {
        "get_images"
    }

    fn description(&self) -> &'static str {
        "List uploaded images, newest first, optionally for one user and with their tags"
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new()
            .field(FieldSpec::string("user_id", "Filter by user ID"))
            .field(FieldSpec::boolean("with_tags", "Include tag information").default_value(false))
            .field(FieldSpec::integer("limit", "Limit number of images returned"))
    }

    async fn execute(&self, args: ToolArgs) -> CallToolResult {
        let query = Self::query(&args);
        guarded("fetching images", async {
            let rows = self.backend.select(&query).await?;
            pretty(&rows)
        })
        .await
    }
}
