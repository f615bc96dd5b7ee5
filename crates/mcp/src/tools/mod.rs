// Tool catalogue served over MCP

mod images;
mod mailing;
mod posts;
mod profiles;
mod registry;
mod stats;

pub use images::ImagesTool;
pub use mailing::{BroadcastGroupsTool, BroadcastsTool, SubscribersTool};
pub use posts::{BlogPostsTool, CreateBlogPostTool};
pub use profiles::UserProfilesTool;
pub use registry::{guarded, pretty, Tool, ToolRegistry};
pub use stats::AppStatsTool;

use anyhow::Result;
use std::sync::Arc;
use supamcp_client::ApiCaller;
use supamcp_core::Backend;

/// Build the registry with every application tool, in catalogue order
pub fn app_registry(backend: Arc<dyn Backend>, api: Arc<ApiCaller>) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();

    registry.register(Arc::new(BlogPostsTool::new(backend.clone())))?;
    registry.register(Arc::new(CreateBlogPostTool::new(api)))?;
    registry.register(Arc::new(BroadcastsTool::new(backend.clone())))?;
    registry.register(Arc::new(SubscribersTool::new(backend.clone())))?;
    registry.register(Arc::new(BroadcastGroupsTool::new(backend.clone())))?;
    registry.register(Arc::new(UserProfilesTool::new(backend.clone())))?;
    registry.register(Arc::new(ImagesTool::new(backend.clone())))?;
    registry.register(Arc::new(AppStatsTool::new(backend)))?;

    tracing::info!(tools = registry.len(), "Registered tools");
    Ok(registry)
}
