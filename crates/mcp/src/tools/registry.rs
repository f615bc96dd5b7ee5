// Tool trait, registry and the shared result-wrapping helper

use crate::protocol::{CallToolResult, ToolSchema};
use crate::schema::{InputSchema, ToolArgs};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Tool executor trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Unique wire name
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Declared arguments, checked before `execute` is called
    fn input_schema(&self) -> InputSchema;

    /// Run the tool with validated arguments. Operational failures are
    /// reported inside the returned envelope, never as an `Err`.
    async fn execute(&self, args: ToolArgs) -> CallToolResult;

    /// Get the tool schema for MCP
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema().to_json_schema(),
        }
    }
}

/// Tool registry, filled once at startup and read-only afterwards
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool; names must be unique
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name();
        if self.by_name.contains_key(name) {
            bail!("Tool {} is already registered", name);
        }
        self.by_name.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.by_name.get(name).map(|&i| self.tools[i].clone())
    }

    /// List all tool schemas, in registration order
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Run one unit of tool work and wrap the outcome in an envelope.
///
/// Success yields the produced text. Any error becomes an `isError`
/// envelope reading `Error <action>: <message>`.
pub async fn guarded<F>(action: &str, work: F) -> CallToolResult
where
    F: Future<Output = Result<String>>,
{
    match work.await {
        Ok(text) => CallToolResult::text(text),
        Err(err) => {
            let mut message = err.to_string();
            if message.trim().is_empty() {
                message = "Unknown error".to_string();
            }
            tracing::error!(action, error = %message, "Tool call failed");
            CallToolResult::error(format!("Error {}: {}", action, message))
        }
    }
}

/// Pretty-print a result with two-space indentation
pub fn pretty(value: &impl Serialize) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize result")
}
