// MCP (Model Context Protocol) server for a Supabase-backed content app.
// Exposes blog, newsletter, profile, image and statistics tools to agent
// clients over stdio.

pub mod config;
pub mod framing;
pub mod protocol;
pub mod schema;
pub mod server;
pub mod tools;

pub use config::Settings;
pub use server::McpServer;
