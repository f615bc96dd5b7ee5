// Core types and backend abstraction for the Supabase app MCP server

pub mod backend;
pub mod memory;
pub mod model;
pub mod query;

pub use backend::Backend;
pub use memory::MemoryBackend;
pub use model::*;
pub use query::{Column, Embed, Filter, Link, Order, SelectQuery};
