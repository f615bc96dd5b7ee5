//! # supamcp client
//!
//! HTTP clients used by the MCP tools: a PostgREST reader for the relational
//! backend and a small JSON caller for the app's own API.
//!
//! ```rust,no_run
//! use supamcp_client::{BackendClients, BackendConfig};
//! use supamcp_core::{Backend, SelectQuery, Table};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = BackendConfig::from_parts(
//!     Some("https://abc.supabase.co"),
//!     Some("anon-key"),
//!     None,
//! )?;
//! let backend = BackendClients::connect(&config)?.reader();
//!
//! let profiles = backend
//!     .select(&SelectQuery::from(Table::Profiles).newest_first().limit(5))
//!     .await?;
//! println!("{} profiles", profiles.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod clients;
pub mod config;
pub mod error;
pub mod postgrest;

pub use api::{ApiCaller, CallOptions};
pub use clients::BackendClients;
pub use config::{ApiConfig, BackendConfig, DEFAULT_APP_BASE_URL};
pub use error::{ClientError, ClientResult};
pub use postgrest::PostgrestClient;
