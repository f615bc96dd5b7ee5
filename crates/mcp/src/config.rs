// Command-line and environment settings for the `supamcp` binary

use anyhow::{Context, Result};
use clap::Parser;
use supamcp_client::{ApiConfig, BackendConfig};

#[derive(Parser, Clone, Default)]
#[command(
    name = "supamcp",
    version,
    about = "MCP server exposing a Supabase-backed app's content as tools over stdio"
)]
pub struct Settings {
    /// Project URL of the Supabase backend
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Restricted (anon) API key
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    pub anon_key: Option<String>,

    /// Elevated (service role) API key; used for all reads when set
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    pub service_role_key: Option<String>,

    /// Base URL of the app API used to create blog posts
    #[arg(long, env = "APP_BASE_URL")]
    pub app_base_url: Option<String>,

    /// Log filter directive, e.g. `debug` or `supamcp=trace`
    #[arg(long, env = "SUPAMCP_LOG")]
    pub log_level: Option<String>,

    /// Print the tool catalogue as JSON and exit
    #[arg(long)]
    pub list_tools: bool,
}

impl Settings {
    pub fn backend_config(&self) -> Result<BackendConfig> {
        BackendConfig::from_parts(
            self.supabase_url.as_deref(),
            self.anon_key.as_deref(),
            self.service_role_key.as_deref(),
        )
        .context("Invalid backend configuration")
    }

    pub fn api_config(&self) -> Result<ApiConfig> {
        ApiConfig::from_base_url(self.app_base_url.as_deref())
            .context("Invalid APP_BASE_URL")
    }
}

// Keys stay out of debug output.
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("supabase_url", &self.supabase_url)
            .field("anon_key", &self.anon_key.as_ref().map(|_| "[SET]"))
            .field(
                "service_role_key",
                &self.service_role_key.as_ref().map(|_| "[SET]"),
            )
            .field("app_base_url", &self.app_base_url)
            .field("log_level", &self.log_level)
            .field("list_tools", &self.list_tools)
            .finish()
    }
}
